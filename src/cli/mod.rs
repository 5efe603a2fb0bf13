//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the notebookapi binary.

use clap::{Parser, Subcommand, ValueEnum};

/// Lab notebook API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "notebookapi", about = "Lab notebook API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Log requests and pages to stderr.
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a single item by id.
    Get {
        /// The kind of item to get.
        kind: GetKind,

        /// Entity eid (`journal:...`), material eid or user id.
        id: String,
    },

    /// List a collection, one page or all of it.
    List {
        /// The collection to list.
        kind: ListKind,

        /// Only entities of this type tag (e.g. `journal`, `sample`).
        #[arg(long = "type")]
        entity_type: Option<String>,

        /// Number of items per page.
        #[arg(long)]
        limit: Option<u32>,

        /// Follow `next` links through every page.
        #[arg(long)]
        all: bool,
    },

    /// Show the properties of a sample.
    Properties {
        /// The sample eid.
        eid: String,
    },

    /// Delete an entity.
    Delete {
        /// The entity eid.
        eid: String,

        /// Only delete if the entity is still at this version.
        #[arg(long)]
        digest: Option<String>,
    },
}

/// Item kinds for `get`.
#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum GetKind {
    /// Any notebook entity.
    Entity,
    /// A user account.
    User,
    /// A material.
    Material,
}

/// Collections for `list`.
#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// Notebook entities.
    #[value(alias = "entity")]
    Entities,
    /// User accounts.
    #[value(alias = "user")]
    Users,
    /// Material libraries.
    #[value(alias = "library")]
    Libraries,
}
