//! Laboratory notebook API client library.
//!
//! A Rust library for a JSON:API-style electronic lab notebook REST API.
//! Collections are read lazily, one page at a time, by following the
//! `links.next` URLs the server returns. Collections owned by an entity
//! (sample properties, table rows and columns) are fetched once and cached,
//! with positional and keyed access.
//!
//! # Quick Start
//!
//! ```no_run
//! use notebookapi::{Entity, EntityListQuery, Get, List, NotebookClient, Sample, User};
//!
//! #[tokio::main]
//! async fn main() -> notebookapi::Result<()> {
//!     // Create client from environment variables
//!     let client = NotebookClient::from_env()?;
//!
//!     // Walk every notebook, one page at a time
//!     let mut notebooks = Entity::list(&client, &EntityListQuery::of_type("journal"))?;
//!     while let Some(notebook) = notebooks.try_next().await? {
//!         println!("{}  {}", notebook.eid(), notebook.name());
//!     }
//!
//!     // Sample properties are loaded on first access, then cached
//!     let mut sample = Sample::get(&client, "sample:2a5c...".to_string()).await?;
//!     let first = sample.properties().get_by_position(&client, 0).await?;
//!     println!("{} = {}", first.name, first.display_value());
//!
//!     // Typed listing through the List trait
//!     let users = User::list_all(&client, &Default::default()).await?;
//!     println!("Found {} users", users.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`Transport`] - one request in, one response (or error) out.
//!   [`NotebookClient`] is the HTTP implementation; every operation takes a
//!   `&dyn Transport`, so tests can script responses.
//! - [`Paginator`] - lazy, fused sequence over a chain of pages.
//! - [`CachedCollection`] - load-once collection with positional and keyed
//!   lookup; keys are UUIDs where possible, raw strings otherwise.
//! - [`Get`], [`List`], [`Create`], [`Update`], [`Delete`] - per-model
//!   operations, implemented by the types whose endpoints support them.
//! - [`EntityRegistry`] - maps entity type tags to model constructors.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `NOTEBOOK_API_KEY` (required) - API key, sent as `x-api-key`
//! - `NOTEBOOK_API_URL` (required) - Base URL, e.g. `https://eln.example.com/api/rest/v1.0`

mod client;
mod collection;
mod envelope;
mod error;
mod models;
mod output;
mod pagination;
mod registry;
mod traits;
mod transport;

pub mod cli;

#[cfg(feature = "test-server")]
pub mod mock_server;

#[cfg(test)]
mod test_support;

// Re-export core types
pub use client::NotebookClient;
pub use error::{ApiErrorDetail, NotebookError, Result};
pub use transport::{ApiPath, ApiRequest, ApiResponse, Method, RequestBody, Transport};

// Re-export collection machinery
pub use collection::{Cache, CachedCollection, CollectionItem, ItemKey};
pub use envelope::{Envelope, Links, Record};
pub use pagination::{Page, PageParams, Paginator, DEFAULT_PAGE_LIMIT};
pub use registry::EntityRegistry;

// Re-export traits
pub use output::PrettyPrint;
pub use traits::{Create, Delete, Get, List, Update};

// Re-export models
pub use models::{
    // Entities
    Entity,
    EntityAttributes,
    EntityListQuery,
    EntityPaginator,
    EntityUpdateParams,
    ExportedFile,
    // Notebooks and experiments
    Experiment,
    ExperimentCreateParams,
    ExperimentPaginator,
    Notebook,
    NotebookCreateParams,
    Text,
    // Samples
    PropertyChange,
    PropertyContent,
    Sample,
    SampleProperty,
    // Tables
    Cell,
    CellContent,
    Column,
    Row,
    Table,
    // Materials
    Material,
    MaterialLibrary,
    // Users
    User,
    UserListQuery,
};
