//! Lab notebook API CLI binary.
//!
//! A command-line interface for browsing notebook entities, users and
//! materials.

use clap::Parser;
use notebookapi::cli::{Cli, Command, GetKind, ListKind};
use notebookapi::{
    Entity, EntityListQuery, Get, List, Material, MaterialLibrary, NotebookClient, Page,
    PageParams, PrettyPrint, Sample, User, UserListQuery, DEFAULT_PAGE_LIMIT,
};
use serde::Serialize;
use std::process::ExitCode;
use tabled::{Table, Tabled};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let client = match NotebookClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set NOTEBOOK_API_KEY and NOTEBOOK_API_URL environment variables");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &NotebookClient, cli: Cli) -> notebookapi::Result<()> {
    match cli.command {
        Command::Get { kind, id } => handle_get(client, kind, id, cli.json).await,
        Command::List {
            kind,
            entity_type,
            limit,
            all,
        } => handle_list(client, kind, entity_type, limit, all, cli.json).await,
        Command::Properties { eid } => handle_properties(client, eid, cli.json).await,
        Command::Delete { eid, digest } => {
            Entity::delete_version(client, &eid, digest.as_deref()).await?;
            if !cli.json {
                println!("Deleted {eid}");
            }
            Ok(())
        }
    }
}

async fn handle_get(
    client: &NotebookClient,
    kind: GetKind,
    id: String,
    json: bool,
) -> notebookapi::Result<()> {
    match kind {
        GetKind::Entity => output_single(&Entity::get(client, id).await?, json),
        GetKind::User => output_single(&User::get(client, id).await?, json),
        GetKind::Material => output_single(&Material::get(client, id).await?, json),
    }
}

async fn handle_list(
    client: &NotebookClient,
    kind: ListKind,
    entity_type: Option<String>,
    limit: Option<u32>,
    all: bool,
    json: bool,
) -> notebookapi::Result<()> {
    let page = PageParams {
        offset: None,
        limit: Some(limit.unwrap_or(DEFAULT_PAGE_LIMIT)),
    };

    match kind {
        ListKind::Entities => {
            let query = EntityListQuery {
                include_types: entity_type.into_iter().collect(),
                page,
                ..Default::default()
            };
            let mut entities = Entity::list(client, &query)?;
            let mut items = Vec::new();
            while let Some(entity) = entities.try_next().await? {
                items.push(entity);
                if !all && items.len() >= query.page.limit.unwrap_or(DEFAULT_PAGE_LIMIT) as usize {
                    break;
                }
            }
            output_list(&items, json, |e| EntityRow::from(e))
        }
        ListKind::Users => {
            let query = UserListQuery {
                page,
                ..Default::default()
            };
            if all {
                output_list(&User::list_all(client, &query).await?, json, |u| UserRow::from(u))
            } else {
                output_page(&User::list_page(client, &query).await?, json, |u| UserRow::from(u))
            }
        }
        ListKind::Libraries => {
            if all {
                output_list(&MaterialLibrary::list_all(client, &page).await?, json, |l| LibraryRow::from(l))
            } else {
                output_page(&MaterialLibrary::list_page(client, &page).await?, json, |l| LibraryRow::from(l))
            }
        }
    }
}

async fn handle_properties(client: &NotebookClient, eid: String, json: bool) -> notebookapi::Result<()> {
    let mut sample = Sample::get(client, eid).await?;
    let properties = sample.properties().ensure_loaded(client).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(properties.items())?);
    } else {
        for property in properties {
            println!("{}", property.pretty_print());
        }
    }
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> notebookapi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_list<T, R, F>(items: &[T], json: bool, to_row: F) -> notebookapi::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        println!("\n{} items", items.len());
    }
    Ok(())
}

fn output_page<T, R, F>(page: &Page<T>, json: bool, to_row: F) -> notebookapi::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(&page.items)?);
    } else {
        let rows: Vec<R> = page.items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        if page.has_more {
            println!("\n{} items (more available, use --all)", page.len());
        } else {
            println!("\n{} items (end)", page.len());
        }
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct EntityRow {
    eid: String,
    #[tabled(rename = "type")]
    entity_type: String,
    name: String,
}

impl From<&Entity> for EntityRow {
    fn from(e: &Entity) -> Self {
        Self {
            eid: e.eid().to_string(),
            entity_type: e.entity_type().to_string(),
            name: e.name().to_string(),
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    id: String,
    user: String,
    name: String,
    enabled: bool,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.user_id.clone(),
            user: u.user_name.clone(),
            name: u.full_name(),
            enabled: u.is_enabled,
        }
    }
}

#[derive(Tabled)]
struct LibraryRow {
    eid: String,
    name: String,
    description: String,
}

impl From<&MaterialLibrary> for LibraryRow {
    fn from(l: &MaterialLibrary) -> Self {
        Self {
            eid: l.eid.clone(),
            name: l.name.clone(),
            description: l.description.clone().unwrap_or_default(),
        }
    }
}
