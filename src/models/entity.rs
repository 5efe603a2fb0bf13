//! The generic entity model and entity-level operations.
//!
//! Everything stored in a notebook (notebooks themselves, experiments,
//! samples, tables, text blocks, ...) is an *entity* addressed by an `eid`
//! such as `journal:0b6e4ef8-...`. The `entities` endpoints return records
//! of mixed types, decoded through the [`EntityRegistry`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::{Envelope, Record};
use crate::error::{NotebookError, Result};
use crate::models::{Experiment, Notebook, Sample, Table, Text};
use crate::pagination::{PageParams, Paginator};
use crate::registry::EntityRegistry;
use crate::traits::{Delete, Get};
use crate::transport::{ApiPath, ApiRequest, Transport};

/// Fields shared by every entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAttributes {
    /// Entity id, `<type>:<uuid>`.
    pub eid: String,

    /// Type tag (e.g. "journal", "experiment", "sample").
    #[serde(rename = "type")]
    pub entity_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version token required by some mutating calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,

    /// Type-specific fields, left undecoded.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl EntityAttributes {
    /// The UUID part of the eid.
    pub fn uid(&self) -> &str {
        self.eid
            .split_once(':')
            .map_or(self.eid.as_str(), |(_, uid)| uid)
    }
}

/// Any entity, decoded to its concrete type where one is modeled.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Entity {
    Notebook(Notebook),
    Experiment(Experiment),
    Sample(Sample),
    Table(Table),
    Text(Text),
    /// A type without a dedicated model.
    Other(EntityAttributes),
}

impl Entity {
    /// Common attributes, whatever the type.
    pub fn attributes(&self) -> &EntityAttributes {
        match self {
            Entity::Notebook(e) => &e.attributes,
            Entity::Experiment(e) => &e.attributes,
            Entity::Sample(e) => &e.attributes,
            Entity::Table(e) => &e.attributes,
            Entity::Text(e) => &e.attributes,
            Entity::Other(attributes) => attributes,
        }
    }

    pub fn eid(&self) -> &str {
        &self.attributes().eid
    }

    pub fn name(&self) -> &str {
        &self.attributes().name
    }

    pub fn entity_type(&self) -> &str {
        &self.attributes().entity_type
    }

    /// Lazily list entities matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be encoded.
    pub fn list<'a>(
        transport: &'a dyn Transport,
        query: &EntityListQuery,
    ) -> Result<EntityPaginator<'a>> {
        let request = ApiRequest::get("entities").with_query(query)?;
        Ok(EntityPaginator::new(transport, request))
    }

    /// Lazily list the direct children of `eid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be encoded.
    pub fn children<'a>(
        transport: &'a dyn Transport,
        eid: &str,
        query: &EntityListQuery,
    ) -> Result<EntityPaginator<'a>> {
        Ok(EntityPaginator::new(transport, children_request(eid, query)?))
    }

    /// Download the entity's exported content.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(transport))]
    pub async fn export(transport: &dyn Transport, eid: &str) -> Result<ExportedFile> {
        let request = ApiRequest::get(ApiPath::segments("entities", [eid, "export"]));
        let response = transport.call(request).await?;

        let content_type = response
            .header_str(reqwest::header::CONTENT_TYPE.as_str())
            .map(str::to_string);
        let file_name = response
            .header_str(reqwest::header::CONTENT_DISPOSITION.as_str())
            .and_then(file_name_from_disposition);

        Ok(ExportedFile {
            content_type,
            file_name,
            data: response.into_content(),
        })
    }
}

impl Entity {
    /// Delete (trash) an entity, optionally pinned to the version `digest`
    /// names. Without a digest the deletion is forced.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::InvalidId`] for an empty eid, or the API
    /// error (e.g. a digest conflict).
    #[tracing::instrument(skip(transport))]
    pub async fn delete_version(
        transport: &dyn Transport,
        eid: &str,
        digest: Option<&str>,
    ) -> Result<()> {
        if eid.is_empty() {
            return Err(NotebookError::InvalidId(eid.to_string()));
        }
        let request = ApiRequest::delete(ApiPath::segments("entities", [eid]));
        let request = match digest {
            Some(digest) => request.with_param("digest", digest),
            None => request.with_param("force", true),
        };
        transport.call(request).await?;
        Ok(())
    }
}

pub(crate) fn children_request(eid: &str, query: &EntityListQuery) -> Result<ApiRequest> {
    ApiRequest::get(ApiPath::segments("entities", [eid, "children"])).with_query(query)
}

/// Fetch one entity and decode its single record through the registry.
pub(crate) async fn fetch_entity(transport: &dyn Transport, eid: &str) -> Result<Entity> {
    let request = ApiRequest::get(ApiPath::segments("entities", [eid]));
    let response = transport.call(request).await?;
    let envelope: Envelope<Value> = response.json()?;
    EntityRegistry::builtin().decode(envelope.into_single()?)
}

/// Patch the `name`/`description` properties of an entity.
pub(crate) async fn patch_properties(
    transport: &dyn Transport,
    eid: &str,
    params: &EntityUpdateParams,
) -> Result<()> {
    let mut data = Vec::new();
    if let Some(name) = &params.name {
        data.push(property_patch("Name", name));
    }
    if let Some(description) = &params.description {
        data.push(property_patch("Description", description));
    }
    if data.is_empty() {
        return Ok(());
    }

    let mut request = ApiRequest::patch(ApiPath::segments("entities", [eid, "properties"]))
        .with_param("force", true)
        .with_json(&serde_json::json!({ "data": data }))?;
    if let Some(digest) = &params.digest {
        request = request.with_param("digest", digest);
    }
    transport.call(request).await?;
    Ok(())
}

fn property_patch(name: &str, value: &str) -> Value {
    serde_json::json!({ "attributes": { "name": name, "value": value } })
}

fn file_name_from_disposition(disposition: &str) -> Option<String> {
    disposition.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
    })
}

/// Filters for the `entities` and `children` listings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityListQuery {
    /// Only these type tags.
    #[serde(rename = "includeTypes", skip_serializing_if = "Vec::is_empty")]
    pub include_types: Vec<String>,

    /// Never these type tags.
    #[serde(rename = "excludeTypes", skip_serializing_if = "Vec::is_empty")]
    pub exclude_types: Vec<String>,

    #[serde(flatten)]
    pub page: PageParams,
}

impl EntityListQuery {
    /// Restrict to one type tag.
    #[must_use]
    pub fn of_type(tag: &str) -> Self {
        Self {
            include_types: vec![tag.to_string()],
            ..Default::default()
        }
    }
}

/// Changes to the common entity properties. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct EntityUpdateParams {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Digest of the version being edited; the server rejects stale edits.
    pub digest: Option<String>,
}

/// Raw exported content of an entity.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Lazy sequence of mixed-type entities.
#[derive(Debug)]
pub struct EntityPaginator<'a> {
    inner: Paginator<'a, Value>,
}

impl<'a> EntityPaginator<'a> {
    pub fn new(transport: &'a dyn Transport, request: ApiRequest) -> Self {
        Self {
            inner: Paginator::new(transport, request),
        }
    }

    /// Pull and decode the next entity.
    ///
    /// # Errors
    ///
    /// Returns transport errors for the page being fetched, or a decode
    /// error for the record.
    pub async fn try_next(&mut self) -> Result<Option<Entity>> {
        match self.inner.next_record().await? {
            Some(record) => EntityRegistry::builtin().decode(record).map(Some),
            None => Ok(None),
        }
    }

    /// Pull the next record without decoding it.
    ///
    /// # Errors
    ///
    /// See [`Paginator::next_record`].
    pub async fn next_record(&mut self) -> Result<Option<Record<Value>>> {
        self.inner.next_record().await
    }

    pub fn requests_issued(&self) -> usize {
        self.inner.requests_issued()
    }

    /// Drain and decode everything that is left.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub async fn collect_all(mut self) -> Result<Vec<Entity>> {
        let mut entities = Vec::new();
        while let Some(entity) = self.try_next().await? {
            entities.push(entity);
        }
        Ok(entities)
    }
}

#[async_trait]
impl Get for Entity {
    type Id = String; // eid

    #[tracing::instrument(skip(transport))]
    async fn get(transport: &dyn Transport, eid: String) -> Result<Self> {
        fetch_entity(transport, &eid).await
    }
}

#[async_trait]
impl Delete for Entity {
    type Id = String; // eid

    #[tracing::instrument(skip(transport))]
    async fn delete(transport: &dyn Transport, eid: String) -> Result<()> {
        Entity::delete_version(transport, &eid, None).await
    }
}
