//! Entity endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{not_found, paged, record, single, split_types};
use crate::mock_server::state::MockState;
use crate::EntityAttributes;

/// Query parameters for listing entities and children.
#[derive(Debug, Default, Deserialize)]
pub struct ListEntitiesQuery {
    #[serde(rename = "page[offset]")]
    pub offset: Option<usize>,
    #[serde(rename = "page[limit]")]
    pub limit: Option<usize>,
    #[serde(rename = "includeTypes")]
    pub include_types: Option<String>,
    #[serde(rename = "excludeTypes")]
    pub exclude_types: Option<String>,
}

impl ListEntitiesQuery {
    fn filters(&self) -> Vec<(&'static str, String)> {
        let mut extra = Vec::new();
        if let Some(ref t) = self.include_types {
            extra.push(("includeTypes", t.clone()));
        }
        if let Some(ref t) = self.exclude_types {
            extra.push(("excludeTypes", t.clone()));
        }
        extra
    }
}

/// Query parameters for mutating calls.
#[derive(Debug, Default, Deserialize)]
pub struct VersionQuery {
    pub digest: Option<String>,
    #[allow(dead_code)] // Sent by the client; the mock never refuses unforced calls
    pub force: Option<bool>,
}

/// `{"data": {...}}` request body for creation.
#[derive(Debug, Deserialize)]
pub struct CreateEntityBody {
    pub data: NewEntity,
}

#[derive(Debug, Deserialize)]
pub struct NewEntity {
    #[serde(default)]
    pub attributes: NewEntityAttributes,
    #[serde(default)]
    pub relationships: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewEntityAttributes {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

/// `{"data": [{"attributes": {"name": ..., "value": ...}}]}` request body.
#[derive(Debug, Deserialize)]
pub struct PatchEntityBody {
    pub data: Vec<PropertyPatch>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyPatch {
    pub attributes: NamedValue,
}

#[derive(Debug, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: String,
}

fn entity_record(entity: &EntityAttributes) -> Value {
    record(&entity.entity_type, &entity.eid, entity)
}

/// GET /entities
pub async fn list_entities(
    State(state): State<Arc<RwLock<MockState>>>,
    Query(query): Query<ListEntitiesQuery>,
) -> Response {
    let state = state.read().await;
    let include = split_types(query.include_types.as_deref());
    let exclude = split_types(query.exclude_types.as_deref());

    let records = state
        .list_entities(&include, &exclude)
        .into_iter()
        .map(entity_record)
        .collect();

    let base = format!("{}/entities", state.base_url);
    paged(&base, records, query.offset, query.limit, &query.filters())
}

/// GET /entities/{eid}
pub async fn get_entity(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(eid): Path<String>,
) -> Response {
    let state = state.read().await;

    match state.get_entity(&eid) {
        Some(entity) => single(StatusCode::OK, entity_record(entity)),
        None => not_found("entity", &eid),
    }
}

/// GET /entities/{eid}/children
pub async fn list_children(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(eid): Path<String>,
    Query(query): Query<ListEntitiesQuery>,
) -> Response {
    let state = state.read().await;
    if state.get_entity(&eid).is_none() {
        return not_found("entity", &eid);
    }

    let include = split_types(query.include_types.as_deref());
    let exclude = split_types(query.exclude_types.as_deref());
    let records = state
        .children(&eid, &include, &exclude)
        .into_iter()
        .map(entity_record)
        .collect();

    let base = format!(
        "{}/entities/{}/children",
        state.base_url,
        urlencoding::encode(&eid)
    );
    paged(&base, records, query.offset, query.limit, &query.filters())
}

/// POST /entities/{type}
pub async fn create_entity(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(tag): Path<String>,
    Json(body): Json<CreateEntityBody>,
) -> Response {
    let parent = body
        .data
        .relationships
        .as_ref()
        .and_then(|r| r["ancestors"]["data"][0]["id"].as_str())
        .map(str::to_string);

    let mut state = state.write().await;
    let attributes = body.data.attributes;
    match state.create_entity(&tag, attributes.name, attributes.description, parent) {
        Ok(entity) => single(StatusCode::CREATED, entity_record(entity)),
        Err(e) => e.into_response(),
    }
}

/// DELETE /entities/{eid}
pub async fn delete_entity(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(eid): Path<String>,
    Query(query): Query<VersionQuery>,
) -> Response {
    let mut state = state.write().await;

    match state.delete_entity(&eid, query.digest.as_deref()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// PATCH /entities/{eid}/properties
pub async fn patch_entity_properties(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(eid): Path<String>,
    Query(query): Query<VersionQuery>,
    Json(body): Json<PatchEntityBody>,
) -> Response {
    let mut name = None;
    let mut description = None;
    for patch in body.data {
        match patch.attributes.name.as_str() {
            "Name" => name = Some(patch.attributes.value),
            "Description" => description = Some(patch.attributes.value),
            _ => {}
        }
    }

    let mut state = state.write().await;
    match state.update_entity(&eid, query.digest.as_deref(), name, description) {
        Ok(entity) => single(StatusCode::OK, entity_record(entity)),
        Err(e) => e.into_response(),
    }
}
