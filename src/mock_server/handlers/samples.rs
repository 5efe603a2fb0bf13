//! Sample property handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

use super::{not_found, record};
use crate::mock_server::state::MockState;
use crate::{PropertyContent, SampleProperty};

/// `{"data": [{"id": ..., "attributes": {"content": {...}}}]}` request body.
#[derive(Debug, Deserialize)]
pub struct PatchPropertiesBody {
    pub data: Vec<PropertyUpdate>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyUpdate {
    pub id: String,
    pub attributes: PropertyUpdateAttributes,
}

#[derive(Debug, Deserialize)]
pub struct PropertyUpdateAttributes {
    #[serde(default)]
    pub content: PropertyContent,
}

fn properties_document(base_url: &str, eid: &str, properties: &[SampleProperty]) -> Response {
    let data: Vec<Value> = properties
        .iter()
        .map(|p| record("property", &p.id, p))
        .collect();
    let links = json!({
        "self": format!("{base_url}/samples/{}/properties", urlencoding::encode(eid))
    });
    (StatusCode::OK, Json(json!({ "links": links, "data": data }))).into_response()
}

/// GET /samples/{eid}/properties
pub async fn get_sample_properties(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(eid): Path<String>,
) -> Response {
    let state = state.read().await;

    match state.get_properties(&eid) {
        Some(properties) => properties_document(&state.base_url, &eid, properties),
        None => not_found("sample", &eid),
    }
}

/// PATCH /samples/{eid}/properties
pub async fn patch_sample_properties(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(eid): Path<String>,
    Json(body): Json<PatchPropertiesBody>,
) -> Response {
    let changes = body
        .data
        .into_iter()
        .map(|update| (update.id, update.attributes.content))
        .collect();

    let mut state = state.write().await;
    let base_url = state.base_url.clone();
    match state.update_properties(&eid, changes) {
        Ok(properties) => properties_document(&base_url, &eid, properties),
        Err(e) => e.into_response(),
    }
}
