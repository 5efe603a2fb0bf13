//! HTTP request handlers for the mock server.
//!
//! Responses use the same envelope the real API does: `data` holds one
//! record or a list of records, `links.next` is an absolute URL when more
//! pages remain, and failures carry an `errors` list.

pub mod entities;
pub mod samples;
pub mod users;

pub use entities::*;
pub use samples::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::state::StateError;
use crate::DEFAULT_PAGE_LIMIT;

/// Wrap a model as a record body.
///
/// # Panics
///
/// Panics if `attributes` fails to serialize, which no model in this crate does.
pub(crate) fn record<A: Serialize + ?Sized>(kind: &str, id: &str, attributes: &A) -> Value {
    let attributes = serde_json::to_value(attributes).expect("mock record attributes serialize");
    json!({ "type": kind, "id": id, "attributes": attributes })
}

/// One page of `records`, with a `next` link when more remain.
///
/// `base` is the absolute collection URL without query; `extra` carries
/// the filters to repeat on the next link.
pub(crate) fn paged(
    base: &str,
    records: Vec<Value>,
    offset: Option<usize>,
    limit: Option<usize>,
    extra: &[(&str, String)],
) -> Response {
    let offset = offset.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT as usize).max(1);
    let total = records.len();

    let page: Vec<Value> = records.into_iter().skip(offset).take(limit).collect();

    let query = |offset: usize| {
        let mut query = format!("page[offset]={offset}&page[limit]={limit}");
        for (key, value) in extra {
            query.push_str(&format!("&{key}={}", urlencoding::encode(value)));
        }
        query
    };

    let mut links = json!({ "self": format!("{base}?{}", query(offset)) });
    if offset + limit < total {
        links["next"] = json!(format!("{base}?{}", query(offset + limit)));
    }

    (StatusCode::OK, Json(json!({ "links": links, "data": page }))).into_response()
}

/// A single-record document.
pub(crate) fn single(status: StatusCode, record: Value) -> Response {
    (status, Json(json!({ "data": record }))).into_response()
}

/// A JSON:API error document.
pub(crate) fn error(status: StatusCode, code: &str, detail: impl Into<String>) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    (
        status,
        Json(json!({
            "errors": [{
                "status": status.as_u16().to_string(),
                "code": code,
                "title": title,
                "detail": detail.into(),
            }]
        })),
    )
        .into_response()
}

pub(crate) fn not_found(what: &str, id: &str) -> Response {
    error(StatusCode::NOT_FOUND, "not_found", format!("No {what} found with id: {id}"))
}

impl IntoResponse for StateError {
    fn into_response(self) -> Response {
        match self {
            StateError::NotFound(id) => not_found("item", &id),
            StateError::Conflict(detail) => error(StatusCode::CONFLICT, "conflict", detail),
            StateError::ReadOnly(id) => error(
                StatusCode::FORBIDDEN,
                "read_only",
                format!("Property {id} is read-only"),
            ),
        }
    }
}

/// Comma-separated type filter.
pub(crate) fn split_types(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::Fixtures;

    #[test]
    fn test_record_carries_model_attributes() {
        let entity = Fixtures::sample(4, "Lysate A");
        let body = record(&entity.entity_type, &entity.eid, &entity);

        assert_eq!(body["type"], "sample");
        assert_eq!(body["id"], entity.eid.as_str());
        assert!(body["attributes"].is_object());
        assert_eq!(body["attributes"]["eid"], entity.eid.as_str());
        assert_eq!(body["attributes"]["name"], "Lysate A");

        let user = Fixtures::user("101", "Rosalind", "Franklin");
        let body = record("user", &user.user_id, &user);
        assert_eq!(body["attributes"]["userName"], user.user_name.as_str());
    }
}
