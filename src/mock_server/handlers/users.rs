//! User endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{not_found, paged, record, single};
use crate::mock_server::state::MockState;
use crate::User;

/// Query parameters for listing users.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(rename = "page[offset]")]
    pub offset: Option<usize>,
    #[serde(rename = "page[limit]")]
    pub limit: Option<usize>,
    pub q: Option<String>,
    pub enabled: Option<bool>,
}

fn user_record(user: &User) -> Value {
    record("user", &user.user_id, user)
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<RwLock<MockState>>>,
    Query(query): Query<ListUsersQuery>,
) -> Response {
    let state = state.read().await;

    let records = state
        .list_users(query.q.as_deref(), query.enabled)
        .into_iter()
        .map(user_record)
        .collect();

    let mut extra = Vec::new();
    if let Some(ref q) = query.q {
        extra.push(("q", q.clone()));
    }
    if let Some(enabled) = query.enabled {
        extra.push(("enabled", enabled.to_string()));
    }

    let base = format!("{}/users", state.base_url);
    paged(&base, records, query.offset, query.limit, &extra)
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(user_id): Path<String>,
) -> Response {
    let state = state.read().await;

    match state.get_user(&user_id) {
        Some(user) => single(StatusCode::OK, user_record(user)),
        None => not_found("user", &user_id),
    }
}

/// GET /users/me
pub async fn get_current_user(State(state): State<Arc<RwLock<MockState>>>) -> Response {
    let state = state.read().await;

    match state.current_user() {
        Some(user) => single(StatusCode::OK, user_record(user)),
        None => not_found("user", "me"),
    }
}
