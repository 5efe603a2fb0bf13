//! Mock notebook API server.
//!
//! Provides an axum-based HTTP server that simulates the notebook API.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers;
use super::state::MockState;

/// A mock notebook API server for testing.
///
/// The server runs in the background and can be used to test the client
/// against a realistic API implementation.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a mock server with empty state.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_state(mut state: MockState) -> Self {
        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");
        let url = format!("http://{}", addr);

        // `next` links are absolute, so the state has to know where it lives
        state.base_url = url.clone();
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Server error");
        });

        Self {
            url,
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Use this URL when creating a `NotebookClient` for testing.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the default state with common test fixtures.
    fn default_state() -> MockState {
        let scenario = Fixtures::default_scenario();
        Self::state_from_scenario(scenario)
    }

    /// Create state from a scenario.
    fn state_from_scenario(scenario: DefaultScenario) -> MockState {
        let mut state = MockState::new();

        for (entity, parent) in scenario.entities {
            state = match parent {
                Some(parent) => state.with_child(&parent, entity),
                None => state.with_entity(entity),
            };
        }

        for (sample_eid, properties) in scenario.properties {
            state.properties.insert(sample_eid, properties);
        }

        state.users = scenario.users;
        state.current_user = scenario.current_user;
        state
    }

    /// Create the axum router with all routes.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        let api = Router::new()
            // Entity routes
            .route("/entities", get(handlers::list_entities))
            .route(
                "/entities/:id",
                get(handlers::get_entity)
                    .post(handlers::create_entity)
                    .delete(handlers::delete_entity),
            )
            .route("/entities/:id/children", get(handlers::list_children))
            .route(
                "/entities/:id/properties",
                axum::routing::patch(handlers::patch_entity_properties),
            )
            // Sample routes
            .route(
                "/samples/:id/properties",
                get(handlers::get_sample_properties).patch(handlers::patch_sample_properties),
            )
            // User routes
            .route("/users", get(handlers::list_users))
            .route("/users/me", get(handlers::get_current_user))
            .route("/users/:id", get(handlers::get_user))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

        Router::new()
            .merge(api)
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Reject requests without the configured `x-api-key`.
async fn require_api_key(
    State(state): State<Arc<RwLock<MockState>>>,
    request: Request,
    next: Next,
) -> Response {
    let required = state.read().await.required_token.clone();
    if let Some(token) = required {
        let sent = request
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        if sent != Some(token.as_str()) {
            return handlers::error(StatusCode::UNAUTHORIZED, "unauthorized", "Invalid API key");
        }
    }
    next.run(request).await
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Entity, EntityListQuery, Get, NotebookClient, NotebookError, User};

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        // Server should be accessible
        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_entity_with_client() {
        let server = MockServer::start().await;
        let client = NotebookClient::new("test-key", server.url()).unwrap();

        let entity = Entity::get(&client, Fixtures::eid("journal", 1))
            .await
            .expect("Failed to get entity");

        assert!(matches!(entity, Entity::Notebook(_)));
        assert_eq!(entity.name(), "Protein Purification");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_next_links_are_followed() {
        let server = MockServer::start().await;
        let client = NotebookClient::new("test-key", server.url()).unwrap();

        let query = EntityListQuery {
            page: crate::PageParams::window(0, 2),
            ..Default::default()
        };
        let mut entities = Entity::list(&client, &query).unwrap();
        let mut count = 0;
        while entities.try_next().await.unwrap().is_some() {
            count += 1;
        }

        assert_eq!(count, 5);
        assert_eq!(entities.requests_issued(), 3);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_server() {
        let server = MockServer::start_empty().await;
        let client = NotebookClient::new("test-key", server.url()).unwrap();

        let result = Entity::get(&client, "journal:missing".to_string()).await;

        assert_eq!(result.unwrap_err().api_code(), Some("not_found"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_required_token() {
        let state = MockState::new()
            .with_user(Fixtures::user("1", "Ada", "Lovelace"))
            .with_current_user("1")
            .with_required_token("secret");
        let server = MockServer::with_state(state).await;

        let wrong = NotebookClient::new("nope", server.url()).unwrap();
        let err = User::me(&wrong).await.unwrap_err();
        assert!(matches!(
            err,
            NotebookError::ApiError {
                status_code: Some(401),
                ..
            }
        ));

        let right = NotebookClient::new("secret", server.url()).unwrap();
        let me = User::me(&right).await.unwrap();
        assert_eq!(me.full_name(), "Ada Lovelace");

        server.shutdown().await;
    }
}
