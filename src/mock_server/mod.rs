//! Mock notebook API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the notebook
//! API for integration and end-to-end testing. Unlike wiremock which mocks at
//! the HTTP level per-test, this server maintains state across requests,
//! enabling realistic workflow testing (create, then list, then delete).
//!
//! # Example
//!
//! ```ignore
//! use notebookapi::mock_server::{Fixtures, MockServer};
//! use notebookapi::{Entity, Get, NotebookClient};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = NotebookClient::new("test-key", server.url()).unwrap();
//!
//!     // Server comes with default fixtures
//!     let notebook = Entity::get(&client, Fixtures::eid("journal", 1)).await.unwrap();
//!     assert_eq!(notebook.name(), "Protein Purification");
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures};
pub use server::MockServer;
pub use state::{MockState, StateError};
