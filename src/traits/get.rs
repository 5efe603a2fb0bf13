//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::transport::Transport;

/// Fetch a single entity by ID.
///
/// Implement this trait for entity types that can be fetched individually
/// by a unique identifier (an entity `eid`, a user id, ...).
///
/// # Example
///
/// ```ignore
/// use notebookapi::{NotebookClient, Notebook, Get};
///
/// let client = NotebookClient::from_env()?;
/// let notebook = Notebook::get(&client, "journal:0b6e4ef8-8b3a-4bd6-a8be-9fd7d5b8b1c2".to_string()).await?;
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The ID type for this entity.
    type Id;

    /// Fetch the entity by ID.
    ///
    /// # Arguments
    ///
    /// * `transport` - The API transport (usually a `NotebookClient`)
    /// * `id` - The entity identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found or the request fails.
    async fn get(transport: &dyn Transport, id: Self::Id) -> Result<Self>;
}
