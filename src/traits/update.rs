//! Update trait for modifying entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::transport::Transport;

/// Update an existing entity.
///
/// # Example
///
/// ```ignore
/// use notebookapi::{NotebookClient, Notebook, Update, EntityUpdateParams};
///
/// let client = NotebookClient::from_env()?;
/// let updated = Notebook::update(
///     &client,
///     "journal:0b6e4ef8-8b3a-4bd6-a8be-9fd7d5b8b1c2".to_string(),
///     EntityUpdateParams {
///         name: Some("Renamed".to_string()),
///         ..Default::default()
///     },
/// ).await?;
/// ```
#[async_trait]
pub trait Update: Sized {
    /// The ID type for this entity.
    type Id;

    /// Parameters for the update.
    type Params;

    /// Update the entity and return the updated version.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found or the request fails.
    async fn update(transport: &dyn Transport, id: Self::Id, params: Self::Params) -> Result<Self>;
}
