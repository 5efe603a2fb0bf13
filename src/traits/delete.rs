//! Delete trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::transport::Transport;

/// Remove an entity.
#[async_trait]
pub trait Delete {
    type Id;

    /// # Errors
    ///
    /// Returns an error if the entity is not found or the request fails.
    async fn delete(transport: &dyn Transport, id: Self::Id) -> Result<()>;
}
