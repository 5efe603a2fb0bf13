//! Create trait for new entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::transport::Transport;

/// Create a new entity on the server.
#[async_trait]
pub trait Create: Sized {
    /// What the caller supplies.
    type Params;

    /// Create the entity and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected.
    async fn create(transport: &dyn Transport, params: Self::Params) -> Result<Self>;
}
