//! List trait for fetching collections of entities.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::pagination::{fetch_page, Page, Paginator};
use crate::transport::{ApiRequest, Transport};

/// List/filter entities with pagination support.
///
/// Implementors only describe the first request; following pages are
/// reached through the `links.next` URLs the API returns.
///
/// # Example
///
/// ```ignore
/// use notebookapi::{NotebookClient, User, List};
///
/// let client = NotebookClient::from_env()?;
///
/// // Fetch a single page
/// let page = User::list_page(&client, &Default::default()).await?;
///
/// // Walk lazily
/// let mut users = User::list(&client, &Default::default())?;
/// while let Some(user) = users.try_next().await? { /* ... */ }
///
/// // Fetch all pages
/// let all_users = User::list_all(&client, &Default::default()).await?;
/// ```
#[async_trait]
pub trait List: DeserializeOwned + Send + Sized {
    /// Query parameters for filtering.
    type Query: Default + Serialize + Send + Sync;

    /// The request for the first page.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be encoded.
    fn list_request(query: &Self::Query) -> Result<ApiRequest>;

    /// Lazily iterate every matching entity across all pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be encoded. Request errors
    /// surface while iterating.
    fn list<'a>(transport: &'a dyn Transport, query: &Self::Query) -> Result<Paginator<'a, Self>> {
        Ok(Paginator::new(transport, Self::list_request(query)?))
    }

    /// Fetch only the first page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list_page(transport: &dyn Transport, query: &Self::Query) -> Result<Page<Self>> {
        let request = Self::list_request(query)?;
        let page = fetch_page::<Self>(transport, request).await?;
        Ok(page.map(|record| record.attributes))
    }

    /// List all entities matching the query (fetches all pages).
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    async fn list_all(transport: &dyn Transport, query: &Self::Query) -> Result<Vec<Self>> {
        Self::list(transport, query)?.collect_all().await
    }
}
