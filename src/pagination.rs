//! Pagination over `links.next`-chained API responses.
//!
//! [`Paginator`] turns a chain of pages into one lazy sequence of items.
//! A page is requested only when the caller asks for an item and the
//! previous page is used up, so stopping early issues no further requests.

use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::envelope::{Envelope, Links, Record};
use crate::error::Result;
use crate::transport::{ApiPath, ApiRequest, Transport};

/// Default page size for list operations.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// A single page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// The links advertised with this page.
    pub links: Links,
    /// Whether the server advertised another page.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a page from items and the links that came with them.
    #[must_use]
    pub fn new(items: Vec<T>, links: Links) -> Self {
        let has_more = links.next.is_some();
        Self {
            items,
            links,
            has_more,
        }
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            links: self.links,
            has_more: self.has_more,
        }
    }

    /// Request for the following page, if any.
    pub fn next_request(&self) -> Option<ApiRequest> {
        self.links.next.as_ref().map(|next| follow(next))
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<A> From<Envelope<A>> for Page<Record<A>> {
    fn from(envelope: Envelope<A>) -> Self {
        Page::new(envelope.data.into_vec(), envelope.links.unwrap_or_default())
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Offset/limit query parameters understood by list endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageParams {
    /// Index of the first item to return.
    #[serde(rename = "page[offset]", skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Maximum number of items per page.
    #[serde(rename = "page[limit]", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PageParams {
    /// Params for a page of `limit` items starting at `offset`.
    #[must_use]
    pub fn window(offset: u32, limit: u32) -> Self {
        Self {
            offset: Some(offset),
            limit: Some(limit),
        }
    }
}

/// Follow-up read for a `next` link: the URL is already complete, so no
/// query parameters are added.
fn follow(next: &str) -> ApiRequest {
    ApiRequest::get(ApiPath::Absolute(next.to_string()))
}

/// Fetch one page.
pub(crate) async fn fetch_page<A: DeserializeOwned>(
    transport: &dyn Transport,
    request: ApiRequest,
) -> Result<Page<Record<A>>> {
    let response = transport.call(request).await?;
    let envelope: Envelope<A> = response.json()?;
    Ok(Page::from(envelope))
}

/// Lazy sequence of items across all pages of a collection.
///
/// Not restartable: once drained (or after an error) it yields `None`
/// forever. Start a new paginator to iterate again.
///
/// # Example
///
/// ```no_run
/// use notebookapi::{ApiRequest, NotebookClient, Paginator, User};
///
/// # async fn example() -> notebookapi::Result<()> {
/// let client = NotebookClient::from_env()?;
/// let mut users: Paginator<'_, User> = Paginator::new(&client, ApiRequest::get("users"));
/// while let Some(user) = users.try_next().await? {
///     println!("{}", user.user_name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Paginator<'a, A> {
    transport: &'a dyn Transport,
    pending: Option<ApiRequest>,
    buffer: VecDeque<Record<A>>,
    requests_issued: usize,
}

impl<A> std::fmt::Debug for Paginator<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("pending", &self.pending.as_ref().map(|r| r.path.render()))
            .field("buffered", &self.buffer.len())
            .field("requests_issued", &self.requests_issued)
            .finish()
    }
}

impl<'a, A: DeserializeOwned> Paginator<'a, A> {
    /// Prepare a paginator. No request is made until the first item is pulled.
    pub fn new(transport: &'a dyn Transport, request: ApiRequest) -> Self {
        Self {
            transport,
            pending: Some(request),
            buffer: VecDeque::new(),
            requests_issued: 0,
        }
    }

    /// Number of page requests made so far.
    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    /// Whether the sequence is finished.
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_empty() && self.pending.is_none()
    }

    /// Pull the next full record, fetching the next page when needed.
    ///
    /// # Errors
    ///
    /// Returns the transport or decode error of the page that was being
    /// fetched. The paginator is exhausted afterwards.
    pub async fn next_record(&mut self) -> Result<Option<Record<A>>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(Some(record));
            }

            let Some(request) = self.pending.take() else {
                return Ok(None);
            };

            self.requests_issued += 1;
            let page = fetch_page::<A>(self.transport, request).await?;
            tracing::debug!(
                page = self.requests_issued,
                items = page.len(),
                has_more = page.has_more,
                "fetched page"
            );

            self.pending = page.next_request();
            self.buffer.extend(page.items);
        }
    }

    /// Pull the next decoded attributes payload.
    ///
    /// # Errors
    ///
    /// See [`Paginator::next_record`].
    pub async fn try_next(&mut self) -> Result<Option<A>> {
        Ok(self.next_record().await?.map(|record| record.attributes))
    }

    /// Drain the remaining records.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; nothing is returned partially.
    pub async fn collect_records(mut self) -> Result<Vec<Record<A>>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Drain the remaining attribute payloads.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; nothing is returned partially.
    pub async fn collect_all(mut self) -> Result<Vec<A>> {
        let mut items = Vec::new();
        while let Some(item) = self.try_next().await? {
            items.push(item);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotebookError;
    use crate::test_support::{error_response, json_response, ScriptedTransport};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    fn named(name: &str) -> Named {
        Named {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_two_pages_follow_next_verbatim() {
        let transport = ScriptedTransport::new(vec![
            json_response(json!({
                "links": {"next": "U2"},
                "data": [{"id": "x1", "type": "entity", "attributes": {"name": "A"}}]
            })),
            json_response(json!({
                "links": {},
                "data": [{"id": "x2", "type": "entity", "attributes": {"name": "B"}}]
            })),
        ]);

        let paginator: Paginator<'_, Named> =
            Paginator::new(&transport, ApiRequest::get("entities").with_param("page[limit]", 1));
        let items = paginator.collect_all().await.unwrap();

        assert_eq!(items, vec![named("A"), named("B")]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].path, ApiPath::Absolute("U2".to_string()));
        assert!(requests[1].params.is_empty());
        assert_eq!(requests[0].param("page[limit]"), Some("1"));
    }

    #[tokio::test]
    async fn test_n_pages_issue_n_requests() {
        let pages = 5;
        let mut script = Vec::new();
        for n in 0..pages {
            let links = if n + 1 < pages {
                json!({"next": format!("https://eln/entities?page[offset]={}", (n + 1) * 2)})
            } else {
                json!({})
            };
            script.push(json_response(json!({
                "links": links,
                "data": [
                    {"id": format!("a{n}"), "type": "entity", "attributes": {"name": format!("{n}-0")}},
                    {"id": format!("b{n}"), "type": "entity", "attributes": {"name": format!("{n}-1")}}
                ]
            })));
        }
        let transport = ScriptedTransport::new(script);

        let mut paginator: Paginator<'_, Named> =
            Paginator::new(&transport, ApiRequest::get("entities"));
        let mut names = Vec::new();
        while let Some(item) = paginator.try_next().await.unwrap() {
            names.push(item.name);
        }

        let expected: Vec<String> = (0..pages)
            .flat_map(|n| [format!("{n}-0"), format!("{n}-1")])
            .collect();
        assert_eq!(names, expected);
        assert_eq!(paginator.requests_issued(), pages);
        assert_eq!(transport.request_count(), pages);
    }

    #[tokio::test]
    async fn test_single_record_is_one_item() {
        let transport = ScriptedTransport::new(vec![json_response(json!({
            "data": {"id": "x1", "type": "entity", "attributes": {"name": "only"}}
        }))]);

        let items: Vec<Named> = Paginator::new(&transport, ApiRequest::get("entities/x1"))
            .collect_all()
            .await
            .unwrap();

        assert_eq!(items, vec![named("only")]);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_is_lazy() {
        let transport = ScriptedTransport::new(vec![json_response(json!({
            "links": {"next": "U2"},
            "data": [{"id": "x1", "type": "entity", "attributes": {"name": "A"}}]
        }))]);

        let mut paginator: Paginator<'_, Named> =
            Paginator::new(&transport, ApiRequest::get("entities"));
        assert_eq!(transport.request_count(), 0);

        let first = paginator.try_next().await.unwrap();
        assert_eq!(first, Some(named("A")));
        // Stopping here never asks for U2.
        assert_eq!(transport.request_count(), 1);
        assert!(!paginator.is_exhausted());
    }

    #[tokio::test]
    async fn test_error_surfaces_at_consumption_and_fuses() {
        let transport = ScriptedTransport::new(vec![
            json_response(json!({
                "links": {"next": "U2"},
                "data": [{"id": "x1", "type": "entity", "attributes": {"name": "A"}}]
            })),
            error_response(
                404,
                json!({"errors": [{"status": "404", "code": "not_found", "title": "t", "detail": "d"}]}),
            ),
        ]);

        let mut paginator: Paginator<'_, Named> =
            Paginator::new(&transport, ApiRequest::get("entities"));

        assert_eq!(paginator.try_next().await.unwrap(), Some(named("A")));
        let err = paginator.try_next().await.unwrap_err();
        assert_eq!(err.api_status(), Some("404"));
        assert_eq!(err.api_code(), Some("not_found"));

        assert!(paginator.try_next().await.unwrap().is_none());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_page_fails_fast() {
        let transport = ScriptedTransport::new(vec![json_response(json!({
            "data": [{"id": "x1", "type": "entity", "attributes": {"title": "wrong shape"}}]
        }))]);

        let result: Result<Vec<Named>> = Paginator::new(&transport, ApiRequest::get("entities"))
            .collect_all()
            .await;

        assert!(matches!(result, Err(NotebookError::ParseError(_))));
    }

    #[test]
    fn test_page_has_more_follows_next_link() {
        let page: Page<i32> = Page::new(
            vec![1, 2],
            Links {
                next: Some("https://eln/entities?page[offset]=2".into()),
                ..Default::default()
            },
        );
        assert!(page.has_more);
        let next = page.next_request().unwrap();
        assert!(next.path.is_absolute());

        let last: Page<i32> = Page::new(vec![3], Links::default());
        assert!(!last.has_more);
        assert!(last.next_request().is_none());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], Links::default());
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert!(!mapped.has_more);
    }

    #[test]
    fn test_page_params_serialize() {
        let params = serde_qs::to_string(&PageParams::window(40, 20)).unwrap();
        assert!(params.contains("offset"));
        assert!(params.contains("limit"));
    }
}
