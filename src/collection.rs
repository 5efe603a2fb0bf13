//! Lazily loaded collections with positional and keyed access.
//!
//! Sample properties, table rows, table columns and similar child lists are
//! fetched in full on first use and cached until explicitly reloaded or
//! invalidated. The cache is an `Option` inside [`CachedCollection`]; every
//! accessor goes through [`CachedCollection::ensure_loaded`].

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::Record;
use crate::error::{NotebookError, Result};
use crate::pagination::Paginator;
use crate::transport::{ApiRequest, Transport};

/// Identifier of an item inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Uuid(Uuid),
    Raw(String),
}

impl ItemKey {
    /// Structured when the text is a UUID, raw otherwise.
    pub fn parse(text: &str) -> Self {
        match Uuid::parse_str(text) {
            Ok(uuid) => ItemKey::Uuid(uuid),
            Err(_) => ItemKey::Raw(text.to_string()),
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            ItemKey::Uuid(uuid) => Some(uuid),
            ItemKey::Raw(_) => None,
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Uuid(uuid) => write!(f, "{uuid}"),
            ItemKey::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<Uuid> for ItemKey {
    fn from(uuid: Uuid) -> Self {
        ItemKey::Uuid(uuid)
    }
}

/// An element that can live in a [`CachedCollection`].
pub trait CollectionItem: DeserializeOwned + Send {
    /// The identifier this item is indexed under.
    fn key(&self) -> ItemKey;

    /// Build the item from its wire record.
    ///
    /// The default keeps the attributes and drops the envelope; override it
    /// when the identifier only travels in the record's `id`.
    fn from_record(record: Record<Self>) -> Self {
        record.attributes
    }
}

/// A loaded snapshot: the ordered items plus an index by key.
#[derive(Debug, Clone)]
pub struct Cache<T> {
    items: Vec<T>,
    index: HashMap<ItemKey, usize>,
}

impl<T: CollectionItem> Cache<T> {
    /// Index `items` by key.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::InvalidResponse`] if two items share a key.
    pub fn build(items: Vec<T>) -> Result<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let key = item.key();
            if index.insert(key.clone(), position).is_some() {
                return Err(NotebookError::InvalidResponse(format!(
                    "duplicate item key '{key}' in collection"
                )));
            }
        }
        Ok(Self { items, index })
    }
}

impl<T> Cache<T> {
    /// Items in server order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the last load returned no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in server order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// The item at `index`, if in range.
    pub fn position(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// The item stored under exactly `key`.
    pub fn get(&self, key: &ItemKey) -> Option<&T> {
        self.index.get(key).map(|&position| &self.items[position])
    }

    /// Look up by text: first as a UUID, then as the raw string.
    pub fn lookup(&self, key: &str) -> Option<&T> {
        Uuid::parse_str(key)
            .ok()
            .and_then(|uuid| self.index.get(&ItemKey::Uuid(uuid)))
            .or_else(|| self.index.get(&ItemKey::Raw(key.to_string())))
            .map(|&position| &self.items[position])
    }

    /// Number of distinct keys; equals [`Cache::len`].
    pub fn key_count(&self) -> usize {
        self.index.len()
    }
}

impl<'a, T> IntoIterator for &'a Cache<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A child collection fetched on first access and cached afterwards.
#[derive(Debug, Clone)]
pub struct CachedCollection<T> {
    request: ApiRequest,
    cache: Option<Cache<T>>,
}

impl<T: CollectionItem> CachedCollection<T> {
    /// An empty collection backed by `request`. Nothing is fetched yet.
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            cache: None,
        }
    }

    /// The request used for every reload.
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.is_some()
    }

    /// The current snapshot, without fetching.
    pub fn cached(&self) -> Option<&Cache<T>> {
        self.cache.as_ref()
    }

    /// Drop the snapshot; the next access reloads.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Fetch every page and replace the snapshot.
    ///
    /// The previous snapshot is only replaced once the whole fetch
    /// succeeded; on error it is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the first transport or decode error, or
    /// [`NotebookError::InvalidResponse`] on duplicate keys.
    #[tracing::instrument(skip(self, transport), fields(path = %self.request.path))]
    pub async fn reload(&mut self, transport: &dyn Transport) -> Result<&Cache<T>> {
        let records = Paginator::<T>::new(transport, self.request.clone())
            .collect_records()
            .await?;
        let cache = Cache::build(records.into_iter().map(T::from_record).collect())?;
        tracing::debug!(items = cache.len(), "collection reloaded");
        Ok(&*self.cache.insert(cache))
    }

    /// Reload only if nothing is cached yet.
    ///
    /// # Errors
    ///
    /// See [`CachedCollection::reload`].
    pub async fn ensure_loaded(&mut self, transport: &dyn Transport) -> Result<&Cache<T>> {
        match self.cache {
            Some(ref cache) => Ok(cache),
            None => self.reload(transport).await,
        }
    }

    /// The item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::IndexOutOfRange`] if the loaded collection is
    /// shorter, or any error from the implicit reload.
    pub async fn get_by_position(&mut self, transport: &dyn Transport, index: usize) -> Result<&T> {
        let cache = self.ensure_loaded(transport).await?;
        cache.position(index).ok_or(NotebookError::IndexOutOfRange {
            index,
            len: cache.len(),
        })
    }

    /// The item whose key matches `key` (UUID first, then raw text).
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::KeyNotFound`] if no item matches, or any
    /// error from the implicit reload.
    pub async fn get_by_key(&mut self, transport: &dyn Transport, key: &str) -> Result<&T> {
        let cache = self.ensure_loaded(transport).await?;
        cache.lookup(key).ok_or_else(|| NotebookError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Iterate the cached items, loading them first if needed.
    ///
    /// # Errors
    ///
    /// See [`CachedCollection::reload`].
    pub async fn iter(&mut self, transport: &dyn Transport) -> Result<std::slice::Iter<'_, T>> {
        Ok(self.ensure_loaded(transport).await?.iter())
    }

    /// Number of items, loading them first if needed.
    ///
    /// # Errors
    ///
    /// See [`CachedCollection::reload`].
    pub async fn len(&mut self, transport: &dyn Transport) -> Result<usize> {
        Ok(self.ensure_loaded(transport).await?.len())
    }
}
