//! JSON:API envelope types shared by every endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NotebookError, Result};

/// Navigation links attached to a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// One element of an envelope's `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<A> {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub attributes: A,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl<A> Record<A> {
    /// Replace the attributes, keeping the type tag and identifier.
    pub fn map<B, F: FnOnce(A) -> B>(self, f: F) -> Record<B> {
        Record {
            kind: self.kind,
            id: self.id,
            attributes: f(self.attributes),
            relationships: self.relationships,
            meta: self.meta,
        }
    }
}

/// `data` is either a single record or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// Normalize to a list; a single record becomes a one-element page.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// A decoded API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<A> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    pub data: OneOrMany<Record<A>>,
}

impl<A> Envelope<A> {
    /// The `links.next` URL, if the server advertised another page.
    pub fn next_link(&self) -> Option<&str> {
        self.links.as_ref().and_then(|l| l.next.as_deref())
    }

    /// Take the single record of a get/create response.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::InvalidResponse`] unless `data` holds exactly one record.
    pub fn into_single(self) -> Result<Record<A>> {
        match self.data {
            OneOrMany::One(record) => Ok(record),
            OneOrMany::Many(mut records) if records.len() == 1 => Ok(records.remove(0)),
            OneOrMany::Many(records) => Err(NotebookError::InvalidResponse(format!(
                "expected a single record, got {}",
                records.len()
            ))),
        }
    }
}

/// Request body for create/update calls: `{"data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct Document<T> {
    pub data: T,
}

/// A record without an id, as sent when creating.
#[derive(Debug, Clone, Serialize)]
pub struct NewRecord<A> {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: A,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_list_envelope() {
        let envelope: Envelope<Named> = serde_json::from_value(json!({
            "links": {"self": "https://x/entities", "next": "https://x/entities?page[offset]=1"},
            "data": [
                {"type": "entity", "id": "x1", "attributes": {"name": "A"}},
                {"type": "entity", "id": "x2", "attributes": {"name": "B"}, "meta": {"n": 1}}
            ]
        }))
        .unwrap();

        assert_eq!(envelope.next_link(), Some("https://x/entities?page[offset]=1"));
        let records = envelope.data.into_vec();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].attributes.name, "B");
        assert!(records[1].meta.is_some());
    }

    #[test]
    fn test_single_record_envelope() {
        let envelope: Envelope<Named> = serde_json::from_value(json!({
            "data": {"type": "journal", "id": "journal:1", "attributes": {"name": "NB"}}
        }))
        .unwrap();

        assert!(envelope.links.is_none());
        assert!(envelope.next_link().is_none());
        let record = envelope.into_single().unwrap();
        assert_eq!(record.kind, "journal");
        assert_eq!(record.attributes, Named { name: "NB".into() });
    }

    #[test]
    fn test_empty_links_has_no_next() {
        let envelope: Envelope<Named> =
            serde_json::from_value(json!({"links": {}, "data": []})).unwrap();
        assert!(envelope.next_link().is_none());
        assert!(envelope.into_single().is_err());
    }

    #[test]
    fn test_malformed_attributes_rejected() {
        let result: std::result::Result<Envelope<Named>, _> = serde_json::from_value(json!({
            "data": [{"type": "entity", "id": "x1", "attributes": {"title": "no name"}}]
        }));
        assert!(result.is_err());
    }
}
