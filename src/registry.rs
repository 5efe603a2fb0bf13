//! Type-tag registry for entity decoding.
//!
//! Endpoints such as `entities` and `entities/{eid}/children` return records
//! of mixed types. The registry maps each record's `type` tag to the decoder
//! for the matching [`Entity`] variant. It is built once, on first use.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::envelope::Record;
use crate::error::{NotebookError, Result};
use crate::models::{Entity, Experiment, Notebook, Sample, Table, Text};

/// Turns a raw record into an [`Entity`].
pub type Decoder = fn(Record<Value>) -> Result<Entity>;

static BUILTIN: Lazy<EntityRegistry> = Lazy::new(EntityRegistry::with_builtin_types);

/// Map from `type` tag to decoder.
#[derive(Debug)]
pub struct EntityRegistry {
    decoders: HashMap<&'static str, Decoder>,
}

impl EntityRegistry {
    /// The registry of every entity type this crate models.
    pub fn builtin() -> &'static EntityRegistry {
        &BUILTIN
    }

    fn with_builtin_types() -> Self {
        let mut decoders: HashMap<&'static str, Decoder> = HashMap::new();
        decoders.insert(Notebook::TYPE, |record| {
            Ok(Entity::Notebook(decode_attributes(record)?))
        });
        decoders.insert(Experiment::TYPE, |record| {
            Ok(Entity::Experiment(decode_attributes(record)?))
        });
        decoders.insert(Sample::TYPE, |record| {
            Ok(Entity::Sample(Sample::new(decode_attributes(record)?)))
        });
        decoders.insert(Table::TYPE, |record| {
            Ok(Entity::Table(Table::new(decode_attributes(record)?)))
        });
        decoders.insert(Text::TYPE, |record| Ok(Entity::Text(decode_attributes(record)?)));
        Self { decoders }
    }

    /// Whether `tag` has a dedicated decoder.
    pub fn is_registered(&self, tag: &str) -> bool {
        self.decoders.contains_key(tag)
    }

    /// Registered tags, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decoders.keys().copied()
    }

    /// Decode a record. Unregistered tags become [`Entity::Other`].
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::ParseError`] if the attributes do not fit
    /// the type's shape.
    pub fn decode(&self, record: Record<Value>) -> Result<Entity> {
        match self.decoders.get(record.kind.as_str()) {
            Some(decode) => decode(record),
            None => {
                tracing::debug!(tag = %record.kind, "no decoder registered, using generic entity");
                Ok(Entity::Other(decode_attributes(record)?))
            }
        }
    }
}

/// Deserialize entity attributes, filling `eid` and `type` from the record
/// when the attributes omit them.
fn decode_attributes<T: DeserializeOwned>(record: Record<Value>) -> Result<T> {
    let Record {
        kind,
        id,
        mut attributes,
        ..
    } = record;

    match attributes {
        Value::Object(ref mut map) => {
            map.entry("eid").or_insert(Value::String(id));
            map.entry("type").or_insert(Value::String(kind));
        }
        _ => {
            return Err(NotebookError::InvalidResponse(format!(
                "attributes of {id} are not an object"
            )))
        }
    }

    Ok(serde_json::from_value(attributes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(kind: &str, id: &str, attributes: Value) -> Record<Value> {
        Record {
            kind: kind.to_string(),
            id: id.to_string(),
            attributes,
            relationships: None,
            meta: None,
        }
    }

    #[test]
    fn test_builtin_tags() {
        let registry = EntityRegistry::builtin();
        for tag in ["journal", "experiment", "sample", "grid", "text"] {
            assert!(registry.is_registered(tag), "{tag} should be registered");
        }
        assert_eq!(registry.tags().count(), 5);
    }

    #[test]
    fn test_decode_dispatches_on_tag() {
        let registry = EntityRegistry::builtin();

        let notebook = registry
            .decode(record("journal", "journal:1", json!({"eid": "journal:1", "name": "NB"})))
            .unwrap();
        assert!(matches!(notebook, Entity::Notebook(_)));
        assert_eq!(notebook.name(), "NB");

        let sample = registry
            .decode(record("sample", "sample:9", json!({"name": "S-9"})))
            .unwrap();
        assert!(matches!(sample, Entity::Sample(_)));
        assert_eq!(sample.eid(), "sample:9");
        assert_eq!(sample.entity_type(), "sample");
    }

    #[test]
    fn test_unknown_tag_is_generic() {
        let entity = EntityRegistry::builtin()
            .decode(record("spotfiredxp", "spotfiredxp:1", json!({"name": "Dashboard"})))
            .unwrap();
        match entity {
            Entity::Other(attributes) => {
                assert_eq!(attributes.entity_type, "spotfiredxp");
                assert_eq!(attributes.name, "Dashboard");
            }
            other => panic!("expected generic entity, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_attributes_rejected() {
        let err = EntityRegistry::builtin()
            .decode(record("journal", "journal:1", json!("nope")))
            .unwrap_err();
        assert!(matches!(err, NotebookError::InvalidResponse(_)));
    }
}
