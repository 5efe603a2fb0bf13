//! Samples and their properties.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::{CachedCollection, CollectionItem, ItemKey};
use crate::envelope::{Document, Record};
use crate::error::{NotebookError, Result};
use crate::models::entity::{fetch_entity, Entity, EntityAttributes};
use crate::traits::Get;
use crate::transport::{ApiPath, ApiRequest, Transport};

/// A sample entity.
///
/// Properties are fetched from `samples/{eid}/properties` the first time
/// they are needed and cached on the sample.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    #[serde(flatten)]
    pub attributes: EntityAttributes,
    #[serde(skip)]
    properties: CachedCollection<SampleProperty>,
}

impl Sample {
    pub const TYPE: &'static str = "sample";

    /// Wrap decoded attributes. Properties start unloaded.
    pub fn new(attributes: EntityAttributes) -> Self {
        let properties = CachedCollection::new(properties_request(&attributes.eid));
        Self {
            attributes,
            properties,
        }
    }

    pub fn eid(&self) -> &str {
        &self.attributes.eid
    }

    /// The property collection, for direct positional/keyed access.
    pub fn properties(&mut self) -> &mut CachedCollection<SampleProperty> {
        &mut self.properties
    }

    /// One property by id (a UUID or a raw id such as `"digest"`).
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::KeyNotFound`] if the sample has no such
    /// property, or the error of the implicit load.
    pub async fn property(&mut self, transport: &dyn Transport, key: &str) -> Result<&SampleProperty> {
        self.properties.get_by_key(transport, key).await
    }

    /// Find a property by its display name.
    ///
    /// # Errors
    ///
    /// Returns [`NotebookError::KeyNotFound`] if no property has that name.
    pub async fn property_named(
        &mut self,
        transport: &dyn Transport,
        name: &str,
    ) -> Result<&SampleProperty> {
        self.properties
            .iter(transport)
            .await?
            .find(|p| p.name == name)
            .ok_or_else(|| NotebookError::KeyNotFound {
                key: name.to_string(),
            })
    }

    /// Write new property values, then drop the cached properties so the
    /// next access sees the server's state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. The cache is left untouched
    /// in that case.
    #[tracing::instrument(skip(self, transport, changes), fields(eid = %self.attributes.eid, count = changes.len()))]
    pub async fn update_properties(
        &mut self,
        transport: &dyn Transport,
        changes: &[PropertyChange],
    ) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let data: Vec<Value> = changes.iter().map(PropertyChange::to_record).collect();
        let request = ApiRequest::patch(ApiPath::segments("samples", [self.eid(), "properties"]))
            .with_param("force", true)
            .with_json(&Document { data })?;
        transport.call(request).await?;

        self.properties.invalidate();
        Ok(())
    }
}

fn properties_request(eid: &str) -> ApiRequest {
    ApiRequest::get(ApiPath::segments("samples", [eid, "properties"]))
}

/// One property of a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleProperty {
    /// UUID for template-defined properties, a plain id for built-ins.
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub content: PropertyContent,

    #[serde(default)]
    pub read_only: bool,
}

impl SampleProperty {
    pub fn value(&self) -> Option<&Value> {
        self.content.value.as_ref()
    }

    /// Value rendered for display, with units when present.
    pub fn display_value(&self) -> String {
        let value = match &self.content.value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        match &self.content.units {
            Some(units) if !value.is_empty() => format!("{value} {units}"),
            _ => value,
        }
    }
}

impl CollectionItem for SampleProperty {
    fn key(&self) -> ItemKey {
        ItemKey::parse(&self.id)
    }

    fn from_record(record: Record<Self>) -> Self {
        let mut property = record.attributes;
        if property.id.is_empty() {
            property.id = record.id;
        }
        property
    }
}

/// Value payload of a sample property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

/// A new value for one property.
#[derive(Debug, Clone)]
pub struct PropertyChange {
    pub id: String,
    pub value: Value,
    pub units: Option<String>,
}

impl PropertyChange {
    pub fn new(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            units: None,
        }
    }

    fn to_record(&self) -> Value {
        let content = PropertyContent {
            value: Some(self.value.clone()),
            units: self.units.clone(),
        };
        serde_json::json!({
            "id": self.id,
            "type": "property",
            "attributes": { "content": content }
        })
    }
}

#[async_trait]
impl Get for Sample {
    type Id = String; // eid

    #[tracing::instrument(skip(transport))]
    async fn get(transport: &dyn Transport, eid: String) -> Result<Self> {
        match fetch_entity(transport, &eid).await? {
            Entity::Sample(sample) => Ok(sample),
            other => Err(NotebookError::InvalidResponse(format!(
                "{} is a '{}', expected '{}'",
                other.eid(),
                other.entity_type(),
                Sample::TYPE
            ))),
        }
    }
}
