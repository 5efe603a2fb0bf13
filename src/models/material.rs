//! Materials and material libraries.
//!
//! Materials live under their own `materials` namespace rather than the
//! generic `entities` endpoints.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::Envelope;
use crate::error::Result;
use crate::pagination::{PageParams, Paginator};
use crate::traits::{Get, List};
use crate::transport::{ApiPath, ApiRequest, Transport};

/// A material (asset or batch) in a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub eid: String,

    #[serde(default)]
    pub name: String,

    /// "asset" or "batch".
    #[serde(rename = "type", default)]
    pub material_type: Option<String>,

    /// Name of the library the material belongs to.
    #[serde(default)]
    pub library: Option<String>,

    #[serde(default)]
    pub digest: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl Material {
    /// Lazily list the assets of a library.
    pub fn list_in_library<'a>(transport: &'a dyn Transport, library: &str) -> Paginator<'a, Material> {
        let request = ApiRequest::get(ApiPath::segments("materials", [library, "assets"]));
        Paginator::new(transport, request)
    }

    /// A field value by field name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A material library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLibrary {
    pub eid: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl Get for Material {
    type Id = String; // eid

    #[tracing::instrument(skip(transport))]
    async fn get(transport: &dyn Transport, eid: String) -> Result<Self> {
        let request = ApiRequest::get(ApiPath::segments("materials", [eid.as_str()]));
        let response = transport.call(request).await?;
        let envelope: Envelope<Material> = response.json()?;
        Ok(envelope.into_single()?.attributes)
    }
}

#[async_trait]
impl List for MaterialLibrary {
    type Query = PageParams;

    fn list_request(query: &Self::Query) -> Result<ApiRequest> {
        ApiRequest::get("materials/libraries").with_query(query)
    }
}
