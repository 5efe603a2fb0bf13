//! Notebooks, experiments and text entities.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::envelope::{Document, Envelope, NewRecord};
use crate::error::{NotebookError, Result};
use crate::models::entity::{
    children_request, fetch_entity, patch_properties, Entity, EntityAttributes, EntityListQuery,
    EntityPaginator, EntityUpdateParams,
};
use crate::registry::EntityRegistry;
use crate::traits::{Create, Get, Update};
use crate::transport::{ApiPath, ApiRequest, Transport};

/// A notebook (the API calls it a *journal*).
///
/// Notebooks are the top-level containers; experiments live inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(flatten)]
    pub attributes: EntityAttributes,
}

impl Notebook {
    pub const TYPE: &'static str = "journal";

    pub fn eid(&self) -> &str {
        &self.attributes.eid
    }

    /// Lazily list the experiments in this notebook.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be encoded.
    pub fn experiments<'a>(&self, transport: &'a dyn Transport) -> Result<ExperimentPaginator<'a>> {
        let request = children_request(self.eid(), &EntityListQuery::of_type(Experiment::TYPE))?;
        Ok(ExperimentPaginator {
            inner: EntityPaginator::new(transport, request),
        })
    }
}

/// Lazy sequence of the experiments in a notebook.
///
/// Records go through the [`EntityRegistry`] like any other entity listing;
/// children of other types are skipped.
#[derive(Debug)]
pub struct ExperimentPaginator<'a> {
    inner: EntityPaginator<'a>,
}

impl ExperimentPaginator<'_> {
    /// Pull the next experiment.
    ///
    /// # Errors
    ///
    /// See [`EntityPaginator::try_next`].
    pub async fn try_next(&mut self) -> Result<Option<Experiment>> {
        while let Some(entity) = self.inner.try_next().await? {
            match entity {
                Entity::Experiment(experiment) => return Ok(Some(experiment)),
                other => {
                    tracing::debug!(
                        eid = other.eid(),
                        tag = other.entity_type(),
                        "skipping non-experiment child"
                    );
                }
            }
        }
        Ok(None)
    }

    pub fn requests_issued(&self) -> usize {
        self.inner.requests_issued()
    }

    /// Drain the remaining experiments.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub async fn collect_all(mut self) -> Result<Vec<Experiment>> {
        let mut experiments = Vec::new();
        while let Some(experiment) = self.try_next().await? {
            experiments.push(experiment);
        }
        Ok(experiments)
    }
}

/// An experiment inside a notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    #[serde(flatten)]
    pub attributes: EntityAttributes,
}

impl Experiment {
    pub const TYPE: &'static str = "experiment";

    pub fn eid(&self) -> &str {
        &self.attributes.eid
    }

    /// Lazily list everything directly inside this experiment.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be encoded.
    pub fn children<'a>(
        &self,
        transport: &'a dyn Transport,
        query: &EntityListQuery,
    ) -> Result<EntityPaginator<'a>> {
        Entity::children(transport, self.eid(), query)
    }
}

/// A rich-text block inside an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    #[serde(flatten)]
    pub attributes: EntityAttributes,
}

impl Text {
    pub const TYPE: &'static str = "text";
}

/// Parameters for creating a notebook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotebookCreateParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameters for creating an experiment inside a notebook.
#[derive(Debug, Clone, Default)]
pub struct ExperimentCreateParams {
    pub notebook_eid: String,
    pub name: String,
    pub description: Option<String>,
}

/// POST `entities/{tag}` and decode the created record.
async fn create_entity(
    transport: &dyn Transport,
    tag: &str,
    attributes: Value,
    relationships: Option<Value>,
) -> Result<Entity> {
    let body = Document {
        data: NewRecord {
            kind: tag.to_string(),
            attributes,
            relationships,
        },
    };
    let request = ApiRequest::post(ApiPath::segments("entities", [tag])).with_json(&body)?;
    let response = transport.call(request).await?;
    let envelope: Envelope<Value> = response.json()?;
    EntityRegistry::builtin().decode(envelope.into_single()?)
}

fn unexpected(entity: Entity, wanted: &str) -> NotebookError {
    NotebookError::InvalidResponse(format!(
        "{} is a '{}', expected '{wanted}'",
        entity.eid(),
        entity.entity_type()
    ))
}

#[async_trait]
impl Get for Notebook {
    type Id = String; // eid

    #[tracing::instrument(skip(transport))]
    async fn get(transport: &dyn Transport, eid: String) -> Result<Self> {
        match fetch_entity(transport, &eid).await? {
            Entity::Notebook(notebook) => Ok(notebook),
            other => Err(unexpected(other, Notebook::TYPE)),
        }
    }
}

#[async_trait]
impl Create for Notebook {
    type Params = NotebookCreateParams;

    #[tracing::instrument(skip(transport))]
    async fn create(transport: &dyn Transport, params: Self::Params) -> Result<Self> {
        let attributes = serde_json::to_value(&params)?;
        match create_entity(transport, Notebook::TYPE, attributes, None).await? {
            Entity::Notebook(notebook) => Ok(notebook),
            other => Err(unexpected(other, Notebook::TYPE)),
        }
    }
}

#[async_trait]
impl Update for Notebook {
    type Id = String; // eid
    type Params = EntityUpdateParams;

    #[tracing::instrument(skip(transport))]
    async fn update(transport: &dyn Transport, eid: String, params: Self::Params) -> Result<Self> {
        patch_properties(transport, &eid, &params).await?;
        Notebook::get(transport, eid).await
    }
}

#[async_trait]
impl Get for Experiment {
    type Id = String; // eid

    #[tracing::instrument(skip(transport))]
    async fn get(transport: &dyn Transport, eid: String) -> Result<Self> {
        match fetch_entity(transport, &eid).await? {
            Entity::Experiment(experiment) => Ok(experiment),
            other => Err(unexpected(other, Experiment::TYPE)),
        }
    }
}

#[async_trait]
impl Create for Experiment {
    type Params = ExperimentCreateParams;

    #[tracing::instrument(skip(transport))]
    async fn create(transport: &dyn Transport, params: Self::Params) -> Result<Self> {
        if params.notebook_eid.is_empty() {
            return Err(NotebookError::InvalidId(params.notebook_eid));
        }

        let mut attributes = json!({ "name": params.name });
        if let Some(description) = params.description {
            attributes["description"] = Value::String(description);
        }
        let relationships = json!({
            "ancestors": {
                "data": [{ "type": Notebook::TYPE, "id": params.notebook_eid }]
            }
        });

        match create_entity(transport, Experiment::TYPE, attributes, Some(relationships)).await? {
            Entity::Experiment(experiment) => Ok(experiment),
            other => Err(unexpected(other, Experiment::TYPE)),
        }
    }
}

#[async_trait]
impl Update for Experiment {
    type Id = String; // eid
    type Params = EntityUpdateParams;

    #[tracing::instrument(skip(transport))]
    async fn update(transport: &dyn Transport, eid: String, params: Self::Params) -> Result<Self> {
        patch_properties(transport, &eid, &params).await?;
        Experiment::get(transport, eid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, ScriptedTransport};
    use crate::transport::{Method, RequestBody};

    fn journal_envelope(eid: &str, name: &str) -> crate::Result<crate::ApiResponse> {
        json_response(json!({
            "links": {"self": format!("https://eln/entities/{eid}")},
            "data": {"type": "journal", "id": eid, "attributes": {"eid": eid, "type": "journal", "name": name}}
        }))
    }

    #[tokio::test]
    async fn test_get_notebook() {
        let transport = ScriptedTransport::new(vec![journal_envelope("journal:1", "Lab book")]);
        let notebook = Notebook::get(&transport, "journal:1".to_string()).await.unwrap();
        assert_eq!(notebook.attributes.name, "Lab book");
        assert_eq!(transport.requests()[0].path.render(), "entities/journal%3A1");
    }

    #[tokio::test]
    async fn test_get_notebook_wrong_type() {
        let transport = ScriptedTransport::new(vec![json_response(json!({
            "data": {"type": "sample", "id": "sample:1", "attributes": {"name": "S"}}
        }))]);
        let err = Notebook::get(&transport, "sample:1".to_string()).await.unwrap_err();
        assert!(matches!(err, NotebookError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_create_experiment_links_notebook() {
        let transport = ScriptedTransport::new(vec![json_response(json!({
            "data": {"type": "experiment", "id": "experiment:7", "attributes": {"name": "Run 7"}}
        }))]);

        let experiment = Experiment::create(
            &transport,
            ExperimentCreateParams {
                notebook_eid: "journal:1".into(),
                name: "Run 7".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(experiment.eid(), "experiment:7");

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path.render(), "entities/experiment");
        match &request.body {
            Some(RequestBody::Json(body)) => {
                assert_eq!(body["data"]["type"], "experiment");
                assert_eq!(body["data"]["attributes"]["name"], "Run 7");
                assert_eq!(
                    body["data"]["relationships"]["ancestors"]["data"][0]["id"],
                    "journal:1"
                );
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_patches_then_refetches() {
        let transport = ScriptedTransport::new(vec![
            json_response(json!({"data": []})),
            journal_envelope("journal:1", "Renamed"),
        ]);

        let notebook = Notebook::update(
            &transport,
            "journal:1".to_string(),
            EntityUpdateParams {
                name: Some("Renamed".into()),
                digest: Some("123".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(notebook.attributes.name, "Renamed");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::PATCH);
        assert_eq!(requests[0].param("digest"), Some("123"));
        assert_eq!(requests[0].param("force"), Some("true"));
        assert_eq!(requests[1].method, Method::GET);
    }

    #[tokio::test]
    async fn test_experiments_filters_children() {
        let transport = ScriptedTransport::new(vec![json_response(json!({
            "data": [
                {"type": "experiment", "id": "experiment:1", "attributes": {"eid": "experiment:1", "type": "experiment", "name": "E1"}}
            ]
        }))]);
        let notebook: Notebook = serde_json::from_value(json!({
            "eid": "journal:1", "type": "journal", "name": "NB"
        }))
        .unwrap();

        let experiments = notebook.experiments(&transport).unwrap().collect_all().await.unwrap();
        assert_eq!(experiments.len(), 1);
        assert_eq!(experiments[0].attributes.name, "E1");

        let request = &transport.requests()[0];
        assert_eq!(request.path.render(), "entities/journal%3A1/children");
        assert_eq!(request.param("includeTypes"), Some("experiment"));
    }

    #[tokio::test]
    async fn test_experiments_decode_like_other_listings() {
        // Attributes without eid/type, as some tenants return them
        let page = json!({
            "data": [
                {"type": "experiment", "id": "experiment:1", "attributes": {"name": "E1"}},
                {"type": "text", "id": "text:2", "attributes": {"name": "stray"}},
                {"type": "experiment", "id": "experiment:3", "attributes": {"name": "E3"}}
            ]
        });
        let transport = ScriptedTransport::new(vec![json_response(page.clone()), json_response(page)]);
        let notebook: Notebook = serde_json::from_value(json!({
            "eid": "journal:1", "type": "journal", "name": "NB"
        }))
        .unwrap();

        let generic = Entity::children(&transport, notebook.eid(), &EntityListQuery::default())
            .unwrap()
            .collect_all()
            .await
            .unwrap();
        assert_eq!(generic.len(), 3);

        let experiments = notebook.experiments(&transport).unwrap().collect_all().await.unwrap();
        let eids: Vec<&str> = experiments.iter().map(Experiment::eid).collect();
        assert_eq!(eids, vec!["experiment:1", "experiment:3"]);
        assert_eq!(experiments[0].attributes.entity_type, Experiment::TYPE);
        assert_eq!(transport.request_count(), 2);
    }
}
