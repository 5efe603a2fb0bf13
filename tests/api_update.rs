//! Create, update and delete calls against a wiremock server.

use notebookapi::{
    Create, Delete, Entity, EntityUpdateParams, Experiment, ExperimentCreateParams, Notebook,
    NotebookClient, NotebookCreateParams, Update,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOTEBOOK_EID: &str = "journal:1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e5f";
const NOTEBOOK_PATH: &str = "/entities/journal%3A1c2d3e4f-5a6b-4c7d-8e9f-0a1b2c3d4e5f";

fn notebook_doc(name: &str, digest: &str) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "type": "journal",
            "id": NOTEBOOK_EID,
            "attributes": {"eid": NOTEBOOK_EID, "type": "journal", "name": name, "digest": digest}
        }
    })
}

#[tokio::test]
async fn test_create_notebook_posts_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/entities/journal"))
        .and(body_partial_json(serde_json::json!({
            "data": {"type": "journal", "attributes": {"name": "Cloning 2024"}}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(notebook_doc("Cloning 2024", "1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotebookClient::new("test-key", &mock_server.uri()).unwrap();
    let notebook = Notebook::create(
        &client,
        NotebookCreateParams {
            name: "Cloning 2024".into(),
            description: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(notebook.eid(), NOTEBOOK_EID);
}

#[tokio::test]
async fn test_create_experiment_names_its_notebook() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/entities/experiment"))
        .and(body_partial_json(serde_json::json!({
            "data": {
                "type": "experiment",
                "relationships": {"ancestors": {"data": [{"type": "journal", "id": NOTEBOOK_EID}]}}
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "data": {"type": "experiment", "id": "experiment:9", "attributes": {
                "eid": "experiment:9", "type": "experiment", "name": "Gibson assembly"
            }}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotebookClient::new("test-key", &mock_server.uri()).unwrap();
    let experiment = Experiment::create(
        &client,
        ExperimentCreateParams {
            notebook_eid: NOTEBOOK_EID.into(),
            name: "Gibson assembly".into(),
            description: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(experiment.attributes.name, "Gibson assembly");
}

#[tokio::test]
async fn test_update_notebook_with_digest() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{NOTEBOOK_PATH}/properties")))
        .and(query_param("digest", "1"))
        .and(body_partial_json(serde_json::json!({
            "data": [{"attributes": {"name": "Name", "value": "Cloning 2025"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(NOTEBOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(notebook_doc("Cloning 2025", "2")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotebookClient::new("test-key", &mock_server.uri()).unwrap();
    let notebook = Notebook::update(
        &client,
        NOTEBOOK_EID.to_string(),
        EntityUpdateParams {
            name: Some("Cloning 2025".into()),
            digest: Some("1".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(notebook.attributes.name, "Cloning 2025");
    assert_eq!(notebook.attributes.digest.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_stale_digest_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(NOTEBOOK_PATH))
        .and(query_param("digest", "1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "errors": [{"status": "409", "code": "conflict", "detail": "digest mismatch"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotebookClient::new("test-key", &mock_server.uri()).unwrap();
    let err = Entity::delete_version(&client, NOTEBOOK_EID, Some("1"))
        .await
        .unwrap_err();

    assert_eq!(err.api_code(), Some("conflict"));
    assert_eq!(err.to_string(), "Notebook API error: digest mismatch");
}

#[tokio::test]
async fn test_forced_delete() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(NOTEBOOK_PATH))
        .and(query_param("force", "true"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NotebookClient::new("test-key", &mock_server.uri()).unwrap();
    Entity::delete(&client, NOTEBOOK_EID.to_string()).await.unwrap();
}
