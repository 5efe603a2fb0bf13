//! Users.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::Result;
use crate::pagination::PageParams;
use crate::traits::{Get, List};
use crate::transport::{ApiPath, ApiRequest, Transport};

/// A user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,

    #[serde(default)]
    pub user_name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub is_enabled: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// "First Last", falling back to the user name.
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => self.user_name.clone(),
        }
    }

    /// The user the API key belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[tracing::instrument(skip(transport))]
    pub async fn me(transport: &dyn Transport) -> Result<Self> {
        fetch_user(transport, ApiRequest::get("users/me")).await
    }
}

async fn fetch_user(transport: &dyn Transport, request: ApiRequest) -> Result<User> {
    let response = transport.call(request).await?;
    let envelope: Envelope<User> = response.json()?;
    Ok(envelope.into_single()?.attributes)
}

/// Query parameters for listing users.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserListQuery {
    /// Free-text filter on name and email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    /// Only enabled (or disabled) accounts.
    #[serde(rename = "enabled", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(flatten)]
    pub page: PageParams,
}

#[async_trait]
impl Get for User {
    type Id = String; // user id

    #[tracing::instrument(skip(transport))]
    async fn get(transport: &dyn Transport, user_id: String) -> Result<Self> {
        fetch_user(transport, ApiRequest::get(ApiPath::segments("users", [user_id]))).await
    }
}

#[async_trait]
impl List for User {
    type Query = UserListQuery;

    fn list_request(query: &Self::Query) -> Result<ApiRequest> {
        ApiRequest::get("users").with_query(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_response, ScriptedTransport};
    use serde_json::json;

    fn user_json(id: &str, first: &str) -> serde_json::Value {
        json!({"type": "user", "id": id, "attributes": {
            "userId": id, "userName": format!("{first}@lab"), "firstName": first,
            "lastName": "Curie", "isEnabled": true, "email": format!("{first}@lab.example")
        }})
    }

    #[test]
    fn test_full_name() {
        let user: User = serde_json::from_value(json!({"userId": "1", "userName": "mc"})).unwrap();
        assert_eq!(user.full_name(), "mc");

        let user: User = serde_json::from_value(
            json!({"userId": "1", "userName": "mc", "firstName": "Marie", "lastName": "Curie"}),
        )
        .unwrap();
        assert_eq!(user.full_name(), "Marie Curie");
    }

    #[test]
    fn test_list_query_serialization() {
        let query = UserListQuery {
            q: Some("curie".into()),
            page: PageParams {
                limit: Some(10),
                ..Default::default()
            },
            ..Default::default()
        };
        let serialized = serde_qs::to_string(&query).expect("Failed to serialize query");
        assert!(serialized.contains("q=curie"));
        assert!(!serialized.contains("enabled"));
    }

    #[tokio::test]
    async fn test_list_all_follows_pages() {
        let transport = ScriptedTransport::new(vec![
            json_response(json!({
                "links": {"next": "https://eln/users?page[offset]=1&page[limit]=1"},
                "data": [user_json("100", "Marie")]
            })),
            json_response(json!({"links": {}, "data": [user_json("101", "Pierre")]})),
        ]);

        let users = User::list_all(&transport, &UserListQuery::default()).await.unwrap();
        let names: Vec<String> = users.iter().map(User::full_name).collect();
        assert_eq!(names, vec!["Marie Curie", "Pierre Curie"]);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_me() {
        let transport = ScriptedTransport::new(vec![json_response(json!({"data": user_json("100", "Marie")}))]);
        let me = User::me(&transport).await.unwrap();
        assert_eq!(me.user_id, "100");
        assert_eq!(transport.requests()[0].path.render(), "users/me");
    }
}
