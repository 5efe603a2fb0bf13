//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use uuid::Uuid;

use crate::{EntityAttributes, PropertyContent, SampleProperty, User};

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Entity Fixtures
    // =========================================================================

    /// An eid with a deterministic UUID part.
    pub fn eid(tag: &str, n: u128) -> String {
        format!("{tag}:{}", Uuid::from_u128(n))
    }

    /// Create a minimal entity with required fields only.
    pub fn entity(eid: &str, name: &str) -> EntityAttributes {
        let entity_type = eid.split_once(':').map_or(eid, |(tag, _)| tag);
        EntityAttributes {
            eid: eid.to_string(),
            entity_type: entity_type.to_string(),
            name: name.to_string(),
            description: None,
            digest: Some("1".to_string()),
            created_at: timestamp("2024-03-01T10:00:00Z"),
            edited_at: None,
            fields: Map::new(),
        }
    }

    /// Create a notebook entity.
    pub fn notebook(n: u128, name: &str) -> EntityAttributes {
        Self::entity(&Self::eid("journal", n), name)
    }

    /// Create an experiment entity.
    pub fn experiment(n: u128, name: &str) -> EntityAttributes {
        let mut experiment = Self::entity(&Self::eid("experiment", n), name);
        experiment
            .fields
            .insert("Status".to_string(), json!({"value": "open"}));
        experiment
    }

    /// Create a sample entity.
    pub fn sample(n: u128, name: &str) -> EntityAttributes {
        Self::entity(&Self::eid("sample", n), name)
    }

    // =========================================================================
    // Property Fixtures
    // =========================================================================

    /// A template property keyed by UUID.
    pub fn property(n: u128, name: &str, value: serde_json::Value, units: Option<&str>) -> SampleProperty {
        SampleProperty {
            id: Uuid::from_u128(n).to_string(),
            name: name.to_string(),
            content: PropertyContent {
                value: Some(value),
                units: units.map(str::to_string),
            },
            read_only: false,
        }
    }

    /// A built-in, read-only property keyed by a plain id.
    pub fn builtin_property(id: &str, name: &str, value: &str) -> SampleProperty {
        SampleProperty {
            id: id.to_string(),
            name: name.to_string(),
            content: PropertyContent {
                value: Some(json!(value)),
                units: None,
            },
            read_only: true,
        }
    }

    // =========================================================================
    // User Fixtures
    // =========================================================================

    /// Create an enabled user.
    pub fn user(id: &str, first: &str, last: &str) -> User {
        User {
            user_id: id.to_string(),
            user_name: format!("{}.{}", first.to_lowercase(), last.to_lowercase()),
            email: Some(format!(
                "{}.{}@lab.example.com",
                first.to_lowercase(),
                last.to_lowercase()
            )),
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
            is_enabled: true,
            created_at: timestamp("2023-09-01T08:00:00Z"),
            last_login_at: None,
        }
    }

    /// Create a default set of test data for common scenarios.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario::new()
    }
}

fn timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// A complete test scenario with related entities.
pub struct DefaultScenario {
    /// Entities paired with their parent eid.
    pub entities: Vec<(EntityAttributes, Option<String>)>,
    /// Properties indexed by sample eid.
    pub properties: Vec<(String, Vec<SampleProperty>)>,
    pub users: Vec<User>,
    /// Id of the user the API key belongs to.
    pub current_user: Option<String>,
}

impl DefaultScenario {
    fn new() -> Self {
        let notebook = Fixtures::notebook(1, "Protein Purification");
        let first = Fixtures::experiment(2, "Buffer Screen");
        let second = Fixtures::experiment(3, "Column Run");
        let sample = Fixtures::sample(4, "Lysate A");
        let text = Fixtures::entity(&Fixtures::eid("text", 5), "Notes");

        let properties = vec![(
            sample.eid.clone(),
            vec![
                Fixtures::property(101, "Concentration", json!(2.5), Some("mg/mL")),
                Fixtures::property(102, "Volume", json!(40), Some("mL")),
                Fixtures::builtin_property("digest", "Digest", "1"),
            ],
        )];

        let entities = vec![
            (notebook.clone(), None),
            (first.clone(), Some(notebook.eid.clone())),
            (second, Some(notebook.eid)),
            (sample, Some(first.eid.clone())),
            (text, Some(first.eid)),
        ];

        let users = vec![
            Fixtures::user("100", "Marie", "Curie"),
            Fixtures::user("101", "Rosalind", "Franklin"),
            Fixtures::user("102", "Dorothy", "Hodgkin"),
        ];

        Self {
            entities,
            properties,
            users,
            current_user: Some("100".to_string()),
        }
    }
}
