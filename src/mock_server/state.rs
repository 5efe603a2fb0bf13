//! Mock server state management.
//!
//! Provides the in-memory data store for the mock notebook API server.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{EntityAttributes, PropertyContent, SampleProperty, User};

/// Why a mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No such entity or property.
    NotFound(String),
    /// The caller's digest is not the current version.
    Conflict(String),
    /// The property cannot be written.
    ReadOnly(String),
}

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug, Default)]
pub struct MockState {
    /// Entities in listing order.
    pub entities: Vec<EntityAttributes>,

    /// Parent eid by child eid.
    pub parents: HashMap<String, String>,

    /// Sample properties indexed by sample eid.
    pub properties: HashMap<String, Vec<SampleProperty>>,

    /// Users in listing order.
    pub users: Vec<User>,

    /// Id of the user returned by `users/me`.
    pub current_user: Option<String>,

    /// Optional API key. If set, requests must send it as `x-api-key`.
    pub required_token: Option<String>,

    /// Public base URL, used to build absolute `next` links.
    pub base_url: String,

    /// Source of fresh eids.
    next_id: u128,
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self {
            next_id: 0x1000,
            ..Self::default()
        }
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a top-level entity to the state.
    pub fn with_entity(mut self, entity: EntityAttributes) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add an entity inside `parent_eid`.
    pub fn with_child(mut self, parent_eid: &str, entity: EntityAttributes) -> Self {
        self.parents
            .insert(entity.eid.clone(), parent_eid.to_string());
        self.entities.push(entity);
        self
    }

    /// Set the properties of a sample.
    pub fn with_properties(mut self, sample_eid: &str, properties: Vec<SampleProperty>) -> Self {
        self.properties.insert(sample_eid.to_string(), properties);
        self
    }

    /// Add a user to the state.
    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    /// Set the user the API key belongs to.
    pub fn with_current_user(mut self, user_id: &str) -> Self {
        self.current_user = Some(user_id.to_string());
        self
    }

    /// Set the required API key.
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Get an entity by eid.
    pub fn get_entity(&self, eid: &str) -> Option<&EntityAttributes> {
        self.entities.iter().find(|e| e.eid == eid)
    }

    /// List entities, filtered by type tags. Empty filters match everything.
    pub fn list_entities(&self, include: &[String], exclude: &[String]) -> Vec<&EntityAttributes> {
        self.entities
            .iter()
            .filter(|e| type_filter(&e.entity_type, include, exclude))
            .collect()
    }

    /// Direct children of `eid`, filtered by type tags.
    pub fn children(&self, eid: &str, include: &[String], exclude: &[String]) -> Vec<&EntityAttributes> {
        self.entities
            .iter()
            .filter(|e| self.parents.get(&e.eid).map(String::as_str) == Some(eid))
            .filter(|e| type_filter(&e.entity_type, include, exclude))
            .collect()
    }

    /// Create an entity of type `tag`, optionally inside `parent_eid`.
    pub fn create_entity(
        &mut self,
        tag: &str,
        name: String,
        description: Option<String>,
        parent_eid: Option<String>,
    ) -> Result<&EntityAttributes, StateError> {
        if let Some(ref parent) = parent_eid {
            if self.get_entity(parent).is_none() {
                return Err(StateError::NotFound(parent.clone()));
            }
        }

        self.next_id += 1;
        let eid = format!("{tag}:{}", Uuid::from_u128(self.next_id));
        let mut entity = super::Fixtures::entity(&eid, &name);
        entity.description = description;

        if let Some(parent) = parent_eid {
            self.parents.insert(eid.clone(), parent);
        }
        if tag == crate::Sample::TYPE {
            self.properties.insert(eid.clone(), Vec::new());
        }
        self.entities.push(entity);
        self.get_entity(&eid).ok_or(StateError::NotFound(eid))
    }

    /// Remove an entity and everything below it.
    pub fn delete_entity(&mut self, eid: &str, digest: Option<&str>) -> Result<(), StateError> {
        let entity = self
            .get_entity(eid)
            .ok_or_else(|| StateError::NotFound(eid.to_string()))?;
        check_digest(entity, digest)?;

        let mut doomed = vec![eid.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i].clone();
            doomed.extend(
                self.parents
                    .iter()
                    .filter(|(_, p)| **p == parent)
                    .map(|(child, _)| child.clone()),
            );
            i += 1;
        }

        self.entities.retain(|e| !doomed.contains(&e.eid));
        for eid in &doomed {
            self.parents.remove(eid);
            self.properties.remove(eid);
        }
        Ok(())
    }

    /// Rename or redescribe an entity, bumping its digest.
    pub fn update_entity(
        &mut self,
        eid: &str,
        digest: Option<&str>,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<&EntityAttributes, StateError> {
        let entity = self
            .entities
            .iter_mut()
            .find(|e| e.eid == eid)
            .ok_or_else(|| StateError::NotFound(eid.to_string()))?;
        check_digest(entity, digest)?;

        if let Some(n) = name {
            entity.name = n;
        }
        if let Some(d) = description {
            entity.description = Some(d);
        }
        bump_digest(entity);
        Ok(entity)
    }

    /// Properties of a sample.
    pub fn get_properties(&self, sample_eid: &str) -> Option<&Vec<SampleProperty>> {
        self.properties.get(sample_eid)
    }

    /// Overwrite property contents. All changes are checked before any is
    /// applied.
    pub fn update_properties(
        &mut self,
        sample_eid: &str,
        changes: Vec<(String, PropertyContent)>,
    ) -> Result<&Vec<SampleProperty>, StateError> {
        let properties = self
            .properties
            .get_mut(sample_eid)
            .ok_or_else(|| StateError::NotFound(sample_eid.to_string()))?;

        let mut targets = Vec::with_capacity(changes.len());
        for (id, _) in &changes {
            let position = properties
                .iter()
                .position(|p| p.id.eq_ignore_ascii_case(id))
                .ok_or_else(|| StateError::NotFound(id.clone()))?;
            if properties[position].read_only {
                return Err(StateError::ReadOnly(id.clone()));
            }
            targets.push(position);
        }
        for (position, (_, content)) in targets.into_iter().zip(changes) {
            properties[position].content = content;
        }

        if let Some(entity) = self.entities.iter_mut().find(|e| e.eid == sample_eid) {
            bump_digest(entity);
        }
        self.properties
            .get(sample_eid)
            .ok_or_else(|| StateError::NotFound(sample_eid.to_string()))
    }

    /// Get a user by id.
    pub fn get_user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.user_id == user_id)
    }

    /// The user the API key belongs to.
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_deref().and_then(|id| self.get_user(id))
    }

    /// List users, optionally filtered by a free-text query and enabled flag.
    pub fn list_users(&self, q: Option<&str>, enabled: Option<bool>) -> Vec<&User> {
        let q = q.map(str::to_lowercase);
        self.users
            .iter()
            .filter(|u| enabled.map_or(true, |e| u.is_enabled == e))
            .filter(|u| {
                q.as_deref().map_or(true, |q| {
                    u.user_name.to_lowercase().contains(q)
                        || u.full_name().to_lowercase().contains(q)
                        || u.email
                            .as_deref()
                            .is_some_and(|e| e.to_lowercase().contains(q))
                })
            })
            .collect()
    }
}

fn type_filter(entity_type: &str, include: &[String], exclude: &[String]) -> bool {
    (include.is_empty() || include.iter().any(|t| t == entity_type))
        && !exclude.iter().any(|t| t == entity_type)
}

fn check_digest(entity: &EntityAttributes, digest: Option<&str>) -> Result<(), StateError> {
    match digest {
        Some(d) if entity.digest.as_deref() != Some(d) => Err(StateError::Conflict(format!(
            "{} is at digest {}",
            entity.eid,
            entity.digest.as_deref().unwrap_or("none")
        ))),
        _ => Ok(()),
    }
}

fn bump_digest(entity: &mut EntityAttributes) {
    let current: u64 = entity
        .digest
        .as_deref()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0);
    entity.digest = Some((current + 1).to_string());
    entity.edited_at = Some(chrono::Utc::now());
}
