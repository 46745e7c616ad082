//! World entities: identity, tags, properties, and reservation flags.
//!
//! An [`Entity`] is anything an agent can act against -- a tree, a table,
//! a trader, another agent. Tags and property keys are case-insensitive
//! (normalized to lowercase on insertion and lookup). The busy flag and
//! holder id implement the per-entity reservation primitive; they are
//! runtime-only state and are excluded from the serialized form.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AgentId, EntityId};

/// The `"agent"` marker tag kept in sync with the `is_agent` flag.
const AGENT_TAG: &str = "agent";

/// A world entity with tags, arbitrary properties, and a reservation slot.
///
/// # Invariants
///
/// - `busy` implies the holder id is present; at most one agent holds an
///   entity at a time.
/// - `is_agent` implies the `"agent"` tag is present. The tag is
///   re-synchronized on deserialization.
///
/// The serialized form carries identity, tags, properties, and the
/// `is_agent` flag only -- reservation state never persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "EntityRecord")]
pub struct Entity {
    /// Opaque identity of this entity.
    id: EntityId,

    /// Case-insensitive tag set (stored lowercase).
    tags: BTreeSet<String>,

    /// Named property values (keys stored lowercase, values arbitrary JSON).
    props: BTreeMap<String, Value>,

    /// Whether this entity represents an agent.
    is_agent: bool,

    /// Whether the entity is currently reserved.
    #[serde(skip)]
    busy: bool,

    /// Id of the agent holding the reservation, if any.
    #[serde(skip)]
    busy_by: Option<AgentId>,
}

/// Persisted subset of [`Entity`] used during deserialization.
#[derive(Debug, Deserialize)]
struct EntityRecord {
    #[serde(default = "EntityId::generate")]
    id: EntityId,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    props: BTreeMap<String, Value>,
    #[serde(default)]
    is_agent: bool,
}

impl From<EntityRecord> for Entity {
    fn from(record: EntityRecord) -> Self {
        let mut entity = Self {
            id: record.id,
            tags: record.tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
            props: record
                .props
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            is_agent: false,
            busy: false,
            busy_by: None,
        };
        // Re-synchronize the agent tag on load.
        entity.set_is_agent(record.is_agent);
        entity
    }
}

impl Entity {
    /// Create an entity with the given id and no tags or properties.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            tags: BTreeSet::new(),
            props: BTreeMap::new(),
            is_agent: false,
            busy: false,
            busy_by: None,
        }
    }

    /// Create an entity with a freshly generated id.
    pub fn generate() -> Self {
        Self::new(EntityId::generate())
    }

    /// The entity's id.
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// True when the entity carries the given tag (case-insensitive).
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    /// Add a tag (normalized to lowercase).
    pub fn add_tag(&mut self, tag: &str) {
        self.tags.insert(tag.to_ascii_lowercase());
    }

    /// Remove a tag (case-insensitive). Returns true when it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(&tag.to_ascii_lowercase())
    }

    /// Iterate over the entity's tags.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Read a property value (case-insensitive key).
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(&key.to_ascii_lowercase())
    }

    /// Read a property as an integer, if present and numeric.
    pub fn prop_i64(&self, key: &str) -> Option<i64> {
        self.prop(key).and_then(Value::as_i64)
    }

    /// Set a property value (key normalized to lowercase).
    pub fn set_prop(&mut self, key: &str, value: impl Into<Value>) {
        self.props.insert(key.to_ascii_lowercase(), value.into());
    }

    /// Iterate over the entity's properties.
    pub fn props(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether this entity represents an agent.
    pub fn is_agent(&self) -> bool {
        self.is_agent
    }

    /// Set the agent flag, keeping the `"agent"` tag in sync.
    pub fn set_is_agent(&mut self, is_agent: bool) {
        self.is_agent = is_agent;
        if is_agent {
            self.tags.insert(AGENT_TAG.to_owned());
        } else {
            self.tags.remove(AGENT_TAG);
        }
    }

    /// Whether the entity is currently reserved.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Id of the agent holding the reservation, if any.
    pub fn busy_by(&self) -> Option<&AgentId> {
        self.busy_by.as_ref()
    }

    /// Attempt to reserve this entity for the given agent.
    ///
    /// Fails for a blank agent id and when the entity is held by a
    /// different agent. Repeated reservation by the current holder
    /// succeeds without further effect.
    pub fn try_reserve(&mut self, agent: &AgentId) -> bool {
        if agent.is_blank() {
            return false;
        }
        if self.busy && self.busy_by.as_ref() != Some(agent) {
            return false;
        }
        self.busy = true;
        self.busy_by = Some(agent.clone());
        true
    }

    /// Attempt to release this entity on behalf of the given agent.
    ///
    /// Returns true when the entity is not busy (nothing to release) or
    /// when the reservation was cleared. Returns false, with no state
    /// change, when a different agent holds the reservation.
    pub fn try_release(&mut self, agent: &AgentId) -> bool {
        if !self.busy {
            return true;
        }
        if self.busy_by.as_ref() != Some(agent) {
            return false;
        }
        self.busy = false;
        self.busy_by = None;
        true
    }
}
