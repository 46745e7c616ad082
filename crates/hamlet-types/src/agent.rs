//! Mutable agent state: stats, inventory, skills, and the current target.
//!
//! [`AgentState`] is pure data. The action registry, planner, and
//! scheduler that drive an agent are owned by the host alongside the
//! state and passed by reference into every operation that needs them --
//! they are never serialized and never live inside the state itself.
//!
//! Stat and inventory keys are case-insensitive (stored lowercase).
//! Stat values carry no implicit clamping; bounding rules live with the
//! callers (stat-decay rules, action effects).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, EntityId};

/// The persisted, mutable state of one agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    /// The agent's id. Matches the id of the agent's world entity.
    pub id: AgentId,

    /// Named integer stats (lowercase keys; an absent stat reads as 0).
    #[serde(default)]
    stats: BTreeMap<String, i64>,

    /// Named inventory counts (lowercase keys; zero counts are removed).
    #[serde(default)]
    inventory: BTreeMap<String, u64>,

    /// Skill names the agent possesses (lowercase).
    #[serde(default)]
    skills: BTreeSet<String>,

    /// The entity the agent is currently acting against, if any.
    #[serde(default)]
    current_target: Option<EntityId>,
}

impl AgentState {
    /// Create an empty state for the given agent id.
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Read a stat value; absent stats read as 0.
    pub fn stat(&self, name: &str) -> i64 {
        self.stats.get(&name.to_ascii_lowercase()).copied().unwrap_or(0)
    }

    /// Set a stat value.
    pub fn set_stat(&mut self, name: &str, value: i64) {
        self.stats.insert(name.to_ascii_lowercase(), value);
    }

    /// Add a delta to a stat (saturating) and return the new value.
    pub fn modify_stat(&mut self, name: &str, delta: i64) -> i64 {
        let key = name.to_ascii_lowercase();
        let value = self.stats.get(&key).copied().unwrap_or(0).saturating_add(delta);
        self.stats.insert(key, value);
        value
    }

    /// Iterate over the agent's stats in key order.
    pub fn stats(&self) -> impl Iterator<Item = (&str, i64)> {
        self.stats.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Count of an inventory item; absent items read as 0.
    pub fn item_count(&self, item: &str) -> u64 {
        self.inventory.get(&item.to_ascii_lowercase()).copied().unwrap_or(0)
    }

    /// True when the agent holds at least one of the item.
    pub fn has_item(&self, item: &str) -> bool {
        self.item_count(item) > 0
    }

    /// Add a quantity of an item. A zero quantity is ignored.
    pub fn add_item(&mut self, item: &str, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let key = item.to_ascii_lowercase();
        let count = self.inventory.get(&key).copied().unwrap_or(0).saturating_add(quantity);
        self.inventory.insert(key, count);
    }

    /// Remove a quantity of an item.
    ///
    /// Returns false, with no change, when the quantity is zero or the
    /// agent holds fewer than requested. A count reaching zero removes
    /// the item entry.
    pub fn remove_item(&mut self, item: &str, quantity: u64) -> bool {
        if quantity == 0 {
            return false;
        }
        let key = item.to_ascii_lowercase();
        let current = self.inventory.get(&key).copied().unwrap_or(0);
        if current < quantity {
            return false;
        }
        let remaining = current.saturating_sub(quantity);
        if remaining == 0 {
            self.inventory.remove(&key);
        } else {
            self.inventory.insert(key, remaining);
        }
        true
    }

    /// Iterate over the agent's inventory in key order.
    pub fn inventory(&self) -> impl Iterator<Item = (&str, u64)> {
        self.inventory.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Add a skill (normalized to lowercase).
    pub fn add_skill(&mut self, skill: &str) {
        self.skills.insert(skill.to_ascii_lowercase());
    }

    /// Remove a skill. Returns true when it was present.
    pub fn remove_skill(&mut self, skill: &str) -> bool {
        self.skills.remove(&skill.to_ascii_lowercase())
    }

    /// True when the agent has the skill (case-insensitive).
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(&skill.to_ascii_lowercase())
    }

    /// Iterate over the agent's skills in order.
    pub fn skills(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(String::as_str)
    }

    /// The entity the agent is currently acting against, if any.
    pub fn current_target(&self) -> Option<&EntityId> {
        self.current_target.as_ref()
    }

    /// Set or clear the agent's current target.
    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.current_target = target;
    }

    /// Clear the agent's current target.
    pub fn clear_target(&mut self) {
        self.current_target = None;
    }
}
