//! Case-insensitive action lookup.

use std::collections::BTreeMap;

use tracing::debug;

use crate::actions::GameAction;
use crate::error::RegistryError;

/// A collection of [`GameAction`]s keyed by lowercase name.
///
/// Re-registering a name replaces the previous action. The registry is
/// an explicit, owned collection: the host owns one and passes it by
/// reference to the decision layers that need it.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, GameAction>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action, replacing any action of the same name.
    ///
    /// Names are compared case-insensitively. An empty or
    /// whitespace-only name is rejected.
    pub fn register(&mut self, action: GameAction) -> Result<(), RegistryError> {
        if action.name().trim().is_empty() {
            return Err(RegistryError::EmptyActionName);
        }
        let key = action.name().to_ascii_lowercase();
        if self.actions.insert(key, action).is_some() {
            debug!("action replaced in registry");
        }
        Ok(())
    }

    /// Register several actions; stops at the first invalid one.
    pub fn register_all(
        &mut self,
        actions: impl IntoIterator<Item = GameAction>,
    ) -> Result<(), RegistryError> {
        for action in actions {
            self.register(action)?;
        }
        Ok(())
    }

    /// Look up an action by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&GameAction> {
        self.actions.get(&name.to_ascii_lowercase())
    }

    /// True when an action of this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(&name.to_ascii_lowercase())
    }

    /// Remove an action, returning it if it was registered.
    pub fn remove(&mut self, name: &str) -> Option<GameAction> {
        self.actions.remove(&name.to_ascii_lowercase())
    }

    /// Remove every registered action.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no actions are registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over the registered actions in name order.
    pub fn actions(&self) -> impl Iterator<Item = &GameAction> {
        self.actions.values()
    }
}
