//! Actions an agent can perform against the world.
//!
//! An action is a name, a planning cost, and an [`ActionBehavior`]. The
//! behavior answers three questions: can the agent perform it right now,
//! does it make sense against a given target, and what does it change.
//! Execution against a target always goes through a
//! [`ReservationGuard`], so the target is held for exactly the duration
//! of the effect and released on every exit path.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use hamlet_types::{AgentState, Entity};
use hamlet_world::{ReservationGuard, WorldStore};

/// The capabilities of one action.
///
/// Effects cannot report failure: once `apply` runs, whatever it changed
/// stands. Anything that can prevent the action belongs in
/// `can_perform` / `applicable_to`, which the executor re-checks
/// immediately before applying.
pub trait ActionBehavior: Send + Sync {
    /// Whether the agent can currently perform this action.
    ///
    /// Behaviors that act on a target typically read the agent's current
    /// target here and validate it against the world.
    fn can_perform(&self, _agent: &AgentState, _world: &dyn WorldStore) -> bool {
        true
    }

    /// Apply the action's effects to the agent and the world.
    fn apply(&self, agent: &mut AgentState, world: &dyn WorldStore);

    /// Whether this action makes sense against the given target entity.
    fn applicable_to(&self, _target: &Entity) -> bool {
        true
    }
}

/// A named, costed action backed by an [`ActionBehavior`].
#[derive(Clone)]
pub struct GameAction {
    name: String,
    cost: f32,
    behavior: Arc<dyn ActionBehavior>,
}

impl fmt::Debug for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameAction")
            .field("name", &self.name)
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl GameAction {
    /// Create an action from a name, a planning cost, and a behavior.
    pub fn new(name: impl Into<String>, cost: f32, behavior: Arc<dyn ActionBehavior>) -> Self {
        Self {
            name: name.into(),
            cost,
            behavior,
        }
    }

    /// The action's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action's planning cost.
    pub fn cost(&self) -> f32 {
        self.cost
    }

    /// Whether the action makes sense against the given target.
    pub fn applicable_to(&self, target: &Entity) -> bool {
        self.behavior.applicable_to(target)
    }

    /// Whether the action could run right now: the behavior's
    /// precondition, and applicability when a target is supplied.
    pub fn can_execute(
        &self,
        agent: &AgentState,
        world: &dyn WorldStore,
        target: Option<&Entity>,
    ) -> bool {
        self.behavior.can_perform(agent, world)
            && target.is_none_or(|t| self.behavior.applicable_to(t))
    }

    /// Execute the action, returning whether it ran.
    ///
    /// Re-validates first; a failed precondition means no side effects.
    /// With a target, the entity is reserved for the agent before the
    /// effect runs and released when this call returns, even if the
    /// effect unwinds. A reservation conflict fails the execution
    /// without side effects.
    pub fn execute(
        &self,
        agent: &mut AgentState,
        world: &dyn WorldStore,
        target: Option<&Entity>,
    ) -> bool {
        if !self.can_execute(agent, world, target) {
            debug!(action = %self.name, agent = %agent.id, "precondition not met");
            return false;
        }

        let _guard = match target {
            Some(entity) => match ReservationGuard::acquire(world, entity.id(), &agent.id) {
                Some(guard) => Some(guard),
                None => {
                    debug!(
                        action = %self.name,
                        agent = %agent.id,
                        target = %entity.id(),
                        "target busy, execution refused"
                    );
                    return false;
                }
            },
            None => None,
        };

        self.behavior.apply(agent, world);
        debug!(action = %self.name, agent = %agent.id, "action executed");
        true
    }
}
