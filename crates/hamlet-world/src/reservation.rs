//! RAII wrapper around a per-entity reservation.

use hamlet_types::{AgentId, EntityId};

use crate::store::WorldStore;

/// Holds a reservation on one entity for the lifetime of the guard.
///
/// The reservation is taken in [`ReservationGuard::acquire`] and given
/// back in `Drop`, so it is released on every exit path, including
/// unwinding out of an action effect.
#[must_use = "dropping the guard releases the reservation"]
pub struct ReservationGuard<'a> {
    world: &'a dyn WorldStore,
    entity: EntityId,
    agent: AgentId,
}

impl<'a> ReservationGuard<'a> {
    /// Reserve `entity` for `agent`, returning `None` when the entity is
    /// already held by a different agent.
    pub fn acquire(world: &'a dyn WorldStore, entity: &EntityId, agent: &AgentId) -> Option<Self> {
        world.try_reserve(entity, agent).then(|| Self {
            world,
            entity: entity.clone(),
            agent: agent.clone(),
        })
    }

    /// The reserved entity's id.
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// The holding agent's id.
    pub fn agent(&self) -> &AgentId {
        &self.agent
    }
}

impl Drop for ReservationGuard<'_> {
    fn drop(&mut self) {
        self.world.release(&self.entity, &self.agent);
    }
}
