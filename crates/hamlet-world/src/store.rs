//! The narrow interface between the decision layers and the world.

use hamlet_types::{AgentId, Entity, EntityId};

/// Read/write access to the entities of a shared world.
///
/// Reads hand out snapshot clones; writes go through [`upsert`] or the
/// reservation methods. Implementations must make `try_reserve` atomic
/// per entity: two concurrent reservation attempts against the same
/// entity must never both succeed.
///
/// [`upsert`]: WorldStore::upsert
pub trait WorldStore: Send + Sync {
    /// Snapshot clones of every entity, in stable id order.
    fn all_entities(&self) -> Vec<Entity>;

    /// Snapshot clone of one entity, if present.
    fn entity(&self, id: &EntityId) -> Option<Entity>;

    /// Insert or replace an entity under its own id.
    fn upsert(&self, entity: Entity);

    /// Attempt to reserve an entity for an agent.
    ///
    /// Non-blocking: fails immediately when a different agent holds the
    /// entity. Idempotent for the current holder. An entity that does
    /// not exist yet is created and reserved in one step.
    fn try_reserve(&self, id: &EntityId, agent: &AgentId) -> bool;

    /// Release an entity held by the given agent.
    ///
    /// A release by a non-holder leaves the reservation in place.
    fn release(&self, id: &EntityId, agent: &AgentId);

    /// The first `limit` entities in id order, or all of them.
    fn load_initial_batch(&self, limit: Option<usize>) -> Vec<Entity> {
        let mut entities = self.all_entities();
        if let Some(limit) = limit {
            entities.truncate(limit);
        }
        entities
    }
}
