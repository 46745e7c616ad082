//! In-memory entity store with per-entity locking.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, warn};

use hamlet_types::{AgentId, Entity, EntityId};

use crate::store::WorldStore;

type Slot = Arc<Mutex<Entity>>;

/// An in-memory [`WorldStore`] backed by a map of individually locked
/// entities.
///
/// The outer map is taken briefly to locate or create a slot; all entity
/// reads and writes then go through that entity's own `Mutex`, so
/// contention on one entity never blocks operations on others. Iteration
/// order is id order (the map is a `BTreeMap`).
#[derive(Debug, Default)]
pub struct InMemoryWorld {
    entities: RwLock<BTreeMap<String, Slot>>,
}

impl InMemoryWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world pre-populated with the given entities.
    pub fn with_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        let world = Self::new();
        for entity in entities {
            world.upsert(entity);
        }
        world
    }

    /// Create a world holding clones of another store's entities.
    ///
    /// Reservation state is cloned along with the data, so a snapshot
    /// sees the same busy entities the source did at the time of the
    /// copy.
    pub fn snapshot_of(source: &dyn WorldStore) -> Self {
        Self::with_entities(source.all_entities())
    }

    /// Number of entities in the store.
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    /// True when the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.read_map().is_empty()
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Slot>> {
        self.entities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Slot>> {
        self.entities.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_slot(slot: &Slot) -> MutexGuard<'_, Entity> {
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, id: &EntityId) -> Option<Slot> {
        self.read_map().get(id.as_str()).cloned()
    }

    /// Locate the slot for an id, creating an empty entity when absent.
    fn slot_or_create(&self, id: &EntityId) -> Slot {
        if let Some(slot) = self.slot(id) {
            return slot;
        }
        self.write_map()
            .entry(id.as_str().to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(Entity::new(id.clone()))))
            .clone()
    }
}

impl WorldStore for InMemoryWorld {
    fn all_entities(&self) -> Vec<Entity> {
        self.read_map()
            .values()
            .map(|slot| Self::lock_slot(slot).clone())
            .collect()
    }

    fn entity(&self, id: &EntityId) -> Option<Entity> {
        self.slot(id).map(|slot| Self::lock_slot(&slot).clone())
    }

    fn upsert(&self, entity: Entity) {
        let mut map = self.write_map();
        if let Some(slot) = map.get(entity.id().as_str()) {
            // Write through the existing slot so readers holding the
            // Arc observe the update.
            *Self::lock_slot(slot) = entity;
        } else {
            map.insert(
                entity.id().as_str().to_owned(),
                Arc::new(Mutex::new(entity)),
            );
        }
    }

    fn try_reserve(&self, id: &EntityId, agent: &AgentId) -> bool {
        let slot = self.slot_or_create(id);
        let mut entity = Self::lock_slot(&slot);
        let reserved = entity.try_reserve(agent);
        if reserved {
            debug!(entity = %id, agent = %agent, "entity reserved");
        } else {
            debug!(
                entity = %id,
                agent = %agent,
                holder = ?entity.busy_by(),
                "reservation refused"
            );
        }
        reserved
    }

    fn release(&self, id: &EntityId, agent: &AgentId) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        let mut entity = Self::lock_slot(&slot);
        if entity.try_release(agent) {
            debug!(entity = %id, agent = %agent, "entity released");
        } else {
            warn!(
                entity = %id,
                agent = %agent,
                holder = ?entity.busy_by(),
                "release refused, reservation held by another agent"
            );
        }
    }
}
