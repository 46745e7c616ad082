//! Shared type definitions for the Hamlet simulation.
//!
//! This crate is the single source of truth for the data model used across
//! the Hamlet workspace: world entities, mutable agent state, and the
//! opaque string identifiers that reference them.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers around opaque string identifiers
//! - [`entity`] -- World entities with tags, properties, and the
//!   per-entity reservation flags
//! - [`agent`] -- Mutable agent state (stats, inventory, skills, target)

pub mod agent;
pub mod entity;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use agent::AgentState;
pub use entity::Entity;
pub use ids::{AgentId, EntityId};
