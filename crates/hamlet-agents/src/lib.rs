//! Agent capabilities for the Hamlet simulation.
//!
//! What an agent can do ([`GameAction`] + [`ActionRegistry`]), what it
//! wants ([`Goal`] + [`GoalManager`]), and how its stats drift over time
//! ([`StatRulebook`]). The decision machinery that sequences these lives
//! in `hamlet-core`; this crate only defines the capabilities themselves.
//!
//! # Modules
//!
//! - [`actions`] -- [`ActionBehavior`], [`GameAction`], reservation-backed
//!   execution
//! - [`registry`] -- [`ActionRegistry`], case-insensitive action lookup
//! - [`goals`] -- [`GoalCondition`], [`Goal`], [`GoalManager`], criticality
//!   thresholds
//! - [`catalog`] -- Ready-made actions and goals for demos and tests
//! - [`stat_rules`] -- Time-driven stat changes with clamping
//! - [`error`] -- Registration-time validation errors

pub mod actions;
pub mod catalog;
pub mod error;
pub mod goals;
pub mod registry;
pub mod stat_rules;

pub use actions::{ActionBehavior, GameAction};
pub use error::{GoalError, RegistryError};
pub use goals::{Goal, GoalCondition, GoalManager, GoalThresholds};
pub use registry::ActionRegistry;
pub use stat_rules::{StatRule, StatRulebook};
