//! Registration-time validation errors.
//!
//! Runtime outcomes (a precondition that does not hold, a reservation
//! conflict, a vanished target) are ordinary `bool`/`Option` returns,
//! not errors; only malformed registrations are typed failures.

use thiserror::Error;

/// Errors raised by [`ActionRegistry`](crate::ActionRegistry).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// An action was registered under an empty or whitespace-only name.
    #[error("action name must not be empty")]
    EmptyActionName,
}

/// Errors raised by [`GoalManager`](crate::GoalManager).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GoalError {
    /// A goal was added under an empty or whitespace-only name.
    #[error("goal name must not be empty")]
    EmptyName,
}
