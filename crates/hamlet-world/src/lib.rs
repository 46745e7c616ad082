//! World adapter for the Hamlet simulation.
//!
//! The decision layers (planner, schedule, scenarios) never talk to a
//! concrete world representation. They see the narrow [`WorldStore`]
//! trait: entity lookup, snapshot iteration, upsert, and the per-entity
//! reservation primitive. [`InMemoryWorld`] is the reference store;
//! [`ReservationGuard`] wraps a reservation in RAII so the hold is
//! released on every exit path.
//!
//! # Modules
//!
//! - [`store`] -- The [`WorldStore`] trait
//! - [`memory`] -- [`InMemoryWorld`], per-entity locking
//! - [`reservation`] -- [`ReservationGuard`], RAII release

pub mod memory;
pub mod reservation;
pub mod store;

pub use memory::InMemoryWorld;
pub use reservation::ReservationGuard;
pub use store::WorldStore;
