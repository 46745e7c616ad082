//! Decision machinery for the Hamlet simulation.
//!
//! Three layers drive an agent, arbitrated by the
//! [`IntegratedScheduler`]:
//!
//! 1. **Schedule** -- time-of-day routine ([`ScheduleManager`]), the
//!    default mode.
//! 2. **Scenario** -- scripted step sequences ([`ScenarioManager`]),
//!    entered explicitly.
//! 3. **GOAP** -- goal-driven planning ([`planner`]), entered when a
//!    goal turns critical and sticky until a scenario completes.
//!
//! # Modules
//!
//! - [`planner`] -- Best-first plan search, plan execution, replanning
//! - [`schedule`] -- Daily schedule with busy-retry bookkeeping
//! - [`scenario`] -- Scripted scenarios with lifecycle hooks
//! - [`integrated`] -- Mode arbitration over the three layers
//! - [`events`] -- Observer callback lists

pub mod events;
pub mod integrated;
pub mod planner;
pub mod scenario;
pub mod schedule;

pub use events::Callbacks;
pub use integrated::{IntegratedScheduler, Mode, SchedulerStatus};
pub use planner::{AgentPlanner, GoapPlan, GoapPlanner, PlanStep, PlannerConfig};
pub use scenario::{
    Scenario, ScenarioHooks, ScenarioManager, ScenarioStep, StepOutcome, StepTarget,
};
pub use schedule::{ScheduleEntry, ScheduleManager};
