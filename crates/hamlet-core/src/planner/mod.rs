//! Goal-oriented action planning.
//!
//! [`GoapPlanner`] searches best-first over agent-state snapshots for
//! the cheapest action sequence that achieves a goal. [`GoapPlan`] is
//! the executable result, stepped one action per tick. [`AgentPlanner`]
//! ties the search to a [`GoalManager`](hamlet_agents::GoalManager) and
//! replans when the world drifts out from under the current plan.

mod agent;
mod node;
mod plan;
mod search;

pub use agent::AgentPlanner;
pub use plan::{GoapPlan, PlanStep};
pub use search::{GoapPlanner, PlannerConfig};
