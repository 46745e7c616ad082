//! Executable plans.

use tracing::debug;

use hamlet_agents::{GameAction, Goal};
use hamlet_types::{AgentState, EntityId};
use hamlet_world::WorldStore;

/// One step of a plan: an action and the entity it runs against, if any.
#[derive(Debug, Clone)]
pub struct PlanStep {
    /// The action to execute.
    pub action: GameAction,
    /// The target chosen during planning, if the step has one.
    pub target: Option<EntityId>,
}

/// An ordered action sequence toward a goal, stepped by a cursor.
///
/// A plan is a static artifact of the search; only the cursor moves.
/// Targets are re-resolved against the live world at execution time, so
/// a target that vanished after planning fails the step instead of
/// acting on stale data.
#[derive(Debug)]
pub struct GoapPlan {
    steps: Vec<PlanStep>,
    goal: Goal,
    cursor: usize,
}

impl GoapPlan {
    /// Create a plan over the given steps. An empty step list is a
    /// valid, already-completed plan (the goal held at search start).
    pub fn new(steps: Vec<PlanStep>, goal: Goal) -> Self {
        Self {
            steps,
            goal,
            cursor: 0,
        }
    }

    /// The goal this plan pursues.
    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    /// The plan's steps, executed and pending alike.
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Whether every step has been executed.
    pub fn is_completed(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// The step the cursor points at, if any remain.
    pub fn current_step(&self) -> Option<&PlanStep> {
        self.steps.get(self.cursor)
    }

    /// Number of steps not yet executed.
    pub fn remaining_steps(&self) -> usize {
        self.steps.len().saturating_sub(self.cursor)
    }

    /// Sum of the costs of every step in the plan.
    pub fn total_cost(&self) -> f32 {
        self.steps.iter().map(|s| s.action.cost()).sum()
    }

    /// Move the cursor back to the first step.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Execute the step under the cursor, advancing only on success.
    ///
    /// Returns false without moving the cursor when the plan is
    /// completed, the step's target no longer exists, or the action
    /// refuses to run. The agent's current target is set to the step's
    /// target before execution.
    pub fn execute_next_step(&mut self, agent: &mut AgentState, world: &dyn WorldStore) -> bool {
        let Some(step) = self.steps.get(self.cursor) else {
            return false;
        };

        let executed = match &step.target {
            Some(target_id) => {
                agent.set_target(Some(target_id.clone()));
                let Some(target) = world.entity(target_id) else {
                    debug!(target = %target_id, "plan step target vanished");
                    return false;
                };
                step.action.execute(agent, world, Some(&target))
            }
            None => step.action.execute(agent, world, None),
        };

        if executed {
            self.cursor = self.cursor.saturating_add(1);
        }
        executed
    }

    /// The longest still-executable prefix of the pending steps.
    ///
    /// Used by replanning to salvage a partially executed plan: steps
    /// are probed in order against the live world, and the first
    /// targetless, vanished, or inexecutable step breaks the chain.
    pub fn remaining_executable(&self, agent: &AgentState, world: &dyn WorldStore) -> Vec<PlanStep> {
        let mut salvaged = Vec::new();

        for step in self.steps.iter().skip(self.cursor) {
            let Some(target_id) = &step.target else {
                break;
            };
            let Some(target) = world.entity(target_id) else {
                break;
            };
            let mut probe = agent.clone();
            probe.set_target(Some(target_id.clone()));
            if !step.action.can_execute(&probe, world, Some(&target)) {
                break;
            }
            salvaged.push(step.clone());
        }

        salvaged
    }
}
