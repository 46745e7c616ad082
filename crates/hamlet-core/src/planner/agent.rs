//! Per-agent planning: goal selection, plan execution, replanning.

use std::sync::Arc;

use tracing::debug;

use hamlet_agents::{ActionRegistry, Goal, GoalError, GoalManager};
use hamlet_types::AgentState;
use hamlet_world::WorldStore;

use super::plan::GoapPlan;
use super::search::{GoapPlanner, PlannerConfig};

/// Drives one agent by GOAP: selects the best goal, builds a plan,
/// executes it step by step, and replans when the world drifts.
pub struct AgentPlanner {
    world: Arc<dyn WorldStore>,
    planner: GoapPlanner,
    goals: GoalManager,
    current_plan: Option<GoapPlan>,
    current_goal: Option<Goal>,
}

impl std::fmt::Debug for AgentPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentPlanner")
            .field("goals", &self.goals.len())
            .field("has_plan", &self.current_plan.is_some())
            .finish_non_exhaustive()
    }
}

impl AgentPlanner {
    /// Create a planner over the given world with default limits.
    pub fn new(world: Arc<dyn WorldStore>) -> Self {
        Self::with_config(world, PlannerConfig::default())
    }

    /// Create a planner with explicit search limits.
    pub fn with_config(world: Arc<dyn WorldStore>, config: PlannerConfig) -> Self {
        Self {
            planner: GoapPlanner::with_config(Arc::clone(&world), config),
            world,
            goals: GoalManager::new(),
            current_plan: None,
            current_goal: None,
        }
    }

    /// Add a goal for arbitration.
    pub fn add_goal(&mut self, goal: Goal) -> Result<(), GoalError> {
        self.goals.add_goal(goal)
    }

    /// Add several goals; stops at the first invalid one.
    pub fn add_goals(&mut self, goals: impl IntoIterator<Item = Goal>) -> Result<(), GoalError> {
        for goal in goals {
            self.goals.add_goal(goal)?;
        }
        Ok(())
    }

    /// The planner's goals.
    pub fn goals(&self) -> &GoalManager {
        &self.goals
    }

    /// Mutable access to the planner's goals.
    pub fn goals_mut(&mut self) -> &mut GoalManager {
        &mut self.goals
    }

    /// Select the best goal and build a fresh plan for it.
    ///
    /// Returns false when no goal is selectable or no plan is found;
    /// the selected goal is remembered either way.
    pub fn build_plan(&mut self, agent: &AgentState, registry: &ActionRegistry) -> bool {
        let Some(goal) = self.goals.select_best_goal(agent).cloned() else {
            return false;
        };

        debug!(agent = %agent.id, goal = goal.name(), "building plan");
        self.current_plan = self.planner.build_plan(agent, &goal, registry);
        self.current_goal = Some(goal);
        self.current_plan.is_some()
    }

    /// Execute one plan step, building or repairing the plan first when
    /// needed. Returns whether a step actually ran; a failed step
    /// triggers a replan for the next call.
    pub fn execute_step(&mut self, agent: &mut AgentState, registry: &ActionRegistry) -> bool {
        if self.current_plan.as_ref().is_none_or(GoapPlan::is_completed)
            && !self.build_plan(agent, registry)
        {
            return false;
        }

        if let Some(goal) = self.current_goal.clone()
            && self.should_replan(agent)
        {
            debug!(agent = %agent.id, goal = goal.name(), "conditions changed, replanning");
            self.current_plan =
                self.planner
                    .replan(agent, &goal, self.current_plan.as_ref(), registry);
            if self.current_plan.is_none() {
                return false;
            }
        }

        let Some(plan) = self.current_plan.as_mut() else {
            return false;
        };
        let executed = plan.execute_next_step(agent, self.world.as_ref());

        if !executed && let Some(goal) = self.current_goal.clone() {
            debug!(agent = %agent.id, goal = goal.name(), "step failed, replanning");
            self.current_plan =
                self.planner
                    .replan(agent, &goal, self.current_plan.as_ref(), registry);
        }

        executed
    }

    /// Whether the plan no longer matches reality: the goal already
    /// holds, or the current step's target vanished or stopped being a
    /// valid target for its action.
    fn should_replan(&self, agent: &AgentState) -> bool {
        let (Some(goal), Some(plan)) = (&self.current_goal, &self.current_plan) else {
            return true;
        };

        if goal.achieved(agent) {
            return true;
        }

        if let Some(step) = plan.current_step()
            && let Some(target_id) = &step.target
        {
            let live = self.world.entity(target_id);
            return !live.is_some_and(|target| step.action.applicable_to(&target));
        }

        false
    }

    /// The plan currently being executed, if any.
    pub fn current_plan(&self) -> Option<&GoapPlan> {
        self.current_plan.as_ref()
    }

    /// The goal the current plan pursues, if any.
    pub fn current_goal(&self) -> Option<&Goal> {
        self.current_goal.as_ref()
    }

    /// Whether any registered goal is still unachieved.
    pub fn has_active_goals(&self, agent: &AgentState) -> bool {
        self.goals.has_active_goals(agent)
    }

    /// Drop all goals and any in-flight plan.
    pub fn clear(&mut self) {
        self.goals.clear();
        self.current_plan = None;
        self.current_goal = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_agents::catalog;
    use hamlet_types::{Entity, EntityId};
    use hamlet_world::InMemoryWorld;

    use super::*;

    fn woods() -> Arc<InMemoryWorld> {
        let mut tree = Entity::new("tree_01");
        tree.add_tag("choppable");
        tree.set_prop("hp", 10);
        Arc::new(InMemoryWorld::with_entities([tree]))
    }

    fn registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry.register(catalog::actions::chop_tree()).unwrap();
        registry
    }

    #[test]
    fn executes_a_fresh_plan_step_by_step() {
        let world = woods();
        let mut planner = AgentPlanner::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        planner.add_goal(catalog::goals::gather_wood()).unwrap();

        let mut farmer = AgentState::new("farmer_001");
        farmer.add_item("axe", 1);
        farmer.add_item("wood", 9); // one felling away from the goal

        assert!(planner.execute_step(&mut farmer, &registry()));
        assert_eq!(farmer.item_count("wood"), 14);
        assert_eq!(planner.current_goal().unwrap().name(), "gather_wood");
    }

    #[test]
    fn no_selectable_goal_means_no_step() {
        let world = woods();
        let mut planner = AgentPlanner::new(Arc::clone(&world) as Arc<dyn WorldStore>);

        let mut farmer = AgentState::new("farmer_001");
        assert!(!planner.execute_step(&mut farmer, &registry()));
        assert!(planner.current_plan().is_none());
    }

    #[test]
    fn vanished_target_forces_a_replan() {
        let mut tree_02 = Entity::new("tree_02");
        tree_02.add_tag("choppable");
        tree_02.set_prop("hp", 10);

        let world = woods();
        world.upsert(tree_02);

        let mut planner = AgentPlanner::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        planner.add_goal(catalog::goals::gather_wood()).unwrap();

        let mut farmer = AgentState::new("farmer_001");
        farmer.add_item("axe", 1);
        farmer.add_item("wood", 9);

        // Build a plan first, then fell whichever tree it picked before
        // the step runs.
        assert!(planner.build_plan(&farmer, &registry()));
        let picked = planner
            .current_plan()
            .unwrap()
            .current_step()
            .unwrap()
            .target
            .clone()
            .unwrap();
        let mut felled = world.entity(&picked).unwrap();
        felled.set_prop("hp", 0);
        felled.remove_tag("choppable");
        felled.add_tag("chopped");
        world.upsert(felled);

        // The step still runs: replanning routes around the dead tree.
        assert!(planner.execute_step(&mut farmer, &registry()));
        assert_eq!(farmer.item_count("wood"), 14);
        let other = if picked == EntityId::new("tree_01") {
            EntityId::new("tree_02")
        } else {
            EntityId::new("tree_01")
        };
        assert_eq!(farmer.current_target(), Some(&other));
    }

    #[test]
    fn clear_drops_goals_and_plan() {
        let world = woods();
        let mut planner = AgentPlanner::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        planner.add_goal(catalog::goals::gather_wood()).unwrap();

        let mut farmer = AgentState::new("farmer_001");
        farmer.add_item("axe", 1);
        farmer.add_item("wood", 9);
        assert!(planner.execute_step(&mut farmer, &registry()));

        planner.clear();
        assert!(planner.current_plan().is_none());
        assert!(planner.current_goal().is_none());
        assert!(!planner.has_active_goals(&farmer));
    }
}
