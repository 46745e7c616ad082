//! Best-first plan search.

use std::collections::{BTreeSet, BinaryHeap};
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use hamlet_agents::{ActionRegistry, Goal};
use hamlet_types::{AgentState, Entity};
use hamlet_world::{InMemoryWorld, WorldStore};

use super::node::{GoapNode, OpenEntry};
use super::plan::{GoapPlan, PlanStep};

/// Search limits.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Maximum nodes popped from the open set before giving up.
    pub max_iterations: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
        }
    }
}

/// Searches for the cheapest action sequence that achieves a goal.
///
/// Expansion applies real action effects, so each search runs against a
/// private scratch copy of the world; the live store is never touched.
/// Effects written to the scratch copy stay visible for the rest of the
/// search, so plans may rely on the cumulative consequences of earlier
/// expansions.
pub struct GoapPlanner {
    world: Arc<dyn WorldStore>,
    config: PlannerConfig,
}

impl std::fmt::Debug for GoapPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoapPlanner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GoapPlanner {
    /// Create a planner over the given world with default limits.
    pub fn new(world: Arc<dyn WorldStore>) -> Self {
        Self::with_config(world, PlannerConfig::default())
    }

    /// Create a planner with explicit limits.
    pub fn with_config(world: Arc<dyn WorldStore>, config: PlannerConfig) -> Self {
        Self { world, config }
    }

    /// The search limits in effect.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Search for a plan that achieves `goal` from the agent's current
    /// state. Returns `None` when no plan is found within the
    /// iteration cap. A goal that already holds yields an empty,
    /// completed plan.
    pub fn build_plan(
        &self,
        agent: &AgentState,
        goal: &Goal,
        registry: &ActionRegistry,
    ) -> Option<GoapPlan> {
        let scratch = InMemoryWorld::snapshot_of(self.world.as_ref());

        let mut arena = vec![GoapNode::root(agent.clone())];
        let mut open = BinaryHeap::new();
        let mut closed: BTreeSet<String> = BTreeSet::new();
        open.push(OpenEntry { f: 0.0, node: 0 });

        let mut iterations = 0_usize;

        while let Some(entry) = open.pop() {
            if iterations >= self.config.max_iterations {
                break;
            }
            iterations = iterations.saturating_add(1);

            let Some(current) = arena.get(entry.node) else {
                break;
            };

            if goal.achieved(&current.state) {
                debug!(
                    goal = goal.name(),
                    agent = %agent.id,
                    iterations,
                    "plan found"
                );
                return Some(GoapPlan::new(materialize(&arena, entry.node), goal.clone()));
            }

            if !closed.insert(state_hash(&current.state)) {
                continue;
            }

            // Expansion reads from the arena and pushes into it, so the
            // parent's fields are copied out first.
            let parent_state = current.state.clone();
            let parent_g = current.g;
            let parent = entry.node;

            let targets: Vec<Entity> = scratch
                .all_entities()
                .into_iter()
                .filter(|e| !e.is_busy() || e.busy_by() == Some(&agent.id))
                .collect();

            for action in registry.actions() {
                for target in &targets {
                    if !action.applicable_to(target) {
                        continue;
                    }

                    let mut child_state = parent_state.clone();
                    child_state.set_target(Some(target.id().clone()));
                    if !action.execute(&mut child_state, &scratch, Some(target)) {
                        continue;
                    }
                    if closed.contains(&state_hash(&child_state)) {
                        continue;
                    }

                    let h = if goal.achieved(&child_state) { 0.0 } else { 1.0 };
                    let g = parent_g + action.cost();
                    arena.push(GoapNode {
                        state: child_state,
                        g,
                        h,
                        parent: Some(parent),
                        edge: Some((action.clone(), target.id().clone())),
                    });
                    open.push(OpenEntry {
                        f: g + h,
                        node: arena.len().saturating_sub(1),
                    });
                }
            }
        }

        debug!(goal = goal.name(), agent = %agent.id, iterations, "no plan found");
        None
    }

    /// Replan cheaply: when the goal is still unachieved and a prefix of
    /// the current plan remains executable, reuse that prefix as a fresh
    /// plan; otherwise run a full search.
    pub fn replan(
        &self,
        agent: &AgentState,
        goal: &Goal,
        current: Option<&GoapPlan>,
        registry: &ActionRegistry,
    ) -> Option<GoapPlan> {
        if let Some(plan) = current
            && !goal.achieved(agent)
        {
            let salvaged = plan.remaining_executable(agent, self.world.as_ref());
            if !salvaged.is_empty() {
                debug!(goal = goal.name(), steps = salvaged.len(), "plan prefix salvaged");
                return Some(GoapPlan::new(salvaged, goal.clone()));
            }
        }

        self.build_plan(agent, goal, registry)
    }
}

/// Walk parent links from a goal node back to the root, collecting the
/// producing edges in execution order.
fn materialize(arena: &[GoapNode], goal_node: usize) -> Vec<PlanStep> {
    let mut steps = Vec::new();
    let mut cursor = arena.get(goal_node);

    while let Some(node) = cursor {
        if let Some((action, target)) = &node.edge {
            steps.push(PlanStep {
                action: action.clone(),
                target: Some(target.clone()),
            });
        }
        cursor = node.parent.and_then(|idx| arena.get(idx));
    }

    steps.reverse();
    steps
}

/// Canonical visited-state key: agent id plus sorted stats, inventory,
/// and skills. The current target and entity state are deliberately not
/// part of the key; two states differing only in target are treated as
/// the same node.
fn state_hash(state: &AgentState) -> String {
    let mut hash = String::new();
    let _ = write!(hash, "{}", state.id);
    for (stat, value) in state.stats() {
        let _ = write!(hash, "|{stat}:{value}");
    }
    hash.push('#');
    for (item, count) in state.inventory() {
        let _ = write!(hash, "|{item}:{count}");
    }
    hash.push('#');
    for skill in state.skills() {
        let _ = write!(hash, "|{skill}");
    }
    hash
}
