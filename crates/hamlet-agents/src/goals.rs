//! Goals and goal arbitration.
//!
//! A [`Goal`] pairs a static priority with a [`GoalCondition`] that
//! reads the agent's state. Arbitration works on the *final relevance*:
//! zero for achieved goals, otherwise the condition's relevance scaled
//! by `priority / 100`. Goals above the configured [`GoalThresholds`]
//! are critical and always win selection.

use std::sync::Arc;

use crate::error::GoalError;
use hamlet_types::AgentState;

/// How strongly an agent wants a goal, and whether it already holds.
pub trait GoalCondition: Send + Sync {
    /// Whether the goal is currently satisfied.
    fn achieved(&self, agent: &AgentState) -> bool;

    /// Raw relevance in `[0.0, 1.0]`, before priority scaling.
    fn relevance(&self, agent: &AgentState) -> f32;
}

/// Criticality thresholds used by goal arbitration.
///
/// A goal is critical when its final relevance exceeds `relevance` AND
/// its priority exceeds `priority`. The defaults match a 0..=100
/// priority scale; hosts using a different scale configure their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalThresholds {
    /// Final-relevance bound, exclusive.
    pub relevance: f32,
    /// Priority bound, exclusive.
    pub priority: u8,
}

impl Default for GoalThresholds {
    fn default() -> Self {
        Self {
            relevance: 0.8,
            priority: 80,
        }
    }
}

/// A named goal with a static priority and a dynamic condition.
#[derive(Clone)]
pub struct Goal {
    name: String,
    priority: u8,
    condition: Arc<dyn GoalCondition>,
}

impl std::fmt::Debug for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Goal")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl Goal {
    /// Create a goal. Priorities above 100 are clamped to 100.
    pub fn new(name: impl Into<String>, priority: u8, condition: Arc<dyn GoalCondition>) -> Self {
        Self {
            name: name.into(),
            priority: priority.min(100),
            condition,
        }
    }

    /// The goal's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The goal's priority (0..=100).
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Whether the goal is currently satisfied for this agent.
    pub fn achieved(&self, agent: &AgentState) -> bool {
        self.condition.achieved(agent)
    }

    /// Priority-scaled relevance: 0 when achieved, otherwise
    /// `relevance * priority / 100`.
    pub fn final_relevance(&self, agent: &AgentState) -> f32 {
        if self.achieved(agent) {
            return 0.0;
        }
        self.condition.relevance(agent) * f32::from(self.priority) / 100.0
    }

    /// Whether the goal is critical under the given thresholds.
    pub fn is_critical(&self, agent: &AgentState, thresholds: &GoalThresholds) -> bool {
        self.final_relevance(agent) > thresholds.relevance && self.priority > thresholds.priority
    }
}

/// An ordered collection of goals with arbitration.
///
/// Goals keep registration order; ties in final relevance resolve to
/// the earliest-registered goal.
#[derive(Debug, Default)]
pub struct GoalManager {
    goals: Vec<Goal>,
    thresholds: GoalThresholds,
}

impl GoalManager {
    /// Create an empty manager with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty manager with custom criticality thresholds.
    pub fn with_thresholds(thresholds: GoalThresholds) -> Self {
        Self {
            goals: Vec::new(),
            thresholds,
        }
    }

    /// The manager's criticality thresholds.
    pub fn thresholds(&self) -> &GoalThresholds {
        &self.thresholds
    }

    /// Add a goal; a goal of the same (case-insensitive) name is
    /// replaced in place, keeping its registration position.
    pub fn add_goal(&mut self, goal: Goal) -> Result<(), GoalError> {
        if goal.name().trim().is_empty() {
            return Err(GoalError::EmptyName);
        }
        if let Some(existing) = self
            .goals
            .iter_mut()
            .find(|g| g.name().eq_ignore_ascii_case(goal.name()))
        {
            *existing = goal;
        } else {
            self.goals.push(goal);
        }
        Ok(())
    }

    /// Select the goal to pursue: the most relevant critical goal if any
    /// goal is critical, otherwise the most relevant unachieved goal.
    pub fn select_best_goal(&self, agent: &AgentState) -> Option<&Goal> {
        self.best_of(agent, |g| g.is_critical(agent, &self.thresholds))
            .or_else(|| self.best_of(agent, |g| !g.achieved(agent)))
    }

    fn best_of(&self, agent: &AgentState, filter: impl Fn(&Goal) -> bool) -> Option<&Goal> {
        let mut best: Option<(&Goal, f32)> = None;
        for goal in self.goals.iter().filter(|g| filter(g)) {
            let relevance = goal.final_relevance(agent);
            // Strict comparison keeps the earliest-registered goal on ties.
            if best.is_none_or(|(_, r)| relevance > r) {
                best = Some((goal, relevance));
            }
        }
        best.map(|(goal, _)| goal)
    }

    /// Unachieved goals, most relevant first (stable on ties).
    pub fn achievable_goals(&self, agent: &AgentState) -> Vec<&Goal> {
        let mut goals: Vec<&Goal> = self.goals.iter().filter(|g| !g.achieved(agent)).collect();
        goals.sort_by(|a, b| b.final_relevance(agent).total_cmp(&a.final_relevance(agent)));
        goals
    }

    /// Whether any registered goal is critical for this agent.
    pub fn any_critical(&self, agent: &AgentState) -> bool {
        self.goals
            .iter()
            .any(|g| g.is_critical(agent, &self.thresholds))
    }

    /// Whether any registered goal is still unachieved.
    pub fn has_active_goals(&self, agent: &AgentState) -> bool {
        self.goals.iter().any(|g| !g.achieved(agent))
    }

    /// Look up a goal by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Goal> {
        self.goals
            .iter()
            .find(|g| g.name().eq_ignore_ascii_case(name))
    }

    /// Remove a goal by name. Returns true when it was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.goals.len();
        self.goals.retain(|g| !g.name().eq_ignore_ascii_case(name));
        self.goals.len() < before
    }

    /// Remove every goal.
    pub fn clear(&mut self) {
        self.goals.clear();
    }

    /// Number of registered goals.
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    /// True when no goals are registered.
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Iterate over the goals in registration order.
    pub fn goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FixedRelevance {
        relevance: f32,
        achieved: bool,
    }

    impl GoalCondition for FixedRelevance {
        fn achieved(&self, _agent: &AgentState) -> bool {
            self.achieved
        }

        fn relevance(&self, _agent: &AgentState) -> f32 {
            self.relevance
        }
    }

    fn goal(name: &str, priority: u8, relevance: f32) -> Goal {
        Goal::new(
            name,
            priority,
            Arc::new(FixedRelevance {
                relevance,
                achieved: false,
            }),
        )
    }

    #[test]
    fn priority_is_clamped() {
        assert_eq!(goal("g", 250, 1.0).priority(), 100);
    }

    #[test]
    fn achieved_goal_has_zero_relevance() {
        let done = Goal::new(
            "done",
            90,
            Arc::new(FixedRelevance {
                relevance: 1.0,
                achieved: true,
            }),
        );
        let agent = AgentState::new("farmer_001");
        assert_eq!(done.final_relevance(&agent), 0.0);
        assert!(!done.is_critical(&agent, &GoalThresholds::default()));
    }

    #[test]
    fn higher_priority_wins_at_equal_raw_relevance() {
        // Two unachieved goals with raw relevance 1.0: priority 5 scores
        // 0.05, priority 8 scores 0.08, so the priority-8 goal wins.
        let mut manager = GoalManager::new();
        manager.add_goal(goal("goal_a", 5, 1.0)).unwrap();
        manager.add_goal(goal("goal_b", 8, 1.0)).unwrap();

        let agent = AgentState::new("farmer_001");
        assert_eq!(
            manager.select_best_goal(&agent).unwrap().name(),
            "goal_b"
        );
    }

    #[test]
    fn critical_goal_beats_more_relevant_ordinary_goal() {
        let mut manager = GoalManager::new();
        // 0.95 final relevance but priority below the bound: not critical.
        manager.add_goal(goal("urgent_chores", 95, 1.0)).unwrap();
        // 0.85 final relevance at priority 100: critical.
        manager.add_goal(goal("survive", 100, 0.85)).unwrap();

        let agent = AgentState::new("farmer_001");
        assert!(manager.any_critical(&agent));
        assert_eq!(
            manager.select_best_goal(&agent).unwrap().name(),
            "survive"
        );
    }

    #[test]
    fn ties_resolve_to_earliest_registered() {
        let mut manager = GoalManager::new();
        manager.add_goal(goal("first", 50, 0.5)).unwrap();
        manager.add_goal(goal("second", 50, 0.5)).unwrap();

        let agent = AgentState::new("farmer_001");
        assert_eq!(manager.select_best_goal(&agent).unwrap().name(), "first");
    }

    #[test]
    fn same_name_replaces_in_place() {
        let mut manager = GoalManager::new();
        manager.add_goal(goal("first", 50, 0.5)).unwrap();
        manager.add_goal(goal("second", 50, 0.5)).unwrap();
        manager.add_goal(goal("FIRST", 70, 0.5)).unwrap();

        assert_eq!(manager.len(), 2);
        assert_eq!(manager.goals().next().unwrap().priority(), 70);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut manager = GoalManager::new();
        assert_eq!(
            manager.add_goal(goal("  ", 50, 0.5)),
            Err(GoalError::EmptyName)
        );
    }

    #[test]
    fn achievable_goals_sorted_by_relevance() {
        let mut manager = GoalManager::new();
        manager.add_goal(goal("low", 10, 1.0)).unwrap();
        manager.add_goal(goal("high", 90, 1.0)).unwrap();
        manager
            .add_goal(Goal::new(
                "done",
                100,
                Arc::new(FixedRelevance {
                    relevance: 1.0,
                    achieved: true,
                }),
            ))
            .unwrap();

        let agent = AgentState::new("farmer_001");
        let names: Vec<&str> = manager
            .achievable_goals(&agent)
            .iter()
            .map(|g| g.name())
            .collect();
        assert_eq!(names, vec!["high", "low"]);
        assert!(manager.has_active_goals(&agent));
    }

    #[test]
    fn custom_thresholds_change_criticality() {
        let agent = AgentState::new("farmer_001");
        let g = goal("modest", 60, 0.9); // final relevance 0.54

        assert!(!g.is_critical(&agent, &GoalThresholds::default()));
        assert!(g.is_critical(
            &agent,
            &GoalThresholds {
                relevance: 0.5,
                priority: 50
            }
        ));
    }
}
