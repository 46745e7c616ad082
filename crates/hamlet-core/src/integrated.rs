//! Mode arbitration across schedule, scenario, and GOAP control.
//!
//! One [`IntegratedScheduler`] owns the three behavior drivers and
//! decides, each tick, which one speaks for the agent. Priority runs
//! GOAP > scenario > schedule: a critical goal preempts everything, a
//! running scenario preempts the schedule, and the schedule fills the
//! rest of the day.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use hamlet_agents::{ActionRegistry, Goal, GoalError};
use hamlet_types::AgentState;
use hamlet_world::WorldStore;

use crate::events::Callbacks;
use crate::planner::AgentPlanner;
use crate::scenario::{Scenario, ScenarioManager, StepOutcome};
use crate::schedule::{ScheduleEntry, ScheduleManager};

/// Which driver currently controls the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Time-of-day schedule entries.
    Schedule,
    /// A scripted scenario.
    Scenario,
    /// Goal-driven planning.
    Goap,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule => f.write_str("schedule"),
            Self::Scenario => f.write_str("scenario"),
            Self::Goap => f.write_str("goap"),
        }
    }
}

/// Point-in-time snapshot of the whole scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStatus {
    /// The driver currently in control.
    pub mode: Mode,
    /// Whether the schedule is unpaused.
    pub schedule_active: bool,
    /// Number of schedule entries.
    pub schedule_entries: usize,
    /// Whether a scenario is running.
    pub scenario_active: bool,
    /// Name of the running scenario, if any.
    pub current_scenario: Option<String>,
    /// Step index of the running scenario, if any.
    pub current_step: Option<usize>,
    /// Whether GOAP currently holds control.
    pub goap_active: bool,
    /// Number of registered goals.
    pub goap_goals: usize,
}

/// Arbitrates between schedule, scenario, and GOAP control of one agent.
///
/// GOAP control is sticky: once entered it holds until a scenario
/// completes or is started explicitly, mirroring an agent that keeps
/// pursuing goals until something scripted takes over.
pub struct IntegratedScheduler {
    world: Arc<dyn WorldStore>,
    schedule: ScheduleManager,
    scenarios: ScenarioManager,
    planner: AgentPlanner,
    goap_sticky: bool,
    on_mode_changed: Callbacks<Mode>,
}

impl std::fmt::Debug for IntegratedScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegratedScheduler")
            .field("mode", &self.current_mode())
            .field("schedule", &self.schedule)
            .field("scenarios", &self.scenarios)
            .field("planner", &self.planner)
            .finish_non_exhaustive()
    }
}

impl IntegratedScheduler {
    /// Create a scheduler over the given world with empty drivers.
    pub fn new(world: Arc<dyn WorldStore>) -> Self {
        Self::with_config(world, crate::planner::PlannerConfig::default())
    }

    /// Create a scheduler with explicit plan search limits.
    pub fn with_config(world: Arc<dyn WorldStore>, config: crate::planner::PlannerConfig) -> Self {
        Self {
            planner: AgentPlanner::with_config(Arc::clone(&world), config),
            world,
            schedule: ScheduleManager::new(),
            scenarios: ScenarioManager::new(),
            goap_sticky: false,
            on_mode_changed: Callbacks::new(),
        }
    }

    /// The driver currently in control.
    pub fn current_mode(&self) -> Mode {
        if self.goap_sticky {
            Mode::Goap
        } else if self.scenarios.is_active() {
            Mode::Scenario
        } else {
            Mode::Schedule
        }
    }

    /// Run one tick at the given time of day.
    ///
    /// A critical goal seizes control for GOAP before anything runs.
    /// Returns whether the controlling driver actually executed an
    /// action this tick.
    pub fn update(
        &mut self,
        agent: &mut AgentState,
        registry: &ActionRegistry,
        now: Duration,
    ) -> bool {
        if self.planner.goals().any_critical(agent) && !self.goap_sticky {
            debug!(agent = %agent.id, "critical goal, switching to goap");
            self.enter_goap();
        }

        match self.current_mode() {
            Mode::Goap => self.planner.execute_step(agent, registry),
            Mode::Scenario => match self.scenarios.execute_next_step(agent, registry, self.world.as_ref()) {
                StepOutcome::Executed { completed } => {
                    if completed {
                        self.exit_goap();
                    }
                    true
                }
                StepOutcome::Interrupted => {
                    self.enter_goap();
                    false
                }
                StepOutcome::Idle | StepOutcome::GuardHeld => false,
            },
            Mode::Schedule => self.run_schedule(agent, registry, now),
        }
    }

    /// Run due schedule entries. Returns whether any entry executed.
    fn run_schedule(&mut self, agent: &mut AgentState, registry: &ActionRegistry, now: Duration) -> bool {
        let due = self.schedule.update_time(now);
        if !self.schedule.is_active() {
            return false;
        }

        let mut executed_any = false;
        for entry in due {
            let Some(action) = registry.get(&entry.action_name).cloned() else {
                debug!(action = %entry.action_name, "scheduled action not registered");
                self.schedule.mark_skipped(&entry.action_name, false);
                continue;
            };

            let executed = match &entry.target {
                Some(target_id) => {
                    let Some(target) = self.world.entity(target_id) else {
                        debug!(action = %entry.action_name, target = %target_id, "scheduled target missing");
                        self.schedule.mark_skipped(&entry.action_name, false);
                        continue;
                    };
                    if target.is_busy() && target.busy_by() != Some(&agent.id) {
                        self.schedule.mark_skipped(&entry.action_name, true);
                        continue;
                    }
                    agent.set_target(Some(target_id.clone()));
                    action.execute(agent, self.world.as_ref(), Some(&target))
                }
                None => action.execute(agent, self.world.as_ref(), None),
            };

            if executed {
                info!(agent = %agent.id, action = %entry.action_name, "schedule entry executed");
                self.schedule.mark_completed(&entry.action_name);
                executed_any = true;
            } else {
                self.schedule.mark_skipped(&entry.action_name, false);
            }
        }
        executed_any
    }

    /// Start a registered scenario, handing control to it on success.
    pub fn start_scenario(&mut self, name: &str, agent: &mut AgentState) -> bool {
        if !self.scenarios.start_scenario(name, agent) {
            return false;
        }
        self.goap_sticky = false;
        info!(scenario = name, "mode changed to scenario");
        self.on_mode_changed.emit(&Mode::Scenario);
        true
    }

    /// Hand control to GOAP until a scenario takes over.
    pub fn enter_goap(&mut self) {
        if !self.goap_sticky {
            self.goap_sticky = true;
            info!("mode changed to goap");
            self.on_mode_changed.emit(&Mode::Goap);
        }
    }

    /// Release GOAP control back to scenario/schedule arbitration.
    pub fn exit_goap(&mut self) {
        if self.goap_sticky {
            self.goap_sticky = false;
            let mode = self.current_mode();
            info!(%mode, "goap released");
            self.on_mode_changed.emit(&mode);
        }
    }

    /// Replace the daily schedule.
    pub fn set_schedule(&mut self, entries: Vec<ScheduleEntry>) {
        self.schedule.set_schedule(entries);
    }

    /// Register a scenario for later starting.
    pub fn register_scenario(&mut self, scenario: Scenario) {
        self.scenarios.register(scenario);
    }

    /// Add a goal for GOAP arbitration.
    pub fn add_goal(&mut self, goal: Goal) -> Result<(), GoalError> {
        self.planner.add_goal(goal)
    }

    /// Pause the schedule; scenarios and GOAP are unaffected.
    pub fn pause_schedule(&mut self) {
        self.schedule.pause();
    }

    /// Resume a paused schedule.
    pub fn resume_schedule(&mut self) {
        self.schedule.resume();
    }

    /// Snapshot the scheduler's state for display or assertions.
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            mode: self.current_mode(),
            schedule_active: self.schedule.is_active(),
            schedule_entries: self.schedule.len(),
            scenario_active: self.scenarios.is_active(),
            current_scenario: self.scenarios.current_scenario().map(str::to_owned),
            current_step: self.scenarios.current_step_index(),
            goap_active: self.goap_sticky,
            goap_goals: self.planner.goals().len(),
        }
    }

    /// Register an observer for mode changes.
    pub fn on_mode_changed(&mut self, listener: impl Fn(&Mode) + Send + 'static) {
        self.on_mode_changed.subscribe(listener);
    }

    /// The schedule driver.
    pub fn schedule(&self) -> &ScheduleManager {
        &self.schedule
    }

    /// Mutable access to the schedule driver.
    pub fn schedule_mut(&mut self) -> &mut ScheduleManager {
        &mut self.schedule
    }

    /// The scenario driver.
    pub fn scenarios(&self) -> &ScenarioManager {
        &self.scenarios
    }

    /// Mutable access to the scenario driver.
    pub fn scenarios_mut(&mut self) -> &mut ScenarioManager {
        &mut self.scenarios
    }

    /// The GOAP driver.
    pub fn planner(&self) -> &AgentPlanner {
        &self.planner
    }

    /// Mutable access to the GOAP driver.
    pub fn planner_mut(&mut self) -> &mut AgentPlanner {
        &mut self.planner
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hamlet_agents::{ActionBehavior, GameAction, GoalCondition};
    use hamlet_types::Entity;
    use hamlet_world::InMemoryWorld;

    use super::*;

    struct Nourish;

    impl ActionBehavior for Nourish {
        fn apply(&self, agent: &mut AgentState, _world: &dyn WorldStore) {
            let hunger = agent.stat("hunger");
            agent.set_stat("hunger", (hunger - 30).max(0));
        }
    }

    struct Starving;

    impl GoalCondition for Starving {
        fn achieved(&self, agent: &AgentState) -> bool {
            agent.stat("hunger") <= 40
        }

        fn relevance(&self, agent: &AgentState) -> f32 {
            if agent.stat("hunger") > 80 { 1.0 } else { 0.1 }
        }
    }

    fn table_world() -> Arc<InMemoryWorld> {
        let mut table = Entity::new("table_01");
        table.add_tag("table");
        table.add_tag("eating");
        Arc::new(InMemoryWorld::with_entities([table]))
    }

    fn eat_registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry
            .register(GameAction::new("eat", 1.0, Arc::new(Nourish)))
            .unwrap();
        registry
    }

    fn hour(h: i64) -> Duration {
        Duration::hours(h)
    }

    #[test]
    fn defaults_to_schedule_mode() {
        let scheduler = IntegratedScheduler::new(table_world());
        assert_eq!(scheduler.current_mode(), Mode::Schedule);
        let status = scheduler.status();
        assert!(status.schedule_active);
        assert!(!status.goap_active);
    }

    #[test]
    fn due_schedule_entry_executes_and_completes() {
        let world = table_world();
        let mut scheduler = IntegratedScheduler::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        scheduler.set_schedule(vec![ScheduleEntry::new(
            hour(6),
            "eat",
            Some("table_01".into()),
        )]);

        let mut farmer = AgentState::new("farmer_001");
        farmer.set_stat("hunger", 50);

        assert!(!scheduler.update(&mut farmer, &eat_registry(), hour(5)));
        assert!(scheduler.update(&mut farmer, &eat_registry(), hour(6)));
        assert_eq!(farmer.stat("hunger"), 20);
    }

    #[test]
    fn critical_goal_seizes_control_for_goap() {
        let world = table_world();
        let mut scheduler = IntegratedScheduler::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        scheduler
            .add_goal(hamlet_agents::Goal::new("eat_now", 90, Arc::new(Starving)))
            .unwrap();

        let modes = Arc::new(AtomicUsize::new(0));
        {
            let modes = Arc::clone(&modes);
            scheduler.on_mode_changed(move |_| {
                modes.fetch_add(1, Ordering::SeqCst);
            });
        }

        let mut farmer = AgentState::new("farmer_001");
        farmer.set_stat("hunger", 90);

        // eat is applicable anywhere, so the plan targets the table.
        assert!(scheduler.update(&mut farmer, &eat_registry(), hour(9)));
        assert_eq!(scheduler.current_mode(), Mode::Goap);
        assert_eq!(modes.load(Ordering::SeqCst), 1);

        // Goap stays in control even after the goal stops being critical.
        assert_eq!(farmer.stat("hunger"), 60);
        assert_eq!(scheduler.current_mode(), Mode::Goap);
    }

    #[test]
    fn scenario_completion_returns_control_to_the_schedule() {
        let world = table_world();
        let mut scheduler = IntegratedScheduler::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        scheduler.register_scenario(
            Scenario::new("supper").step_against("sit_down", "eat", "table_01"),
        );

        let mut farmer = AgentState::new("farmer_001");
        farmer.set_stat("hunger", 50);

        assert!(scheduler.start_scenario("supper", &mut farmer));
        assert_eq!(scheduler.current_mode(), Mode::Scenario);

        assert!(scheduler.update(&mut farmer, &eat_registry(), hour(12)));
        assert_eq!(scheduler.current_mode(), Mode::Schedule);
        assert_eq!(farmer.stat("hunger"), 20);
    }

    #[test]
    fn starting_a_scenario_releases_goap() {
        let world = table_world();
        let mut scheduler = IntegratedScheduler::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        scheduler.register_scenario(
            Scenario::new("supper").step_against("sit_down", "eat", "table_01"),
        );
        scheduler.enter_goap();
        assert_eq!(scheduler.current_mode(), Mode::Goap);

        let mut farmer = AgentState::new("farmer_001");
        assert!(scheduler.start_scenario("supper", &mut farmer));
        assert_eq!(scheduler.current_mode(), Mode::Scenario);
    }

    #[test]
    fn interrupted_scenario_falls_into_goap() {
        // The scenario's only step targets an entity that never existed.
        let world = table_world();
        let mut scheduler = IntegratedScheduler::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        scheduler.register_scenario(
            Scenario::new("ghost_errand").step_against("visit", "eat", "nowhere_01"),
        );

        let mut farmer = AgentState::new("farmer_001");
        assert!(scheduler.start_scenario("ghost_errand", &mut farmer));
        assert!(!scheduler.update(&mut farmer, &eat_registry(), hour(12)));
        assert_eq!(scheduler.current_mode(), Mode::Goap);
    }

    #[test]
    fn busy_target_defers_a_retrying_entry() {
        let world = table_world();
        world.try_reserve(&"table_01".into(), &"farmer_002".into());

        let mut scheduler = IntegratedScheduler::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        scheduler.set_schedule(vec![ScheduleEntry::new(
            hour(6),
            "eat",
            Some("table_01".into()),
        )
        .retry_if_busy(Duration::minutes(10))]);

        let mut farmer = AgentState::new("farmer_001");
        farmer.set_stat("hunger", 50);

        assert!(!scheduler.update(&mut farmer, &eat_registry(), hour(6)));
        assert_eq!(scheduler.schedule().retry_count("eat"), 1);

        // The table frees up before the first retry comes due.
        world.release(&"table_01".into(), &"farmer_002".into());
        assert!(scheduler.update(
            &mut farmer,
            &eat_registry(),
            hour(6) + Duration::minutes(10)
        ));
        assert_eq!(scheduler.schedule().retry_count("eat"), 0);
    }

    #[test]
    fn status_reflects_every_driver() {
        let world = table_world();
        let mut scheduler = IntegratedScheduler::new(Arc::clone(&world) as Arc<dyn WorldStore>);
        scheduler.set_schedule(vec![ScheduleEntry::new(hour(6), "eat", None)]);
        scheduler.register_scenario(
            Scenario::new("supper").step_against("sit_down", "eat", "table_01"),
        );
        scheduler
            .add_goal(hamlet_agents::Goal::new("eat_now", 90, Arc::new(Starving)))
            .unwrap();

        let mut farmer = AgentState::new("farmer_001");
        scheduler.start_scenario("supper", &mut farmer);

        let status = scheduler.status();
        assert_eq!(status.mode, Mode::Scenario);
        assert_eq!(status.schedule_entries, 1);
        assert_eq!(status.current_scenario.as_deref(), Some("supper"));
        assert_eq!(status.current_step, Some(0));
        assert_eq!(status.goap_goals, 1);
        assert!(!status.goap_active);
    }
}
