//! Scripted scenarios.
//!
//! A [`Scenario`] is a fixed step sequence with lifecycle hooks. The
//! [`ScenarioManager`] runs at most one scenario at a time (Idle or
//! Running), advancing one step per tick. Any failure along a step --
//! unresolvable target, unknown action, vanished entity, refused
//! execution -- interrupts the whole scenario; only a held guard merely
//! waits.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use hamlet_agents::ActionRegistry;
use hamlet_types::{AgentState, EntityId};
use hamlet_world::WorldStore;

use crate::events::Callbacks;

/// Lifecycle hooks of one scenario.
///
/// All hooks default to no-ops and `can_start` to true; scenarios that
/// need behavior implement only what they use.
pub trait ScenarioHooks: Send + Sync {
    /// Gate checked by `start_scenario` before anything changes.
    fn can_start(&self, _agent: &AgentState) -> bool {
        true
    }

    /// Runs once when the scenario starts.
    fn on_start(&self, _agent: &mut AgentState) {}

    /// Runs once when the last step completes.
    fn on_complete(&self, _agent: &mut AgentState) {}

    /// Runs once when the scenario is interrupted.
    fn on_interrupt(&self, _agent: &mut AgentState) {}
}

/// Hook set with every default.
#[derive(Debug, Default)]
pub struct DefaultHooks;

impl ScenarioHooks for DefaultHooks {}

/// How a step finds its target entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTarget {
    /// A fixed entity id.
    Entity(EntityId),
    /// The first non-busy entity carrying this tag, in store order.
    Tag(String),
}

/// Guard closure deciding whether a step may proceed yet.
pub type StepGuard = Arc<dyn Fn(&AgentState) -> bool + Send + Sync>;

/// One step of a scenario: run `action_name` against a resolved target.
#[derive(Clone)]
pub struct ScenarioStep {
    /// Step name, for logs and diagnostics.
    pub name: String,
    /// Name of the registered action to run.
    pub action_name: String,
    /// How the target entity is found.
    pub target: StepTarget,
    /// Optional wait condition; a false guard holds the step without
    /// interrupting the scenario.
    pub guard: Option<StepGuard>,
    /// Whether a critical goal may preempt this step.
    pub interruptible: bool,
    /// Whether the scenario waits on this step until it executes.
    pub wait_for_completion: bool,
}

impl std::fmt::Debug for ScenarioStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioStep")
            .field("name", &self.name)
            .field("action_name", &self.action_name)
            .field("target", &self.target)
            .field("guarded", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

impl ScenarioStep {
    /// Create an unguarded, interruptible step.
    pub fn new(name: impl Into<String>, action_name: impl Into<String>, target: StepTarget) -> Self {
        Self {
            name: name.into(),
            action_name: action_name.into(),
            target,
            guard: None,
            interruptible: true,
            wait_for_completion: true,
        }
    }

    /// Attach a wait condition to the step.
    pub fn guarded(mut self, guard: impl Fn(&AgentState) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    fn resolve_target(&self, world: &dyn WorldStore) -> Option<EntityId> {
        match &self.target {
            StepTarget::Entity(id) => Some(id.clone()),
            StepTarget::Tag(tag) => world
                .all_entities()
                .into_iter()
                .find(|e| e.has_tag(tag) && !e.is_busy())
                .map(|e| e.id().clone()),
        }
    }
}

/// A named, fixed sequence of steps with hooks.
///
/// The scenario itself is a static template; the running cursor lives
/// in the [`ScenarioManager`].
#[derive(Clone)]
pub struct Scenario {
    name: String,
    steps: Vec<ScenarioStep>,
    hooks: Arc<dyn ScenarioHooks>,
    looping: bool,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("steps", &self.steps.len())
            .field("looping", &self.looping)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Create an empty scenario with default hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            hooks: Arc::new(DefaultHooks),
            looping: false,
        }
    }

    /// Replace the scenario's hooks.
    pub fn with_hooks(mut self, hooks: Arc<dyn ScenarioHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Restart at the first step after completing instead of stopping.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Append a step.
    pub fn step(mut self, step: ScenarioStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a plain step against a fixed entity.
    pub fn step_against(
        self,
        name: impl Into<String>,
        action_name: impl Into<String>,
        target: impl Into<EntityId>,
    ) -> Self {
        self.step(ScenarioStep::new(
            name,
            action_name,
            StepTarget::Entity(target.into()),
        ))
    }

    /// The scenario's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scenario's steps in order.
    pub fn steps(&self) -> &[ScenarioStep] {
        &self.steps
    }

    /// Whether the scenario restarts after completing.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    fn hooks(&self) -> &dyn ScenarioHooks {
        self.hooks.as_ref()
    }
}

/// Outcome of one scenario tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No scenario is running.
    Idle,
    /// The current step's guard is false; nothing changed.
    GuardHeld,
    /// The step executed; `completed` is set when it was the last one.
    Executed {
        /// Whether this step completed the scenario.
        completed: bool,
    },
    /// The step failed and the scenario was interrupted.
    Interrupted,
}

/// Registers scenarios and runs at most one at a time.
#[derive(Debug, Default)]
pub struct ScenarioManager {
    scenarios: BTreeMap<String, Scenario>,
    current: Option<(Scenario, usize)>,
    on_started: Callbacks<String>,
    on_completed: Callbacks<String>,
    on_interrupted: Callbacks<String>,
}

impl ScenarioManager {
    /// Create an empty, idle manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scenario under its (case-insensitive) name, replacing
    /// any previous scenario of that name.
    pub fn register(&mut self, scenario: Scenario) {
        self.scenarios
            .insert(scenario.name().to_ascii_lowercase(), scenario);
    }

    /// Register several scenarios.
    pub fn register_all(&mut self, scenarios: impl IntoIterator<Item = Scenario>) {
        for scenario in scenarios {
            self.register(scenario);
        }
    }

    /// Start a registered scenario.
    ///
    /// Returns false, changing nothing, when the name is unknown or the
    /// scenario's start gate refuses. Otherwise any running scenario is
    /// interrupted first (its interrupt hook and callbacks fire exactly
    /// once), and the new scenario enters at step 0 with its start hook
    /// and the started callbacks.
    pub fn start_scenario(&mut self, name: &str, agent: &mut AgentState) -> bool {
        let Some(scenario) = self.scenarios.get(&name.to_ascii_lowercase()).cloned() else {
            debug!(scenario = name, "unknown scenario");
            return false;
        };
        if !scenario.hooks().can_start(agent) {
            debug!(scenario = name, agent = %agent.id, "start gate refused");
            return false;
        }

        self.interrupt_current(agent);

        info!(scenario = scenario.name(), agent = %agent.id, "scenario started");
        scenario.hooks().on_start(agent);
        self.on_started.emit(&scenario.name().to_owned());
        self.current = Some((scenario, 0));
        true
    }

    /// Run one tick of the current scenario.
    pub fn execute_next_step(
        &mut self,
        agent: &mut AgentState,
        registry: &ActionRegistry,
        world: &dyn WorldStore,
    ) -> StepOutcome {
        let Some((scenario, cursor)) = &self.current else {
            return StepOutcome::Idle;
        };
        let step_count = scenario.steps().len();
        let Some(step) = scenario.steps().get(*cursor).cloned() else {
            return StepOutcome::Idle;
        };

        if let Some(guard) = &step.guard
            && !guard(agent)
        {
            debug!(step = %step.name, "step guard held");
            return StepOutcome::GuardHeld;
        }

        let Some(target_id) = step.resolve_target(world) else {
            debug!(step = %step.name, "no target available");
            self.interrupt_current(agent);
            return StepOutcome::Interrupted;
        };
        agent.set_target(Some(target_id.clone()));

        let Some(action) = registry.get(&step.action_name) else {
            debug!(step = %step.name, action = %step.action_name, "action not registered");
            self.interrupt_current(agent);
            return StepOutcome::Interrupted;
        };
        let Some(target) = world.entity(&target_id) else {
            debug!(step = %step.name, target = %target_id, "target vanished");
            self.interrupt_current(agent);
            return StepOutcome::Interrupted;
        };
        if !action.can_execute(agent, world, Some(&target)) {
            debug!(step = %step.name, "action not executable");
            self.interrupt_current(agent);
            return StepOutcome::Interrupted;
        }

        if !action.execute(agent, world, Some(&target)) {
            self.interrupt_current(agent);
            return StepOutcome::Interrupted;
        }

        let next = cursor.saturating_add(1);
        if next >= step_count {
            self.complete_current(agent);
            return StepOutcome::Executed { completed: true };
        }
        if let Some((_, cursor)) = &mut self.current {
            *cursor = next;
        }
        StepOutcome::Executed { completed: false }
    }

    /// Interrupt the running scenario, if any. Idempotent.
    pub fn interrupt_current(&mut self, agent: &mut AgentState) {
        if let Some((scenario, _)) = self.current.take() {
            info!(scenario = scenario.name(), agent = %agent.id, "scenario interrupted");
            scenario.hooks().on_interrupt(agent);
            self.on_interrupted.emit(&scenario.name().to_owned());
        }
    }

    fn complete_current(&mut self, agent: &mut AgentState) {
        let Some((scenario, cursor)) = &mut self.current else {
            return;
        };
        info!(scenario = scenario.name(), agent = %agent.id, "scenario completed");
        scenario.hooks().on_complete(agent);
        let name = scenario.name().to_owned();
        if scenario.is_looping() {
            *cursor = 0;
        } else {
            self.current = None;
        }
        self.on_completed.emit(&name);
    }

    /// Whether a scenario is currently running.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Name of the running scenario, if any.
    pub fn current_scenario(&self) -> Option<&str> {
        self.current.as_ref().map(|(s, _)| s.name())
    }

    /// Index of the step the running scenario sits at, if any.
    pub fn current_step_index(&self) -> Option<usize> {
        self.current.as_ref().map(|(_, cursor)| *cursor)
    }

    /// Look up a registered scenario (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.get(&name.to_ascii_lowercase())
    }

    /// Remove a registered scenario, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Scenario> {
        self.scenarios.remove(&name.to_ascii_lowercase())
    }

    /// Drop every registered scenario and the running one, without
    /// firing interrupt hooks.
    pub fn clear(&mut self) {
        self.scenarios.clear();
        self.current = None;
    }

    /// Number of registered scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// True when no scenarios are registered.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Register an observer for scenario starts.
    pub fn on_started(&mut self, listener: impl Fn(&String) + Send + 'static) {
        self.on_started.subscribe(listener);
    }

    /// Register an observer for scenario completions.
    pub fn on_completed(&mut self, listener: impl Fn(&String) + Send + 'static) {
        self.on_completed.subscribe(listener);
    }

    /// Register an observer for scenario interruptions.
    pub fn on_interrupted(&mut self, listener: impl Fn(&String) + Send + 'static) {
        self.on_interrupted.subscribe(listener);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use hamlet_agents::{ActionBehavior, GameAction};
    use hamlet_types::Entity;
    use hamlet_world::InMemoryWorld;

    use super::*;

    struct Greet;

    impl ActionBehavior for Greet {
        fn apply(&self, agent: &mut AgentState, _world: &dyn WorldStore) {
            agent.modify_stat("greetings", 1);
        }
    }

    fn registry() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry
            .register(GameAction::new("greet", 1.0, Arc::new(Greet)))
            .unwrap();
        registry
    }

    fn village() -> InMemoryWorld {
        let mut guide = Entity::new("guide_01");
        guide.add_tag("guide");
        InMemoryWorld::with_entities([guide, Entity::new("village_center")])
    }

    fn intro() -> Scenario {
        Scenario::new("intro_scene")
            .step_against("approach_guide", "greet", "guide_01")
            .step_against("leave_guide", "greet", "village_center")
    }

    #[derive(Default)]
    struct RecordingHooks {
        log: Mutex<Vec<&'static str>>,
    }

    impl ScenarioHooks for RecordingHooks {
        fn on_start(&self, _agent: &mut AgentState) {
            self.log.lock().unwrap().push("start");
        }

        fn on_complete(&self, _agent: &mut AgentState) {
            self.log.lock().unwrap().push("complete");
        }

        fn on_interrupt(&self, _agent: &mut AgentState) {
            self.log.lock().unwrap().push("interrupt");
        }
    }

    #[test]
    fn runs_steps_in_order_to_completion() {
        let world = village();
        let registry = registry();
        let mut manager = ScenarioManager::new();
        manager.register(intro());
        let mut villager = AgentState::new("villager_01");

        assert!(manager.start_scenario("Intro_Scene", &mut villager));
        assert_eq!(manager.current_step_index(), Some(0));

        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::Executed { completed: false }
        );
        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::Executed { completed: true }
        );
        assert!(!manager.is_active());
        assert_eq!(villager.stat("greetings"), 2);
        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::Idle
        );
    }

    #[test]
    fn unknown_scenario_does_not_start() {
        let mut manager = ScenarioManager::new();
        let mut villager = AgentState::new("villager_01");
        assert!(!manager.start_scenario("missing", &mut villager));
        assert!(!manager.is_active());
    }

    #[test]
    fn start_gate_refusal_changes_nothing() {
        struct Gated;
        impl ScenarioHooks for Gated {
            fn can_start(&self, agent: &AgentState) -> bool {
                agent.stat("level") >= 2
            }
        }

        let mut manager = ScenarioManager::new();
        manager.register(intro().with_hooks(Arc::new(Gated)));
        let mut villager = AgentState::new("villager_01");

        assert!(!manager.start_scenario("intro_scene", &mut villager));
        villager.set_stat("level", 2);
        assert!(manager.start_scenario("intro_scene", &mut villager));
    }

    #[test]
    fn held_guard_waits_without_side_effects() {
        let world = village();
        let registry = registry();
        let mut manager = ScenarioManager::new();
        manager.register(
            Scenario::new("patient").step(
                ScenarioStep::new("wait_for_dawn", "greet", StepTarget::Entity("guide_01".into()))
                    .guarded(|agent| agent.stat("awake") == 1),
            ),
        );
        let mut villager = AgentState::new("villager_01");
        manager.start_scenario("patient", &mut villager);

        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::GuardHeld
        );
        assert!(manager.is_active());
        assert_eq!(manager.current_step_index(), Some(0));

        villager.set_stat("awake", 1);
        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::Executed { completed: true }
        );
    }

    #[test]
    fn vanished_target_interrupts_exactly_once() {
        let world = InMemoryWorld::new(); // guide_01 does not exist
        let registry = registry();
        let interrupts = Arc::new(AtomicUsize::new(0));

        let mut manager = ScenarioManager::new();
        manager.register(intro());
        {
            let interrupts = Arc::clone(&interrupts);
            manager.on_interrupted(move |_| {
                interrupts.fetch_add(1, Ordering::SeqCst);
            });
        }

        let mut villager = AgentState::new("villager_01");
        manager.start_scenario("intro_scene", &mut villager);
        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::Interrupted
        );
        assert!(!manager.is_active());
        assert_eq!(interrupts.load(Ordering::SeqCst), 1);

        // Further interrupts are no-ops.
        manager.interrupt_current(&mut villager);
        assert_eq!(interrupts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn starting_over_a_running_scenario_interrupts_it_first() {
        let world = village();
        let registry = registry();
        let hooks = Arc::new(RecordingHooks::default());
        let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let mut manager = ScenarioManager::new();
        manager.register(intro().with_hooks(Arc::clone(&hooks) as Arc<dyn ScenarioHooks>));
        manager.register(Scenario::new("errand").step_against("visit", "greet", "guide_01"));
        {
            let order = Arc::clone(&order);
            manager.on_interrupted(move |name| order.lock().unwrap().push(format!("int:{name}")));
        }
        {
            let order = Arc::clone(&order);
            manager.on_started(move |name| order.lock().unwrap().push(format!("start:{name}")));
        }

        let mut villager = AgentState::new("villager_01");
        assert!(manager.start_scenario("intro_scene", &mut villager));
        assert!(manager.start_scenario("errand", &mut villager));

        assert_eq!(manager.current_scenario(), Some("errand"));
        assert_eq!(hooks.log.lock().unwrap().as_slice(), ["start", "interrupt"]);
        assert_eq!(
            order.lock().unwrap().as_slice(),
            [
                "start:intro_scene".to_owned(),
                "int:intro_scene".to_owned(),
                "start:errand".to_owned()
            ]
        );
    }

    #[test]
    fn looping_scenario_restarts_at_step_zero() {
        let world = village();
        let registry = registry();
        let mut manager = ScenarioManager::new();
        manager.register(
            Scenario::new("rounds")
                .looping()
                .step_against("visit", "greet", "guide_01"),
        );

        let mut villager = AgentState::new("villager_01");
        manager.start_scenario("rounds", &mut villager);

        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::Executed { completed: true }
        );
        assert!(manager.is_active());
        assert_eq!(manager.current_step_index(), Some(0));
    }

    #[test]
    fn tag_targets_resolve_to_first_free_entity() {
        let world = village();
        let registry = registry();
        let mut manager = ScenarioManager::new();
        manager.register(
            Scenario::new("find_guide").step(ScenarioStep::new(
                "find",
                "greet",
                StepTarget::Tag("guide".into()),
            )),
        );

        let mut villager = AgentState::new("villager_01");
        manager.start_scenario("find_guide", &mut villager);
        assert_eq!(
            manager.execute_next_step(&mut villager, &registry, &world),
            StepOutcome::Executed { completed: true }
        );
        assert_eq!(villager.current_target(), Some(&EntityId::new("guide_01")));
    }
}
