//! Ready-made actions and goals for demos and tests.
//!
//! The behaviors here follow one convention: an action that works on an
//! entity reads the agent's current target, validates it against the
//! live world in `can_perform`, and re-fetches it in `apply` (the target
//! may have changed between planning and execution).

/// Action constructors.
pub mod actions {
    use std::sync::Arc;

    use hamlet_types::{AgentState, Entity};
    use hamlet_world::WorldStore;

    use crate::actions::{ActionBehavior, GameAction};

    /// Fetch the agent's current target from the world, if it resolves.
    fn current_target(agent: &AgentState, world: &dyn WorldStore) -> Option<Entity> {
        agent.current_target().and_then(|id| world.entity(id))
    }

    struct ChopTree;

    impl ActionBehavior for ChopTree {
        fn can_perform(&self, agent: &AgentState, world: &dyn WorldStore) -> bool {
            current_target(agent, world).is_some_and(|target| {
                target.has_tag("choppable") && !target.is_busy() && agent.has_item("axe")
            })
        }

        fn apply(&self, agent: &mut AgentState, world: &dyn WorldStore) {
            let Some(mut target) = current_target(agent, world) else {
                return;
            };
            let hp = target.prop_i64("hp").unwrap_or(100);
            let hp = hp.saturating_sub(10).max(0);
            target.set_prop("hp", hp);
            if hp == 0 {
                agent.add_item("wood", 5);
                target.remove_tag("choppable");
                target.add_tag("chopped");
            }
            world.upsert(target);
        }

        fn applicable_to(&self, target: &Entity) -> bool {
            target.has_tag("choppable") && !target.is_busy()
        }
    }

    /// Chop the targeted tree: 10 hp per swing, 5 wood when it falls.
    /// Requires an axe.
    pub fn chop_tree() -> GameAction {
        GameAction::new("chop_tree", 5.0, Arc::new(ChopTree))
    }

    struct Trade;

    impl ActionBehavior for Trade {
        fn can_perform(&self, agent: &AgentState, world: &dyn WorldStore) -> bool {
            current_target(agent, world).is_some_and(|target| {
                target.has_tag("trader") && !target.is_busy() && agent.has_item("gold")
            })
        }

        fn apply(&self, agent: &mut AgentState, _world: &dyn WorldStore) {
            if agent.item_count("gold") >= 10 && agent.remove_item("gold", 10) {
                agent.add_item("food", 3);
            }
        }

        fn applicable_to(&self, target: &Entity) -> bool {
            target.has_tag("trader") && !target.is_busy()
        }
    }

    /// Exchange 10 gold for 3 food at the targeted trader.
    pub fn trade() -> GameAction {
        GameAction::new("trade", 2.0, Arc::new(Trade))
    }

    struct OpenDoor;

    impl ActionBehavior for OpenDoor {
        fn can_perform(&self, agent: &AgentState, world: &dyn WorldStore) -> bool {
            current_target(agent, world)
                .is_some_and(|target| target.has_tag("door") && !target.is_busy())
        }

        fn apply(&self, agent: &mut AgentState, world: &dyn WorldStore) {
            let Some(mut target) = current_target(agent, world) else {
                return;
            };
            target.set_prop("is_open", true);
            target.remove_tag("closed");
            target.add_tag("open");
            world.upsert(target);
        }

        fn applicable_to(&self, target: &Entity) -> bool {
            target.has_tag("door") && !target.is_busy()
        }
    }

    /// Open the targeted door.
    pub fn open_door() -> GameAction {
        GameAction::new("open_door", 1.0, Arc::new(OpenDoor))
    }

    struct Eat;

    impl ActionBehavior for Eat {
        fn apply(&self, agent: &mut AgentState, _world: &dyn WorldStore) {
            let hunger = agent.stat("hunger").saturating_sub(30).max(0);
            agent.set_stat("hunger", hunger);
        }

        fn applicable_to(&self, target: &Entity) -> bool {
            target.has_tag("eating")
        }
    }

    /// Eat a meal: hunger drops by 30, floored at 0.
    pub fn eat() -> GameAction {
        GameAction::new("eat", 1.0, Arc::new(Eat))
    }

    struct Rest;

    impl ActionBehavior for Rest {
        fn apply(&self, agent: &mut AgentState, _world: &dyn WorldStore) {
            let energy = agent.stat("energy").saturating_add(40).min(100);
            agent.set_stat("energy", energy);
        }

        fn applicable_to(&self, target: &Entity) -> bool {
            target.has_tag("resting")
        }
    }

    /// Rest: energy rises by 40, capped at 100.
    pub fn rest() -> GameAction {
        GameAction::new("rest", 1.0, Arc::new(Rest))
    }
}

/// Goal constructors.
#[allow(clippy::cast_precision_loss)]
pub mod goals {
    use std::sync::Arc;

    use hamlet_types::AgentState;

    use crate::goals::{Goal, GoalCondition};

    struct GatherWood;

    impl GoalCondition for GatherWood {
        fn achieved(&self, agent: &AgentState) -> bool {
            agent.item_count("wood") >= 10
        }

        fn relevance(&self, agent: &AgentState) -> f32 {
            let wood = agent.item_count("wood");
            if wood >= 10 {
                return 0.0;
            }
            // The less wood on hand, the more the goal matters.
            (1.0 - wood as f32 / 10.0).max(0.1)
        }
    }

    /// Stockpile 10 wood (priority 5).
    pub fn gather_wood() -> Goal {
        Goal::new("gather_wood", 5, Arc::new(GatherWood))
    }

    struct GetFood;

    impl GoalCondition for GetFood {
        fn achieved(&self, agent: &AgentState) -> bool {
            agent.item_count("food") >= 5
        }

        fn relevance(&self, agent: &AgentState) -> f32 {
            let food = agent.item_count("food");
            if food >= 5 {
                return 0.0;
            }
            let hunger = agent.stat("hunger");
            if hunger > 80 {
                return 1.0;
            }
            if hunger > 60 {
                return 0.8;
            }
            (1.0 - food as f32 / 5.0).max(0.2)
        }
    }

    /// Keep 5 food on hand; spikes to full relevance when starving
    /// (priority 8).
    pub fn get_food() -> Goal {
        Goal::new("get_food", 8, Arc::new(GetFood))
    }

    struct Rest;

    impl GoalCondition for Rest {
        fn achieved(&self, agent: &AgentState) -> bool {
            agent.stat("energy") >= 80
        }

        fn relevance(&self, agent: &AgentState) -> f32 {
            let energy = agent.stat("energy");
            if energy >= 80 {
                return 0.0;
            }
            if energy < 20 {
                return 0.9;
            }
            if energy < 40 {
                return 0.7;
            }
            ((80 - energy) as f32 / 80.0).max(0.1)
        }
    }

    /// Recover to 80 energy (priority 3).
    pub fn rest() -> Goal {
        Goal::new("rest", 3, Arc::new(Rest))
    }

    struct BuildHouse;

    impl GoalCondition for BuildHouse {
        fn achieved(&self, agent: &AgentState) -> bool {
            agent.item_count("house") >= 1
        }

        fn relevance(&self, agent: &AgentState) -> f32 {
            if agent.item_count("wood") < 20 || agent.item_count("stone") < 15 {
                return 0.1;
            }
            0.6
        }
    }

    /// Build a house once 20 wood and 15 stone are stockpiled
    /// (priority 10).
    pub fn build_house() -> Goal {
        Goal::new("build_house", 10, Arc::new(BuildHouse))
    }

    struct Trade;

    impl GoalCondition for Trade {
        fn achieved(&self, agent: &AgentState) -> bool {
            agent.stat("wealth") >= 100
        }

        fn relevance(&self, agent: &AgentState) -> f32 {
            if agent.stat("wealth") >= 100 {
                return 0.0;
            }
            if agent.item_count("gold") > 0 {
                return 0.5;
            }
            0.2
        }
    }

    /// Accumulate 100 wealth (priority 4).
    pub fn trade() -> Goal {
        Goal::new("trade", 4, Arc::new(Trade))
    }
}
