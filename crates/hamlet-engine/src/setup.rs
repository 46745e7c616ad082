//! Demo world content: the farmer, the village, and the quest.

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use hamlet_agents::{
    catalog, ActionBehavior, ActionRegistry, GameAction, GoalManager, GoalThresholds,
    RegistryError, StatRule, StatRulebook,
};
use hamlet_core::{Scenario, ScenarioHooks, ScheduleEntry};
use hamlet_types::{AgentState, Entity};
use hamlet_world::{InMemoryWorld, WorldStore};

use crate::config::{GoalsConfig, StatsConfig};

/// Build the village: a table, three trees, a trader, a bed, and the
/// quest locations.
pub fn build_world() -> Arc<InMemoryWorld> {
    let mut table = Entity::new("table_01");
    table.add_tag("table");
    table.add_tag("eating");

    let mut trees = Vec::new();
    for id in ["tree_01", "tree_02", "tree_03"] {
        let mut tree = Entity::new(id);
        tree.add_tag("choppable");
        tree.set_prop("hp", 100);
        trees.push(tree);
    }

    let mut trader = Entity::new("trader_01");
    trader.add_tag("trader");

    let mut bed = Entity::new("bed_01");
    bed.add_tag("bed");
    bed.add_tag("resting");

    let mut quest_target = Entity::new("quest_target");
    quest_target.add_tag("quest");

    let mut quest_giver = Entity::new("quest_giver");
    quest_giver.add_tag("quest");
    quest_giver.add_tag("quest_giver");

    let world = InMemoryWorld::with_entities([table, trader, bed, quest_target, quest_giver]);
    for tree in trees {
        world.upsert(tree);
    }
    Arc::new(world)
}

/// Build the farmer: midday-ish stats, an axe, some gold, and a small
/// larder so the food goal only turns critical when hunger spikes.
pub fn build_farmer() -> AgentState {
    let mut farmer = AgentState::new("farmer_001");
    farmer.set_stat("hunger", 50);
    farmer.set_stat("energy", 80);
    farmer.set_stat("level", 1);
    farmer.set_stat("quest_active", 0);
    farmer.set_stat("social_need", 30);
    farmer.set_stat("crafting_skill", 5);

    farmer.add_item("axe", 1);
    farmer.add_item("gold", 20);
    farmer.add_item("food", 2);
    farmer
}

struct MoveTo;

impl ActionBehavior for MoveTo {
    fn apply(&self, _agent: &mut AgentState, _world: &dyn WorldStore) {
        // Movement is instantaneous in this demo; arriving is the effect.
    }
}

struct Interact;

impl ActionBehavior for Interact {
    fn apply(&self, agent: &mut AgentState, _world: &dyn WorldStore) {
        agent.modify_stat("quest_progress", 1);
    }
}

struct CompleteQuest;

impl ActionBehavior for CompleteQuest {
    fn apply(&self, agent: &mut AgentState, _world: &dyn WorldStore) {
        agent.set_stat("quest_active", 0);
        agent.modify_stat("level", 1);
        agent.add_item("gold", 10);
    }
}

/// Register the catalog actions plus the quest-only ones.
pub fn build_registry() -> Result<ActionRegistry, RegistryError> {
    let mut registry = ActionRegistry::new();
    registry.register_all([
        catalog::actions::chop_tree(),
        catalog::actions::trade(),
        catalog::actions::open_door(),
        catalog::actions::eat(),
        catalog::actions::rest(),
        GameAction::new("move_to", 1.0, Arc::new(MoveTo)),
        GameAction::new("interact", 1.0, Arc::new(Interact)),
        GameAction::new("complete_quest", 1.0, Arc::new(CompleteQuest)),
    ])?;
    Ok(registry)
}

fn at(hour: i64, minute: i64) -> Duration {
    Duration::hours(hour) + Duration::minutes(minute)
}

/// The farmer's working day: meals with busy-retries, chopping blocks
/// that refuse interruption, trade in the afternoon, bed at night.
pub fn farmer_schedule() -> Vec<ScheduleEntry> {
    vec![
        ScheduleEntry::new(at(6, 0), "eat", Some("table_01".into()))
            .retry_if_busy(Duration::minutes(10)),
        ScheduleEntry::new(at(7, 0), "chop_tree", Some("tree_01".into())).not_interruptible(),
        ScheduleEntry::new(at(9, 0), "chop_tree", Some("tree_01".into())).not_interruptible(),
        ScheduleEntry::new(at(10, 0), "eat", Some("table_01".into()))
            .retry_if_busy(Duration::minutes(15)),
        ScheduleEntry::new(at(11, 0), "chop_tree", Some("tree_02".into())),
        ScheduleEntry::new(at(13, 0), "chop_tree", Some("tree_02".into())),
        ScheduleEntry::new(at(14, 0), "trade", Some("trader_01".into()))
            .retry_if_busy(Duration::minutes(30)),
        ScheduleEntry::new(at(16, 0), "chop_tree", Some("tree_03".into())),
        ScheduleEntry::new(at(18, 0), "chop_tree", Some("tree_03".into())),
        ScheduleEntry::new(at(19, 0), "eat", Some("table_01".into()))
            .retry_if_busy(Duration::minutes(20)),
        ScheduleEntry::new(at(22, 0), "rest", Some("bed_01".into()))
            .retry_if_busy(Duration::minutes(10)),
    ]
}

struct QuestHooks;

impl ScenarioHooks for QuestHooks {
    fn can_start(&self, agent: &AgentState) -> bool {
        agent.stat("quest_active") == 1
    }

    fn on_start(&self, agent: &mut AgentState) {
        info!(agent = %agent.id, "quest begins");
    }

    fn on_complete(&self, agent: &mut AgentState) {
        info!(agent = %agent.id, level = agent.stat("level"), "quest finished");
    }

    fn on_interrupt(&self, agent: &mut AgentState) {
        info!(agent = %agent.id, "quest abandoned");
    }
}

/// The scripted quest: find the target, deal with it, report back.
pub fn quest_scenario() -> Scenario {
    Scenario::new("quest_sequence")
        .with_hooks(Arc::new(QuestHooks))
        .step_against("find_target", "move_to", "quest_target")
        .step_against("interact_with_target", "interact", "quest_target")
        .step_against("return_to_quest_giver", "move_to", "quest_giver")
        .step_against("complete_quest", "complete_quest", "quest_giver")
}

/// GOAP goals with demo-scale criticality thresholds.
pub fn build_goals(config: &GoalsConfig) -> GoalManager {
    let mut goals = GoalManager::with_thresholds(GoalThresholds {
        relevance: config.critical_relevance,
        priority: config.critical_priority,
    });
    // Registration can only fail on an empty name; these are static.
    let _ = goals.add_goal(catalog::goals::gather_wood());
    let _ = goals.add_goal(catalog::goals::get_food());
    let _ = goals.add_goal(catalog::goals::rest());
    goals
}

/// Hourly stat drift: appetite builds, work tires.
pub fn build_rulebook(config: &StatsConfig, start: Duration) -> StatRulebook {
    let mut rules = StatRulebook::new();
    rules.add_rule(
        "hunger",
        StatRule::new(config.hunger_per_hour, 0, 100, "appetite builds"),
    );
    rules.add_rule(
        "energy",
        StatRule::new(config.energy_per_hour, 0, 100, "work is tiring"),
    );
    rules.set_initial_time(start);
    rules
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hamlet_types::EntityId;

    use super::*;

    #[test]
    fn village_holds_the_expected_entities() {
        let world = build_world();
        for id in [
            "table_01", "tree_01", "tree_02", "tree_03", "trader_01", "bed_01", "quest_target",
            "quest_giver",
        ] {
            assert!(world.entity(&EntityId::new(id)).is_some(), "{id} missing");
        }
        assert!(world
            .entity(&EntityId::new("tree_02"))
            .unwrap()
            .has_tag("choppable"));
    }

    #[test]
    fn schedule_covers_the_day_in_order() {
        let schedule = farmer_schedule();
        assert_eq!(schedule.len(), 11);
        assert!(schedule.windows(2).all(|w| match w {
            [a, b] => a.time <= b.time,
            _ => true,
        }));
    }

    #[test]
    fn quest_cannot_start_before_activation() {
        let scenario = quest_scenario();
        let mut farmer = build_farmer();
        assert!(!scenario
            .steps()
            .is_empty());

        let hooks = QuestHooks;
        assert!(!hooks.can_start(&farmer));
        farmer.set_stat("quest_active", 1);
        assert!(hooks.can_start(&farmer));
    }

    #[test]
    fn food_goal_turns_critical_only_when_starving() {
        let goals = build_goals(&GoalsConfig::default());
        let mut farmer = build_farmer();
        assert!(!goals.any_critical(&farmer));

        farmer.set_stat("hunger", 85);
        assert!(goals.any_critical(&farmer));
    }
}
