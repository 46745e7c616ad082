//! Demo entry point: one farmer's day under the integrated scheduler.
//!
//! Builds the village and the farmer, wires up the schedule, the quest
//! scenario, and the GOAP goals, then ticks hourly from morning to
//! night. Two scripted perturbations show the arbitration working: a
//! hunger spike mid-morning forces a GOAP takeover, and the quest
//! scenario starts in the afternoon and hands control back to the
//! schedule when it completes.

mod config;
mod setup;

use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hamlet_core::{IntegratedScheduler, PlannerConfig};
use hamlet_world::WorldStore;

use crate::config::EngineConfig;

/// Run the farmer's day.
///
/// # Errors
///
/// Returns an error when the configuration file is unreadable or the
/// action registry rejects a registration.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("hamlet-engine starting");

    let config = EngineConfig::from_file(Path::new("hamlet-engine.yaml"))?;
    info!(
        start_hour = config.day.start_hour,
        end_hour = config.day.end_hour,
        hunger_per_hour = config.stats.hunger_per_hour,
        energy_per_hour = config.stats.energy_per_hour,
        "configuration loaded"
    );

    let world = setup::build_world();
    let mut farmer = setup::build_farmer();
    let registry = setup::build_registry()?;

    let mut scheduler = IntegratedScheduler::with_config(
        Arc::clone(&world) as Arc<dyn WorldStore>,
        PlannerConfig {
            max_iterations: config.planner.max_iterations,
        },
    );
    scheduler.set_schedule(setup::farmer_schedule());
    scheduler.register_scenario(setup::quest_scenario());
    *scheduler.planner_mut().goals_mut() = setup::build_goals(&config.goals);

    scheduler.on_mode_changed(|mode| info!(%mode, "mode changed"));
    scheduler
        .schedule_mut()
        .on_completed(|entry| info!(action = %entry.action_name, "schedule entry done"));
    scheduler
        .schedule_mut()
        .on_skipped(|entry| warn!(action = %entry.action_name, "schedule entry skipped"));
    scheduler
        .scenarios_mut()
        .on_completed(|name| info!(scenario = %name, "scenario completed"));

    let start = Duration::hours(config.day.start_hour);
    let mut rulebook = setup::build_rulebook(&config.stats, start);

    info!(
        agent = %farmer.id,
        hunger = farmer.stat("hunger"),
        energy = farmer.stat("energy"),
        "day begins"
    );

    for hour in config.day.start_hour..=config.day.end_hour {
        let now = Duration::hours(hour);
        rulebook.update(&mut farmer, now);

        let mode = scheduler.current_mode();
        let acted = scheduler.update(&mut farmer, &registry, now);
        info!(
            hour,
            %mode,
            acted,
            hunger = farmer.stat("hunger"),
            energy = farmer.stat("energy"),
            wood = farmer.item_count("wood"),
            food = farmer.item_count("food"),
            "tick"
        );

        // Mid-morning perturbation: a sudden appetite that the planner
        // has to deal with outside the schedule.
        if hour == 10 {
            info!("hunger spike");
            farmer.set_stat("hunger", 85);
        }

        // Afternoon perturbation: the quest arrives.
        if hour == 14 && farmer.stat("quest_active") == 0 {
            farmer.set_stat("quest_active", 1);
            if !scheduler.start_scenario("quest_sequence", &mut farmer) {
                warn!("quest scenario refused to start");
            }
        }
    }

    let status = scheduler.status();
    info!(
        mode = %status.mode,
        scenario_active = status.scenario_active,
        goap_active = status.goap_active,
        goals = status.goap_goals,
        wood = farmer.item_count("wood"),
        level = farmer.stat("level"),
        "day over"
    );

    Ok(())
}
