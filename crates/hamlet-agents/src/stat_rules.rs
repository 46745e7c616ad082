//! Time-driven stat changes.
//!
//! A [`StatRulebook`] applies per-hour deltas to an agent's stats,
//! clamped to each rule's bounds. Updates happen only after at least one
//! whole hour has elapsed since the last application.

use std::collections::BTreeMap;

use chrono::Duration;
use tracing::debug;

use hamlet_types::AgentState;

/// A per-hour change applied to one stat, clamped to `[min, max]`.
#[derive(Debug, Clone)]
pub struct StatRule {
    /// Signed change applied per elapsed hour.
    pub change_per_hour: i64,
    /// Lower clamp bound.
    pub min: i64,
    /// Upper clamp bound.
    pub max: i64,
    /// Human-readable description for logs and diagnostics.
    pub description: String,
}

impl StatRule {
    /// Create a rule.
    pub fn new(change_per_hour: i64, min: i64, max: i64, description: impl Into<String>) -> Self {
        Self {
            change_per_hour,
            min,
            max,
            description: description.into(),
        }
    }
}

/// Rules keyed by stat name (lowercase), plus the update clock.
#[derive(Debug, Default)]
pub struct StatRulebook {
    rules: BTreeMap<String, StatRule>,
    last_update: Duration,
}

impl StatRulebook {
    /// Create an empty rulebook with the clock at midnight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for a stat (case-insensitive).
    pub fn add_rule(&mut self, stat: &str, rule: StatRule) {
        self.rules.insert(stat.to_ascii_lowercase(), rule);
    }

    /// Seed the update clock, typically with the simulation's start time.
    pub fn set_initial_time(&mut self, time: Duration) {
        self.last_update = time;
    }

    /// Apply every rule for the whole hours elapsed since the last
    /// update. Does nothing (and keeps the clock) when less than an
    /// hour has passed.
    pub fn update(&mut self, agent: &mut AgentState, now: Duration) {
        let hours = (now - self.last_update).num_hours();
        if hours < 1 {
            return;
        }

        for (stat, rule) in &self.rules {
            let current = agent.stat(stat);
            let change = rule.change_per_hour.saturating_mul(hours);
            let value = current.saturating_add(change).clamp(rule.min, rule.max);
            agent.set_stat(stat, value);
            if value != current {
                debug!(
                    agent = %agent.id,
                    stat = %stat,
                    delta = value - current,
                    value,
                    "stat rule applied"
                );
            }
        }

        self.last_update = now;
    }

    /// Iterate over the rules in stat-name order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &StatRule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn hungry_farmer() -> AgentState {
        let mut farmer = AgentState::new("farmer_001");
        farmer.set_stat("hunger", 50);
        farmer.set_stat("energy", 80);
        farmer
    }

    fn rulebook() -> StatRulebook {
        let mut rules = StatRulebook::new();
        rules.add_rule("hunger", StatRule::new(5, 0, 100, "appetite builds"));
        rules.add_rule("energy", StatRule::new(-3, 0, 100, "work is tiring"));
        rules.set_initial_time(Duration::hours(6));
        rules
    }

    #[test]
    fn applies_change_per_whole_hour() {
        let mut farmer = hungry_farmer();
        let mut rules = rulebook();

        rules.update(&mut farmer, Duration::hours(8));
        assert_eq!(farmer.stat("hunger"), 60);
        assert_eq!(farmer.stat("energy"), 74);
    }

    #[test]
    fn sub_hour_elapsed_is_a_no_op() {
        let mut farmer = hungry_farmer();
        let mut rules = rulebook();

        rules.update(&mut farmer, Duration::hours(6) + Duration::minutes(59));
        assert_eq!(farmer.stat("hunger"), 50);

        // The clock did not advance, so the full hour still counts.
        rules.update(&mut farmer, Duration::hours(7));
        assert_eq!(farmer.stat("hunger"), 55);
    }

    #[test]
    fn values_clamp_to_rule_bounds() {
        let mut farmer = hungry_farmer();
        farmer.set_stat("energy", 2);
        let mut rules = rulebook();

        rules.update(&mut farmer, Duration::hours(30));
        assert_eq!(farmer.stat("hunger"), 100);
        assert_eq!(farmer.stat("energy"), 0);
    }
}
