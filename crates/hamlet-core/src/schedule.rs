//! Time-of-day schedules with busy-retry bookkeeping.
//!
//! A [`ScheduleEntry`] is a static template: trigger time, action name,
//! optional target, retry policy. Runtime bookkeeping (retry counters,
//! the clock) lives in the [`ScheduleManager`]. Counters are keyed by
//! action name, so entries sharing a name share their retry budget.

use std::collections::BTreeMap;

use chrono::Duration;
use tracing::debug;

use hamlet_types::EntityId;

use crate::events::Callbacks;

/// One scheduled action: run `action_name` at `time`, optionally
/// against a fixed target.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    /// Time of day (since midnight) the entry becomes due.
    pub time: Duration,
    /// Name of the registered action to run.
    pub action_name: String,
    /// Fixed target entity, if the action needs one.
    pub target: Option<EntityId>,
    /// Whether a scenario or critical goal may preempt this entry.
    pub interruptible: bool,
    /// Whether a busy target schedules a retry instead of a skip.
    pub retry_if_busy: bool,
    /// Retry budget once the target was found busy.
    pub max_retries: u32,
    /// Delay between retries, multiplied by the attempt number.
    pub retry_interval: Duration,
}

impl ScheduleEntry {
    /// Create an entry with the default policy: interruptible, no
    /// busy-retry, 3 retries at 5 minute intervals when enabled.
    pub fn new(time: Duration, action_name: impl Into<String>, target: Option<EntityId>) -> Self {
        Self {
            time,
            action_name: action_name.into(),
            target,
            interruptible: true,
            retry_if_busy: false,
            max_retries: 3,
            retry_interval: Duration::minutes(5),
        }
    }

    /// Enable busy-retry with the given interval.
    pub fn retry_if_busy(mut self, interval: Duration) -> Self {
        self.retry_if_busy = true;
        self.retry_interval = interval;
        self
    }

    /// Mark the entry as not preemptible.
    pub fn not_interruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }

    fn retry_due_at(&self, retry_count: u32) -> Duration {
        let factor = i32::try_from(retry_count).unwrap_or(i32::MAX);
        self.time + self.retry_interval * factor
    }
}

/// Owns the day's entries and the retry/callback bookkeeping.
#[derive(Debug, Default)]
pub struct ScheduleManager {
    entries: Vec<ScheduleEntry>,
    retry_counts: BTreeMap<String, u32>,
    paused: bool,
    current_time: Duration,
    on_completed: Callbacks<ScheduleEntry>,
    on_skipped: Callbacks<ScheduleEntry>,
}

impl ScheduleManager {
    /// Create an empty, active manager with the clock at midnight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole schedule, clearing all retry bookkeeping.
    /// Entries are kept sorted by trigger time.
    pub fn set_schedule(&mut self, entries: impl IntoIterator<Item = ScheduleEntry>) {
        self.entries = entries.into_iter().collect();
        self.entries.sort_by_key(|e| e.time);
        self.retry_counts.clear();
    }

    /// Insert one entry, keeping trigger-time order.
    pub fn add_entry(&mut self, entry: ScheduleEntry) {
        self.entries.push(entry);
        self.entries.sort_by_key(|e| e.time);
    }

    /// Remove every entry with this action name (case-insensitive).
    pub fn remove_entry(&mut self, action_name: &str) {
        self.entries
            .retain(|e| !e.action_name.eq_ignore_ascii_case(action_name));
    }

    /// Drop all entries and bookkeeping.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.retry_counts.clear();
    }

    /// Advance the clock and return clones of every entry due at `now`.
    ///
    /// An entry is due once `now` reaches its trigger time. While a
    /// busy-retry is pending (count `r`), the entry is withheld until
    /// `time + retry_interval * r`; an entry whose retry budget is spent
    /// is withheld permanently.
    pub fn update_time(&mut self, now: Duration) -> Vec<ScheduleEntry> {
        self.current_time = now;
        self.entries
            .iter()
            .filter(|e| self.is_due(e))
            .cloned()
            .collect()
    }

    fn is_due(&self, entry: &ScheduleEntry) -> bool {
        if self.current_time < entry.time {
            return false;
        }
        let retries = self.retry_count(&entry.action_name);
        if retries == 0 {
            return true;
        }
        if retries > entry.max_retries {
            return false;
        }
        self.current_time >= entry.retry_due_at(retries)
    }

    /// Record a successful execution: clears the retry counter and
    /// fires the completed callbacks.
    pub fn mark_completed(&mut self, action_name: &str) {
        self.retry_counts.remove(&action_name.to_ascii_lowercase());
        if let Some(entry) = self.find(action_name) {
            self.on_completed.emit(&entry);
        }
    }

    /// Record a failed execution.
    ///
    /// When the failure was a busy target and the entry retries on
    /// busy, the retry counter advances; skips are suppressed while the
    /// budget lasts and the skipped callbacks fire exactly once when it
    /// is exhausted. Every other failure fires the skipped callbacks
    /// immediately.
    pub fn mark_skipped(&mut self, action_name: &str, was_busy: bool) {
        let Some(entry) = self.find(action_name) else {
            return;
        };

        if was_busy && entry.retry_if_busy {
            let key = action_name.to_ascii_lowercase();
            let count = self.retry_count(action_name).saturating_add(1);
            self.retry_counts.insert(key, count);

            if count <= entry.max_retries {
                debug!(
                    action = %entry.action_name,
                    retry = count,
                    "target busy, retry scheduled"
                );
                return;
            }
            if count > entry.max_retries.saturating_add(1) {
                // Budget already reported as exhausted.
                return;
            }
            debug!(action = %entry.action_name, "retry budget exhausted");
        }

        self.on_skipped.emit(&entry);
    }

    /// The pending retry count for an action name.
    pub fn retry_count(&self, action_name: &str) -> u32 {
        self.retry_counts
            .get(&action_name.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Stop dispatching entries until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume dispatching entries.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the schedule is currently dispatching.
    pub fn is_active(&self) -> bool {
        !self.paused
    }

    /// The clock as of the last [`update_time`](Self::update_time).
    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    /// Register an observer for completed entries.
    pub fn on_completed(&mut self, listener: impl Fn(&ScheduleEntry) + Send + 'static) {
        self.on_completed.subscribe(listener);
    }

    /// Register an observer for skipped entries.
    pub fn on_skipped(&mut self, listener: impl Fn(&ScheduleEntry) + Send + 'static) {
        self.on_skipped.subscribe(listener);
    }

    /// Iterate over the entries in trigger-time order.
    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter()
    }

    /// Number of entries in the schedule.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the schedule has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, action_name: &str) -> Option<ScheduleEntry> {
        self.entries
            .iter()
            .find(|e| e.action_name.eq_ignore_ascii_case(action_name))
            .cloned()
    }
}
