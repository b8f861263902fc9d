//! Runtime event log.
//!
//! Records, per control-loop iteration, which task models started,
//! stopped or were reconfigured. Resolution uses it to answer liveness
//! questions ("did this model start since iteration N?") without
//! re-scanning the live model's history. Owned by a live model instance;
//! grows monotonically (pruning is out of scope).

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::domain::{HasModel, InstanceId, TaskModel};

type EventList = Vec<(u64, InstanceId)>;

#[derive(Debug, Default)]
pub struct RuntimeEventLog {
    /// Timestamp of each iteration; iteration numbers are 1-based indices
    /// into this list.
    iterations: Vec<DateTime<Utc>>,
    started: HashMap<TaskModel, EventList>,
    stopped: HashMap<TaskModel, EventList>,
    reconfigured: HashMap<TaskModel, EventList>,
}

impl RuntimeEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new control-loop iteration and return its number.
    pub fn new_iteration(&mut self, timestamp: DateTime<Utc>) -> u64 {
        self.iterations.push(timestamp);
        self.current_iteration()
    }

    /// Number of the most recent iteration; 0 before the first one.
    pub fn current_iteration(&self) -> u64 {
        self.iterations.len() as u64
    }

    pub fn record_start(&mut self, model: TaskModel, instance: InstanceId, iteration: u64) {
        self.started.entry(model).or_default().push((iteration, instance));
    }

    pub fn record_stop(&mut self, model: TaskModel, instance: InstanceId, iteration: u64) {
        self.stopped.entry(model).or_default().push((iteration, instance));
    }

    pub fn record_reconfigure(&mut self, model: TaskModel, instance: InstanceId, iteration: u64) {
        self.reconfigured
            .entry(model)
            .or_default()
            .push((iteration, instance));
    }

    /// Instances started in the half-open range `(from, current]`.
    pub fn started_since(&self, from: u64) -> HashSet<InstanceId> {
        Self::collect_since(&self.started, from, self.current_iteration())
    }

    /// Instances stopped in the half-open range `(from, current]`.
    pub fn stopped_since(&self, from: u64) -> HashSet<InstanceId> {
        Self::collect_since(&self.stopped, from, self.current_iteration())
    }

    /// True iff some start event for `model` falls in `(from, current]`.
    /// An unknown model answers false.
    pub fn was_started(&self, model: &dyn HasModel, from: u64) -> bool {
        Self::any_since(&self.started, model.model(), from, self.current_iteration())
    }

    /// True iff some stop event for `model` falls in `(from, current]`.
    pub fn was_stopped(&self, model: &dyn HasModel, from: u64) -> bool {
        Self::any_since(&self.stopped, model.model(), from, self.current_iteration())
    }

    /// Models that ever appeared in a start or stop event.
    pub fn known_models(&self) -> HashSet<&TaskModel> {
        self.started.keys().chain(self.stopped.keys()).collect()
    }

    /// Iterations at which `model` started.
    pub fn start_iterations(&self, model: &dyn HasModel) -> Vec<u64> {
        Self::iterations_of(&self.started, model.model())
    }

    /// Iterations at which `model` stopped.
    pub fn stop_iterations(&self, model: &dyn HasModel) -> Vec<u64> {
        Self::iterations_of(&self.stopped, model.model())
    }

    /// Iterations at which `model` was reconfigured.
    pub fn reconfigure_iterations(&self, model: &dyn HasModel) -> Vec<u64> {
        Self::iterations_of(&self.reconfigured, model.model())
    }

    fn collect_since(
        events: &HashMap<TaskModel, EventList>,
        from: u64,
        current: u64,
    ) -> HashSet<InstanceId> {
        events
            .values()
            .flatten()
            .filter(|(iteration, _)| *iteration > from && *iteration <= current)
            .map(|(_, instance)| *instance)
            .collect()
    }

    fn any_since(
        events: &HashMap<TaskModel, EventList>,
        model: &TaskModel,
        from: u64,
        current: u64,
    ) -> bool {
        events
            .get(model)
            .is_some_and(|list| {
                list.iter()
                    .any(|(iteration, _)| *iteration > from && *iteration <= current)
            })
    }

    fn iterations_of(events: &HashMap<TaskModel, EventList>, model: &TaskModel) -> Vec<u64> {
        events
            .get(model)
            .map(|list| list.iter().map(|(iteration, _)| *iteration).collect())
            .unwrap_or_default()
    }
}
