//! In-memory live model.
//!
//! Reference implementation of the [`LiveModel`] port: a mutex-guarded
//! plan good enough for the demo binary and for exercising the
//! controller in tests. Installing a network opens a new event-log
//! iteration and records one start event per deployed task.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::{InstanceId, KeepaliveId, RequirementId, ResolutionError, ResolvedNetwork};
use crate::eventlog::RuntimeEventLog;
use crate::ports::{Clock, LiveModel, RequirementHandle, SystemClock};

/// Terminal state of a requirement once resolution ran for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Default)]
struct State {
    pending: Vec<RequirementHandle>,
    keepalives: HashSet<KeepaliveId>,
    installed: Vec<ResolvedNetwork>,
    outcomes: HashMap<RequirementId, RequirementOutcome>,
    log: RuntimeEventLog,
    fail_installs: bool,
}

pub struct InMemoryLiveModel {
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl Default for InMemoryLiveModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLiveModel {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }

    pub fn add_requirement(&self, requirement: RequirementHandle) {
        self.state.lock().unwrap().pending.push(requirement);
    }

    pub fn remove_requirement(&self, id: RequirementId) {
        self.state
            .lock()
            .unwrap()
            .pending
            .retain(|requirement| requirement.id != id);
    }

    pub fn active_keepalives(&self) -> usize {
        self.state.lock().unwrap().keepalives.len()
    }

    pub fn installed_networks(&self) -> Vec<ResolvedNetwork> {
        self.state.lock().unwrap().installed.clone()
    }

    pub fn outcome(&self, id: RequirementId) -> Option<RequirementOutcome> {
        self.state.lock().unwrap().outcomes.get(&id).cloned()
    }

    pub fn succeeded(&self, id: RequirementId) -> bool {
        self.outcome(id) == Some(RequirementOutcome::Succeeded)
    }

    pub fn failed(&self, id: RequirementId) -> bool {
        matches!(self.outcome(id), Some(RequirementOutcome::Failed(_)))
    }

    /// Make every subsequent `install` fail, to exercise error paths.
    pub fn fail_installs(&self, fail: bool) {
        self.state.lock().unwrap().fail_installs = fail;
    }

    /// Run a closure against the runtime event log.
    pub fn with_log<R>(&self, f: impl FnOnce(&RuntimeEventLog) -> R) -> R {
        f(&self.state.lock().unwrap().log)
    }
}

impl LiveModel for InMemoryLiveModel {
    fn find_pending_requirements(&self) -> Vec<RequirementHandle> {
        self.state.lock().unwrap().pending.clone()
    }

    fn requirement_pending(&self, id: RequirementId) -> bool {
        self.state
            .lock()
            .unwrap()
            .pending
            .iter()
            .any(|requirement| requirement.id == id)
    }

    fn protect_components(&self) -> KeepaliveId {
        let id = KeepaliveId::generate();
        self.state.lock().unwrap().keepalives.insert(id);
        id
    }

    fn discard_keepalive(&self, id: KeepaliveId) {
        self.state.lock().unwrap().keepalives.remove(&id);
    }

    fn install(&self, network: &ResolvedNetwork) -> Result<(), ResolutionError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_installs {
            return Err(ResolutionError::Install(
                "the plan rejected the network".to_string(),
            ));
        }

        let iteration = state.log.new_iteration(self.clock.now());
        for task in &network.tasks {
            state
                .log
                .record_start(task.model.clone(), InstanceId::generate(), iteration);
        }
        debug!(tasks = network.tasks.len(), iteration, "network installed");
        state.installed.push(network.clone());
        Ok(())
    }

    fn mark_succeeded(&self, id: RequirementId) {
        let mut state = self.state.lock().unwrap();
        state.pending.retain(|requirement| requirement.id != id);
        state.outcomes.insert(id, RequirementOutcome::Succeeded);
    }

    fn mark_failed(&self, id: RequirementId, error: &ResolutionError) {
        let mut state = self.state.lock().unwrap();
        state.pending.retain(|requirement| requirement.id != id);
        state
            .outcomes
            .insert(id, RequirementOutcome::Failed(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeployedTask, TaskModel};

    fn network_with(model: TaskModel) -> ResolvedNetwork {
        ResolvedNetwork {
            tasks: vec![DeployedTask {
                requirement: RequirementId::generate(),
                process_server_name: "main".to_string(),
                process_name: "camera".to_string(),
                task_name: "camera".to_string(),
                model,
            }],
            connections: Vec::new(),
        }
    }

    #[test]
    fn pending_requirements_round_trip() {
        let live = InMemoryLiveModel::new();
        let requirement = RequirementHandle::task(TaskModel::new("camera::Driver"));
        live.add_requirement(requirement.clone());

        assert!(live.requirement_pending(requirement.id));
        assert_eq!(live.find_pending_requirements(), vec![requirement.clone()]);

        live.remove_requirement(requirement.id);
        assert!(!live.requirement_pending(requirement.id));
    }

    #[test]
    fn keepalives_are_tracked_until_discarded() {
        let live = InMemoryLiveModel::new();
        let a = live.protect_components();
        let b = live.protect_components();
        assert_eq!(live.active_keepalives(), 2);

        live.discard_keepalive(a);
        assert_eq!(live.active_keepalives(), 1);
        // Discarding twice is harmless.
        live.discard_keepalive(a);
        assert_eq!(live.active_keepalives(), 1);
        live.discard_keepalive(b);
        assert_eq!(live.active_keepalives(), 0);
    }

    #[test]
    fn install_records_start_events_in_the_log() {
        let live = InMemoryLiveModel::new();
        let model = TaskModel::new("camera::Driver");
        live.install(&network_with(model.clone())).unwrap();

        assert_eq!(live.installed_networks().len(), 1);
        live.with_log(|log| {
            assert_eq!(log.current_iteration(), 1);
            assert!(log.was_started(&model, 0));
        });
    }

    #[test]
    fn install_can_be_forced_to_fail() {
        let live = InMemoryLiveModel::new();
        live.fail_installs(true);
        let err = live
            .install(&network_with(TaskModel::new("camera::Driver")))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Install(_)));
        assert!(live.installed_networks().is_empty());
        live.with_log(|log| assert_eq!(log.current_iteration(), 0));
    }

    #[test]
    fn marking_an_outcome_removes_the_requirement_from_pending() {
        let live = InMemoryLiveModel::new();
        let ok = RequirementHandle::task(TaskModel::new("camera::Driver"));
        let bad = RequirementHandle::task(TaskModel::new("gps::Driver"));
        live.add_requirement(ok.clone());
        live.add_requirement(bad.clone());

        live.mark_succeeded(ok.id);
        live.mark_failed(bad.id, &ResolutionError::NoDeployment(TaskModel::new("gps::Driver")));

        assert!(live.find_pending_requirements().is_empty());
        assert!(live.succeeded(ok.id));
        assert!(live.failed(bad.id));
    }
}
