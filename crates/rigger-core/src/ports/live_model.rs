//! Live model port and the keepalive guard.
//!
//! The live model owns the running task graph. The resolution core only
//! ever reads from it on the background side; `install` is the single
//! mutation point and must run on the thread that owns the model.

use std::sync::Arc;

use crate::domain::{Composition, KeepaliveId, RequirementId, ResolutionError, ResolvedNetwork, TaskModel};

/// What a pending requirement asks for: a single component satisfying a
/// model, or a whole composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementSpec {
    Task(TaskModel),
    Composition(Composition),
}

/// One abstract requirement pending in the live model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementHandle {
    pub id: RequirementId,
    pub spec: RequirementSpec,
}

impl RequirementHandle {
    pub fn task(model: TaskModel) -> Self {
        Self {
            id: RequirementId::generate(),
            spec: RequirementSpec::Task(model),
        }
    }

    pub fn composition(composition: Composition) -> Self {
        Self {
            id: RequirementId::generate(),
            spec: RequirementSpec::Composition(composition),
        }
    }
}

/// Seam to the host plan engine owning the live task graph.
pub trait LiveModel: Send + Sync {
    /// Requirement batches waiting to be resolved.
    fn find_pending_requirements(&self) -> Vec<RequirementHandle>;

    /// Whether a requirement started at resolution time is still pending.
    /// The controller's `valid()` staleness check is built on this.
    fn requirement_pending(&self, id: RequirementId) -> bool;

    /// Open a protective transaction shielding every unfinished top-level
    /// component from garbage collection. Balanced by `discard_keepalive`.
    fn protect_components(&self) -> KeepaliveId;

    fn discard_keepalive(&self, id: KeepaliveId);

    /// Merge a resolved network into the live graph. Must be called from
    /// the thread that owns the model; never from the background side.
    fn install(&self, network: &ResolvedNetwork) -> Result<(), ResolutionError>;

    fn mark_succeeded(&self, id: RequirementId);

    fn mark_failed(&self, id: RequirementId, error: &ResolutionError);
}

/// Scoped handle over a keepalive transaction.
///
/// Released exactly once: either explicitly through `discard`, or on drop
/// for any early-exit path. Double release is impossible by construction.
pub struct KeepaliveGuard {
    live: Arc<dyn LiveModel>,
    id: Option<KeepaliveId>,
}

impl KeepaliveGuard {
    pub fn acquire(live: Arc<dyn LiveModel>) -> Self {
        let id = live.protect_components();
        Self { live, id: Some(id) }
    }

    pub fn discard(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.live.discard_keepalive(id);
        }
    }
}

impl Drop for KeepaliveGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingModel {
        protected: AtomicUsize,
        discarded: AtomicUsize,
    }

    impl LiveModel for CountingModel {
        fn find_pending_requirements(&self) -> Vec<RequirementHandle> {
            Vec::new()
        }

        fn requirement_pending(&self, _id: RequirementId) -> bool {
            false
        }

        fn protect_components(&self) -> KeepaliveId {
            self.protected.fetch_add(1, Ordering::SeqCst);
            KeepaliveId::generate()
        }

        fn discard_keepalive(&self, _id: KeepaliveId) {
            self.discarded.fetch_add(1, Ordering::SeqCst);
        }

        fn install(&self, _network: &ResolvedNetwork) -> Result<(), ResolutionError> {
            Ok(())
        }

        fn mark_succeeded(&self, _id: RequirementId) {}

        fn mark_failed(&self, _id: RequirementId, _error: &ResolutionError) {}
    }

    #[test]
    fn guard_releases_on_drop() {
        let model = Arc::new(CountingModel::default());
        {
            let _guard = KeepaliveGuard::acquire(model.clone());
            assert_eq!(model.protected.load(Ordering::SeqCst), 1);
            assert_eq!(model.discarded.load(Ordering::SeqCst), 0);
        }
        assert_eq!(model.discarded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_discard_does_not_release_twice() {
        let model = Arc::new(CountingModel::default());
        let guard = KeepaliveGuard::acquire(model.clone());
        guard.discard();
        assert_eq!(model.discarded.load(Ordering::SeqCst), 1);
    }
}
