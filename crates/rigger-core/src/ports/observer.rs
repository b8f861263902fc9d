//! Resolution observer port.
//!
//! Write-only from the core's perspective: the controller pushes progress
//! notifications through it and never reads anything back. A UI such as a
//! job monitor sits on the other side.

use crate::domain::RequirementId;

pub trait ResolutionObserver: Send + Sync {
    /// A requirement moved to a new progress state ("planning",
    /// "deploying", "ready", "failed", ...).
    fn progress(&self, requirement: RequirementId, state: &str);

    /// Summary counts after an apply: tasks blocked waiting on something,
    /// tasks that raised an exception.
    fn summary(&self, blocked: usize, failed: usize);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ResolutionObserver for NoopObserver {
    fn progress(&self, _requirement: RequirementId, _state: &str) {}

    fn summary(&self, _blocked: usize, _failed: usize) {}
}
