//! Asynchronous resolution controller.
//!
//! A small state machine around one in-flight resolution:
//!
//! ```text
//! Idle --start()--> Running --(background completes)--> Finished
//! Running  --cancel()--> Idle
//! Finished --cancel()--> Idle
//! Finished --apply()---> Idle   (success and failure alike)
//! ```
//!
//! The control thread owns the controller and the live model; the
//! computation itself runs on tokio's blocking pool. While it runs, a
//! keepalive transaction shields the live model's components from garbage
//! collection; the guard is released exactly once on every exit path.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{ControllerError, ResolutionError, ResolvedNetwork};
use crate::ports::{KeepaliveGuard, LiveModel, NoopObserver, RequirementHandle, ResolutionObserver};
use crate::registry::DeploymentRegistry;
use crate::resolve::engine::resolve_network;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Idle,
    Running,
    Finished,
}

struct CurrentResolution {
    batch: Vec<RequirementHandle>,
    keepalive: KeepaliveGuard,
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<ResolvedNetwork, ResolutionError>>,
    /// Set once the handle has been joined (by `join`), so the outcome is
    /// not awaited twice.
    outcome: Option<Result<ResolvedNetwork, ResolutionError>>,
}

pub struct ResolutionController {
    live: Arc<dyn LiveModel>,
    registry: Arc<DeploymentRegistry>,
    observer: Arc<dyn ResolutionObserver>,
    current: Option<CurrentResolution>,
}

impl ResolutionController {
    pub fn new(live: Arc<dyn LiveModel>, registry: Arc<DeploymentRegistry>) -> Self {
        Self {
            live,
            registry,
            observer: Arc::new(NoopObserver),
            current: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn live(&self) -> &Arc<dyn LiveModel> {
        &self.live
    }

    pub fn state(&self) -> ResolutionState {
        match &self.current {
            None => ResolutionState::Idle,
            Some(current) if current.outcome.is_some() || current.handle.is_finished() => {
                ResolutionState::Finished
            }
            Some(_) => ResolutionState::Running,
        }
    }

    /// True if a resolution is Running or Finished-but-not-applied.
    pub fn has_resolution(&self) -> bool {
        self.current.is_some()
    }

    /// Non-blocking: has the background computation completed?
    pub fn finished(&self) -> bool {
        self.state() == ResolutionState::Finished
    }

    /// Non-blocking staleness check: do the assumptions taken at `start`
    /// time still hold, i.e. is every requirement of the batch still
    /// pending in the live model?
    pub fn valid(&self) -> bool {
        self.current.as_ref().is_some_and(|current| {
            current
                .batch
                .iter()
                .all(|requirement| self.live.requirement_pending(requirement.id))
        })
    }

    /// Start resolving a requirement batch in the background.
    ///
    /// Opens the keepalive, submits the computation and returns without
    /// blocking. Fails with `AlreadyRunning` (leaving the in-flight
    /// resolution untouched) unless the controller is Idle.
    pub fn start(&mut self, batch: Vec<RequirementHandle>) -> Result<(), ControllerError> {
        if self.current.is_some() {
            return Err(ControllerError::AlreadyRunning);
        }

        let keepalive = KeepaliveGuard::acquire(self.live.clone());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        for requirement in &batch {
            self.observer.progress(requirement.id, "planning");
        }

        let registry = self.registry.clone();
        let background_batch = batch.clone();
        let handle = tokio::task::spawn_blocking(move || {
            resolve_network(&registry, &background_batch, &cancel_rx)
        });

        info!(requirements = batch.len(), "started network resolution");
        self.current = Some(CurrentResolution {
            batch,
            keepalive,
            cancel_tx,
            handle,
            outcome: None,
        });
        Ok(())
    }

    /// Cancel the current resolution, if any.
    ///
    /// Cooperative: in-flight steps finish, no further work starts; the
    /// background task sees the signal at its next checkpoint and exits.
    /// The keepalive is discarded and the controller returns to Idle.
    /// Safe to call from Running and Finished alike.
    pub fn cancel(&mut self) {
        if let Some(current) = self.current.take() {
            let _ = current.cancel_tx.send(true);
            current.keepalive.discard();
            info!("cancelled network resolution");
        }
    }

    /// Block until the background computation completes, then apply.
    pub async fn join(&mut self) -> Result<(), ControllerError> {
        let current = self.current.as_mut().ok_or(ControllerError::NotFinished)?;
        if current.outcome.is_none() {
            let joined = (&mut current.handle).await;
            current.outcome = Some(flatten_join(joined));
        }
        self.apply().await
    }

    /// Install a finished resolution into the live model.
    ///
    /// Fails with `NotFinished` (state unchanged) unless the computation
    /// completed; the await is then immediate. Internal errors while
    /// installing are converted into per-requirement failure notifications
    /// and never propagate further; on every path the keepalive is
    /// released and the controller ends up Idle.
    pub async fn apply(&mut self) -> Result<(), ControllerError> {
        if self.state() != ResolutionState::Finished {
            return Err(ControllerError::NotFinished);
        }
        let Some(mut current) = self.current.take() else {
            return Err(ControllerError::NotFinished);
        };

        let outcome = match current.outcome.take() {
            Some(outcome) => outcome,
            None => flatten_join(current.handle.await),
        };

        let installed = outcome.and_then(|network| {
            self.live.install(&network)?;
            Ok(network)
        });

        match installed {
            Ok(network) => {
                debug!(
                    tasks = network.tasks.len(),
                    connections = network.connections.len(),
                    "installed resolved network"
                );
                for requirement in &current.batch {
                    self.live.mark_succeeded(requirement.id);
                    self.observer.progress(requirement.id, "ready");
                }
                self.observer.summary(0, 0);
            }
            Err(error) => {
                warn!(%error, "network resolution failed");
                for requirement in &current.batch {
                    self.live.mark_failed(requirement.id, &error);
                    self.observer.progress(requirement.id, "failed");
                }
                self.observer.summary(0, current.batch.len());
            }
        }

        current.keepalive.discard();
        Ok(())
    }
}

fn flatten_join(
    joined: Result<Result<ResolvedNetwork, ResolutionError>, tokio::task::JoinError>,
) -> Result<ResolvedNetwork, ResolutionError> {
    match joined {
        Ok(outcome) => outcome,
        Err(join_error) => Err(ResolutionError::Worker(join_error.to_string())),
    }
}
