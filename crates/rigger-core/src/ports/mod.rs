//! Ports: trait seams toward the external collaborators.
//!
//! Each trait hides one collaborator: the live task graph owned by the
//! host plan engine, the deployment-description database, whatever UI
//! observes resolution progress, and the clock.

pub mod clock;
pub mod live_model;
pub mod loader;
pub mod observer;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::live_model::{KeepaliveGuard, LiveModel, RequirementHandle, RequirementSpec};
pub use self::loader::{DeploymentLoader, StaticLoader};
pub use self::observer::{NoopObserver, ResolutionObserver};
