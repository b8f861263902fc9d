//! Error types, one small enum per concern.
//!
//! Registry and wiring errors are local and recoverable by the caller.
//! Controller sequencing errors (`AlreadyRunning`, `NotFinished`) are
//! caller bugs and stay loud.

use thiserror::Error;

use super::model::TaskModel;

/// Errors raised by the deployment registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two distinct deployments claim the same external task name.
    /// Registry state is left unchanged when this is raised.
    #[error("task name '{0}' is already in use by a different deployment")]
    TaskNameAlreadyInUse(String),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Name-mapping keys must be exactly the deployment model's internal
    /// task names.
    #[error("deployment '{deployment}' maps unknown internal task '{task}'")]
    UnknownInternalTask { deployment: String, task: String },
}

/// Errors reported by the external deployment-description loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("no deployment model named '{0}'")]
    NotFound(String),

    #[error("no project named '{0}'")]
    ProjectNotFound(String),
}

/// Errors raised while wiring a composition.
#[derive(Debug, Error)]
pub enum WiringError {
    /// Autoconnection cannot uniquely infer the wiring. No inferred
    /// connection is applied when this is raised.
    #[error("ambiguous autoconnection between '{left}' and '{right}': {candidates} candidate port pairs")]
    Ambiguous {
        left: String,
        right: String,
        candidates: usize,
    },

    /// An exported name is already bound to a different underlying port.
    #[error("export name '{0}' is already bound to a different port")]
    ExportConflict(String),

    #[error("composition has no child named '{0}'")]
    UnknownChild(String),

    #[error("child '{child}' has no port named '{port}'")]
    UnknownPort { child: String, port: String },
}

/// Controller sequencing errors. These indicate misuse by the driving
/// code, not a runtime condition; the controller state is unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("a resolution is already running, cancel it first")]
    AlreadyRunning,

    #[error("the current resolution is not finished")]
    NotFinished,
}

/// Errors produced by the background resolution computation, or while
/// installing its result into the live model.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no registered deployment can run '{0}'")]
    NoDeployment(TaskModel),

    #[error("{count} deployments can run '{model}', refusing to pick one")]
    AmbiguousDeployment { model: TaskModel, count: usize },

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error("resolution was cancelled")]
    Cancelled,

    #[error("resolution worker terminated abnormally: {0}")]
    Worker(String),

    #[error("failed to install the resolved network: {0}")]
    Install(String),
}
