//! Deployment-description loader port.
//!
//! The registry turns deployment names into process descriptions through
//! this seam. Production wires it to the component-description database;
//! tests and the demo use `StaticLoader`.

use std::collections::HashMap;

use crate::domain::{DeploymentModel, LoaderError, TaskModel};

pub trait DeploymentLoader: Send + Sync {
    /// Resolve a deployment name to its process description.
    fn deployment_model_from_name(&self, name: &str) -> Result<DeploymentModel, LoaderError>;

    /// Names of the installed deployments of a project.
    fn project_deployment_names(&self, project: &str) -> Result<Vec<String>, LoaderError>;

    /// Conventional name of the default single-task deployment generated
    /// for a bare task model.
    fn default_deployment_name(&self, model: &TaskModel) -> String {
        format!("default_{}", model.as_str().replace("::", "__"))
    }
}

/// In-memory loader backed by pre-registered descriptions.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    deployments: HashMap<String, DeploymentModel>,
    projects: HashMap<String, Vec<String>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deployment(mut self, model: DeploymentModel) -> Self {
        self.deployments.insert(model.name().to_string(), model);
        self
    }

    pub fn with_project(mut self, name: impl Into<String>, deployments: Vec<String>) -> Self {
        self.projects.insert(name.into(), deployments);
        self
    }
}

impl DeploymentLoader for StaticLoader {
    fn deployment_model_from_name(&self, name: &str) -> Result<DeploymentModel, LoaderError> {
        self.deployments
            .get(name)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(name.to_string()))
    }

    fn project_deployment_names(&self, project: &str) -> Result<Vec<String>, LoaderError> {
        self.projects
            .get(project)
            .cloned()
            .ok_or_else(|| LoaderError::ProjectNotFound(project.to_string()))
    }
}
