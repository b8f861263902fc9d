//! Deployment descriptions and configured deployments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::RegistryError;
use super::model::TaskModel;

/// Description of a deployable unit: a named process hosting a set of
/// task slots, each binding an internal name to a task model.
///
/// This is what the external loader returns for a deployment name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentModel {
    name: String,
    tasks: BTreeMap<String, TaskModel>,
}

impl DeploymentModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: BTreeMap::new(),
        }
    }

    /// Declare a task slot. Builder-style so descriptions read like the
    /// process description they stand for.
    pub fn with_task(mut self, internal_name: impl Into<String>, model: TaskModel) -> Self {
        self.tasks.insert(internal_name.into(), model);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> impl Iterator<Item = (&str, &TaskModel)> {
        self.tasks.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn has_task(&self, internal_name: &str) -> bool {
        self.tasks.contains_key(internal_name)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

/// A deployable unit bound to a process server, with its internal task
/// names remapped to externally visible ones.
///
/// Constructed once by configuration code and immutable thereafter.
/// Equality is structural: server, process name, model and name mappings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfiguredDeployment {
    process_server_name: String,
    process_name: String,
    model: DeploymentModel,
    name_mappings: BTreeMap<String, String>,
}

impl ConfiguredDeployment {
    /// Build a configured deployment.
    ///
    /// Mapping keys must all be internal task names of `model`; internal
    /// tasks absent from `name_mappings` are completed to the identity
    /// mapping, so the keys end up being exactly the model's task names.
    pub fn new(
        process_server_name: impl Into<String>,
        process_name: impl Into<String>,
        model: DeploymentModel,
        name_mappings: BTreeMap<String, String>,
    ) -> Result<Self, RegistryError> {
        let process_name = process_name.into();
        for internal in name_mappings.keys() {
            if !model.has_task(internal) {
                return Err(RegistryError::UnknownInternalTask {
                    deployment: process_name,
                    task: internal.clone(),
                });
            }
        }

        let mut name_mappings = name_mappings;
        for (internal, _) in model.tasks() {
            name_mappings
                .entry(internal.to_string())
                .or_insert_with(|| internal.to_string());
        }

        Ok(Self {
            process_server_name: process_server_name.into(),
            process_name,
            model,
            name_mappings,
        })
    }

    pub fn process_server_name(&self) -> &str {
        &self.process_server_name
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn model(&self) -> &DeploymentModel {
        &self.model
    }

    pub fn name_mappings(&self) -> &BTreeMap<String, String> {
        &self.name_mappings
    }

    /// Externally visible name of an internal task slot.
    pub fn mapped_name(&self, internal_name: &str) -> Option<&str> {
        self.name_mappings.get(internal_name).map(String::as_str)
    }

    /// Iterate the deployed tasks as (external name, task model).
    pub fn each_deployed_task(&self) -> impl Iterator<Item = (&str, &TaskModel)> {
        self.model.tasks().map(|(internal, model)| {
            let external = self
                .name_mappings
                .get(internal)
                .map(String::as_str)
                .unwrap_or(internal);
            (external, model)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_model() -> TaskModel {
        TaskModel::new("camera::Driver")
    }

    #[test]
    fn missing_mappings_complete_to_identity() {
        let model = DeploymentModel::new("camera_deployment")
            .with_task("camera", camera_model())
            .with_task("camera_logger", TaskModel::new("logger::Logger"));
        let mapping = BTreeMap::from([("camera".to_string(), "front_camera".to_string())]);
        let d = ConfiguredDeployment::new("main", "camera_deployment", model, mapping).unwrap();

        assert_eq!(d.mapped_name("camera"), Some("front_camera"));
        assert_eq!(d.mapped_name("camera_logger"), Some("camera_logger"));
    }

    #[test]
    fn mapping_unknown_internal_task_is_rejected() {
        let model = DeploymentModel::new("d").with_task("task", camera_model());
        let mapping = BTreeMap::from([("nope".to_string(), "x".to_string())]);
        let err = ConfiguredDeployment::new("main", "d", model, mapping).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownInternalTask { .. }));
    }

    #[test]
    fn deployed_tasks_use_external_names() {
        let model = DeploymentModel::new("d").with_task("task", camera_model());
        let mapping = BTreeMap::from([("task".to_string(), "sensor".to_string())]);
        let d = ConfiguredDeployment::new("main", "d", model, mapping).unwrap();

        let deployed: Vec<_> = d.each_deployed_task().collect();
        assert_eq!(deployed, vec![("sensor", &camera_model())]);
    }

    #[test]
    fn equality_is_structural() {
        let make = || {
            let model = DeploymentModel::new("d").with_task("task", camera_model());
            ConfiguredDeployment::new("main", "d", model, BTreeMap::new()).unwrap()
        };
        assert_eq!(make(), make());

        let model = DeploymentModel::new("d").with_task("task", camera_model());
        let other = ConfiguredDeployment::new("other-server", "d", model, BTreeMap::new()).unwrap();
        assert_ne!(make(), other);
    }
}
