//! Deployment candidate registry.
//!
//! Tracks which concrete deployable processes exist, which task models
//! they can satisfy, and under which externally visible task names.
//! External task names are globally unique within a registry; the derived
//! candidate index is cached and invalidated on every mutation.
//!
//! Design:
//! - Mutation (`register`, `merge`, `use_*`) happens at configuration
//!   time, single-threaded, through `&mut self`.
//! - Lookups stay `&self` so a registry behind an `Arc` can be read from
//!   the background resolution; the lazily built candidate index sits
//!   behind a `Mutex` for that reason only.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::{
    ConfiguredDeployment, DeploymentModel, HasModel, LoaderError, RegistryError, TaskModel,
};
use crate::ports::DeploymentLoader;

/// A candidate for a task model: the deployment and the external name of
/// the matching task slot.
pub type Candidate = (Arc<ConfiguredDeployment>, String);

type CandidateIndex = HashMap<TaskModel, HashSet<Candidate>>;

/// How a deployment is specified to `use_deployment`.
#[derive(Debug, Clone)]
pub enum DeploymentSpec {
    /// Deploy the default deployment of a task model under a new name.
    /// Every task slot of that deployment is renamed accordingly.
    TaskByName(TaskModel, String),

    /// An already resolved deployment description.
    Model(DeploymentModel),

    /// A deployment name, resolved through the loader.
    Name(String),
}

/// Registry of configured deployments owned by one configuration scope.
pub struct DeploymentRegistry {
    loader: Arc<dyn DeploymentLoader>,
    simulation: bool,
    by_task_name: HashMap<String, Arc<ConfiguredDeployment>>,
    by_server: HashMap<String, HashSet<Arc<ConfiguredDeployment>>>,
    candidates: Mutex<Option<CandidateIndex>>,
}

impl DeploymentRegistry {
    pub fn new(loader: Arc<dyn DeploymentLoader>) -> Self {
        Self {
            loader,
            simulation: false,
            by_task_name: HashMap::new(),
            by_server: HashMap::new(),
            candidates: Mutex::new(None),
        }
    }

    /// In simulation mode, deployments resolved by `use_deployment` are
    /// redirected to the stub process server (`<name>-sim`).
    pub fn set_simulation(&mut self, simulation: bool) {
        self.simulation = simulation;
    }

    pub fn is_empty(&self) -> bool {
        self.by_server.values().all(HashSet::is_empty)
    }

    /// Register a configured deployment.
    ///
    /// Registering a value-equal copy of an already registered deployment
    /// is a complete no-op (the candidate index stays valid). If any of
    /// the deployment's external task names is held by a *different*
    /// deployment, fails with `TaskNameAlreadyInUse` and changes nothing:
    /// every name is validated before the first mutation.
    pub fn register(
        &mut self,
        deployment: impl Into<Arc<ConfiguredDeployment>>,
    ) -> Result<(), RegistryError> {
        let deployment = deployment.into();
        let names: Vec<String> = deployment
            .each_deployed_task()
            .map(|(name, _)| name.to_string())
            .collect();

        let mut is_new = names.is_empty()
            && !self
                .by_server
                .get(deployment.process_server_name())
                .is_some_and(|set| set.contains(&deployment));
        for name in &names {
            match self.by_task_name.get(name) {
                Some(existing) if **existing != *deployment => {
                    return Err(RegistryError::TaskNameAlreadyInUse(name.clone()));
                }
                Some(_) => {}
                None => is_new = true,
            }
        }
        if !is_new {
            return Ok(());
        }

        for name in names {
            self.by_task_name.insert(name, deployment.clone());
        }
        self.by_server
            .entry(deployment.process_server_name().to_string())
            .or_default()
            .insert(deployment.clone());
        debug!(
            process = deployment.process_name(),
            server = deployment.process_server_name(),
            "registered deployment"
        );
        self.invalidate_caches();
        Ok(())
    }

    /// Merge another registry's registrations into this one, leaving the
    /// argument untouched.
    ///
    /// All-or-nothing: the whole batch is validated against `self` before
    /// anything is applied, so a `TaskNameAlreadyInUse` conflict leaves
    /// `self` exactly as it was.
    pub fn merge(&mut self, other: &DeploymentRegistry) -> Result<(), RegistryError> {
        for (name, deployment) in &other.by_task_name {
            if let Some(existing) = self.by_task_name.get(name) {
                if existing != deployment {
                    return Err(RegistryError::TaskNameAlreadyInUse(name.clone()));
                }
            }
        }

        for set in other.by_server.values() {
            for deployment in set {
                self.register(deployment.clone())?;
            }
        }
        Ok(())
    }

    pub fn deployment_by_task_name(&self, name: &str) -> Option<&Arc<ConfiguredDeployment>> {
        self.by_task_name.get(name)
    }

    pub fn deployments_on_server(&self, server: &str) -> HashSet<Arc<ConfiguredDeployment>> {
        self.by_server.get(server).cloned().unwrap_or_default()
    }

    /// Drop the cached candidate index. Called by every mutation; public
    /// because configuration code that tweaks loader state may need it.
    pub fn invalidate_caches(&mut self) {
        *self.candidates.lock().unwrap() = None;
    }

    /// Deployments able to run `model`, as (deployment, external task
    /// name) pairs. Computes and caches the full candidate index on first
    /// use after a mutation.
    pub fn candidates_for(&self, model: &TaskModel) -> HashSet<Candidate> {
        let mut cache = self.candidates.lock().unwrap();
        let index = cache.get_or_insert_with(|| self.compute_candidate_index());
        index.get(model).cloned().unwrap_or_default()
    }

    /// Candidates for a live instance: its exact model first, then its
    /// concrete (most-specialized-resolved) model, else the empty set.
    pub fn candidates_for_instance(&self, instance: &dyn HasModel) -> HashSet<Candidate> {
        let exact = self.candidates_for(instance.model());
        if !exact.is_empty() {
            return exact;
        }
        self.candidates_for(instance.concrete_model())
    }

    fn compute_candidate_index(&self) -> CandidateIndex {
        let mut index = CandidateIndex::new();
        for set in self.by_server.values() {
            for deployment in set {
                for (external, model) in deployment.each_deployed_task() {
                    index
                        .entry(model.clone())
                        .or_default()
                        .insert((deployment.clone(), external.to_string()));
                }
            }
        }
        index
    }

    /// Resolve a deployment spec through the loader, configure it for the
    /// given process server and register it.
    ///
    /// Returns the newly built deployments (a value-equal re-registration
    /// still returns the built deployment).
    pub fn use_deployment(
        &mut self,
        spec: DeploymentSpec,
        on: &str,
    ) -> Result<Vec<Arc<ConfiguredDeployment>>, RegistryError> {
        let server = if self.simulation {
            format!("{on}-sim")
        } else {
            on.to_string()
        };

        let deployment = match spec {
            DeploymentSpec::Name(name) => {
                let model = self.loader.deployment_model_from_name(&name)?;
                let process_name = model.name().to_string();
                ConfiguredDeployment::new(server, process_name, model, BTreeMap::new())?
            }
            DeploymentSpec::Model(model) => {
                let process_name = model.name().to_string();
                ConfiguredDeployment::new(server, process_name, model, BTreeMap::new())?
            }
            DeploymentSpec::TaskByName(task_model, name) => {
                let default_name = self.loader.default_deployment_name(&task_model);
                let model = self.loader.deployment_model_from_name(&default_name)?;
                let mappings: BTreeMap<String, String> = model
                    .tasks()
                    .map(|(internal, _)| {
                        let external = if let Some(suffix) = internal.strip_prefix(&default_name) {
                            format!("{name}{suffix}")
                        } else {
                            format!("{name}_{internal}")
                        };
                        (internal.to_string(), external)
                    })
                    .collect();
                ConfiguredDeployment::new(server, name, model, mappings)?
            }
        };

        let deployment = Arc::new(deployment);
        self.register(deployment.clone())?;
        Ok(vec![deployment])
    }

    /// Register every installed deployment of a loader project. Project
    /// entries the loader cannot resolve are not installed and are
    /// skipped, not errors.
    pub fn use_deployments_from(
        &mut self,
        project: &str,
        on: &str,
    ) -> Result<Vec<Arc<ConfiguredDeployment>>, RegistryError> {
        let names = self.loader.project_deployment_names(project)?;
        let mut registered = Vec::with_capacity(names.len());
        for name in names {
            match self.loader.deployment_model_from_name(&name) {
                Ok(model) => {
                    registered.extend(self.use_deployment(DeploymentSpec::Model(model), on)?);
                }
                Err(LoaderError::NotFound(name)) => {
                    debug!(deployment = name, "skipping uninstalled deployment");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Ok(registered)
    }

    /// Register a lightweight task that has no independent process
    /// description, wrapping it into a synthetic single-task deployment.
    pub fn use_unmanaged_task(
        &mut self,
        model: TaskModel,
        name: &str,
        on: &str,
    ) -> Result<Arc<ConfiguredDeployment>, RegistryError> {
        let deployment_model = DeploymentModel::new(name).with_task(name, model);
        let deployment = Arc::new(ConfiguredDeployment::new(
            on,
            name,
            deployment_model,
            BTreeMap::new(),
        )?);
        self.register(deployment.clone())?;
        Ok(deployment)
    }

    #[cfg(test)]
    fn candidate_cache_is_valid(&self) -> bool {
        self.candidates.lock().unwrap().is_some()
    }
}
