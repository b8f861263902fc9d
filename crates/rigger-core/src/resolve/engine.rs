//! Background resolution computation.
//!
//! Turns a batch of abstract requirements into a concrete network, using
//! the registry for deployment selection and autoconnection for wiring.
//! Pure with respect to the live model: it reads the registry and writes
//! only into its own `ResolvedNetwork`.
//!
//! Cancellation is cooperative: the computation checks the signal at
//! coarse-grained points (between candidate selections) and returns
//! `Cancelled` instead of partial output.

use std::collections::HashMap;

use tokio::sync::watch;

use crate::autoconnect::compute_autoconnection;
use crate::domain::{
    DeployedTask, RequirementId, ResolutionError, ResolvedConnection, ResolvedNetwork, TaskModel,
};
use crate::ports::{RequirementHandle, RequirementSpec};
use crate::registry::DeploymentRegistry;

pub fn resolve_network(
    registry: &DeploymentRegistry,
    batch: &[RequirementHandle],
    cancel: &watch::Receiver<bool>,
) -> Result<ResolvedNetwork, ResolutionError> {
    let mut network = ResolvedNetwork::default();

    for requirement in batch {
        if *cancel.borrow() {
            return Err(ResolutionError::Cancelled);
        }

        match &requirement.spec {
            RequirementSpec::Task(model) => {
                network
                    .tasks
                    .push(pick_deployment(registry, requirement.id, model)?);
            }
            RequirementSpec::Composition(composition) => {
                let mut composition = composition.clone();
                compute_autoconnection(&mut composition)?;

                let mut task_names: HashMap<String, String> = HashMap::new();
                for (child_name, child) in composition.children() {
                    if *cancel.borrow() {
                        return Err(ResolutionError::Cancelled);
                    }
                    let task = pick_deployment(registry, requirement.id, &child.model)?;
                    task_names.insert(child_name.to_string(), task.task_name.clone());
                    network.tasks.push(task);
                }

                for connection in composition.connections() {
                    network.connections.push(ResolvedConnection {
                        source_task: task_names[&connection.source.child].clone(),
                        source_port: connection.source.port.clone(),
                        sink_task: task_names[&connection.sink.child].clone(),
                        sink_port: connection.sink.port.clone(),
                        policy: connection.policy.clone(),
                    });
                }
            }
        }
    }

    Ok(network)
}

/// Pick the deployment for a task model. Exactly one candidate is
/// required: zero means the model cannot be deployed at all, several
/// means the configuration must disambiguate and we refuse to guess.
fn pick_deployment(
    registry: &DeploymentRegistry,
    requirement: RequirementId,
    model: &TaskModel,
) -> Result<DeployedTask, ResolutionError> {
    let candidates = registry.candidates_for(model);
    match candidates.len() {
        0 => Err(ResolutionError::NoDeployment(model.clone())),
        1 => {
            let (deployment, task_name) = candidates.into_iter().next().unwrap();
            Ok(DeployedTask {
                requirement,
                process_server_name: deployment.process_server_name().to_string(),
                process_name: deployment.process_name().to_string(),
                task_name,
                model: model.clone(),
            })
        }
        n => Err(ResolutionError::AmbiguousDeployment {
            model: model.clone(),
            count: n,
        }),
    }
}
