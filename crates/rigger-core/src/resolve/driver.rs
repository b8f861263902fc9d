//! Control-loop driving policy.
//!
//! One call per control cycle keeps exactly one resolution moving:
//! stale or forced work is cancelled, finished work is applied, and a
//! fresh batch is started whenever the controller is idle and the live
//! model has pending requirements. Cancelling and restarting in the
//! same cycle is deliberate: the restarted batch picks up the state
//! that invalidated its predecessor.

use tracing::debug;

use crate::domain::ControllerError;
use crate::resolve::controller::ResolutionController;

pub async fn apply_requirement_modifications(
    controller: &mut ResolutionController,
    force: bool,
) -> Result<(), ControllerError> {
    if controller.has_resolution() {
        if force || !controller.valid() {
            debug!(force, "discarding stale resolution");
            controller.cancel();
        } else if controller.finished() {
            controller.apply().await?;
        }
    }

    if !controller.has_resolution() {
        let batch = controller.live().find_pending_requirements();
        if !batch.is_empty() {
            controller.start(batch)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfiguredDeployment, DeploymentModel, TaskModel};
    use crate::impls::InMemoryLiveModel;
    use crate::ports::{RequirementHandle, StaticLoader};
    use crate::registry::DeploymentRegistry;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn camera() -> TaskModel {
        TaskModel::new("camera::Driver")
    }

    fn registry_with_camera() -> Arc<DeploymentRegistry> {
        let mut registry = DeploymentRegistry::new(Arc::new(StaticLoader::new()));
        let model = DeploymentModel::new("camera_deployment").with_task("task", camera());
        let mappings = BTreeMap::from([("task".to_string(), "camera".to_string())]);
        registry
            .register(ConfiguredDeployment::new("main", "camera", model, mappings).unwrap())
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn pending_requirements_start_a_resolution() {
        let live = Arc::new(InMemoryLiveModel::new());
        live.add_requirement(RequirementHandle::task(camera()));
        let mut controller = ResolutionController::new(live.clone(), registry_with_camera());

        apply_requirement_modifications(&mut controller, false)
            .await
            .unwrap();
        assert!(controller.has_resolution());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn no_pending_requirements_stays_idle() {
        let live = Arc::new(InMemoryLiveModel::new());
        let mut controller = ResolutionController::new(live, registry_with_camera());

        apply_requirement_modifications(&mut controller, false)
            .await
            .unwrap();
        assert!(!controller.has_resolution());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn repeated_cycles_eventually_apply() {
        let live = Arc::new(InMemoryLiveModel::new());
        let requirement = RequirementHandle::task(camera());
        live.add_requirement(requirement.clone());
        let mut controller = ResolutionController::new(live.clone(), registry_with_camera());

        // Resolution stays in flight across cycles until it finishes.
        while live.installed_networks().is_empty() {
            apply_requirement_modifications(&mut controller, false)
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
        assert!(live.succeeded(requirement.id));
        assert_eq!(live.active_keepalives(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stale_resolution_is_cancelled_and_replaced() {
        let live = Arc::new(InMemoryLiveModel::new());
        let stale = RequirementHandle::task(camera());
        live.add_requirement(stale.clone());
        let mut controller = ResolutionController::new(live.clone(), registry_with_camera());

        apply_requirement_modifications(&mut controller, false)
            .await
            .unwrap();

        // The old batch disappears, a new requirement shows up.
        live.remove_requirement(stale.id);
        let fresh = RequirementHandle::task(camera());
        live.add_requirement(fresh.clone());

        apply_requirement_modifications(&mut controller, false)
            .await
            .unwrap();
        assert!(controller.has_resolution());
        assert!(controller.valid());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn force_discards_a_valid_resolution() {
        let live = Arc::new(InMemoryLiveModel::new());
        live.add_requirement(RequirementHandle::task(camera()));
        let mut controller = ResolutionController::new(live.clone(), registry_with_camera());

        apply_requirement_modifications(&mut controller, false)
            .await
            .unwrap();
        assert!(controller.valid());

        apply_requirement_modifications(&mut controller, true)
            .await
            .unwrap();
        // Cancelled, then immediately restarted on the same pending batch.
        assert!(controller.has_resolution());
        assert!(live.installed_networks().is_empty());
    }
}
