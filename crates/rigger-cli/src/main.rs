use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use rigger_core::domain::{
    ChildModel, Composition, ConfiguredDeployment, DeploymentModel, Port, TaskModel,
};
use rigger_core::impls::InMemoryLiveModel;
use rigger_core::ports::{LiveModel, RequirementHandle, StaticLoader};
use rigger_core::registry::DeploymentRegistry;
use rigger_core::resolve::{ResolutionController, apply_requirement_modifications};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn demo_registry() -> Result<DeploymentRegistry> {
    let loader = Arc::new(StaticLoader::new());
    let mut registry = DeploymentRegistry::new(loader);

    let camera = TaskModel::new("camera::Driver");
    let tracker = TaskModel::new("vision::Tracker");

    let camera_deployment =
        DeploymentModel::new("camera_deployment").with_task("task", camera.clone());
    registry.register(ConfiguredDeployment::new(
        "main",
        "camera",
        camera_deployment,
        BTreeMap::from([("task".to_string(), "camera".to_string())]),
    )?)?;

    let tracker_deployment =
        DeploymentModel::new("tracker_deployment").with_task("task", tracker.clone());
    registry.register(ConfiguredDeployment::new(
        "main",
        "tracker",
        tracker_deployment,
        BTreeMap::from([("task".to_string(), "tracker".to_string())]),
    )?)?;

    Ok(registry)
}

fn demo_requirements() -> Vec<RequirementHandle> {
    // One plain task plus a composition whose wiring is inferred.
    let pipeline = Composition::new("tracking_pipeline")
        .with_child(
            "camera",
            ChildModel::new(
                TaskModel::new("camera::Driver"),
                vec![Port::output("frame", "image")],
            ),
        )
        .with_child(
            "tracker",
            ChildModel::new(
                TaskModel::new("vision::Tracker"),
                vec![Port::input("frame", "image")],
            ),
        );

    vec![
        RequirementHandle::task(TaskModel::new("camera::Driver")),
        RequirementHandle::composition(pipeline),
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let registry = Arc::new(demo_registry()?);
    let live = Arc::new(InMemoryLiveModel::new());
    for requirement in demo_requirements() {
        live.add_requirement(requirement);
    }

    let mut controller = ResolutionController::new(live.clone(), registry);

    // Drive the controller the way a host control loop would: one policy
    // call per cycle until everything pending has been resolved.
    while !live.find_pending_requirements().is_empty() || controller.has_resolution() {
        apply_requirement_modifications(&mut controller, false).await?;
        sleep(Duration::from_millis(10)).await;
    }

    for network in live.installed_networks() {
        println!("{}", serde_json::to_string_pretty(&network)?);
    }
    live.with_log(|log| {
        info!(
            iterations = log.current_iteration(),
            started = log.started_since(0).len(),
            "runtime event log"
        );
    });

    Ok(())
}
