//! The output of one resolution pass.
//!
//! The background computation writes into this private structure; nothing
//! here touches the live model. Installation happens later, on the control
//! thread, through the `LiveModel` port.

use serde::{Deserialize, Serialize};

use super::composition::ConnectionPolicy;
use super::ids::RequirementId;
use super::model::TaskModel;

/// One concrete task picked for a requirement: which process on which
/// server runs it, under which external task name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedTask {
    pub requirement: RequirementId,
    pub process_server_name: String,
    pub process_name: String,
    pub task_name: String,
    pub model: TaskModel,
}

/// A connection of the resolved network, expressed over external task
/// names so the live model can install it without composition context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConnection {
    pub source_task: String,
    pub source_port: String,
    pub sink_task: String,
    pub sink_port: String,
    pub policy: ConnectionPolicy,
}

/// The complete desired network computed by one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNetwork {
    pub tasks: Vec<DeployedTask>,
    pub connections: Vec<ResolvedConnection>,
}

impl ResolvedNetwork {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.connections.is_empty()
    }

    /// Tasks resolved for a given requirement (a composition requirement
    /// yields one per child).
    pub fn tasks_for(&self, requirement: RequirementId) -> impl Iterator<Item = &DeployedTask> {
        self.tasks
            .iter()
            .filter(move |t| t.requirement == requirement)
    }
}
