//! Task models and instances.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::InstanceId;

/// Identifier of an abstract component type, used as a resolution key.
///
/// Immutable once defined; equality and hashing go by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskModel(String);

impl TaskModel {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Anything that can be normalized to a task model.
///
/// Implemented by bare models and by live instances, so lookup code can
/// accept either without probing concrete types. `concrete_model` is the
/// most-specialized resolved model; for anything that has not been
/// specialized it is the declared model itself.
pub trait HasModel {
    fn model(&self) -> &TaskModel;

    fn concrete_model(&self) -> &TaskModel {
        self.model()
    }
}

impl HasModel for TaskModel {
    fn model(&self) -> &TaskModel {
        self
    }
}

/// A component instance in the live model.
///
/// Carries the model it was declared with and, once the instance has been
/// specialized, the concrete model actually running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInstance {
    id: InstanceId,
    model: TaskModel,
    concrete: Option<TaskModel>,
}

impl TaskInstance {
    pub fn new(model: TaskModel) -> Self {
        Self {
            id: InstanceId::generate(),
            model,
            concrete: None,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Record the concrete model this instance specialized into.
    pub fn specialize(&mut self, concrete: TaskModel) {
        self.concrete = Some(concrete);
    }
}

impl HasModel for TaskInstance {
    fn model(&self) -> &TaskModel {
        &self.model
    }

    fn concrete_model(&self) -> &TaskModel {
        self.concrete.as_ref().unwrap_or(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_model_is_its_own_concrete_model() {
        let m = TaskModel::new("camera::Driver");
        assert_eq!(m.model(), &m);
        assert_eq!(m.concrete_model(), &m);
    }

    #[test]
    fn unspecialized_instance_falls_back_to_declared_model() {
        let m = TaskModel::new("camera::Driver");
        let inst = TaskInstance::new(m.clone());
        assert_eq!(inst.model(), &m);
        assert_eq!(inst.concrete_model(), &m);
    }

    #[test]
    fn specialized_instance_reports_concrete_model() {
        let declared = TaskModel::new("camera::Driver");
        let concrete = TaskModel::new("camera::Driver<hires>");
        let mut inst = TaskInstance::new(declared.clone());
        inst.specialize(concrete.clone());
        assert_eq!(inst.model(), &declared);
        assert_eq!(inst.concrete_model(), &concrete);
    }
}
