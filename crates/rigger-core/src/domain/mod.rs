//! Domain model (identifiers, models, ports, deployments, compositions).

pub mod composition;
pub mod deployment;
pub mod errors;
pub mod ids;
pub mod model;
pub mod network;
pub mod port;

pub use composition::{ChildModel, Composition, Connection, ConnectionPolicy, Endpoint};
pub use deployment::{ConfiguredDeployment, DeploymentModel};
pub use errors::{ControllerError, LoaderError, RegistryError, ResolutionError, WiringError};
pub use ids::{InstanceId, KeepaliveId, RequirementId};
pub use model::{HasModel, TaskInstance, TaskModel};
pub use network::{DeployedTask, ResolvedConnection, ResolvedNetwork};
pub use port::{DataType, Port, PortDirection};
