//! Concrete port implementations shipped with the library.

pub mod inmem_model;

pub use self::inmem_model::{InMemoryLiveModel, RequirementOutcome};
