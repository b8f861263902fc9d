//! Network resolution: background computation, its controller, and the
//! control-loop driving policy.

pub mod controller;
pub mod driver;
pub mod engine;

pub use self::controller::{ResolutionController, ResolutionState};
pub use self::driver::apply_requirement_modifications;
pub use self::engine::resolve_network;
