//! Core library for rigger, a component-network resolution engine.
//!
//! Abstract requirements (task models and compositions) are turned into a
//! concrete, deployable network: deployment selection through the
//! [`registry`], wiring inference through [`autoconnect`], and the whole
//! computation driven asynchronously by [`resolve`] so the control loop
//! never blocks on it. [`ports`] holds the trait seams toward the host
//! system; [`impls`] ships in-memory implementations of them.

pub mod autoconnect;
pub mod domain;
pub mod eventlog;
pub mod impls;
pub mod ports;
pub mod registry;
pub mod resolve;
