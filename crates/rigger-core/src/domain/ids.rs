//! Domain identifiers (strongly-typed IDs).
//!
//! All identifiers are ULID-backed so they sort by creation time and can be
//! generated without coordination. A single generic `Id<T>` carries the
//! shared implementation; the marker type `T` exists only at compile time
//! and keeps the different identifier kinds from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for identifier kinds.
///
/// Provides the prefix used by `Display` (e.g. "req-", "inst-").
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed identifier.
///
/// `T` is phantom: it consumes no memory but makes `RequirementId` and
/// `InstanceId` distinct types at compile time.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self::from_ulid(Ulid::from_parts(
            chrono::Utc::now().timestamp_millis() as u64,
            rand::random(),
        ))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for requirement identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Requirement {}

impl IdMarker for Requirement {
    fn prefix() -> &'static str {
        "req-"
    }
}

/// Marker for component instance identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Instance {}

impl IdMarker for Instance {
    fn prefix() -> &'static str {
        "inst-"
    }
}

/// Marker for keepalive transaction identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keepalive {}

impl IdMarker for Keepalive {
    fn prefix() -> &'static str {
        "keep-"
    }
}

/// Identifier of an abstract requirement pending in the live model.
pub type RequirementId = Id<Requirement>;

/// Identifier of a running component instance.
pub type InstanceId = Id<Instance>;

/// Identifier of a keepalive transaction held on the live model.
pub type KeepaliveId = Id<Keepalive>;
