//! Compositions: component models with named children and connections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::errors::WiringError;
use super::model::TaskModel;
use super::port::{Port, PortDirection};

/// A child slot of a composition: the model it is bound to plus the ports
/// that model exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildModel {
    pub model: TaskModel,
    pub ports: Vec<Port>,
}

impl ChildModel {
    pub fn new(model: TaskModel, ports: Vec<Port>) -> Self {
        Self { model, ports }
    }

    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }
}

/// A (child name, port name) pair inside a composition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub child: String,
    pub port: String,
}

impl Endpoint {
    pub fn new(child: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            child: child.into(),
            port: port.into(),
        }
    }
}

/// Transport options attached to a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPolicy {
    /// Buffered connection of the given depth; `None` means data-flow
    /// default (last sample wins).
    pub buffer_size: Option<usize>,
}

/// A directed connection between two child ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: Endpoint,
    pub sink: Endpoint,
    pub policy: ConnectionPolicy,
    /// True when this connection was inferred by autoconnection rather
    /// than written by the composition's author.
    pub inferred: bool,
}

/// A component model with named children, connections between their ports
/// and an exported-port interface.
///
/// Invariants:
/// - no two connections share the same (source, sink) endpoint pair;
/// - exports map external names injectively onto child ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    name: String,
    children: BTreeMap<String, ChildModel>,
    connections: Vec<Connection>,
    exports: BTreeMap<String, Endpoint>,
}

impl Composition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
            connections: Vec::new(),
            exports: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, name: impl Into<String>, child: ChildModel) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ChildModel)> {
        self.children.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn child(&self, name: &str) -> Option<&ChildModel> {
        self.children.get(name)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn resolve_port(&self, endpoint: &Endpoint) -> Result<Port, WiringError> {
        let child = self
            .children
            .get(&endpoint.child)
            .ok_or_else(|| WiringError::UnknownChild(endpoint.child.clone()))?;
        child
            .port(&endpoint.port)
            .cloned()
            .ok_or_else(|| WiringError::UnknownPort {
                child: endpoint.child.clone(),
                port: endpoint.port.clone(),
            })
    }

    /// Install an explicit, author-specified connection.
    ///
    /// Connecting an endpoint pair that is already connected replaces the
    /// policy, keeping the one-connection-per-pair invariant.
    pub fn connect(
        &mut self,
        source: Endpoint,
        sink: Endpoint,
        policy: ConnectionPolicy,
    ) -> Result<(), WiringError> {
        let source_port = self.resolve_port(&source)?;
        let sink_port = self.resolve_port(&sink)?;
        debug_assert_eq!(source_port.direction, PortDirection::Output);
        debug_assert_eq!(sink_port.direction, PortDirection::Input);

        if let Some(existing) = self
            .connections
            .iter_mut()
            .find(|c| c.source == source && c.sink == sink)
        {
            existing.policy = policy;
            existing.inferred = false;
            return Ok(());
        }

        self.connections.push(Connection {
            source,
            sink,
            policy,
            inferred: false,
        });
        Ok(())
    }

    /// Bind an external port name to a child port.
    ///
    /// Re-binding a name to the same port is a no-op; binding it to a
    /// different port fails and changes nothing.
    pub fn export(&mut self, child_port: Endpoint, as_name: impl Into<String>) -> Result<(), WiringError> {
        self.resolve_port(&child_port)?;
        let as_name = as_name.into();
        match self.exports.get(&as_name) {
            Some(existing) if *existing == child_port => Ok(()),
            Some(_) => Err(WiringError::ExportConflict(as_name)),
            None => {
                self.exports.insert(as_name, child_port);
                Ok(())
            }
        }
    }

    /// Resolve an exported port name to the child port behind it.
    pub fn exported_port(&self, name: &str) -> Option<&Endpoint> {
        self.exports.get(name)
    }

    /// True if the endpoint appears in any explicit connection. Such ports
    /// are off-limits to autoconnection.
    pub(crate) fn endpoint_explicitly_connected(&self, endpoint: &Endpoint) -> bool {
        self.connections
            .iter()
            .filter(|c| !c.inferred)
            .any(|c| c.source == *endpoint || c.sink == *endpoint)
    }

    /// Drop previously inferred connections (autoconnection recompute).
    pub(crate) fn clear_inferred(&mut self) {
        self.connections.retain(|c| !c.inferred);
    }

    /// Install a batch of inferred connections.
    pub(crate) fn add_inferred(&mut self, connections: impl IntoIterator<Item = Connection>) {
        self.connections.extend(connections);
    }
}
