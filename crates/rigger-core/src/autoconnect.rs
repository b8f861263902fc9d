//! Autoconnection: inferring wiring between sibling children.
//!
//! The resolver only ever wires what is unambiguous. A child pair with
//! several compatible port pairs, or two inferred connections fanning in
//! to the same input port, fails the whole computation: partial
//! autoconnection is never applied. Explicit connections are left alone
//! and their ports are off-limits to inference.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{
    ChildModel, Composition, Connection, ConnectionPolicy, Endpoint, PortDirection, WiringError,
};

/// Compute and install the inferred connections of a composition.
///
/// Previously inferred connections are dropped first, so the pass can be
/// re-run after the composition changed. Returns the number of inferred
/// connections installed.
pub fn compute_autoconnection(composition: &mut Composition) -> Result<usize, WiringError> {
    composition.clear_inferred();

    let children: Vec<(String, ChildModel)> = composition
        .children()
        .map(|(name, child)| (name.to_string(), child.clone()))
        .collect();

    let mut inferred: Vec<Connection> = Vec::new();
    for (i, (left_name, left)) in children.iter().enumerate() {
        for (right_name, right) in &children[i + 1..] {
            let candidates =
                candidate_pairs(composition, left_name, left, right_name, right);
            match candidates.len() {
                0 => {}
                1 => {
                    let (source, sink) = candidates.into_iter().next().unwrap();
                    inferred.push(Connection {
                        source,
                        sink,
                        policy: ConnectionPolicy::default(),
                        inferred: true,
                    });
                }
                n => {
                    return Err(WiringError::Ambiguous {
                        left: left_name.clone(),
                        right: right_name.clone(),
                        candidates: n,
                    });
                }
            }
        }
    }

    // Each child pair was unambiguous on its own, but two of them may
    // still compete for the same input port (fan-in). Fan-out from one
    // output to several inputs is fine.
    let mut sinks: HashMap<&Endpoint, &Endpoint> = HashMap::new();
    for connection in &inferred {
        if let Some(previous_source) = sinks.insert(&connection.sink, &connection.source) {
            return Err(WiringError::Ambiguous {
                left: previous_source.child.clone(),
                right: connection.source.child.clone(),
                candidates: 2,
            });
        }
    }

    let count = inferred.len();
    debug!(
        composition = composition.name(),
        connections = count,
        "autoconnection computed"
    );
    composition.add_inferred(inferred);
    Ok(count)
}

/// Candidate (source, sink) endpoint pairs between two children, skipping
/// ports already covered by an explicit connection.
fn candidate_pairs(
    composition: &Composition,
    left_name: &str,
    left: &ChildModel,
    right_name: &str,
    right: &ChildModel,
) -> Vec<(Endpoint, Endpoint)> {
    let mut candidates = Vec::new();
    for left_port in &left.ports {
        let left_endpoint = Endpoint::new(left_name, &left_port.name);
        if composition.endpoint_explicitly_connected(&left_endpoint) {
            continue;
        }
        for right_port in &right.ports {
            let right_endpoint = Endpoint::new(right_name, &right_port.name);
            if composition.endpoint_explicitly_connected(&right_endpoint) {
                continue;
            }
            if !left_port.connectable_to(right_port) {
                continue;
            }
            if left_port.direction == PortDirection::Output {
                candidates.push((left_endpoint.clone(), right_endpoint));
            } else {
                candidates.push((right_endpoint, left_endpoint.clone()));
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Port, TaskModel};

    fn source() -> ChildModel {
        ChildModel::new(
            TaskModel::new("simple::Source"),
            vec![Port::output("cycle", "f64")],
        )
    }

    fn sink() -> ChildModel {
        ChildModel::new(
            TaskModel::new("simple::Sink"),
            vec![Port::input("cycle", "f64")],
        )
    }

    /// A child with one input and one output of the same type.
    fn echo() -> ChildModel {
        ChildModel::new(
            TaskModel::new("echo::Echo"),
            vec![Port::input("in", "f64"), Port::output("out", "f64")],
        )
    }

    #[test]
    fn single_compatible_pair_is_wired() {
        let mut c = Composition::new("source_sink")
            .with_child("source", source())
            .with_child("sink", sink());

        assert_eq!(compute_autoconnection(&mut c).unwrap(), 1);
        let connections = c.connections();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].source, Endpoint::new("source", "cycle"));
        assert_eq!(connections[0].sink, Endpoint::new("sink", "cycle"));
        assert!(connections[0].inferred);
        assert_eq!(connections[0].policy, ConnectionPolicy::default());
    }

    #[test]
    fn fan_out_to_several_sinks_is_allowed() {
        let mut c = Composition::new("fan_out")
            .with_child("source", source())
            .with_child("sink1", sink())
            .with_child("sink2", sink());

        assert_eq!(compute_autoconnection(&mut c).unwrap(), 2);
    }

    #[test]
    fn several_candidates_between_two_children_is_ambiguous() {
        let mut c = Composition::new("echo_pair")
            .with_child("echo1", echo())
            .with_child("echo2", echo());

        let err = compute_autoconnection(&mut c).unwrap_err();
        assert!(matches!(err, WiringError::Ambiguous { candidates: 2, .. }));
        assert!(c.connections().is_empty());
    }

    #[test]
    fn fan_in_to_one_input_is_ambiguous_and_applies_nothing() {
        let mut c = Composition::new("fan_in")
            .with_child("sink", sink())
            .with_child("source1", source())
            .with_child("source2", source());

        let err = compute_autoconnection(&mut c).unwrap_err();
        assert!(matches!(err, WiringError::Ambiguous { .. }));
        // Atomic: not even the first, individually fine, pair was applied.
        assert!(c.connections().is_empty());
    }

    #[test]
    fn explicitly_connected_ports_are_excluded_from_inference() {
        let mut c = Composition::new("echo_pair")
            .with_child("echo1", echo())
            .with_child("echo2", echo());

        // The author wired one direction; the resolver may only consider
        // the remaining ports, which leave exactly one candidate.
        c.connect(
            Endpoint::new("echo1", "out"),
            Endpoint::new("echo2", "in"),
            ConnectionPolicy::default(),
        )
        .unwrap();

        assert_eq!(compute_autoconnection(&mut c).unwrap(), 1);
        assert_eq!(c.connections().len(), 2);
        let inferred: Vec<_> = c.connections().iter().filter(|x| x.inferred).collect();
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].source, Endpoint::new("echo2", "out"));
        assert_eq!(inferred[0].sink, Endpoint::new("echo1", "in"));
    }

    #[test]
    fn recomputation_does_not_duplicate_inferred_connections() {
        let mut c = Composition::new("source_sink")
            .with_child("source", source())
            .with_child("sink", sink());

        compute_autoconnection(&mut c).unwrap();
        compute_autoconnection(&mut c).unwrap();
        assert_eq!(c.connections().len(), 1);
    }

    #[test]
    fn incompatible_types_yield_no_connection() {
        let text_sink = ChildModel::new(
            TaskModel::new("text::Sink"),
            vec![Port::input("text", "string")],
        );
        let mut c = Composition::new("mismatch")
            .with_child("source", source())
            .with_child("sink", text_sink);

        assert_eq!(compute_autoconnection(&mut c).unwrap(), 0);
        assert!(c.connections().is_empty());
    }
}
