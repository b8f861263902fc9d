//! Component ports and connectability.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the data type flowing through a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataType(String);

impl DataType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn complements(self, other: PortDirection) -> bool {
        self != other
    }
}

/// A named, directed, typed port on a component model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    pub data_type: DataType,
}

impl Port {
    pub fn input(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            data_type: DataType::new(data_type),
        }
    }

    pub fn output(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            data_type: DataType::new(data_type),
        }
    }

    /// Two ports can be wired iff their directions complement each other
    /// and their data types match.
    pub fn connectable_to(&self, other: &Port) -> bool {
        self.direction.complements(other.direction) && self.data_type == other.data_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::out_to_in(Port::output("cycle", "f64"), Port::input("cycle", "f64"), true)]
    #[case::in_to_out(Port::input("cycle", "f64"), Port::output("cycle", "f64"), true)]
    #[case::same_direction(Port::output("a", "f64"), Port::output("b", "f64"), false)]
    #[case::type_mismatch(Port::output("a", "f64"), Port::input("b", "u32"), false)]
    fn connectability(#[case] a: Port, #[case] b: Port, #[case] expected: bool) {
        assert_eq!(a.connectable_to(&b), expected);
    }
}
