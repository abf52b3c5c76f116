//! Ports and their connection state.

use crate::ids::{GlueId, InterfaceId, ModuleId, PortId};
use crate::rules::{default_rules, Rule};
use crate::width::DataWidth;
use asterics_common::{Ident, Span};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Signal direction as seen from the owning module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// Input.
    In,
    /// Output.
    Out,
    /// Bidirectional.
    InOut,
}

impl Direction {
    /// The opposite direction; `InOut` stays `InOut`.
    pub fn flipped(self) -> Direction {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
            Direction::InOut => Direction::InOut,
        }
    }

    /// May drive a signal.
    pub fn is_driver(self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }

    /// May be driven.
    pub fn is_sink(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::InOut => "inout",
        })
    }
}

/// How a port was classified at discovery.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortKind {
    /// Lone port, matched by code name.
    Single,
    /// Clock, reset and similar infrastructure ports.
    Standard,
    /// Member of an interface.
    Interface(InterfaceId),
}

/// A port of a specific module instance.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct PortRef {
    /// Owning module.
    pub module: ModuleId,
    /// Port within the module.
    pub port: PortId,
}

impl PortRef {
    /// Creates a reference.
    pub fn new(module: ModuleId, port: PortId) -> Self {
        PortRef { module, port }
    }
}

/// A typed, directional signal of a module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    /// Template name (`data`), or the code name for lone ports.
    pub name: Ident,
    /// Name as declared in the entity (`data_in`).
    pub code_name: Ident,
    /// Direction from the entity declaration.
    pub direction: Direction,
    /// Type mark, lower case.
    pub data_type: String,
    /// Declared width.
    pub data_width: DataWidth,
    /// Width after finalization.
    pub resolved_width: Option<DataWidth>,
    /// Classification.
    pub kind: PortKind,
    /// May be left unconnected.
    pub optional: bool,
    /// Connection rules.
    pub rules: Vec<Rule>,
    /// Driving port, if connected.
    pub incoming: Option<PortRef>,
    /// Driven ports.
    pub outgoing: BTreeSet<PortRef>,
    /// Glue signal the port is attached to.
    pub glue: Option<GlueId>,
    /// Constant the port is tied to instead of a signal.
    pub fixed_value: Option<String>,
    /// Routed to the top level.
    pub external: bool,
    /// Default expression from the declaration.
    pub default_value: Option<String>,
    /// Declaration span.
    pub span: Span,
}

impl Port {
    /// A mandatory lone port with the default rules.
    pub fn new(code_name: Ident, direction: Direction, data_type: impl Into<String>) -> Self {
        Port {
            name: code_name,
            code_name,
            direction,
            data_type: data_type.into(),
            data_width: DataWidth::scalar(),
            resolved_width: None,
            kind: PortKind::Single,
            optional: false,
            rules: default_rules(),
            incoming: None,
            outgoing: BTreeSet::new(),
            glue: None,
            fixed_value: None,
            external: false,
            default_value: None,
            span: Span::DUMMY,
        }
    }

    /// Builder: sets the width.
    pub fn with_width(mut self, width: DataWidth) -> Self {
        self.data_width = width;
        self
    }

    /// Attached to a signal, tied to a constant, or routed outside.
    pub fn is_connected(&self) -> bool {
        self.incoming.is_some()
            || !self.outgoing.is_empty()
            || self.fixed_value.is_some()
            || self.external
    }

    /// The interface the port belongs to.
    pub fn interface(&self) -> Option<InterfaceId> {
        match self.kind {
            PortKind::Interface(id) => Some(id),
            _ => None,
        }
    }

    /// Width to use for checks: resolved if available.
    pub fn effective_width(&self) -> &DataWidth {
        self.resolved_width.as_ref().unwrap_or(&self.data_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asterics_common::Interner;

    #[test]
    fn direction_helpers() {
        assert_eq!(Direction::In.flipped(), Direction::Out);
        assert_eq!(Direction::InOut.flipped(), Direction::InOut);
        assert!(Direction::InOut.is_driver() && Direction::InOut.is_sink());
        assert!(!Direction::In.is_driver());
        assert_eq!(Direction::Out.to_string(), "out");
    }

    #[test]
    fn new_port_is_unconnected() {
        let interner = Interner::new();
        let mut port = Port::new(interner.get_or_intern("strobe_in"), Direction::In, "std_logic");
        assert!(!port.is_connected());
        assert_eq!(port.rules, default_rules());
        port.fixed_value = Some("'0'".into());
        assert!(port.is_connected());
    }

    #[test]
    fn serde_roundtrip() {
        let interner = Interner::new();
        let port = Port::new(interner.get_or_intern("data_in"), Direction::In, "std_logic_vector")
            .with_width(DataWidth::single(crate::width::Range::downto(7, 0)));
        let json = serde_json::to_string(&port).unwrap();
        let back: Port = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code_name, port.code_name);
        assert_eq!(back.data_width, port.data_width);
    }
}
