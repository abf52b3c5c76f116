//! Interfaces and the templates that describe them.

use crate::ids::{GenericId, PortId};
use crate::port::Direction;
use crate::rules::{default_rules, Rule};
use serde::{Deserialize, Serialize};

/// One port slot of an interface template.
///
/// `direction` is given for an `in` interface; an `out` interface flips it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePort {
    /// Slot name, e.g. `strobe`.
    pub name: String,
    /// Direction inside an `in` interface.
    pub direction: Direction,
    /// Required type mark; `None` accepts any.
    pub data_type: Option<String>,
    /// Interface is complete without it.
    pub optional: bool,
    /// Rules copied onto the fitted port.
    pub rules: Vec<Rule>,
}

impl TemplatePort {
    /// A mandatory slot with default rules.
    pub fn new(name: &str, direction: Direction, data_type: Option<&str>) -> Self {
        TemplatePort {
            name: name.to_string(),
            direction,
            data_type: data_type.map(str::to_string),
            optional: false,
            rules: default_rules(),
        }
    }

    /// Builder: marks the slot optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Builder: appends a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Describes an interface type: its port slots and flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceTemplate {
    /// Interface type, e.g. `as_stream`.
    pub type_name: String,
    /// Port slots.
    pub ports: Vec<TemplatePort>,
    /// Fitted interfaces surface on the system boundary.
    pub to_external: bool,
    /// Module entity to auto-instantiate when the interface stays unconnected.
    pub instantiate_in_top: Option<String>,
}

impl InterfaceTemplate {
    /// Creates an empty template.
    pub fn new(type_name: &str) -> Self {
        InterfaceTemplate {
            type_name: type_name.to_string(),
            ports: Vec::new(),
            to_external: false,
            instantiate_in_top: None,
        }
    }

    /// Builder: adds a slot.
    pub fn with_port(mut self, port: TemplatePort) -> Self {
        self.ports.push(port);
        self
    }

    /// Looks up a slot by name.
    pub fn port(&self, name: &str) -> Option<&TemplatePort> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Names of the slots that must be present.
    pub fn mandatory_ports(&self) -> impl Iterator<Item = &str> {
        self.ports
            .iter()
            .filter(|p| !p.optional)
            .map(|p| p.name.as_str())
    }
}

/// A group of ports of one module that is wired as a unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Interface {
    /// Interface type, e.g. `as_stream`.
    pub type_name: String,
    /// `In` for consumers, `Out` for producers.
    pub direction: Direction,
    /// Text before the template name in the code names.
    pub name_prefix: String,
    /// Text after the template name in the code names.
    pub name_suffix: String,
    /// Name used for explicit qualification, unique within the module.
    pub unique_name: String,
    /// Member ports.
    pub ports: Vec<PortId>,
    /// Generics referenced by member widths.
    pub generics: Vec<GenericId>,
    /// Surfaces on the system boundary.
    pub to_external: bool,
    /// Wired to some other interface.
    pub connected: bool,
    /// Entity auto-instantiated when left unconnected.
    pub instantiate_in_top: Option<String>,
}

impl Interface {
    /// Creates an empty interface of a template.
    pub fn from_template(
        template: &InterfaceTemplate,
        direction: Direction,
        name_prefix: &str,
        name_suffix: &str,
    ) -> Self {
        Interface {
            type_name: template.type_name.clone(),
            direction,
            name_prefix: name_prefix.to_string(),
            name_suffix: name_suffix.to_string(),
            unique_name: String::new(),
            ports: Vec::new(),
            generics: Vec::new(),
            to_external: template.to_external,
            connected: false,
            instantiate_in_top: template.instantiate_in_top.clone(),
        }
    }

    /// Actual direction of a template slot inside this interface.
    pub fn port_direction(&self, template_direction: Direction) -> Direction {
        match self.direction {
            Direction::Out => template_direction.flipped(),
            _ => template_direction,
        }
    }
}
