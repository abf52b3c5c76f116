//! Connection rules attached to ports.
//!
//! A rule pairs a [`Condition`] with an [`Action`]. `both_present` rules are
//! consulted when a connection is made; all other conditions are evaluated
//! for ports that are still unconnected when the design is finalized.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// When a rule applies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Condition {
    /// Both sides of a candidate connection have the port.
    BothPresent,
    /// The port has no counterpart on the other side, whatever its direction.
    AnyMissing,
    /// The port has no counterpart on the sink side.
    SinkMissing,
    /// The input port has no driver.
    SourceMissing,
    /// The port is left unconnected and may be routed to the top level.
    ExternalPort,
    /// The port is unconnected and belongs to no interface.
    SinglePort,
}

/// What to do when a rule's condition holds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Wire the port to its counterpart.
    Connect,
    /// Route the port to the top level.
    MakeExternal,
    /// Report an error.
    Error,
    /// Report a warning.
    Warning,
    /// Report a note.
    Note,
    /// Tie the port to a constant value.
    SetValue(String),
    /// Connect to the named port of the same module instead.
    FallbackPort(String),
    /// Do nothing.
    None,
}

/// A condition/action pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Trigger.
    pub condition: Condition,
    /// Effect.
    pub action: Action,
}

impl Rule {
    /// Creates a rule.
    pub fn new(condition: Condition, action: Action) -> Self {
        Rule { condition, action }
    }
}

/// Rules every port starts with: connect when both sides have it, note
/// when the sink lacks it.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(Condition::BothPresent, Action::Connect),
        Rule::new(Condition::SinkMissing, Action::Note),
    ]
}

/// A rule string could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid rule '{0}'")]
pub struct ParseRuleError(pub String);

impl FromStr for Condition {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "both_present" => Ok(Condition::BothPresent),
            "any_missing" => Ok(Condition::AnyMissing),
            "sink_missing" => Ok(Condition::SinkMissing),
            "source_missing" => Ok(Condition::SourceMissing),
            "external_port" => Ok(Condition::ExternalPort),
            "single_port" => Ok(Condition::SinglePort),
            other => Err(ParseRuleError(other.to_string())),
        }
    }
}

impl FromStr for Action {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((name, rest)) = s.split_once('(') {
            let arg = rest
                .strip_suffix(')')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .ok_or_else(|| ParseRuleError(s.to_string()))?;
            return match name.trim() {
                "set_value" => Ok(Action::SetValue(arg.to_string())),
                "fallback_port" => Ok(Action::FallbackPort(arg.to_ascii_lowercase())),
                _ => Err(ParseRuleError(s.to_string())),
            };
        }
        match s {
            "connect" => Ok(Action::Connect),
            "make_external" => Ok(Action::MakeExternal),
            "error" => Ok(Action::Error),
            "warning" => Ok(Action::Warning),
            "note" => Ok(Action::Note),
            "none" => Ok(Action::None),
            other => Err(ParseRuleError(other.to_string())),
        }
    }
}

impl FromStr for Rule {
    type Err = ParseRuleError;

    /// Parses `condition -> action`, e.g. `sink_missing -> fallback_port(vsync)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cond, action) = s
            .split_once("->")
            .ok_or_else(|| ParseRuleError(s.to_string()))?;
        Ok(Rule {
            condition: cond.parse()?,
            action: action.parse()?,
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Condition::BothPresent => "both_present",
            Condition::AnyMissing => "any_missing",
            Condition::SinkMissing => "sink_missing",
            Condition::SourceMissing => "source_missing",
            Condition::ExternalPort => "external_port",
            Condition::SinglePort => "single_port",
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Connect => f.write_str("connect"),
            Action::MakeExternal => f.write_str("make_external"),
            Action::Error => f.write_str("error"),
            Action::Warning => f.write_str("warning"),
            Action::Note => f.write_str("note"),
            Action::SetValue(v) => write!(f, "set_value({v})"),
            Action::FallbackPort(p) => write!(f, "fallback_port({p})"),
            Action::None => f.write_str("none"),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.condition, self.action)
    }
}
