//! Clock, reset and other infrastructure ports every module may have.

use asterics_model::{default_rules, Action, Condition, Direction, Rule};

/// Description of one standard port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandardPort {
    /// Declared name.
    pub name: &'static str,
    /// Expected direction.
    pub direction: Direction,
    /// Rules for the port.
    pub rules: Vec<Rule>,
}

const EXTERNAL: &[&str] = &["clk", "reset", "reset_n", "rst", "rst_n"];

/// Returns the standard port description for a declared port name.
pub fn standard_port(code_name: &str) -> Option<StandardPort> {
    let name = code_name.to_ascii_lowercase();
    if let Some(n) = EXTERNAL.iter().find(|n| **n == name) {
        let mut rules = default_rules();
        rules.push(Rule::new(Condition::ExternalPort, Action::MakeExternal));
        return Some(StandardPort {
            name: n,
            direction: Direction::In,
            rules,
        });
    }
    let (name, direction) = match name.as_str() {
        "ready" => ("ready", Direction::Out),
        "flush" => ("flush", Direction::In),
        "sync_error_in" => ("sync_error_in", Direction::In),
        "sync_error_out" => ("sync_error_out", Direction::Out),
        _ => return None,
    };
    Some(StandardPort {
        name,
        direction,
        rules: default_rules(),
    })
}
