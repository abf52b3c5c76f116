//! Errors raised while attaching objects to modules or assigning values.

use asterics_common::Span;
use asterics_diagnostics::{Category, Diagnostic, DiagnosticCode};
use std::fmt;

/// Object name already used in its parent.
pub const E201: DiagnosticCode = DiagnosticCode::new(Category::Error, 201);
/// Referenced object does not exist in its parent.
pub const E202: DiagnosticCode = DiagnosticCode::new(Category::Error, 202);
/// Generic link would close a cycle.
pub const E203: DiagnosticCode = DiagnosticCode::new(Category::Error, 203);
/// Value rejected by a generic's value check.
pub const E204: DiagnosticCode = DiagnosticCode::new(Category::Error, 204);
/// Module-local write to a generic that is linked elsewhere.
pub const E205: DiagnosticCode = DiagnosticCode::new(Category::Error, 205);

/// Kind of model object named in an [`AssignError`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ObjectKind {
    /// A module instance.
    Module,
    /// A port.
    Port,
    /// An interface.
    Interface,
    /// A generic.
    Generic,
    /// A constant.
    Constant,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Module => "module",
            ObjectKind::Port => "port",
            ObjectKind::Interface => "interface",
            ObjectKind::Generic => "generic",
            ObjectKind::Constant => "constant",
        })
    }
}

/// Invalid attachment of a sub-object to a parent, or invalid assignment.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    /// A sibling with the same name exists.
    #[error("{parent} already has a {kind} named '{name}'")]
    Duplicate {
        /// Parent object.
        parent: String,
        /// Kind of the rejected object.
        kind: ObjectKind,
        /// Its name.
        name: String,
    },
    /// No such object in the parent.
    #[error("{parent} has no {kind} named '{name}'")]
    UnknownObject {
        /// Parent object.
        parent: String,
        /// Kind looked for.
        kind: ObjectKind,
        /// Name or ID looked for.
        name: String,
    },
    /// Linking would make the value chain loop.
    #[error("generic link cycle: {}", chain.join(" -> "))]
    LinkCycle {
        /// `module.GENERIC` names around the cycle, first repeated at the end.
        chain: Vec<String>,
    },
    /// The generic's value check refused the value.
    #[error("value {value} rejected for generic {generic}: expected {check}")]
    ValueRejected {
        /// `module.GENERIC`.
        generic: String,
        /// Offered value.
        value: String,
        /// Description of the check.
        check: String,
    },
    /// Module-local write to a linked generic; must go through the design.
    #[error("generic {generic} is linked to {target}")]
    Linked {
        /// `module.GENERIC`.
        generic: String,
        /// Link target.
        target: String,
    },
}

impl AssignError {
    /// Code of this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            AssignError::Duplicate { .. } => E201,
            AssignError::UnknownObject { .. } => E202,
            AssignError::LinkCycle { .. } => E203,
            AssignError::ValueRejected { .. } => E204,
            AssignError::Linked { .. } => E205,
        }
    }

    /// Cyclic links invalidate every later resolution.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AssignError::LinkCycle { .. })
    }

    /// Converts into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string(), Span::DUMMY);
        match self {
            AssignError::Duplicate { parent, .. } | AssignError::UnknownObject { parent, .. } => {
                diag.with_subject(parent.clone())
            }
            AssignError::LinkCycle { chain } => match chain.first() {
                Some(first) => diag.with_subject(first.clone()),
                None => diag,
            },
            AssignError::ValueRejected { generic, .. } => diag.with_subject(generic.clone()),
            AssignError::Linked { generic, .. } => diag
                .with_subject(generic.clone())
                .with_help("assign the value through the design so it reaches the link target"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_cycle_message() {
        let err = AssignError::LinkCycle {
            chain: vec!["a.X".into(), "b.Y".into(), "a.X".into()],
        };
        assert_eq!(err.to_string(), "generic link cycle: a.X -> b.Y -> a.X");
        assert!(err.is_fatal());
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, E203);
        assert_eq!(diag.subject.as_deref(), Some("a.X"));
    }

    #[test]
    fn duplicate_message() {
        let err = AssignError::Duplicate {
            parent: "as_invert_0".into(),
            kind: ObjectKind::Port,
            name: "data_in".into(),
        };
        assert_eq!(err.to_string(), "as_invert_0 already has a port named 'data_in'");
        assert!(!err.is_fatal());
        assert_eq!(err.code().to_string(), "E201");
    }
}
