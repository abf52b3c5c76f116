//! Connection and build errors, plus the notes and warnings the engine emits.

use asterics_common::Span;
use asterics_diagnostics::{Category, Diagnostic, DiagnosticCode};
use asterics_library::ModuleError;
use asterics_model::{AssignError, EvalError};
use asterics_vhdl::{AnalysisError, FileError};

/// No compatible interface or port pair.
pub const E401: DiagnosticCode = DiagnosticCode::new(Category::Error, 401);
/// More than one compatible pair.
pub const E402: DiagnosticCode = DiagnosticCode::new(Category::Error, 402);
/// Sink port already driven.
pub const E403: DiagnosticCode = DiagnosticCode::new(Category::Error, 403);
/// Driver cannot drive or sink cannot be driven.
pub const E404: DiagnosticCode = DiagnosticCode::new(Category::Error, 404);
/// Data types differ.
pub const E405: DiagnosticCode = DiagnosticCode::new(Category::Error, 405);
/// Resolved widths differ.
pub const E406: DiagnosticCode = DiagnosticCode::new(Category::Error, 406);
/// Layer without members.
pub const E407: DiagnosticCode = DiagnosticCode::new(Category::Error, 407);
/// Named module, interface, port or layer does not exist.
pub const E408: DiagnosticCode = DiagnosticCode::new(Category::Error, 408);
/// A port rule forbids the connection or the open port.
pub const E409: DiagnosticCode = DiagnosticCode::new(Category::Error, 409);
/// Layer name used twice.
pub const E410: DiagnosticCode = DiagnosticCode::new(Category::Error, 410);
/// Expression could not be evaluated.
pub const E501: DiagnosticCode = DiagnosticCode::new(Category::Error, 501);
/// Width still references unknown names after finalization.
pub const E502: DiagnosticCode = DiagnosticCode::new(Category::Error, 502);
/// Chain stopped after a fatal error.
pub const E503: DiagnosticCode = DiagnosticCode::new(Category::Error, 503);
/// Port rule warning.
pub const W401: DiagnosticCode = DiagnosticCode::new(Category::Warning, 401);
/// Mandatory input left open.
pub const W402: DiagnosticCode = DiagnosticCode::new(Category::Warning, 402);
/// Width left unresolved with strict widths off.
pub const W501: DiagnosticCode = DiagnosticCode::new(Category::Warning, 501);
/// Generic linked to carry a width across a connection.
pub const N401: DiagnosticCode = DiagnosticCode::new(Category::Note, 401);
/// Module auto-instantiated.
pub const N402: DiagnosticCode = DiagnosticCode::new(Category::Note, 402);
/// Port rule note.
pub const N403: DiagnosticCode = DiagnosticCode::new(Category::Note, 403);

/// Ambiguous or impossible wiring. Names are `module`, `module.interface`
/// or `module.port`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Nothing on the two sides fits together.
    #[error("no compatible port or interface found between '{driver}' and '{sink}'")]
    NoCandidate {
        /// Driving side.
        driver: String,
        /// Sink side.
        sink: String,
    },
    /// Several pairs fit; the caller must qualify the interface.
    #[error("ambiguous connection from '{driver}' to '{sink}', qualify the interface: {}", candidates.join(", "))]
    Ambiguous {
        /// Driving side.
        driver: String,
        /// Sink side.
        sink: String,
        /// Compatible pairs.
        candidates: Vec<String>,
    },
    /// The sink is already driven or tied off.
    #[error("port '{port}' is already connected")]
    AlreadyConnected {
        /// The sink port or interface.
        port: String,
    },
    /// Directions do not allow the connection.
    #[error("cannot drive '{sink}' from '{driver}': {detail}")]
    DirectionMismatch {
        /// Driving side.
        driver: String,
        /// Driven side.
        sink: String,
        /// Which direction is wrong.
        detail: String,
    },
    /// Data types differ.
    #[error("type mismatch: '{driver}' is {driver_type}, '{sink}' is {sink_type}")]
    TypeMismatch {
        /// Driving port.
        driver: String,
        /// Driven port.
        sink: String,
        /// Driver type.
        driver_type: String,
        /// Sink type.
        sink_type: String,
    },
    /// Both widths are known and differ.
    #[error("width mismatch: '{driver}' has {driver_width} bit(s), '{sink}' has {sink_width}")]
    WidthMismatch {
        /// Driving port.
        driver: String,
        /// Driven port.
        sink: String,
        /// Driver bit count.
        driver_width: u64,
        /// Sink bit count.
        sink_width: u64,
    },
    /// A layer used as an endpoint has no members.
    #[error("layer '{layer}' has no modules")]
    EmptyLayer {
        /// Layer name.
        layer: String,
    },
    /// A named target does not exist.
    #[error("unknown {kind} '{name}'")]
    UnknownTarget {
        /// What was looked for.
        kind: &'static str,
        /// Name as given.
        name: String,
    },
    /// A port rule raised an error.
    #[error("rule '{rule}' of port '{port}' reports an error")]
    RuleViolation {
        /// The port.
        port: String,
        /// The rule, e.g. `sink_missing -> error`.
        rule: String,
    },
    /// Layer name taken.
    #[error("layer '{layer}' already exists")]
    DuplicateLayer {
        /// Layer name.
        layer: String,
    },
}

impl ConnectionError {
    /// Code of this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ConnectionError::NoCandidate { .. } => E401,
            ConnectionError::Ambiguous { .. } => E402,
            ConnectionError::AlreadyConnected { .. } => E403,
            ConnectionError::DirectionMismatch { .. } => E404,
            ConnectionError::TypeMismatch { .. } => E405,
            ConnectionError::WidthMismatch { .. } => E406,
            ConnectionError::EmptyLayer { .. } => E407,
            ConnectionError::UnknownTarget { .. } => E408,
            ConnectionError::RuleViolation { .. } => E409,
            ConnectionError::DuplicateLayer { .. } => E410,
        }
    }

    /// The object the error is about.
    pub fn subject(&self) -> &str {
        match self {
            ConnectionError::NoCandidate { sink, .. }
            | ConnectionError::Ambiguous { sink, .. }
            | ConnectionError::DirectionMismatch { sink, .. }
            | ConnectionError::TypeMismatch { sink, .. }
            | ConnectionError::WidthMismatch { sink, .. } => sink,
            ConnectionError::AlreadyConnected { port }
            | ConnectionError::RuleViolation { port, .. } => port,
            ConnectionError::EmptyLayer { layer } | ConnectionError::DuplicateLayer { layer } => {
                layer
            }
            ConnectionError::UnknownTarget { name, .. } => name,
        }
    }

    /// Converts into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string(), Span::DUMMY)
            .with_subject(self.subject().to_string());
        match self {
            ConnectionError::Ambiguous { .. } => {
                diag.with_help("connect a specific interface, e.g. chain.interface(module, \"out\")")
            }
            _ => diag,
        }
    }
}

/// Any failure while building a processing chain.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Malformed declaration text.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Unreadable declaration file.
    #[error(transparent)]
    File(#[from] FileError),
    /// Invalid attachment or assignment.
    #[error(transparent)]
    Assign(#[from] AssignError),
    /// Unknown or unresolvable module.
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// Impossible or ambiguous wiring.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// A width or value expression is malformed or faults.
    #[error("cannot evaluate {subject}: {source}")]
    Eval {
        /// The port, constant or generic.
        subject: String,
        /// Evaluation failure.
        #[source]
        source: EvalError,
    },
    /// Width unresolved after finalization.
    #[error("width of '{subject}' is unresolved; no value for {}", names.join(", "))]
    UnresolvedWidth {
        /// The port, glue signal or constant.
        subject: String,
        /// Names without a value.
        names: Vec<String>,
    },
    /// A fatal error stopped the chain earlier.
    #[error("processing chain aborted after a fatal error")]
    Aborted,
}

impl BuildError {
    /// Errors after which further wiring is meaningless.
    pub fn is_fatal(&self) -> bool {
        match self {
            BuildError::Module(e) => e.is_fatal(),
            BuildError::Assign(e) => e.is_fatal(),
            BuildError::Aborted => true,
            _ => false,
        }
    }

    /// Converts into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::Analysis(e) => e.to_diagnostic(),
            BuildError::File(e) => e.to_diagnostic(),
            BuildError::Assign(e) => e.to_diagnostic(),
            BuildError::Module(e) => e.to_diagnostic(),
            BuildError::Connection(e) => e.to_diagnostic(),
            BuildError::Eval { subject, .. } => {
                Diagnostic::error(E501, self.to_string(), Span::DUMMY).with_subject(subject.clone())
            }
            BuildError::UnresolvedWidth { subject, .. } => {
                Diagnostic::error(E502, self.to_string(), Span::DUMMY)
                    .with_subject(subject.clone())
                    .with_help("set the generics the width depends on")
            }
            BuildError::Aborted => Diagnostic::error(E503, self.to_string(), Span::DUMMY),
        }
    }
}

/// Note for a generic linked during a connection.
pub fn note_width_propagated(sink_generic: &str, source_generic: &str) -> Diagnostic {
    Diagnostic::note(
        N401,
        format!("linked {sink_generic} to {source_generic} to match connected port widths"),
        Span::DUMMY,
    )
    .with_subject(sink_generic.to_string())
}

/// Note for an auto-instantiated module.
pub fn note_auto_instantiated(instance: &str, entity: &str, instantiator: &str) -> Diagnostic {
    Diagnostic::note(
        N402,
        format!("instantiated '{entity}' as '{instance}' for '{instantiator}'"),
        Span::DUMMY,
    )
    .with_subject(instance.to_string())
}

/// Diagnostic for a `warning` or `note` rule firing on an open port.
pub fn rule_report(port: &str, rule: &str, warning: bool) -> Diagnostic {
    let message = format!("port '{port}' left unconnected ({rule})");
    let diag = if warning {
        Diagnostic::warning(W401, message, Span::DUMMY)
    } else {
        Diagnostic::note(N403, message, Span::DUMMY)
    };
    diag.with_subject(port.to_string())
}

/// Warning for a mandatory input without driver, value or default.
pub fn warning_open_input(port: &str) -> Diagnostic {
    Diagnostic::warning(W402, format!("mandatory input '{port}' is not driven"), Span::DUMMY)
        .with_subject(port.to_string())
}

/// Warning for an unresolved width when strict widths are off.
pub fn warning_unresolved_width(subject: &str, names: &[String]) -> Diagnostic {
    Diagnostic::warning(
        W501,
        format!("width of '{subject}' is unresolved; no value for {}", names.join(", ")),
        Span::DUMMY,
    )
    .with_subject(subject.to_string())
}

/// Every diagnostic of a failed build.
#[derive(Debug, thiserror::Error)]
#[error("build failed with {} error(s)", self.error_count())]
pub struct BuildFailure {
    /// Errors, warnings and notes in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildFailure {
    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// The error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity.is_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_diagnostic() {
        let err = ConnectionError::Ambiguous {
            driver: "cam".into(),
            sink: "filter".into(),
            candidates: vec!["cam.out -> filter.in".into(), "cam.out -> filter.aux".into()],
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, E402);
        assert_eq!(diag.subject.as_deref(), Some("filter"));
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn connection_error_names_both_sides() {
        let err = ConnectionError::WidthMismatch {
            driver: "cam.data_out".into(),
            sink: "writer.data_in".into(),
            driver_width: 12,
            sink_width: 8,
        };
        assert_eq!(
            err.to_string(),
            "width mismatch: 'cam.data_out' has 12 bit(s), 'writer.data_in' has 8"
        );
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(err.to_diagnostic().subject.as_deref(), Some("writer.data_in"));
    }

    #[test]
    fn build_error_fatality() {
        let missing = BuildError::from(ModuleError::MissingDependency {
            module: "as_invert".into(),
            dependency: "as_regmgr".into(),
        });
        assert!(missing.is_fatal());
        let wiring = BuildError::from(ConnectionError::EmptyLayer { layer: "l".into() });
        assert!(!wiring.is_fatal());
        assert_eq!(wiring.to_diagnostic().code, E407);
    }

    #[test]
    fn failure_counts_errors() {
        let failure = BuildFailure {
            diagnostics: vec![
                BuildError::Aborted.to_diagnostic(),
                warning_open_input("a.x"),
                note_auto_instantiated("a_reg", "as_regmgr", "a"),
            ],
        };
        assert_eq!(failure.error_count(), 1);
        assert_eq!(failure.to_string(), "build failed with 1 error(s)");
    }
}
