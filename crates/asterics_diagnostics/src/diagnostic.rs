//! A single structured diagnostic message.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use asterics_common::Span;
use serde::{Deserialize, Serialize};

/// One reported event or problem.
///
/// Besides the code and message, a diagnostic names the object it is about
/// (`subject`, e.g. `as_invert_0.strobe_in`) so it can be reported without
/// a second lookup into the module graph, and optionally points into a
/// declaration file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Stable code.
    pub code: DiagnosticCode,
    /// Main message.
    pub message: String,
    /// The affected module, interface, port, generic or file.
    pub subject: Option<String>,
    /// Source location, [`Span::DUMMY`] when there is none.
    pub span: Span,
    /// Extra context lines.
    pub notes: Vec<String>,
    /// Suggestions for the user.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, code: DiagnosticCode, message: String, span: Span) -> Self {
        Self {
            severity,
            code,
            message,
            subject: None,
            span,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, code, message.into(), span)
    }

    /// Creates a warning.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, code, message.into(), span)
    }

    /// Creates a note.
    pub fn note(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Note, code, message.into(), span)
    }

    /// Names the affected object.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Adds a note line.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help line.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn constructors_set_severity() {
        let code = DiagnosticCode::new(Category::Error, 401);
        assert_eq!(
            Diagnostic::error(code, "x", Span::DUMMY).severity,
            Severity::Error
        );
        assert_eq!(
            Diagnostic::warning(code, "x", Span::DUMMY).severity,
            Severity::Warning
        );
        assert_eq!(
            Diagnostic::note(code, "x", Span::DUMMY).severity,
            Severity::Note
        );
    }

    #[test]
    fn builder_methods() {
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Error, 402),
            "ambiguous connection",
            Span::DUMMY,
        )
        .with_subject("as_sensor_0 -> as_invert_0")
        .with_note("2 candidate interface pairs")
        .with_help("qualify the interface");
        assert_eq!(diag.subject.as_deref(), Some("as_sensor_0 -> as_invert_0"));
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn serde_roundtrip() {
        let diag = Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 101),
            "generic not declared",
            Span::DUMMY,
        );
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, "generic not declared");
        assert_eq!(back.code, diag.code);
    }
}
