//! Errors raised while reading a declaration file.

use asterics_common::Span;
use asterics_diagnostics::{Category, Diagnostic, DiagnosticCode};
use std::path::PathBuf;

/// Malformed or unsupported declaration syntax.
pub const E101: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
/// Declaration file could not be read.
pub const E102: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);

/// The declaration text is malformed. The reader aborts the file at the
/// first such problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("analysis of '{}' failed: {detail}", file.display())]
pub struct AnalysisError {
    /// The file being read.
    pub file: PathBuf,
    /// What is wrong.
    pub detail: String,
    /// Where it is wrong.
    pub span: Span,
}

impl AnalysisError {
    /// Converts into a diagnostic with code `E101`.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(E101, self.detail.clone(), self.span)
            .with_subject(self.file.display().to_string())
    }
}

/// The declaration file could not be read.
#[derive(Debug, thiserror::Error)]
#[error("cannot read '{}': {source}", file.display())]
pub struct FileError {
    /// The path that was attempted.
    pub file: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

impl FileError {
    /// Converts into a diagnostic with code `E102`.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(E102, format!("cannot read file: {}", self.source), Span::DUMMY)
            .with_subject(self.file.display().to_string())
    }
}

/// Either failure of [`read_entity_file`](crate::read_entity_file).
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Malformed text.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    /// Unreadable file.
    #[error(transparent)]
    File(#[from] FileError),
}

impl ReadError {
    /// Converts into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ReadError::Analysis(e) => e.to_diagnostic(),
            ReadError::File(e) => e.to_diagnostic(),
        }
    }
}
