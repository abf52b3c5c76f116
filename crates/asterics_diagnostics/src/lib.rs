//! Structured diagnostics: the toolkit's logging and error-reporting channel.
//!
//! Every component reports what it did and what went wrong as a
//! [`Diagnostic`] pushed into a [`DiagnosticSink`]. The processing chain
//! collects them for the whole build and hands the list back to the caller,
//! who may render it with the [`TerminalRenderer`].

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
