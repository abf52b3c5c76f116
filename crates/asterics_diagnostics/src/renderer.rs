//! Text rendering of diagnostics for a front-end to print.

use crate::diagnostic::Diagnostic;
use asterics_common::SourceDb;

/// Formats a diagnostic for some output target.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;

    /// Renders a list, one diagnostic after the other.
    fn render_all(&self, diags: &[Diagnostic], source_db: &SourceDb) -> String {
        diags.iter().map(|d| self.render(d, source_db)).collect()
    }
}

/// rustc-style plain text output:
///
/// ```text
/// error[E101]: expected 'downto' or 'to' in range
///   --> as_invert.vhd:12:39
///    |
/// 12 |     data_in : in std_logic_vector(DATA_WIDTH - 1 0);
///    = subject: as_invert.vhd
///    = note: ...
/// ```
#[derive(Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = format!("{}[{}]: {}\n", diag.severity, diag.code, diag.message);
        if let (Some(location), Some(file)) =
            (source_db.locate(diag.span), source_db.file(diag.span.file))
        {
            let line_num = location.line.to_string();
            let pad = " ".repeat(line_num.len());
            out.push_str(&format!("{pad}--> {location}\n"));
            out.push_str(&format!("{pad} |\n"));
            out.push_str(&format!(
                "{line_num} | {}\n",
                file.line_text(diag.span.start)
            ));
        }
        if let Some(subject) = &diag.subject {
            out.push_str(&format!("   = subject: {subject}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}
