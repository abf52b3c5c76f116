//! Per-build context shared by the library and the processing chain.

use asterics_common::{ContentHash, Interner, SourceDb};
use asterics_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use asterics_vhdl::{EntityDecl, FileError, ReadError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Interner, loaded declaration files and collected diagnostics of one build.
///
/// Created by the caller and passed by reference to everything that needs
/// it; nothing in the toolkit keeps process-wide state.
#[derive(Default)]
pub struct Session {
    /// Identifier interner.
    pub interner: Interner,
    /// Diagnostics of the build.
    pub sink: DiagnosticSink,
    source_db: Mutex<SourceDb>,
    entities: Mutex<HashMap<ContentHash, EntityDecl>>,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Session::default()
    }

    /// Loads a declaration file and reads its entity.
    ///
    /// Files with identical content are parsed once.
    pub fn read_entity(&self, path: &Path) -> Result<EntityDecl, ReadError> {
        let mut db = self.source_db.lock().unwrap_or_else(PoisonError::into_inner);
        let file_id = db.load_file(path).map_err(|source| FileError {
            file: path.to_path_buf(),
            source,
        })?;
        let hash = db.file(file_id).map(|f| f.content_hash);
        let mut cache = self.entities.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(decl) = hash.and_then(|h| cache.get(&h)) {
            return Ok(decl.clone());
        }
        let decl = asterics_vhdl::read_entity(file_id, &db, &self.interner)?;
        if let Some(hash) = hash {
            cache.insert(hash, decl.clone());
        }
        Ok(decl)
    }

    /// Number of distinct entities parsed so far.
    pub fn cached_entities(&self) -> usize {
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Runs `f` with the loaded source files.
    pub fn with_source_db<R>(&self, f: impl FnOnce(&SourceDb) -> R) -> R {
        f(&self.source_db.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Renders a diagnostic for a terminal.
    pub fn render(&self, diag: &Diagnostic) -> String {
        self.with_source_db(|db| TerminalRenderer::new().render(diag, db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTITY: &str = "entity as_dummy is\n  port (\n    clk : in std_logic\n  );\nend entity;\n";

    #[test]
    fn identical_files_are_parsed_once() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.vhd");
        let b = dir.path().join("b.vhd");
        std::fs::write(&a, ENTITY).unwrap();
        std::fs::write(&b, ENTITY).unwrap();
        let session = Session::new();
        let first = session.read_entity(&a).unwrap();
        let second = session.read_entity(&b).unwrap();
        assert_eq!(first.ports.len(), 1);
        assert_eq!(second.ports.len(), 1);
        assert_eq!(session.cached_entities(), 1);
    }

    #[test]
    fn missing_file_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new();
        let err = session.read_entity(&dir.path().join("nope.vhd")).unwrap_err();
        assert!(matches!(err, ReadError::File(_)));
    }

    #[test]
    fn render_points_into_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.vhd");
        std::fs::write(&path, "entity bad is\n  port (\n    clk : std_logic\n  );\nend;\n").unwrap();
        let session = Session::new();
        let err = session.read_entity(&path).unwrap_err();
        let text = session.render(&err.to_diagnostic());
        assert!(text.starts_with("error[E101]"));
        assert!(text.contains("bad.vhd:3:"));
    }
}
