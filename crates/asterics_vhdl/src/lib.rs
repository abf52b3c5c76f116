//! Entity reader for hardware module declaration files.
//!
//! Extracts the generic and port clauses of the entity declared in a VHDL
//! file, with widths kept as `(left, to|downto, right)` ranges whose bounds
//! are literals or generic-referencing expressions, plus the constants
//! declared alongside. The main entry points are [`read_entity`] for text
//! already in a [`SourceDb`] and [`read_entity_file`] for a path on disk.

#![warn(missing_docs)]

pub mod decl;
pub mod error;
pub mod lexer;
pub mod reader;
pub mod token;

pub use decl::{
    BoundDecl, ConstantDecl, EntityDecl, GenericDecl, PortDecl, PortMode, RangeDecl, RangeDir,
};
pub use error::{AnalysisError, FileError, ReadError};

use asterics_common::{FileId, Interner, SourceDb, Span};
use std::path::Path;

/// Reads the entity declared in a file that is already loaded.
pub fn read_entity(
    file_id: FileId,
    source_db: &SourceDb,
    interner: &Interner,
) -> Result<EntityDecl, AnalysisError> {
    let file = source_db.file(file_id).ok_or_else(|| AnalysisError {
        file: Default::default(),
        detail: format!("source file {} is not loaded", file_id.as_raw()),
        span: Span::DUMMY,
    })?;
    let tokens = lexer::lex(&file.content, file_id, &file.path)?;
    reader::EntityReader::new(tokens, &file.content, &file.path, interner).read_design_file()
}

/// Loads `path` into the database and reads its entity.
pub fn read_entity_file(
    path: &Path,
    source_db: &mut SourceDb,
    interner: &Interner,
) -> Result<(FileId, EntityDecl), ReadError> {
    let file_id = source_db.load_file(path).map_err(|source| FileError {
        file: path.to_path_buf(),
        source,
    })?;
    let decl = read_entity(file_id, source_db, interner)?;
    Ok((file_id, decl))
}
