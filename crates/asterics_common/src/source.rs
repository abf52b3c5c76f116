//! Declaration files loaded into a session, and byte spans into them.
//!
//! Spans let analysis errors and warnings point at the exact place in an
//! entity declaration, and the renderer turn that into `file:line:col`.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Index of a file inside a [`SourceDb`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// Placeholder for objects that were not read from a file.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Creates a file ID from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A half-open byte range `start..end` in one file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// The file the range belongs to.
    pub file: FileId,
    /// First byte (inclusive).
    pub start: u32,
    /// Last byte (exclusive).
    pub end: u32,
}

impl Span {
    /// Span used for diagnostics about objects with no source location.
    pub const DUMMY: Span = Span {
        file: FileId::DUMMY,
        start: 0,
        end: 0,
    };

    /// Creates a span.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// Spans from different files are not merged; `self` is returned as is.
    pub fn merge(self, other: Span) -> Span {
        if self.file != other.file {
            return self;
        }
        Span {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns `true` for [`Span::DUMMY`] and other spans without a file.
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }
}

/// One loaded declaration file.
pub struct SourceFile {
    /// The file's ID.
    pub id: FileId,
    /// Path on disk, or a synthetic name for in-memory text.
    pub path: PathBuf,
    /// Full text.
    pub content: String,
    /// Hash of `content`.
    pub content_hash: ContentHash,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(id: FileId, path: PathBuf, content: String) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        let content_hash = ContentHash::from_bytes(content.as_bytes());
        Self {
            id,
            path,
            content,
            content_hash,
            line_starts,
        }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line as u32 + 1, offset - self.line_starts[line] + 1)
    }

    /// Text of the whole line containing `offset`, without the newline.
    pub fn line_text(&self, offset: u32) -> &str {
        let (line, _) = self.line_col(offset);
        let start = self.line_starts[(line - 1) as usize] as usize;
        let end = self.content[start..]
            .find('\n')
            .map_or(self.content.len(), |pos| start + pos);
        &self.content[start..end]
    }
}

/// A resolved `file:line:col` location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// File path.
    pub path: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.col)
    }
}

/// All declaration files read during a session.
#[derive(Default)]
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Reads a file from disk.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path, content))
    }

    /// Adds in-memory text under the given name.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(id, name.into(), content));
        id
    }

    /// Returns the file for `id`, or `None` for [`FileId::DUMMY`] and unknown IDs.
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.as_raw() as usize)
    }

    /// Path of a file, used in error messages.
    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.file(id).map(|f| f.path.as_path())
    }

    /// Source text covered by a span. Empty for dummy spans.
    pub fn snippet(&self, span: Span) -> &str {
        match self.file(span.file) {
            Some(file) => &file.content[span.start as usize..span.end as usize],
            None => "",
        }
    }

    /// Resolves the start of a span to a location.
    pub fn locate(&self, span: Span) -> Option<Location> {
        let file = self.file(span.file)?;
        let (line, col) = file.line_col(span.start);
        Some(Location {
            path: file.path.clone(),
            line,
            col,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_lookup() {
        let mut db = SourceDb::new();
        let id = db.add_source("a.vhd", "entity a is\nend a;\n".to_string());
        let file = db.file(id).unwrap();
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(12), (2, 1));
        assert_eq!(file.line_col(16), (2, 5));
        assert_eq!(file.line_text(14), "end a;");
    }

    #[test]
    fn snippet_and_locate() {
        let mut db = SourceDb::new();
        let id = db.add_source("b.vhd", "port (clk : in std_logic);".to_string());
        let span = Span::new(id, 6, 9);
        assert_eq!(db.snippet(span), "clk");
        assert_eq!(db.locate(span).unwrap().to_string(), "b.vhd:1:7");
    }

    #[test]
    fn dummy_span_has_no_location() {
        let db = SourceDb::new();
        assert!(Span::DUMMY.is_dummy());
        assert!(db.locate(Span::DUMMY).is_none());
        assert_eq!(db.snippet(Span::DUMMY), "");
    }

    #[test]
    fn merge_ignores_other_files() {
        let a = Span::new(FileId::from_raw(0), 4, 8);
        let b = Span::new(FileId::from_raw(0), 2, 6);
        assert_eq!(a.merge(b), Span::new(FileId::from_raw(0), 2, 8));
        let c = Span::new(FileId::from_raw(1), 0, 1);
        assert_eq!(a.merge(c), a);
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("as_invert.vhd");
        std::fs::write(&path, "entity as_invert is end;").unwrap();
        let mut db = SourceDb::new();
        let id = db.load_file(&path).unwrap();
        assert_eq!(db.path(id), Some(path.as_path()));
        assert_eq!(
            db.file(id).unwrap().content_hash,
            ContentHash::from_bytes(b"entity as_invert is end;")
        );
    }

    #[test]
    fn load_missing_file_fails() {
        let mut db = SourceDb::new();
        assert!(db.load_file(Path::new("/nonexistent/x.vhd")).is_err());
    }
}
