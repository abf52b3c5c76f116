//! Shared foundational types used across the ASTERICS composition toolkit.
//!
//! This crate provides interned identifiers, content hashing and source file
//! tracking for declaration files.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod source;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use source::{FileId, Location, SourceDb, SourceFile, Span};
