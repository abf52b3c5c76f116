//! Interned names for modules, ports, generics and interfaces.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name.
///
/// Every module, port, generic and interface name in a session is stored once
/// in the [`Interner`] and referred to by this `u32` handle, so names compare
/// and copy in constant time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw index. Intended for tests and deserialization.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32`, which always fits in a `usize` on the
// supported platforms; `try_from_usize` rejects indices beyond `u32::MAX`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// String interner shared by the library, the reader and the processing chain.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s` and returns its identifier.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Interns the lower-case form of `s`. Module, port and entity names are
    /// case-insensitive and always stored this way.
    pub fn intern_lower(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s.to_ascii_lowercase())
    }

    /// Interns the upper-case form of `s`, used for generic names.
    pub fn intern_upper(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s.to_ascii_uppercase())
    }

    /// Looks up an already interned string without interning it.
    pub fn get(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an identifier back to its string.
    ///
    /// # Panics
    ///
    /// Panics if `ident` was not produced by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
