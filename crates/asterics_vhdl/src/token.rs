//! Tokens of the VHDL subset the entity reader understands.

use asterics_common::Span;
use serde::{Deserialize, Serialize};

/// A token kind.
///
/// Only the keywords that structure entity, architecture and package
/// headers are distinguished; every other word is an [`Identifier`].
/// Literal text is recovered from the source through the token's span.
///
/// [`Identifier`]: VhdlToken::Identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum VhdlToken {
    // Keywords
    /// `architecture`
    Architecture,
    /// `begin`
    Begin,
    /// `body`
    Body,
    /// `buffer`
    Buffer,
    /// `constant`
    Constant,
    /// `downto`
    Downto,
    /// `end`
    End,
    /// `entity`
    Entity,
    /// `generic`
    Generic,
    /// `in`
    In,
    /// `inout`
    Inout,
    /// `is`
    Is,
    /// `linkage`
    Linkage,
    /// `mod`
    Mod,
    /// `of`
    Of,
    /// `out`
    Out,
    /// `package`
    Package,
    /// `port`
    Port,
    /// `range`
    Range,
    /// `rem`
    Rem,
    /// `signal`
    Signal,
    /// `to`
    To,
    /// `type`
    Type,

    // Literals and names
    /// Identifier (including keywords the reader does not care about).
    Identifier,
    /// Integer literal, possibly based (`16#FF#`).
    IntLiteral,
    /// Real literal.
    RealLiteral,
    /// `"..."`
    StringLiteral,
    /// `'0'`
    CharLiteral,
    /// `x"0F"`
    BitStringLiteral,

    // Punctuation and operators
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `:=`
    ColonEquals,
    /// `.`
    Dot,
    /// `'`
    Tick,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    DoubleStar,
    /// `/`
    Slash,
    /// `&`
    Ampersand,
    /// `|`
    Bar,
    /// `=`
    Equals,
    /// `/=`
    SlashEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessEquals,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterEquals,
    /// `=>`
    Arrow,
    /// `<>`
    Box,

    /// End of input.
    Eof,
}

impl VhdlToken {
    /// Returns `true` for word-like tokens, keywords included.
    pub fn is_word(self) -> bool {
        matches!(
            self,
            VhdlToken::Identifier
                | VhdlToken::Architecture
                | VhdlToken::Begin
                | VhdlToken::Body
                | VhdlToken::Buffer
                | VhdlToken::Constant
                | VhdlToken::Downto
                | VhdlToken::End
                | VhdlToken::Entity
                | VhdlToken::Generic
                | VhdlToken::In
                | VhdlToken::Inout
                | VhdlToken::Is
                | VhdlToken::Linkage
                | VhdlToken::Mod
                | VhdlToken::Of
                | VhdlToken::Out
                | VhdlToken::Package
                | VhdlToken::Port
                | VhdlToken::Range
                | VhdlToken::Rem
                | VhdlToken::Signal
                | VhdlToken::To
                | VhdlToken::Type
        )
    }
}

/// Looks up a lower-case word in the keyword table.
pub fn lookup_keyword(s: &str) -> Option<VhdlToken> {
    let kind = match s {
        "architecture" => VhdlToken::Architecture,
        "begin" => VhdlToken::Begin,
        "body" => VhdlToken::Body,
        "buffer" => VhdlToken::Buffer,
        "constant" => VhdlToken::Constant,
        "downto" => VhdlToken::Downto,
        "end" => VhdlToken::End,
        "entity" => VhdlToken::Entity,
        "generic" => VhdlToken::Generic,
        "in" => VhdlToken::In,
        "inout" => VhdlToken::Inout,
        "is" => VhdlToken::Is,
        "linkage" => VhdlToken::Linkage,
        "mod" => VhdlToken::Mod,
        "of" => VhdlToken::Of,
        "out" => VhdlToken::Out,
        "package" => VhdlToken::Package,
        "port" => VhdlToken::Port,
        "range" => VhdlToken::Range,
        "rem" => VhdlToken::Rem,
        "signal" => VhdlToken::Signal,
        "to" => VhdlToken::To,
        "type" => VhdlToken::Type,
        _ => return None,
    };
    Some(kind)
}

/// A token kind with its location.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Kind.
    pub kind: VhdlToken,
    /// Source range of the token text.
    pub span: Span,
}
