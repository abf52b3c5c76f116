//! What the reader extracts from a declaration file.
//!
//! Names are interned and normalized: entity, port and constant names in
//! lower case, generic names in upper case. Expressions are kept as text
//! with identifiers upper-cased so they line up with generic names.

use asterics_common::{Ident, Span};
use serde::{Deserialize, Serialize};

/// The entity declaration of one file plus the constants found next to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDecl {
    /// Entity name.
    pub name: Ident,
    /// Generics in declaration order.
    pub generics: Vec<GenericDecl>,
    /// Ports in declaration order, one entry per declared name.
    pub ports: Vec<PortDecl>,
    /// Constants from the architecture declarative part and package headers.
    pub constants: Vec<ConstantDecl>,
    /// Span of the entity declaration.
    pub span: Span,
}

/// `NAME : type [:= default]` inside a generic clause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenericDecl {
    /// Upper-case generic name.
    pub name: Ident,
    /// Type mark, lower case.
    pub data_type: String,
    /// Default value expression.
    pub default: Option<String>,
    /// Span of the declaration.
    pub span: Span,
}

/// Port direction as written.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortMode {
    /// `in`
    In,
    /// `out` or `buffer`
    Out,
    /// `inout`
    InOut,
}

/// `name : mode type[(ranges)] [:= default]` inside a port clause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortDecl {
    /// Lower-case port name.
    pub name: Ident,
    /// Direction.
    pub mode: PortMode,
    /// Type mark, lower case.
    pub data_type: String,
    /// Index constraint; empty for scalar ports.
    pub ranges: Vec<RangeDecl>,
    /// Default value expression.
    pub default: Option<String>,
    /// Span of the declaration.
    pub span: Span,
}

/// `to` or `downto`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RangeDir {
    /// Ascending.
    To,
    /// Descending.
    Downto,
}

/// One bound of a range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundDecl {
    /// An integer literal.
    Int(i64),
    /// Any other expression, as normalized text.
    Expr(String),
}

/// `(left, to|downto, right)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDecl {
    /// Left bound.
    pub left: BoundDecl,
    /// Direction.
    pub dir: RangeDir,
    /// Right bound.
    pub right: BoundDecl,
}

/// `constant name : type[(ranges)] := value;`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantDecl {
    /// Lower-case constant name.
    pub name: Ident,
    /// Type mark, lower case.
    pub data_type: String,
    /// Index constraint.
    pub ranges: Vec<RangeDecl>,
    /// Value expression.
    pub value: String,
    /// Span of the declaration.
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use asterics_common::Interner;

    #[test]
    fn serde_roundtrip() {
        let interner = Interner::new();
        let decl = EntityDecl {
            name: interner.intern_lower("as_invert"),
            generics: vec![GenericDecl {
                name: interner.intern_upper("DOUT_WIDTH"),
                data_type: "integer".into(),
                default: Some("8".into()),
                span: Span::DUMMY,
            }],
            ports: vec![PortDecl {
                name: interner.intern_lower("data_out"),
                mode: PortMode::Out,
                data_type: "std_logic_vector".into(),
                ranges: vec![RangeDecl {
                    left: BoundDecl::Expr("DOUT_WIDTH - 1".into()),
                    dir: RangeDir::Downto,
                    right: BoundDecl::Int(0),
                }],
                default: None,
                span: Span::DUMMY,
            }],
            constants: vec![ConstantDecl {
                name: interner.intern_lower("reg_config"),
                data_type: "slv_reg_config_table".into(),
                ranges: vec![],
                value: "(\"11\")".into(),
                span: Span::DUMMY,
            }],
            span: Span::DUMMY,
        };
        let json = serde_json::to_string(&decl).unwrap();
        let back: EntityDecl = serde_json::from_str(&json).unwrap();
        assert_eq!(decl, back);
    }
}
