//! Values of generics and constants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generic or constant value.
///
/// Declaration files give defaults as text; [`ConstValue::parse`] turns the
/// common literal forms into typed values and keeps everything else as a
/// symbolic expression that the resolver may still evaluate later.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstValue {
    /// Integer (also used for `natural`/`positive`).
    Int(i64),
    /// `true` / `false`.
    Bool(bool),
    /// String literal contents, without quotes.
    Str(String),
    /// Any other expression text, e.g. `C_SLAVE_REG_COUNT + 1` or `'0'`.
    Symbol(String),
}

impl ConstValue {
    /// Classifies declaration text.
    pub fn parse(text: &str) -> ConstValue {
        let text = text.trim();
        if let Some(v) = parse_int(text) {
            return ConstValue::Int(v);
        }
        if text.eq_ignore_ascii_case("true") {
            return ConstValue::Bool(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return ConstValue::Bool(false);
        }
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            return ConstValue::Str(text[1..text.len() - 1].replace("\"\"", "\""));
        }
        ConstValue::Symbol(text.to_string())
    }

    /// Integer view; booleans map to 0/1.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Returns `true` for [`ConstValue::Symbol`].
    pub fn is_symbolic(&self) -> bool {
        matches!(self, ConstValue::Symbol(_))
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Str(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            ConstValue::Symbol(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ConstValue {
    fn from(v: i64) -> Self {
        ConstValue::Int(v)
    }
}

impl From<bool> for ConstValue {
    fn from(b: bool) -> Self {
        ConstValue::Bool(b)
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '_') {
        return None;
    }
    let clean: String = digits.chars().filter(|c| *c != '_').collect();
    let v: i64 = clean.parse().ok()?;
    Some(if negative { -v } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literals() {
        assert_eq!(ConstValue::parse("8"), ConstValue::Int(8));
        assert_eq!(ConstValue::parse("-3"), ConstValue::Int(-3));
        assert_eq!(ConstValue::parse("1_024"), ConstValue::Int(1024));
        assert_eq!(ConstValue::parse("TRUE"), ConstValue::Bool(true));
        assert_eq!(ConstValue::parse("\"fast\""), ConstValue::Str("fast".into()));
        assert_eq!(
            ConstValue::parse("C_COUNT + 1"),
            ConstValue::Symbol("C_COUNT + 1".into())
        );
        assert_eq!(ConstValue::parse("'0'"), ConstValue::Symbol("'0'".into()));
    }

    #[test]
    fn as_int() {
        assert_eq!(ConstValue::Int(5).as_int(), Some(5));
        assert_eq!(ConstValue::Bool(true).as_int(), Some(1));
        assert_eq!(ConstValue::Symbol("X".into()).as_int(), None);
    }

    #[test]
    fn display_is_vhdl_text() {
        assert_eq!(ConstValue::Int(12).to_string(), "12");
        assert_eq!(ConstValue::Str("a\"b".into()).to_string(), "\"a\"\"b\"");
        assert_eq!(ConstValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn serde_roundtrip() {
        let v = ConstValue::Symbol("DATA_WIDTH * 2".into());
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(serde_json::from_str::<ConstValue>(&json).unwrap(), v);
    }
}
