//! Generics, their values and value checks.

use crate::ids::{GenericId, ModuleId};
use crate::value::ConstValue;
use asterics_common::{Ident, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A generic of a specific module instance.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct GenericRef {
    /// Owning module.
    pub module: ModuleId,
    /// Generic within the module.
    pub generic: GenericId,
}

impl GenericRef {
    /// Creates a reference.
    pub fn new(module: ModuleId, generic: GenericId) -> Self {
        GenericRef { module, generic }
    }
}

/// What a generic's value is set to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenericValue {
    /// Falls back to the default.
    #[default]
    Unset,
    /// Concrete or symbolic value.
    Literal(ConstValue),
    /// Shares the value of another generic.
    Link(GenericRef),
}

/// Constraint on the values a generic accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueCheck {
    /// Inclusive integer range.
    Range {
        /// Lowest accepted value.
        min: i64,
        /// Highest accepted value.
        max: i64,
    },
    /// Positive power of two.
    PowerOfTwo,
    /// One of the listed integers.
    OneOf(Vec<i64>),
}

impl ValueCheck {
    /// Symbolic values are accepted; they are checked once they resolve.
    pub fn accepts(&self, value: &ConstValue) -> bool {
        if value.is_symbolic() {
            return true;
        }
        let Some(v) = value.as_int() else {
            return false;
        };
        match self {
            ValueCheck::Range { min, max } => (*min..=*max).contains(&v),
            ValueCheck::PowerOfTwo => v > 0 && (v & (v - 1)) == 0,
            ValueCheck::OneOf(values) => values.contains(&v),
        }
    }
}

impl fmt::Display for ValueCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueCheck::Range { min, max } => write!(f, "range {min} to {max}"),
            ValueCheck::PowerOfTwo => f.write_str("power of two"),
            ValueCheck::OneOf(values) => {
                let list: Vec<String> = values.iter().map(i64::to_string).collect();
                write!(f, "one of [{}]", list.join(", "))
            }
        }
    }
}

/// A named parameter of a module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Generic {
    /// Upper-case name.
    pub name: Ident,
    /// Type mark, lower case.
    pub data_type: String,
    /// Default from the declaration.
    pub default_value: Option<ConstValue>,
    /// Assigned value.
    pub value: GenericValue,
    /// Surfaces as a generic of the top level.
    pub to_external: bool,
    /// Accepted values.
    pub check: Option<ValueCheck>,
    /// Declaration span.
    pub span: Span,
}

impl Generic {
    /// An unset generic.
    pub fn new(name: Ident, data_type: impl Into<String>, default_value: Option<ConstValue>) -> Self {
        Generic {
            name,
            data_type: data_type.into(),
            default_value,
            value: GenericValue::Unset,
            to_external: false,
            check: None,
            span: Span::DUMMY,
        }
    }

    /// The generic this one is linked to.
    pub fn link(&self) -> Option<GenericRef> {
        match self.value {
            GenericValue::Link(target) => Some(target),
            _ => None,
        }
    }
}
