//! Port and signal widths.

use crate::expr::{evaluate, EvalError, GenericEnv, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One bound of an index range.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bound {
    /// Concrete index.
    Int(i64),
    /// Expression over generics, upper-case identifiers.
    Expr(String),
}

impl Bound {
    /// Concrete index, if known.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Bound::Int(v) => Some(*v),
            Bound::Expr(_) => None,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Int(v) => write!(f, "{v}"),
            Bound::Expr(e) => write!(f, "{e}"),
        }
    }
}

/// `to` or `downto`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum RangeDir {
    /// Ascending.
    To,
    /// Descending.
    Downto,
}

/// `left to|downto right`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Left bound.
    pub left: Bound,
    /// Direction.
    pub dir: RangeDir,
    /// Right bound.
    pub right: Bound,
}

impl Range {
    /// `left downto right` with literal bounds.
    pub fn downto(left: i64, right: i64) -> Self {
        Range {
            left: Bound::Int(left),
            dir: RangeDir::Downto,
            right: Bound::Int(right),
        }
    }

    /// Number of elements, if both bounds are concrete. Null ranges count 0;
    /// ranges too long to count saturate.
    pub fn element_count(&self) -> Option<u64> {
        match self.checked_element_count() {
            Ok(count) => count,
            Err(_) => Some(u64::MAX),
        }
    }

    /// Like [`Range::element_count`], but a range whose length does not fit
    /// in a `u64` is an overflow.
    pub fn checked_element_count(&self) -> Result<Option<u64>, EvalError> {
        let (Some(l), Some(r)) = (self.left.as_int(), self.right.as_int()) else {
            return Ok(None);
        };
        let (l, r) = (i128::from(l), i128::from(r));
        let span = match self.dir {
            RangeDir::Downto => l - r,
            RangeDir::To => r - l,
        };
        if span < 0 {
            return Ok(Some(0));
        }
        u64::try_from(span + 1)
            .map(Some)
            .map_err(|_| EvalError::Overflow(self.to_string()))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.dir {
            RangeDir::To => "to",
            RangeDir::Downto => "downto",
        };
        write!(f, "{} {dir} {}", self.left, self.right)
    }
}

/// Width of a port or signal: scalar, or one range per dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataWidth {
    /// Index ranges; empty for scalar types.
    pub ranges: Vec<Range>,
}

/// Result of comparing two widths.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WidthCompat {
    /// Both resolved and equal in bit count.
    Same,
    /// Both resolved and different.
    Mismatch,
    /// At least one side still references generics.
    Unknown,
}

impl DataWidth {
    /// Scalar width.
    pub fn scalar() -> Self {
        DataWidth::default()
    }

    /// Single range.
    pub fn single(range: Range) -> Self {
        DataWidth {
            ranges: vec![range],
        }
    }

    /// Returns `true` for scalar widths.
    pub fn is_scalar(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns `true` if every bound is concrete.
    pub fn is_resolved(&self) -> bool {
        self.ranges
            .iter()
            .all(|r| r.left.as_int().is_some() && r.right.as_int().is_some())
    }

    /// Names referenced by unresolved bounds.
    ///
    /// Bounds that fail to parse contribute nothing.
    pub fn generic_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for range in &self.ranges {
            for bound in [&range.left, &range.right] {
                if let Bound::Expr(text) = bound {
                    if let Ok(expr) = crate::expr::Expr::parse(text) {
                        names.extend(expr.names());
                    }
                }
            }
        }
        names
    }

    /// Substitutes `env` into every bound.
    ///
    /// Bounds whose names are not all known stay as expressions. A resolved
    /// range too long to count is an overflow.
    pub fn resolve(&self, env: &GenericEnv) -> Result<DataWidth, EvalError> {
        let mut ranges = Vec::with_capacity(self.ranges.len());
        for range in &self.ranges {
            let range = Range {
                left: resolve_bound(&range.left, env)?,
                dir: range.dir,
                right: resolve_bound(&range.right, env)?,
            };
            range.checked_element_count()?;
            ranges.push(range);
        }
        Ok(DataWidth { ranges })
    }

    /// Total bit count, if resolved. Scalars count 1.
    pub fn bit_width(&self) -> Option<u64> {
        self.ranges
            .iter()
            .try_fold(1u64, |acc, r| Some(acc.saturating_mul(r.element_count()?)))
    }

    /// Compares two widths by bit count.
    pub fn compatibility(&self, other: &DataWidth) -> WidthCompat {
        match (self.bit_width(), other.bit_width()) {
            (Some(a), Some(b)) if a == b => WidthCompat::Same,
            (Some(_), Some(_)) => WidthCompat::Mismatch,
            _ => WidthCompat::Unknown,
        }
    }
}

fn resolve_bound(bound: &Bound, env: &GenericEnv) -> Result<Bound, EvalError> {
    match bound {
        Bound::Int(v) => Ok(Bound::Int(*v)),
        Bound::Expr(text) => match evaluate(text, env)? {
            Resolution::Resolved(v) => Ok(Bound::Int(v)),
            Resolution::Unresolved(_) => Ok(Bound::Expr(text.clone())),
        },
    }
}

impl fmt::Display for DataWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return Ok(());
        }
        write!(f, "(")?;
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{r}")?;
        }
        write!(f, ")")
    }
}
