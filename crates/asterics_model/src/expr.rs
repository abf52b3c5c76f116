//! Width and value expressions, and their evaluation against generic values.
//!
//! Supported syntax, loosest binding first:
//!
//! - relational `= /= < <= > >=` (yield 1 or 0)
//! - `+ -`
//! - `* / // mod rem`
//! - unary `+ -`
//! - `**` (right associative)
//! - integer literals, names, `f(args)`, parentheses
//!
//! `/` truncates toward zero, `//` floors, `mod` takes the sign of the
//! divisor and `rem` the sign of the dividend. Functions: `log2_ceil`,
//! `clog2`, `max`, `min`, `abs`.
//!
//! Names are case-insensitive and looked up upper-cased.

use crate::value::ConstValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Names and their current values, as seen from one module.
pub type GenericEnv = HashMap<String, ConstValue>;

/// Outcome of evaluating an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The expression has a concrete value.
    Resolved(i64),
    /// Some referenced names have no usable value yet (sorted, unique).
    Unresolved(Vec<String>),
}

impl Resolution {
    /// Returns the value if resolved.
    pub fn value(&self) -> Option<i64> {
        match self {
            Resolution::Resolved(v) => Some(*v),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Evaluation failed for a reason other than a missing value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The text is not a valid expression.
    #[error("invalid expression '{expr}': {detail}")]
    Syntax {
        /// The expression text.
        expr: String,
        /// What is wrong.
        detail: String,
    },
    /// Division or modulo by zero.
    #[error("division by zero in '{0}'")]
    DivisionByZero(String),
    /// Arithmetic overflow or negative exponent.
    #[error("arithmetic overflow in '{0}'")]
    Overflow(String),
    /// Call of a function the resolver does not know.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
}

/// Binary operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `mod`
    Mod,
    /// `rem`
    Rem,
    /// `**`
    Pow,
    /// `=`
    Eq,
    /// `/=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A parsed expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal.
    Int(i64),
    /// Upper-cased name.
    Name(String),
    /// Arithmetic negation.
    Neg(Box<Expr>),
    /// Binary operation.
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// Function call with lower-cased function name.
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Parses expression text.
    pub fn parse(text: &str) -> Result<Expr, EvalError> {
        let tokens = tokenize(text)?;
        let mut parser = ExprParser {
            text,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_binary(0)?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Every name the expression references.
    pub fn names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Int(_) => {}
            Expr::Name(n) => {
                out.insert(n.clone());
            }
            Expr::Neg(e) => e.collect_names(out),
            Expr::Binary(_, l, r) => {
                l.collect_names(out);
                r.collect_names(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_names(out)),
        }
    }
}

/// Evaluates expression text against `env`.
///
/// Names without a usable value make the result
/// [`Resolution::Unresolved`]; only malformed text and arithmetic faults are
/// errors.
pub fn evaluate(text: &str, env: &GenericEnv) -> Result<Resolution, EvalError> {
    evaluate_expr(&Expr::parse(text)?, text, env)
}

/// Evaluates an already parsed expression. `text` is used in error messages.
pub fn evaluate_expr(expr: &Expr, text: &str, env: &GenericEnv) -> Result<Resolution, EvalError> {
    let mut eval = Evaluator {
        env,
        text,
        missing: BTreeSet::new(),
        visiting: Vec::new(),
    };
    let value = eval.eval(expr)?;
    match value {
        Some(v) if eval.missing.is_empty() => Ok(Resolution::Resolved(v)),
        _ => Ok(Resolution::Unresolved(eval.missing.into_iter().collect())),
    }
}

struct Evaluator<'a> {
    env: &'a GenericEnv,
    text: &'a str,
    missing: BTreeSet<String>,
    visiting: Vec<String>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> Result<Option<i64>, EvalError> {
        match expr {
            Expr::Int(v) => Ok(Some(*v)),
            Expr::Name(name) => self.lookup(name),
            Expr::Neg(inner) => Ok(self
                .eval(inner)?
                .map(|v| v.checked_neg().ok_or_else(|| self.overflow()))
                .transpose()?),
            Expr::Binary(op, lhs, rhs) => {
                // Both sides are evaluated so every missing name gets reported.
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                match (l, r) {
                    (Some(l), Some(r)) => apply_binop(*op, l, r, self.text).map(Some),
                    _ => Ok(None),
                }
            }
            Expr::Call(func, args) => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                let Some(values) = values.into_iter().collect::<Option<Vec<i64>>>() else {
                    return Ok(None);
                };
                apply_call(func, &values, self.text).map(Some)
            }
        }
    }

    fn lookup(&mut self, name: &str) -> Result<Option<i64>, EvalError> {
        let value = match self.env.get(name) {
            Some(v) => v,
            None => {
                self.missing.insert(name.to_string());
                return Ok(None);
            }
        };
        if let Some(v) = value.as_int() {
            return Ok(Some(v));
        }
        let ConstValue::Symbol(text) = value else {
            self.missing.insert(name.to_string());
            return Ok(None);
        };
        if self.visiting.iter().any(|n| n == name) {
            self.missing.insert(name.to_string());
            return Ok(None);
        }
        let Ok(inner) = Expr::parse(text) else {
            self.missing.insert(name.to_string());
            return Ok(None);
        };
        self.visiting.push(name.to_string());
        let result = self.eval(&inner);
        self.visiting.pop();
        result
    }

    fn overflow(&self) -> EvalError {
        EvalError::Overflow(self.text.to_string())
    }
}

fn apply_binop(op: BinOp, l: i64, r: i64, text: &str) -> Result<i64, EvalError> {
    let overflow = || EvalError::Overflow(text.to_string());
    let zero = || EvalError::DivisionByZero(text.to_string());
    let value = match op {
        BinOp::Add => l.checked_add(r).ok_or_else(overflow)?,
        BinOp::Sub => l.checked_sub(r).ok_or_else(overflow)?,
        BinOp::Mul => l.checked_mul(r).ok_or_else(overflow)?,
        BinOp::Div => {
            if r == 0 {
                return Err(zero());
            }
            l.checked_div(r).ok_or_else(overflow)?
        }
        BinOp::FloorDiv => {
            if r == 0 {
                return Err(zero());
            }
            let q = l.checked_div(r).ok_or_else(overflow)?;
            if l % r != 0 && ((l < 0) != (r < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinOp::Mod => {
            if r == 0 {
                return Err(zero());
            }
            let m = l.checked_rem(r).ok_or_else(overflow)?;
            if m != 0 && ((m < 0) != (r < 0)) {
                m + r
            } else {
                m
            }
        }
        BinOp::Rem => {
            if r == 0 {
                return Err(zero());
            }
            l.checked_rem(r).ok_or_else(overflow)?
        }
        BinOp::Pow => {
            let exp = u32::try_from(r).map_err(|_| overflow())?;
            l.checked_pow(exp).ok_or_else(overflow)?
        }
        BinOp::Eq => i64::from(l == r),
        BinOp::Ne => i64::from(l != r),
        BinOp::Lt => i64::from(l < r),
        BinOp::Le => i64::from(l <= r),
        BinOp::Gt => i64::from(l > r),
        BinOp::Ge => i64::from(l >= r),
    };
    Ok(value)
}

fn apply_call(func: &str, args: &[i64], text: &str) -> Result<i64, EvalError> {
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(EvalError::Syntax {
                expr: text.to_string(),
                detail: format!("'{func}' takes {n} argument(s)"),
            })
        }
    };
    match func {
        "log2_ceil" | "clog2" => {
            arity(1)?;
            Ok(clog2(args[0]))
        }
        "max" => {
            arity(2)?;
            Ok(args[0].max(args[1]))
        }
        "min" => {
            arity(2)?;
            Ok(args[0].min(args[1]))
        }
        "abs" => {
            arity(1)?;
            args[0]
                .checked_abs()
                .ok_or_else(|| EvalError::Overflow(text.to_string()))
        }
        _ => Err(EvalError::UnknownFunction(func.to_string())),
    }
}

/// Ceiling of log2; 0 for inputs up to 1.
fn clog2(n: i64) -> i64 {
    if n <= 1 {
        0
    } else {
        64 - i64::from((n - 1).leading_zeros())
    }
}

// ----------------------------------------------------------------------
// Tokenizer and Pratt parser
// ----------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Int(i64),
    Word(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

fn tokenize(text: &str) -> Result<Vec<Tok>, EvalError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let syntax = |detail: String| EvalError::Syntax {
        expr: text.to_string(),
        detail,
    };
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if b.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
                i += 1;
            }
            let digits: String = text[start..i].chars().filter(|c| *c != '_').collect();
            let v = digits
                .parse()
                .map_err(|_| syntax(format!("integer literal '{digits}' out of range")))?;
            tokens.push(Tok::Int(v));
            continue;
        }
        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Tok::Word(text[start..i].to_string()));
            continue;
        }
        let two = bytes.get(i + 1).copied().unwrap_or(0);
        let (tok, len) = match (b, two) {
            (b'*', b'*') => (Tok::Op("**"), 2),
            (b'/', b'/') => (Tok::Op("//"), 2),
            (b'/', b'=') => (Tok::Op("/="), 2),
            (b'<', b'=') => (Tok::Op("<="), 2),
            (b'>', b'=') => (Tok::Op(">="), 2),
            (b'+', _) => (Tok::Op("+"), 1),
            (b'-', _) => (Tok::Op("-"), 1),
            (b'*', _) => (Tok::Op("*"), 1),
            (b'/', _) => (Tok::Op("/"), 1),
            (b'=', _) => (Tok::Op("="), 1),
            (b'<', _) => (Tok::Op("<"), 1),
            (b'>', _) => (Tok::Op(">"), 1),
            (b'(', _) => (Tok::LParen, 1),
            (b')', _) => (Tok::RParen, 1),
            (b',', _) => (Tok::Comma, 1),
            _ => return Err(syntax(format!("unexpected character '{}'", b as char))),
        };
        tokens.push(tok);
        i += len;
    }
    Ok(tokens)
}

struct ExprParser<'a> {
    text: &'a str,
    tokens: Vec<Tok>,
    pos: usize,
}

/// Binding power of an infix operator; `None` if the token is not one.
fn infix_power(tok: &Tok) -> Option<(BinOp, u8, bool)> {
    let op = match tok {
        Tok::Op("=") => (BinOp::Eq, 1, false),
        Tok::Op("/=") => (BinOp::Ne, 1, false),
        Tok::Op("<") => (BinOp::Lt, 1, false),
        Tok::Op("<=") => (BinOp::Le, 1, false),
        Tok::Op(">") => (BinOp::Gt, 1, false),
        Tok::Op(">=") => (BinOp::Ge, 1, false),
        Tok::Op("+") => (BinOp::Add, 2, false),
        Tok::Op("-") => (BinOp::Sub, 2, false),
        Tok::Op("*") => (BinOp::Mul, 3, false),
        Tok::Op("/") => (BinOp::Div, 3, false),
        Tok::Op("//") => (BinOp::FloorDiv, 3, false),
        Tok::Word(w) if w.eq_ignore_ascii_case("mod") => (BinOp::Mod, 3, false),
        Tok::Word(w) if w.eq_ignore_ascii_case("rem") => (BinOp::Rem, 3, false),
        Tok::Op("**") => (BinOp::Pow, 5, true),
        _ => return None,
    };
    Some(op)
}

const PREFIX_POWER: u8 = 4;

impl ExprParser<'_> {
    fn error(&self, detail: &str) -> EvalError {
        EvalError::Syntax {
            expr: self.text.to_string(),
            detail: detail.to_string(),
        }
    }

    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn parse_binary(&mut self, min_power: u8) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_prefix()?;
        while let Some((op, power, right_assoc)) = self.peek().and_then(infix_power) {
            if power < min_power {
                break;
            }
            self.pos += 1;
            let next_min = if right_assoc { power } else { power + 1 };
            let rhs = self.parse_binary(next_min)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Tok::Int(v)) => Ok(Expr::Int(v)),
            Some(Tok::Op("-")) => Ok(Expr::Neg(Box::new(self.parse_binary(PREFIX_POWER)?))),
            Some(Tok::Op("+")) => self.parse_binary(PREFIX_POWER),
            Some(Tok::LParen) => {
                let inner = self.parse_binary(0)?;
                match self.next() {
                    Some(Tok::RParen) => Ok(inner),
                    _ => Err(self.error("expected ')'")),
                }
            }
            Some(Tok::Word(word)) => {
                if self.peek() == Some(&Tok::LParen) {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Tok::RParen) {
                        loop {
                            args.push(self.parse_binary(0)?);
                            if self.peek() == Some(&Tok::Comma) {
                                self.pos += 1;
                                continue;
                            }
                            break;
                        }
                    }
                    match self.next() {
                        Some(Tok::RParen) => Ok(Expr::Call(word.to_ascii_lowercase(), args)),
                        _ => Err(self.error("expected ')' after arguments")),
                    }
                } else {
                    Ok(Expr::Name(word.to_ascii_uppercase()))
                }
            }
            Some(_) => Err(self.error("expected operand")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}
