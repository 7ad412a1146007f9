//! Typed predicates over variant store columns.
//!
//! An `Expr` renders to the SQL dialect of the GEMINI `variants` table and can
//! also be evaluated directly against a record with SQL three-valued logic
//! (`None` standing in for `NULL`).

use std::cmp::Ordering;

use crate::err::Error;
use crate::store::Value;

/// Name of a column in the variant store.
///
/// Only plain identifiers are accepted so that rendered predicates cannot be
/// broken up by user-provided names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column(String);

impl Column {
    /// Validate and wrap a column name.
    pub fn new(name: &str) -> Result<Self, Error> {
        let mut chars = name.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(Self(name.to_string()))
        } else {
            Err(Error::Configuration(format!(
                "invalid column name {:?}",
                name
            )))
        }
    }

    /// Wrap a column name derived from compile-time constants.
    pub(crate) fn from_static(name: String) -> Self {
        debug_assert!(Column::new(&name).is_ok(), "bad column {}", name);
        Self(name)
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::new(s)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Literal value on the right hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{}", value),
            Literal::Float(value) => write!(f, "{}", value),
            Literal::Str(value) => write!(f, "'{}'", value.replace('\'', "''")),
        }
    }
}

/// Comparison operators supported in predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CmpOp {
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = ">=")]
    Ge,
}

/// A predicate over the columns of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `column <op> literal`
    Compare {
        column: Column,
        op: CmpOp,
        value: Literal,
    },
    /// The column interpreted as a boolean, e.g., `in_1kg`.
    Flag(Column),
    Not(Box<Expr>),
    /// Conjunction; the empty conjunction is true.
    And(Vec<Expr>),
    /// Disjunction; the empty disjunction is false.
    Or(Vec<Expr>),
}

impl Expr {
    pub fn eq<L: Into<Literal>>(column: Column, value: L) -> Self {
        Expr::Compare {
            column,
            op: CmpOp::Eq,
            value: value.into(),
        }
    }

    pub fn lt<L: Into<Literal>>(column: Column, value: L) -> Self {
        Expr::Compare {
            column,
            op: CmpOp::Lt,
            value: value.into(),
        }
    }

    pub fn ge<L: Into<Literal>>(column: Column, value: L) -> Self {
        Expr::Compare {
            column,
            op: CmpOp::Ge,
            value: value.into(),
        }
    }

    pub fn flag(column: Column) -> Self {
        Expr::Flag(column)
    }

    pub fn negate(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    /// Build a conjunction, splicing in nested conjunctions.
    ///
    /// An empty nested conjunction thus disappears instead of turning into
    /// a literal term.
    pub fn all<I: IntoIterator<Item = Expr>>(exprs: I) -> Self {
        let mut result = Vec::new();
        for expr in exprs {
            match expr {
                Expr::And(children) => result.extend(children),
                other => result.push(other),
            }
        }
        Expr::And(result)
    }

    /// Build a disjunction, splicing in nested disjunctions.
    pub fn any<I: IntoIterator<Item = Expr>>(exprs: I) -> Self {
        let mut result = Vec::new();
        for expr in exprs {
            match expr {
                Expr::Or(children) => result.extend(children),
                other => result.push(other),
            }
        }
        Expr::Or(result)
    }

    /// All columns referenced by the predicate, in order of appearance.
    pub fn columns(&self) -> Vec<&Column> {
        let mut result = Vec::new();
        self.collect_columns(&mut result);
        result
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Column>) {
        match self {
            Expr::Compare { column, .. } | Expr::Flag(column) => out.push(column),
            Expr::Not(inner) => inner.collect_columns(out),
            Expr::And(children) | Expr::Or(children) => {
                for child in children {
                    child.collect_columns(out);
                }
            }
        }
    }

    /// Evaluate the predicate with SQL semantics; `None` means `NULL`.
    ///
    /// `lookup` returns the value of a column or `None` if it is absent.
    pub fn eval<'a>(&self, lookup: &dyn Fn(&str) -> Option<&'a Value>) -> Option<bool> {
        match self {
            Expr::Compare { column, op, value } => {
                let ord = sql_cmp(lookup(column.name())?, value)?;
                Some(match op {
                    CmpOp::Eq => ord == Ordering::Equal,
                    CmpOp::Lt => ord == Ordering::Less,
                    CmpOp::Ge => ord != Ordering::Less,
                })
            }
            Expr::Flag(column) => truthiness(lookup(column.name())?),
            Expr::Not(inner) => inner.eval(lookup).map(|b| !b),
            Expr::And(children) => {
                let mut unknown = false;
                for child in children {
                    match child.eval(lookup) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => (),
                    }
                }
                if unknown {
                    None
                } else {
                    Some(true)
                }
            }
            Expr::Or(children) => {
                let mut unknown = false;
                for child in children {
                    match child.eval(lookup) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => (),
                    }
                }
                if unknown {
                    None
                } else {
                    Some(false)
                }
            }
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, Expr::And(_) | Expr::Or(_))
    }

    fn fmt_child(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_compound() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Compare { column, op, value } => write!(f, "{} {} {}", column, op, value),
            Expr::Flag(column) => write!(f, "{}", column),
            Expr::Not(inner) => match inner.as_ref() {
                Expr::Compare { .. } | Expr::Flag(_) => write!(f, "NOT {}", inner),
                _ => write!(f, "NOT ({})", inner),
            },
            Expr::And(children) | Expr::Or(children) if children.is_empty() => {
                // SQLite has no boolean literals.
                f.write_str(if matches!(self, Expr::And(_)) { "1" } else { "0" })
            }
            Expr::And(children) | Expr::Or(children) => {
                let sep = if matches!(self, Expr::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    child.fmt_child(f)?;
                }
                Ok(())
            }
        }
    }
}

/// Order a stored value against a literal the way SQLite does: numbers sort
/// before text; `NULL` and NaN are incomparable.
fn sql_cmp(value: &Value, literal: &Literal) -> Option<Ordering> {
    let lhs_num = match value {
        Value::Null => return None,
        Value::Integer(i) => Some(*i as f64),
        Value::Real(x) => Some(*x),
        Value::Text(_) => None,
    };
    match (lhs_num, literal) {
        (Some(lhs), Literal::Int(rhs)) => lhs.partial_cmp(&(*rhs as f64)),
        (Some(lhs), Literal::Float(rhs)) => lhs.partial_cmp(rhs),
        (Some(_), Literal::Str(_)) => Some(Ordering::Less),
        (None, Literal::Str(rhs)) => match value {
            Value::Text(lhs) => Some(lhs.as_str().cmp(rhs.as_str())),
            _ => None,
        },
        (None, _) => Some(Ordering::Greater),
    }
}

fn truthiness(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(*i != 0),
        Value::Real(x) => Some(*x != 0.0),
        Value::Text(s) => Some(s.trim().parse::<f64>().map(|x| x != 0.0).unwrap_or(false)),
    }
}
