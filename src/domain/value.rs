//! Cell values and numeric coercion.
//!
//! Input tables arrive as text. Each column of the observations being
//! evaluated is coerced as a whole: it becomes numeric only if every non-empty
//! cell parses as a number, otherwise all of its cells stay text. Empty cells
//! are `Value::Empty` either way.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Empty => "empty",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view of the value. Booleans count as 1/0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Empty => false,
        }
    }

    /// Ordering between two values of compatible kinds.
    ///
    /// Returns `None` when the kinds cannot be ordered (text vs number) or
    /// when either side is missing.
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Empty => Ok(()),
        }
    }
}

/// Formats a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

/// Parses a single cell as a number, ignoring surrounding whitespace.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

/// Coerces one column of raw cells, all-or-nothing.
pub fn coerce_column(cells: &[&str]) -> Vec<Value> {
    let numeric = cells
        .iter()
        .all(|c| is_blank(c) || parse_number(c).is_some());

    cells
        .iter()
        .map(|c| {
            if is_blank(c) {
                Value::Empty
            } else if numeric {
                parse_number(c).map(Value::Number).unwrap_or(Value::Empty)
            } else {
                Value::Text(c.to_string())
            }
        })
        .collect()
}
