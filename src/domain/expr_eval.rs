//! Rule expression evaluation.
//!
//! # Evaluation Semantics
//!
//! - Variables resolve only against the row; an unknown name is an error
//! - `and` short-circuits on the first false item, `or` on the first true one
//! - `a < b < c` holds when every adjacent pair holds, left to right
//! - Numbers compare numerically, text lexicographically, `True`/`False` as 1/0
//! - `==` across incompatible kinds is false, `!=` is true
//! - Ordering across incompatible kinds is a type error
//! - A missing cell fails every comparison except `!=`
//!
//! [`matches`] collapses every error to `false`.

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::column::Row;
use crate::domain::error::EvalError;
use crate::domain::expr::{CompareOp, Expr, Operand};
use crate::domain::value::Value;

pub fn evaluate(expr: &Expr, row: &Row) -> Result<bool, EvalError> {
    match expr {
        Expr::Or(items) => {
            for item in items {
                if evaluate(item, row)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Expr::And(items) => {
            for item in items {
                if !evaluate(item, row)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Expr::Compare { first, rest } => {
            let mut left = resolve_operand(first, row)?;
            for (op, operand) in rest {
                let right = resolve_operand(operand, row)?;
                if !compare(&left, *op, &right)? {
                    return Ok(false);
                }
                left = right;
            }
            Ok(true)
        }
        Expr::Operand(operand) => Ok(resolve_operand(operand, row)?.truthy()),
    }
}

/// Evaluates `expr` against `row`, treating any failure as "no match".
pub fn matches(expr: &Expr, row: &Row) -> bool {
    match evaluate(expr, row) {
        Ok(result) => result,
        Err(e) => {
            debug!(expression = %expr, error = %e, "expression failed, treating as no match");
            false
        }
    }
}

fn resolve_operand(operand: &Operand, row: &Row) -> Result<Value, EvalError> {
    match operand {
        Operand::Number(n) => Ok(Value::Number(*n)),
        Operand::Text(s) => Ok(Value::Text(s.clone())),
        Operand::Bool(b) => Ok(Value::Bool(*b)),
        Operand::Variable(name) => row
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
    }
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(values_equal(left, right)),
        CompareOp::Ne => Ok(!values_equal(left, right)),
        CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
            if left.is_empty() || right.is_empty() {
                return Ok(false);
            }
            let ordering = left
                .partial_cmp_value(right)
                .ok_or(EvalError::TypeMismatch {
                    left: left.type_name(),
                    op: op.symbol(),
                    right: right.type_name(),
                })?;
            Ok(match op {
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Ge => ordering != Ordering::Less,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Eq | CompareOp::Ne => unreachable!(),
            })
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    left.partial_cmp_value(right) == Some(Ordering::Equal)
}
