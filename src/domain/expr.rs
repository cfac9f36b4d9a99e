//! Rule expression AST.
//!
//! The grammar is deliberately closed: comparisons joined by `and`/`or`,
//! literals and identifiers. There are no calls, attributes or arithmetic,
//! so an expression can only ever read the row it is evaluated against.

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::value::format_number;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
    Bool(bool),
    /// A normalized column identifier.
    Variable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    /// `first op1 second op2 third ...`, evaluated pairwise like a chain.
    Compare {
        first: Operand,
        rest: Vec<(CompareOp, Operand)>,
    },
    /// A bare operand tested for truthiness.
    Operand(Operand),
}

impl Expr {
    /// Every column identifier the expression reads.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Or(items) | Expr::And(items) => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            Expr::Compare { first, rest } => {
                push_variable(first, out);
                for (_, operand) in rest {
                    push_variable(operand, out);
                }
            }
            Expr::Operand(operand) => push_variable(operand, out),
        }
    }
}

fn push_variable(operand: &Operand, out: &mut BTreeSet<String>) {
    if let Operand::Variable(name) = operand {
        out.insert(name.clone());
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{}", format_number(*n)),
            Operand::Text(s) => write!(f, "{:?}", s),
            Operand::Bool(true) => write!(f, "True"),
            Operand::Bool(false) => write!(f, "False"),
            Operand::Variable(name) => write!(f, "{}", name),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Or(items) => write_joined(f, items, " or "),
            Expr::And(items) => write_joined(f, items, " and "),
            Expr::Compare { first, rest } => {
                write!(f, "{}", first)?;
                for (op, operand) in rest {
                    write!(f, " {} {}", op.symbol(), operand)?;
                }
                Ok(())
            }
            Expr::Operand(operand) => write!(f, "{}", operand),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        match item {
            Expr::Or(_) | Expr::And(_) => write!(f, "({})", item)?,
            _ => write!(f, "{}", item)?,
        }
    }
    Ok(())
}
