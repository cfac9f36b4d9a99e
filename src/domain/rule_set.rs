//! User-supplied recommendation rules and winner selection.
//!
//! A rule pairs a boolean expression with a recommendation label, a priority
//! (lower wins) and a rationale. For each row every rule is evaluated in
//! input order; among the rules that match, the smallest priority wins and
//! ties go to the earlier rule.

use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::domain::column::{normalize_column, ColumnMapping, Row};
use crate::domain::error::ParseError;
use crate::domain::expr::Expr;
use crate::domain::expr_eval;
use crate::domain::expr_parser;
use crate::domain::table::Table;
use crate::domain::value::{format_number, parse_number};

/// Numeric stand-in for [`Priority::Lowest`] in exports.
pub const DEFAULT_PRIORITY: f64 = 9999.0;

pub const RULE_COLUMN: &str = "Regel";
pub const RECOMMENDATION_COLUMN: &str = "Empfehlung";
pub const PRIORITY_COLUMN: &str = "Prioritaet";
pub const RATIONALE_COLUMN: &str = "Begruendung";

/// Rule precedence. `Lowest` ranks below every parsed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Priority {
    Value(f64),
    Lowest,
}

impl Priority {
    /// Missing and non-numeric cells become `Lowest`. `inf` and `-inf` are
    /// kept as values, so `-inf` beats every finite priority.
    pub fn parse(raw: &str) -> Self {
        parse_number(raw).map_or(Priority::Lowest, Priority::Value)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Priority::Value(v) => v,
            Priority::Lowest => DEFAULT_PRIORITY,
        }
    }

    /// True when `self` strictly beats `other`.
    pub fn outranks(self, other: Priority) -> bool {
        self.partial_cmp(&other) == Some(Ordering::Less)
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Priority::Value(a), Priority::Value(b)) => a.partial_cmp(b),
            (Priority::Value(_), Priority::Lowest) => Some(Ordering::Less),
            (Priority::Lowest, Priority::Value(_)) => Some(Ordering::Greater),
            (Priority::Lowest, Priority::Lowest) => Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_number(self.as_f64()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub expression: String,
    pub recommendation: String,
    pub priority: Priority,
    pub rationale: String,
}

impl Rule {
    pub fn new(expression: &str, recommendation: &str, priority: Priority, rationale: &str) -> Self {
        Self {
            expression: expression.trim().to_string(),
            recommendation: recommendation.trim().to_string(),
            priority,
            rationale: rationale.trim().to_string(),
        }
    }
}

/// An immutable, ordered collection of usable rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Rules without an expression or without a label are dropped here.
    pub fn new(rules: Vec<Rule>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|r| !r.expression.is_empty() && !r.recommendation.is_empty())
            .collect();
        Self { rules }
    }

    /// Reads rules from a `Regeln`-shaped sheet.
    ///
    /// Columns are matched by normalized name. Without a rule or a
    /// recommendation column the set is empty.
    pub fn from_table(table: &Table) -> Self {
        let find = |name: &str| {
            table
                .columns
                .iter()
                .rposition(|c| normalize_column(c) == name)
        };

        let (Some(rule_col), Some(rec_col)) = (find(RULE_COLUMN), find(RECOMMENDATION_COLUMN))
        else {
            return Self::default();
        };
        let prio_col = find(PRIORITY_COLUMN);
        let why_col = find(RATIONALE_COLUMN);

        let cell = |row: usize, col: Option<usize>| {
            col.and_then(|c| table.cell(row, c)).unwrap_or("")
        };

        let rules = (0..table.len())
            .map(|row| {
                Rule::new(
                    cell(row, Some(rule_col)),
                    cell(row, Some(rec_col)),
                    Priority::parse(cell(row, prio_col)),
                    cell(row, why_col),
                )
            })
            .collect();
        Self::new(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compiles every rule against the labels of one data table.
    pub fn compile(&self, mapping: &ColumnMapping) -> CompiledRules<'_> {
        let entries = self
            .rules
            .iter()
            .map(|rule| {
                let compiled = expr_parser::parse(&rule.expression, mapping);
                if let Err(e) = &compiled {
                    debug!(rule = %rule.expression, error = %e, "rule does not parse and will never match");
                }
                (rule, compiled)
            })
            .collect();
        CompiledRules { entries }
    }
}

/// Rules compiled for one evaluation pass.
pub struct CompiledRules<'r> {
    entries: Vec<(&'r Rule, Result<Expr, ParseError>)>,
}

impl<'r> CompiledRules<'r> {
    /// The matching rule with the best priority, earliest rule on ties.
    pub fn best_match(&self, row: &Row) -> Option<&'r Rule> {
        let mut best: Option<&'r Rule> = None;
        for (rule, compiled) in &self.entries {
            let Ok(expr) = compiled else {
                continue;
            };
            if !expr_eval::matches(expr, row) {
                continue;
            }
            if best.is_none_or(|b| rule.priority.outranks(b.priority)) {
                best = Some(*rule);
            }
        }
        best
    }

    pub fn entries(&self) -> &[(&'r Rule, Result<Expr, ParseError>)] {
        &self.entries
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|(_, c)| c.is_err()).count()
    }
}
