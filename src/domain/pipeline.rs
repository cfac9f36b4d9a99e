//! One rule-engine pass: normalize, select, coerce, match, record.

use tracing::info;

use crate::domain::column::{coerce_rows, normalize_table, ColumnMapping};
use crate::domain::rule_set::{Priority, RuleSet};
use crate::domain::selector::{select, KeyColumns, ObservationFilter};
use crate::domain::table::Table;
use crate::domain::value::Value;

/// Outcome for one selected observation.
///
/// An observation no rule matched carries an empty recommendation, trigger
/// and rationale, and no priority.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRecord {
    pub asset: Value,
    pub timeframe: Value,
    pub timestamp: Value,
    pub recommendation: String,
    pub trigger: String,
    pub rationale: String,
    pub priority: Option<Priority>,
}

impl RecommendationRecord {
    pub fn is_match(&self) -> bool {
        self.priority.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub mapping: ColumnMapping,
    pub records: Vec<RecommendationRecord>,
}

impl Evaluation {
    pub fn matched(&self) -> usize {
        self.records.iter().filter(|r| r.is_match()).count()
    }
}

/// Runs the rule engine over `data`.
///
/// Without data rows or without usable rules the record list is empty.
pub fn evaluate(
    data: &Table,
    rules: &RuleSet,
    filter: &ObservationFilter,
    keys: &KeyColumns,
) -> Evaluation {
    let normalized = normalize_table(data);
    if normalized.rows.is_empty() || rules.is_empty() {
        info!(
            rows = normalized.rows.len(),
            rules = rules.len(),
            "nothing to evaluate"
        );
        return Evaluation {
            mapping: normalized.mapping,
            records: Vec::new(),
        };
    }

    let selected = coerce_rows(&select(&normalized, filter, keys));
    let compiled = rules.compile(&normalized.mapping);
    info!(
        rows = normalized.rows.len(),
        selected = selected.len(),
        rules = rules.len(),
        unparsable = compiled.failed(),
        "evaluating rules"
    );

    let asset_key = keys.asset_key();
    let timeframe_key = keys.timeframe_key();
    let timestamp_key = keys.timestamp_key();

    let records = selected
        .iter()
        .map(|row| {
            let best = compiled.best_match(row);
            RecommendationRecord {
                asset: row.get_or_empty(&asset_key),
                timeframe: row.get_or_empty(&timeframe_key),
                timestamp: row.get_or_empty(&timestamp_key),
                recommendation: best.map(|r| r.recommendation.clone()).unwrap_or_default(),
                trigger: best.map(|r| r.expression.clone()).unwrap_or_default(),
                rationale: best.map(|r| r.rationale.clone()).unwrap_or_default(),
                priority: best.map(|r| r.priority),
            }
        })
        .collect();

    Evaluation {
        mapping: normalized.mapping,
        records,
    }
}
