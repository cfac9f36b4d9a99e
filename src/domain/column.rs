//! Column-name normalization.
//!
//! Header labels from user sheets ("MACD Histogramm", "Kurs (USD)", "4H RSI")
//! are turned into identifiers that rule expressions can reference:
//!
//! 1. trim surrounding whitespace
//! 2. collapse each internal whitespace run to one `_`
//! 3. replace every character outside `[0-9a-zA-Z_]` with `_`
//! 4. prefix `_` when the result starts with a digit
//!
//! Two labels may collapse to the same identifier. The later one wins, both
//! in the reverse lookup and in the re-keyed row data.
//!
//! Normalized rows still hold the raw cell text. Numeric coercion happens in
//! [`coerce_rows`], once the observations to evaluate have been selected.

use std::collections::{BTreeSet, HashMap};

use crate::domain::table::Table;
use crate::domain::value::{coerce_column, Value};

pub fn normalize_column(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }

    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Original label → normalized identifier, in input column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    entries: Vec<(String, String)>,
}

impl ColumnMapping {
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let mut mapping = Self::default();
        for c in columns {
            mapping.insert(c.as_ref());
        }
        mapping
    }

    fn insert(&mut self, original: &str) {
        let normalized = normalize_column(original);
        match self.entries.iter_mut().find(|(o, _)| o == original) {
            Some(entry) => entry.1 = normalized,
            None => self.entries.push((original.to_string(), normalized)),
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn normalized(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(o, _)| o == original)
            .map(|(_, n)| n.as_str())
    }

    /// Reverse lookup; on collisions the last original wins.
    pub fn original(&self, normalized: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(_, n)| n == normalized)
            .map(|(o, _)| o.as_str())
    }

    pub fn originals(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(o, _)| o.as_str())
    }
}

/// One observation keyed by normalized column identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Value under `key`, or `Value::Empty` when the column does not exist.
    pub fn get_or_empty(&self, key: &str) -> Value {
        self.values.get(key).cloned().unwrap_or(Value::Empty)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A table re-keyed by normalized identifiers.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub mapping: ColumnMapping,
    pub rows: Vec<Row>,
}

impl NormalizedTable {
    pub fn has_column(&self, normalized: &str) -> bool {
        self.mapping.entries().iter().any(|(_, n)| n == normalized)
    }
}

/// Re-keys every row by normalized identifier. Blank cells become
/// `Value::Empty`, everything else stays `Value::Text`.
pub fn normalize_table(table: &Table) -> NormalizedTable {
    let mapping = ColumnMapping::from_columns(&table.columns);
    let keys: Vec<String> = table.columns.iter().map(|c| normalize_column(c)).collect();

    let rows = table
        .rows
        .iter()
        .map(|cells| {
            let mut row = Row::new();
            for (key, cell) in keys.iter().zip(cells) {
                let value = if cell.trim().is_empty() {
                    Value::Empty
                } else {
                    Value::Text(cell.clone())
                };
                row.values.insert(key.clone(), value);
            }
            row
        })
        .collect();

    NormalizedTable { mapping, rows }
}

/// Coerces `rows` column by column, all-or-nothing within each column.
///
/// Only the given rows take part, so a placeholder in an observation that
/// was filtered out does not turn a numeric column into text.
pub fn coerce_rows(rows: &[&Row]) -> Vec<Row> {
    let keys: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.values.keys().map(String::as_str))
        .collect();

    let mut out = vec![Row::new(); rows.len()];
    for key in keys {
        let raw: Vec<String> = rows
            .iter()
            .map(|r| r.get(key).map(Value::to_string).unwrap_or_default())
            .collect();
        let cells: Vec<&str> = raw.iter().map(String::as_str).collect();
        for (row, value) in out.iter_mut().zip(coerce_column(&cells)) {
            row.values.insert(key.to_string(), value);
        }
    }
    out
}
