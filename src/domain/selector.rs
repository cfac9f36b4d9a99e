//! Observation selection: asset/timeframe filters and "latest only".

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::column::{normalize_column, NormalizedTable, Row};
use crate::domain::value::Value;

pub const ASSET_COLUMN: &str = "Asset";
pub const TIMEFRAME_COLUMN: &str = "Timeframe";
pub const TIMESTAMP_COLUMN: &str = "Bewertungszeit";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Which columns identify asset, timeframe and assessment time.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyColumns {
    pub asset: String,
    pub timeframe: String,
    pub timestamp: String,
}

impl Default for KeyColumns {
    fn default() -> Self {
        Self {
            asset: ASSET_COLUMN.to_string(),
            timeframe: TIMEFRAME_COLUMN.to_string(),
            timestamp: TIMESTAMP_COLUMN.to_string(),
        }
    }
}

impl KeyColumns {
    pub fn asset_key(&self) -> String {
        normalize_column(&self.asset)
    }

    pub fn timeframe_key(&self) -> String {
        normalize_column(&self.timeframe)
    }

    pub fn timestamp_key(&self) -> String {
        normalize_column(&self.timestamp)
    }
}

/// Empty `assets`/`timeframes` mean "no filter", not "exclude everything".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationFilter {
    pub assets: Vec<String>,
    pub timeframes: Vec<String>,
    pub latest_only: bool,
}

impl ObservationFilter {
    pub fn latest() -> Self {
        Self {
            latest_only: true,
            ..Self::default()
        }
    }

    pub fn with_assets<S: AsRef<str>>(mut self, assets: &[S]) -> Self {
        self.assets = assets.iter().map(|a| a.as_ref().to_string()).collect();
        self
    }

    pub fn with_timeframes<S: AsRef<str>>(mut self, timeframes: &[S]) -> Self {
        self.timeframes = timeframes.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }
}

/// Parses an assessment time. Date-only values mean midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn value_timestamp(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value {
        Some(Value::Text(s)) => parse_timestamp(s),
        _ => None,
    }
}

fn key_text(row: &Row, key: &str) -> String {
    row.get(key).map(|v| v.to_string()).unwrap_or_default()
}

fn passes(row: &Row, key: &str, allowed: &[String], column_exists: bool) -> bool {
    if allowed.is_empty() || !column_exists {
        return true;
    }
    match row.get(key) {
        Some(Value::Empty) | None => false,
        Some(v) => {
            let text = v.to_string();
            allowed.iter().any(|a| *a == text)
        }
    }
}

/// Applies the filter and returns the selected rows.
///
/// Filters whose key column is absent from the table are skipped. "Latest
/// only" needs all three key columns; it keeps the row with the greatest
/// timestamp per (asset, timeframe), earlier rows winning ties, unparsable
/// timestamps ranking below every parsable one. Its output is ordered by
/// (asset, timeframe); without it input order is kept.
pub fn select<'t>(
    table: &'t NormalizedTable,
    filter: &ObservationFilter,
    keys: &KeyColumns,
) -> Vec<&'t Row> {
    let asset_key = keys.asset_key();
    let timeframe_key = keys.timeframe_key();
    let timestamp_key = keys.timestamp_key();

    let has_asset = table.has_column(&asset_key);
    let has_timeframe = table.has_column(&timeframe_key);
    let has_timestamp = table.has_column(&timestamp_key);

    let filtered: Vec<&Row> = table
        .rows
        .iter()
        .filter(|row| passes(row, &asset_key, &filter.assets, has_asset))
        .filter(|row| passes(row, &timeframe_key, &filter.timeframes, has_timeframe))
        .collect();

    if !(filter.latest_only && has_asset && has_timeframe && has_timestamp) {
        return filtered;
    }

    let mut latest: BTreeMap<(String, String), (Option<NaiveDateTime>, &Row)> = BTreeMap::new();
    for row in filtered {
        let group = (key_text(row, &asset_key), key_text(row, &timeframe_key));
        let ts = value_timestamp(row.get(&timestamp_key));
        let newer = latest.get(&group).is_none_or(|(best, _)| ts > *best);
        if newer {
            latest.insert(group, (ts, row));
        }
    }

    latest.into_values().map(|(_, row)| row).collect()
}
