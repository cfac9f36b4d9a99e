//! Fixed-form observations and the append-only session log.
//!
//! The log is owned by the caller and handed to the classifier per pass;
//! entries are only ever appended.

use tracing::warn;

use crate::domain::classifier::{classify, IndicatorReading, Recommendation};
use crate::domain::column::normalize_column;
use crate::domain::legend::normalize_histogram_code;
use crate::domain::table::Table;
use crate::domain::value::parse_number;

/// Column layout of a fixed-form `Daten` sheet.
pub const FIXED_COLUMNS: [&str; 11] = [
    "Asset",
    "Kurs_USD",
    "RSI",
    "MACD_Position",
    "MACD_zu_Signallinie",
    "MACD_Histogramm",
    "Bollinger",
    "Divergenz",
    "Timeframe",
    "Bewertungszeit",
    "Kommentar",
];

#[derive(Debug, Clone, PartialEq)]
pub struct FixedObservation {
    pub asset: String,
    pub price_usd: f64,
    pub rsi: f64,
    pub macd_position: f64,
    pub signal: String,
    pub histogram: String,
    pub bollinger: String,
    pub divergence: String,
    pub timeframe: String,
    pub assessed_at: String,
    pub comment: String,
}

impl FixedObservation {
    pub fn reading(&self) -> IndicatorReading {
        IndicatorReading::from_codes(
            self.rsi,
            self.macd_position,
            &self.signal,
            &self.histogram,
            &self.bollinger,
            &self.divergence,
        )
    }

    /// Cells in [`FIXED_COLUMNS`] order.
    pub fn cells(&self) -> Vec<String> {
        let num = |v: f64| {
            if v.is_nan() {
                String::new()
            } else {
                crate::domain::value::format_number(v)
            }
        };
        vec![
            self.asset.clone(),
            num(self.price_usd),
            num(self.rsi),
            num(self.macd_position),
            self.signal.clone(),
            self.histogram.clone(),
            self.bollinger.clone(),
            self.divergence.clone(),
            self.timeframe.clone(),
            self.assessed_at.clone(),
            self.comment.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObservationLog {
    entries: Vec<FixedObservation>,
}

impl ObservationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observation. Blank assets are rejected and `false` returned.
    pub fn append(&mut self, mut obs: FixedObservation) -> bool {
        let asset = obs.asset.trim();
        if asset.is_empty() {
            return false;
        }
        obs.asset = asset.to_string();
        obs.histogram = normalize_histogram_code(&obs.histogram);
        self.entries.push(obs);
        true
    }

    /// Appends every row of a fixed-form sheet; returns how many were taken.
    pub fn extend_from_table(&mut self, table: &Table) -> usize {
        let index: Vec<Option<usize>> = FIXED_COLUMNS
            .iter()
            .map(|name| {
                table
                    .columns
                    .iter()
                    .rposition(|c| normalize_column(c) == *name)
            })
            .collect();

        let mut appended = 0;
        for row in 0..table.len() {
            let text = |field: usize| {
                index[field]
                    .and_then(|c| table.cell(row, c))
                    .unwrap_or("")
                    .trim()
                    .to_string()
            };
            let number = |field: usize| parse_number(&text(field)).unwrap_or(f64::NAN);

            let obs = FixedObservation {
                asset: text(0),
                price_usd: number(1),
                rsi: number(2),
                macd_position: number(3),
                signal: text(4),
                histogram: text(5),
                bollinger: text(6),
                divergence: text(7),
                timeframe: text(8),
                assessed_at: text(9),
                comment: text(10),
            };
            if self.append(obs) {
                appended += 1;
            } else {
                warn!(row = row + 1, "skipping observation without asset");
            }
        }
        appended
    }

    pub fn entries(&self) -> &[FixedObservation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classifies every entry with the fixed decision table.
    pub fn recommendations(&self) -> Vec<(&FixedObservation, Recommendation)> {
        self.entries
            .iter()
            .map(|obs| (obs, classify(&obs.reading())))
            .collect()
    }
}
