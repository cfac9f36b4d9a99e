#![allow(dead_code)]

use kryptosignal::domain::error::KryptoError;
use kryptosignal::domain::rule_set::{Priority, Rule, RuleSet};
pub use kryptosignal::domain::table::Table;
use kryptosignal::ports::table_port::{TablePort, DATA_SHEET, RULES_SHEET};
use std::collections::HashMap;

pub struct MockTablePort {
    pub sheets: HashMap<String, Table>,
    pub errors: HashMap<String, String>,
}

impl MockTablePort {
    pub fn new() -> Self {
        Self {
            sheets: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: &str, table: Table) -> Self {
        self.sheets.insert(sheet.to_string(), table);
        self
    }

    pub fn with_data(self, table: Table) -> Self {
        self.with_sheet(DATA_SHEET, table)
    }

    pub fn with_rules(self, table: Table) -> Self {
        self.with_sheet(RULES_SHEET, table)
    }

    pub fn with_error(mut self, sheet: &str, reason: &str) -> Self {
        self.errors.insert(sheet.to_string(), reason.to_string());
        self
    }
}

impl TablePort for MockTablePort {
    fn load_table(&self, sheet: &str) -> Result<Table, KryptoError> {
        if let Some(reason) = self.errors.get(sheet) {
            return Err(KryptoError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.sheets.get(sheet).cloned().unwrap_or_default())
    }
}

pub fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
    let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
    for row in rows {
        t.push_row(row.iter().map(|c| c.to_string()).collect());
    }
    t
}

/// Daten sheet with two BTC/1D readings and one ETH/4H reading.
pub fn sample_data() -> Table {
    table(
        &["Asset", "Timeframe", "Bewertungszeit", "RSI", "MACD Histogramm", "Bollinger"],
        &[
            &["BTC", "1D", "2024-01-01 10:00", "25", "1.2", "überverkauft"],
            &["BTC", "1D", "2024-01-02 09:00", "28", "0.4", "überverkauft"],
            &["ETH", "4H", "2024-01-01 10:00", "75", "-0.5", "überkauft"],
        ],
    )
}

/// Regeln sheet; the third rule has no priority.
pub fn sample_rules() -> Table {
    table(
        &["Regel", "Empfehlung", "Prioritaet", "Begruendung"],
        &[
            &["RSI < 30 and MACD Histogramm > 0", "Kaufen", "1", "überverkauft, Momentum dreht"],
            &["RSI > 70", "Verkaufen", "2", "überkauft"],
            &["Bollinger == 'überverkauft'", "Kauf in Erwägung ziehen", "", ""],
        ],
    )
}

pub fn rule(expression: &str, recommendation: &str, priority: f64) -> Rule {
    Rule::new(expression, recommendation, Priority::Value(priority), "")
}

pub fn rule_set(rules: Vec<Rule>) -> RuleSet {
    RuleSet::new(rules)
}
