//! CSV sheet adapter: one `<sheet>.csv` file per workbook sheet.

use crate::domain::error::KryptoError;
use crate::domain::table::Table;
use crate::ports::table_port::TablePort;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct CsvTableAdapter {
    base_path: PathBuf,
    delimiter: u8,
}

impl CsvTableAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            delimiter: b',',
        }
    }

    /// Spreadsheet exports from German locales use `;`.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn csv_path(&self, sheet: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", sheet))
    }
}

impl TablePort for CsvTableAdapter {
    fn load_table(&self, sheet: &str) -> Result<Table, KryptoError> {
        let path = self.csv_path(sheet);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "sheet file missing, using empty table");
                return Ok(Table::default());
            }
            Err(e) => {
                return Err(KryptoError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| KryptoError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let mut table = Table::new(headers.iter().map(str::to_string).collect());

        for result in rdr.records() {
            let record = result.map_err(|e| KryptoError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            table.push_row(record.iter().map(str::to_string).collect());
        }

        info!(
            sheet,
            columns = table.columns.len(),
            rows = table.len(),
            "loaded sheet"
        );
        Ok(table)
    }
}
