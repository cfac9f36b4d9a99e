//! CSV export of recommendation records and classified observations.

use crate::domain::error::KryptoError;
use crate::domain::observation::{ObservationLog, FIXED_COLUMNS};
use crate::domain::pipeline::RecommendationRecord;
use crate::ports::export_port::ExportPort;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const RECOMMENDATION_HEADER: [&str; 7] = [
    "Asset",
    "Timeframe",
    "Bewertungszeit",
    "Empfehlung",
    "Regel_trigger",
    "Begruendung",
    "Prioritaet",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExportAdapter;

fn export_err(e: impl std::fmt::Display) -> KryptoError {
    KryptoError::Export {
        reason: e.to_string(),
    }
}

impl CsvExportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_recommendations_to<W: Write>(
        &self,
        records: &[RecommendationRecord],
        writer: W,
    ) -> Result<(), KryptoError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(RECOMMENDATION_HEADER).map_err(export_err)?;
        for r in records {
            let priority = r.priority.map(|p| p.to_string()).unwrap_or_default();
            wtr.write_record([
                r.asset.to_string(),
                r.timeframe.to_string(),
                r.timestamp.to_string(),
                r.recommendation.clone(),
                r.trigger.clone(),
                r.rationale.clone(),
                priority,
            ])
            .map_err(export_err)?;
        }
        wtr.flush().map_err(export_err)?;
        Ok(())
    }

    pub fn write_classified_to<W: Write>(
        &self,
        log: &ObservationLog,
        writer: W,
    ) -> Result<(), KryptoError> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header: Vec<&str> = FIXED_COLUMNS.to_vec();
        header.push("Empfehlung");
        wtr.write_record(&header).map_err(export_err)?;
        for (obs, rec) in log.recommendations() {
            let mut cells = obs.cells();
            cells.push(rec.label().to_string());
            wtr.write_record(&cells).map_err(export_err)?;
        }
        wtr.flush().map_err(export_err)?;
        Ok(())
    }
}

impl ExportPort for CsvExportAdapter {
    fn write_recommendations(
        &self,
        records: &[RecommendationRecord],
        path: &Path,
    ) -> Result<(), KryptoError> {
        let file = File::create(path).map_err(|e| KryptoError::Export {
            reason: format!("failed to create {}: {}", path.display(), e),
        })?;
        self.write_recommendations_to(records, file)
    }

    fn write_classified(&self, log: &ObservationLog, path: &Path) -> Result<(), KryptoError> {
        let file = File::create(path).map_err(|e| KryptoError::Export {
            reason: format!("failed to create {}: {}", path.display(), e),
        })?;
        self.write_classified_to(log, file)
    }
}
