//! Result export port trait.

use std::path::Path;

use crate::domain::error::KryptoError;
use crate::domain::observation::ObservationLog;
use crate::domain::pipeline::RecommendationRecord;

pub trait ExportPort {
    fn write_recommendations(
        &self,
        records: &[RecommendationRecord],
        path: &Path,
    ) -> Result<(), KryptoError>;

    fn write_classified(&self, log: &ObservationLog, path: &Path) -> Result<(), KryptoError>;
}
