//! Sheet access port trait.

use crate::domain::error::KryptoError;
use crate::domain::table::Table;

/// Sheet names of a workbook.
pub const DATA_SHEET: &str = "Daten";
pub const RULES_SHEET: &str = "Regeln";
pub const LEGEND_SHEET: &str = "Legenden";

pub trait TablePort {
    /// Loads one sheet as raw text cells. A sheet that does not exist is an
    /// empty table, not an error.
    fn load_table(&self, sheet: &str) -> Result<Table, KryptoError>;
}
