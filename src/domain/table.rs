//! Raw tabular input as supplied by a table collaborator.

/// A sheet of text cells with named columns.
///
/// Rows shorter than the header are padded with empty cells; extra cells
/// beyond the header are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_row<S: AsRef<str>>(mut self, cells: &[S]) -> Self {
        self.push_row(cells.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.columns.len(), String::new());
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}
