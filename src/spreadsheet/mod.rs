//! # Worksheet Access Module
//!
//! Cell-level access to a single worksheet of an `.xlsx` workbook. Readers see
//! cells as [`CellValue`]s addressed by 1-based (row, column); writers overwrite
//! values and the handful of formats the table writer needs. Three
//! implementations exist:
//!
//! - [`sheet::Sheet`]: an in-memory grid, filled by the snapshot reader or by tests
//! - [`umya_spreadsheet::Worksheet`]: the editable document, see [`document`]
//! - [`xlsx::XlsxSnapshot`]: a streaming read-only loader producing a [`sheet::Sheet`]
use crate::error::RustyTrendsError;
use crate::spreadsheet::cell::CellValue;
use thiserror::Error;

pub mod cell;
pub mod document;
mod excel;
pub(crate) mod reference;
pub mod sheet;
pub mod xlsx;

/// Number format applied to written percentage cells.
pub const PERCENT_FORMAT: &str = "0.00%";

/// Errors raised while opening or navigating a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    /// A required part of the xlsx package is missing
    #[error("Missing part '{0}' in xlsx package")]
    FileError(String),

    #[error("Invalid value at {position}: {message}")]
    InvalidCellValue { position: String, message: String },

    #[error("Workbook '{0}' contains no worksheets")]
    EmptySpreadsheet(String),
}

/// Read access to one worksheet.
pub trait SheetReader {
    /// Value of the cell at 1-based (row, column); missing cells are `Empty`.
    fn value(&self, row: u32, column: u32) -> CellValue;

    /// Highest row holding any cell, 0 for an empty sheet.
    fn last_row(&self) -> u32;

    /// Trimmed text label of a cell, `None` when blank.
    fn label(&self, row: u32, column: u32) -> Option<String> {
        self.value(row, column).label()
    }
}

/// Write access to one worksheet.
///
/// Implementations never insert or delete rows or columns.
pub trait SheetWriter: SheetReader {
    fn set_number(&mut self, row: u32, column: u32, value: f64);

    /// Stores a fraction (0.264 for 26.4%) formatted with [`PERCENT_FORMAT`].
    fn set_percent(&mut self, row: u32, column: u32, fraction: f64);

    /// Stores text with wrapping enabled and top vertical alignment.
    fn set_wrapped_text(&mut self, row: u32, column: u32, text: &str);

    fn clear(&mut self, row: u32, column: u32);

    fn set_column_width(&mut self, column: u32, width: f64);
}

/// A workbook that can hand out writable worksheets and persist itself.
pub trait Document {
    /// Borrows the named worksheet for reading and writing.
    fn worksheet(&mut self, name: &str) -> Result<&mut dyn SheetWriter, RustyTrendsError>;

    /// Persists every change made so far to the backing store.
    fn save(&mut self) -> Result<(), RustyTrendsError>;
}
