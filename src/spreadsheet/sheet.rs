use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::SheetReader;
use crate::spreadsheet::SheetWriter;
use crate::spreadsheet::PERCENT_FORMAT;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// In-memory worksheet holding cell values and the few formats the writer touches.
///
/// Used for read-only snapshots of xlsx files and as a test double for the
/// editable document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    /// Sheet name
    pub name: String,
    /// Non-empty cells keyed by 1-based (row, column)
    cells: BTreeMap<(u32, u32), CellValue>,
    /// Number format codes keyed by (row, column)
    formats: BTreeMap<(u32, u32), String>,
    /// Cells with text wrapping enabled
    wrapped: BTreeSet<(u32, u32)>,
    /// Column widths keyed by 1-based column
    column_widths: BTreeMap<u32, f64>,
}

impl Sheet {
    /// Creates an empty sheet.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Creates a sheet from rows of values; `rows[0][0]` lands in A1.
    pub fn from_rows(name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = Self::new(name);
        for (row_index, row) in rows.into_iter().enumerate() {
            for (col_index, value) in row.into_iter().enumerate() {
                sheet.set(row_index as u32 + 1, col_index as u32 + 1, value);
            }
        }
        sheet
    }

    /// Stores a value; storing `Empty` removes the cell.
    pub fn set(&mut self, row: u32, column: u32, value: impl Into<CellValue>) {
        match value.into() {
            CellValue::Empty => {
                self.cells.remove(&(row, column));
            }
            value => {
                self.cells.insert((row, column), value);
            }
        }
    }

    /// Number format code applied to a cell, if any.
    pub fn number_format(&self, row: u32, column: u32) -> Option<&str> {
        self.formats.get(&(row, column)).map(String::as_str)
    }

    /// Whether a cell has text wrapping enabled.
    pub fn is_wrapped(&self, row: u32, column: u32) -> bool {
        self.wrapped.contains(&(row, column))
    }

    /// Width assigned to a column, if any.
    pub fn column_width(&self, column: u32) -> Option<f64> {
        self.column_widths.get(&column).copied()
    }
}

impl SheetReader for Sheet {
    fn value(&self, row: u32, column: u32) -> CellValue {
        self.cells.get(&(row, column)).cloned().unwrap_or_default()
    }

    fn last_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }
}

impl SheetWriter for Sheet {
    fn set_number(&mut self, row: u32, column: u32, value: f64) {
        self.set(row, column, value);
    }

    fn set_percent(&mut self, row: u32, column: u32, fraction: f64) {
        self.set(row, column, fraction);
        self.formats.insert((row, column), PERCENT_FORMAT.to_owned());
    }

    fn set_wrapped_text(&mut self, row: u32, column: u32, text: &str) {
        self.cells.insert((row, column), CellValue::Text(text.to_owned()));
        self.wrapped.insert((row, column));
    }

    fn clear(&mut self, row: u32, column: u32) {
        self.cells.remove(&(row, column));
    }

    fn set_column_width(&mut self, column: u32, width: f64) {
        self.column_widths.insert(column, width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Traffic-Status");

        assert_eq!(sheet.last_row(), 0);
        assert_eq!(sheet.value(1, 1), CellValue::Empty);
    }

    #[test]
    fn sheet_from_rows() {
        let sheet = Sheet::from_rows("", vec![
            vec!["Organic".into(), "Month".into()],
            vec![],
            vec![CellValue::Empty, "Jan".into(), 5288.0.into()],
        ]);

        assert_eq!(sheet.last_row(), 3);
        assert_eq!(sheet.value(1, 2), CellValue::Text("Month".to_owned()));
        assert_eq!(sheet.value(3, 3), CellValue::Number(5288.0));
        assert_eq!(sheet.value(2, 1), CellValue::Empty);
    }

    #[test]
    fn sheet_writes() {
        let mut sheet = Sheet::new("");
        sheet.set_percent(4, 6, -0.264);
        sheet.set_wrapped_text(4, 8, "Traffic fell.");
        sheet.set_column_width(8, 60.0);

        assert_eq!(sheet.value(4, 6), CellValue::Number(-0.264));
        assert_eq!(sheet.number_format(4, 6), Some(PERCENT_FORMAT));
        assert!(sheet.is_wrapped(4, 8));
        assert_eq!(sheet.column_width(8), Some(60.0));

        sheet.clear(4, 6);
        assert_eq!(sheet.value(4, 6), CellValue::Empty);
        assert_eq!(sheet.last_row(), 4);
    }
}
