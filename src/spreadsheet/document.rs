//! Editable `.xlsx` workbook backed by `umya-spreadsheet`
use crate::error::RustyTrendsError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::reference::column_letters;
use crate::spreadsheet::Document;
use crate::spreadsheet::SheetReader;
use crate::spreadsheet::SheetWriter;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::PERCENT_FORMAT;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use umya_spreadsheet::CellRawValue;
use umya_spreadsheet::Spreadsheet;
use umya_spreadsheet::VerticalAlignmentValues;
use umya_spreadsheet::Worksheet;

/// A workbook loaded fully into memory and overwritten in place on save.
pub struct Workbook {
    path: PathBuf,
    book: Spreadsheet,
}

impl Workbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Workbook, RustyTrendsError> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Loading workbook");
        let book = umya_spreadsheet::reader::xlsx::read(&path)?;
        if book.get_sheet_collection().is_empty() {
            Err(SpreadsheetError::EmptySpreadsheet(path.display().to_string()))?;
        }
        Ok(Workbook { path, book })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_owned())
            .collect()
    }
}

impl Document for Workbook {
    fn worksheet(&mut self, name: &str) -> Result<&mut dyn SheetWriter, RustyTrendsError> {
        let sheet = self
            .book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(name.to_owned()))?;
        Ok(sheet)
    }

    fn save(&mut self) -> Result<(), RustyTrendsError> {
        debug!(path = %self.path.display(), "Saving workbook");
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|error| {
            RustyTrendsError::PersistenceError {
                path: self.path.display().to_string(),
                message: error.to_string(),
            }
        })
    }
}

impl SheetReader for Worksheet {
    fn value(&self, row: u32, column: u32) -> CellValue {
        let Some(cell) = self.get_cell((column, row)) else {
            return CellValue::Empty;
        };
        let value = cell.get_cell_value();
        if value.is_formula() {
            let formula = value.get_formula();
            return if formula.starts_with('=') {
                CellValue::Formula(formula.to_owned())
            } else {
                CellValue::Formula(format!("={formula}"))
            };
        }
        match value.get_raw_value() {
            CellRawValue::Numeric(number) => CellValue::Number(*number),
            CellRawValue::Bool(flag) => CellValue::Bool(*flag),
            CellRawValue::String(text) => CellValue::Text(text.to_string()),
            CellRawValue::RichText(text) => CellValue::Text(text.get_text().to_string()),
            CellRawValue::Lazy(text) => match text.parse::<f64>() {
                Ok(number) => CellValue::Number(number),
                Err(_) => CellValue::Text(text.to_string()),
            },
            CellRawValue::Error(_) => CellValue::Error(value.get_value().to_string()),
            CellRawValue::Empty => CellValue::Empty,
        }
    }

    fn last_row(&self) -> u32 {
        self.get_highest_row()
    }
}

impl SheetWriter for Worksheet {
    fn set_number(&mut self, row: u32, column: u32, value: f64) {
        self.get_cell_mut((column, row)).set_value_number(value);
    }

    fn set_percent(&mut self, row: u32, column: u32, fraction: f64) {
        self.get_cell_mut((column, row)).set_value_number(fraction);
        self.get_style_mut((column, row))
            .get_number_format_mut()
            .set_format_code(PERCENT_FORMAT);
    }

    fn set_wrapped_text(&mut self, row: u32, column: u32, text: &str) {
        self.get_cell_mut((column, row)).set_value_string(text);
        let alignment = self.get_style_mut((column, row)).get_alignment_mut();
        alignment.set_wrap_text(true);
        alignment.set_vertical(VerticalAlignmentValues::Top);
    }

    fn clear(&mut self, row: u32, column: u32) {
        if self.get_cell((column, row)).is_some() {
            self.get_cell_mut((column, row)).set_blank();
        }
    }

    fn set_column_width(&mut self, column: u32, width: f64) {
        self.get_column_dimension_mut(&column_letters(column)).set_width(width);
    }
}
