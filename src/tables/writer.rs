//! Commits computed values and narrative text into a worksheet.
//!
//! Only columns 5 to 8 of a table's data and total rows are ever touched; the
//! percent-change row keeps whatever the workbook author put there, and so
//! does a fallback total row that belongs to a neighbouring table.
use crate::spreadsheet::SheetWriter;
use crate::tables::BoundarySet;
use crate::tables::MonthlyRecord;
use crate::tables::TableTotals;
use crate::tables::MOM_COLUMN;
use crate::tables::NARRATIVE_COLUMN;
use crate::tables::YEAR_N_COLUMN;
use crate::tables::YOY_COLUMN;
use std::cmp::min;
use std::ops::Range;

/// Most narrative lines written per table.
pub const MAX_NARRATIVE_LINES: usize = 10;

/// Width given to the narrative column.
pub const NARRATIVE_WIDTH: f64 = 60.0;

/// Converts a 0-100 percentage into the stored fraction, rounded to four places.
fn to_fraction(percent: f64) -> f64 {
    (percent / 100.0 * 10_000.0).round() / 10_000.0
}

/// Writes YoY and MoM of every computed record plus the total row.
pub fn write_metrics<S: SheetWriter + ?Sized>(
    sheet: &mut S,
    boundaries: &BoundarySet,
    records: &[MonthlyRecord],
    totals: &TableTotals,
) {
    for record in records {
        if let Some(yoy) = record.yoy_pct {
            sheet.set_percent(record.row, YOY_COLUMN, to_fraction(yoy));
        }
        if let Some(mom) = record.mom_pct {
            sheet.set_percent(record.row, MOM_COLUMN, to_fraction(mom));
        }
    }

    if !boundaries.total_writable {
        return;
    }
    if let Some(total) = totals.year_n_total {
        sheet.set_number(boundaries.total_row, YEAR_N_COLUMN, total);
    }
    match totals.yoy_total_pct {
        Some(yoy) => sheet.set_percent(boundaries.total_row, YOY_COLUMN, to_fraction(yoy)),
        None => sheet.clear(boundaries.total_row, YOY_COLUMN),
    }
}

/// Rows of column 8 owned by the narrative: up to ten from the first data
/// row, ending before the percent-change row or a total row that is not ours.
pub fn narrative_rows(boundaries: &BoundarySet) -> Range<u32> {
    let mut end = boundaries.data_start + MAX_NARRATIVE_LINES as u32;
    if let Some(stop) = boundaries.percent_change_row {
        end = min(end, stop);
    }
    if !boundaries.total_writable {
        end = min(end, boundaries.total_row);
    }
    boundaries.data_start..end
}

/// Replaces the narrative of a table, one line per cell in column 8.
///
/// Lines left over from a longer earlier narrative are cleared. Returns the
/// number of lines written.
pub fn write_narrative<S: SheetWriter + ?Sized>(sheet: &mut S, boundaries: &BoundarySet, text: &str) -> usize {
    let rows = narrative_rows(boundaries);
    let lines = narrative_lines(text);
    let written = min(lines.len(), rows.len());
    for (index, row) in rows.enumerate() {
        match lines.get(index) {
            Some(line) => sheet.set_wrapped_text(row, NARRATIVE_COLUMN, line),
            None => sheet.clear(row, NARRATIVE_COLUMN),
        }
    }
    sheet.set_column_width(NARRATIVE_COLUMN, NARRATIVE_WIDTH);
    written
}

/// Trimmed non-empty lines with bold markers removed, at most ten.
pub fn narrative_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.replace("**", "").trim().to_owned())
        .filter(|line| !line.is_empty())
        .take(MAX_NARRATIVE_LINES)
        .collect()
}
