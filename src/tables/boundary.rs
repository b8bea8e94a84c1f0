use crate::spreadsheet::SheetReader;
use crate::tables::locator::RowRole;
use crate::tables::BoundaryError;
use crate::tables::BoundarySet;
use crate::tables::TableDescriptor;
use crate::tables::HEADER_LABEL;
use crate::tables::MONTH_COLUMN;
use crate::tables::PERCENT_CHANGE_LABEL;
use std::cmp::min;
use tracing::debug;
use tracing::warn;

/// Rows examined below the header when looking for months and the total.
const SCAN_WINDOW: u32 = 15;

/// Extra rows examined for a late "Total" once the window runs out.
const TOTAL_LOOKAHEAD: u32 = 4;

/// Month rows a single table can hold.
const MAX_DATA_ROWS: u32 = 12;

/// Resolves the row layout of the table starting at `table.start_row`.
///
/// Always recomputed from the sheet, so the same descriptor resolves
/// identically before and after values are written into columns 5 to 8.
pub fn resolve<S: SheetReader + ?Sized>(sheet: &S, table: &TableDescriptor) -> Result<BoundarySet, BoundaryError> {
    let is_header = |row: u32| sheet.label(row, MONTH_COLUMN).as_deref() == Some(HEADER_LABEL);
    let header_row = [table.start_row, table.start_row + 1]
        .into_iter()
        .find(|row| is_header(*row))
        .ok_or_else(|| BoundaryError::MissingHeader {
            title: table.title.to_owned(),
            row: table.start_row,
        })?;

    let data_start = header_row + 1;
    let last_row = sheet.last_row();
    let window_end = min(data_start + SCAN_WINDOW - 1, last_row);
    let mut data_end = None::<u32>;
    let mut total_row = None::<u32>;
    let mut window_exhausted = true;
    for row in data_start..=window_end {
        match RowRole::classify(sheet, row) {
            RowRole::Total => {
                total_row = Some(row);
                window_exhausted = false;
                break;
            }
            RowRole::Month if row - data_start >= MAX_DATA_ROWS => {
                window_exhausted = false;
                break;
            }
            RowRole::Month => data_end = Some(row),
            role if role.is_header() => {
                window_exhausted = false;
                break;
            }
            _ => (),
        }
    }

    let data_end = data_end.ok_or_else(|| BoundaryError::EmptyDataRange {
        title: table.title.to_owned(),
        header_row,
    })?;

    if total_row.is_none() && window_exhausted {
        let lookahead_end = min(window_end + TOTAL_LOOKAHEAD, last_row);
        total_row = (window_end + 1..=lookahead_end).find(|row| RowRole::classify(sheet, *row) == RowRole::Total);
    }
    let (total_row, total_writable) = match total_row {
        Some(row) => (row, true),
        None => {
            let fallback = data_end + 1;
            let writable = matches!(RowRole::classify(sheet, fallback), RowRole::Blank | RowRole::Other);
            warn!(
                title = table.title.as_str(),
                row = fallback,
                writable,
                "No 'Total' row found, using the row after the data"
            );
            (fallback, writable)
        }
    };

    let percent_change_row = Some(total_row + 1)
        .filter(|row| sheet.label(*row, MONTH_COLUMN).as_deref() == Some(PERCENT_CHANGE_LABEL));

    let boundaries = BoundarySet {
        header_row,
        data_start,
        data_end,
        total_row,
        total_writable,
        percent_change_row,
    };
    debug!(title = table.title.as_str(), ?boundaries, "Resolved boundaries");
    Ok(boundaries)
}
