//! # Monthly Table Module
//!
//! Discovery and computation over the monthly tables stacked vertically in
//! one worksheet. Every table uses the same column layout:
//!
//! | Column | Content                         |
//! |--------|---------------------------------|
//! | 1      | table title                     |
//! | 2      | month label, "Month", "Total"   |
//! | 3      | year N-2                        |
//! | 4      | year N-1                        |
//! | 5      | year N                          |
//! | 6      | year-over-year change           |
//! | 7      | month-over-month change         |
//! | 8      | narrative summary               |
use crate::spreadsheet::SheetReader;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

pub mod boundary;
pub mod locator;
pub mod metrics;
pub mod writer;

pub const TITLE_COLUMN: u32 = 1;
pub const MONTH_COLUMN: u32 = 2;
pub const YEAR_N_MINUS_2_COLUMN: u32 = 3;
pub const YEAR_N_MINUS_1_COLUMN: u32 = 4;
pub const YEAR_N_COLUMN: u32 = 5;
pub const YOY_COLUMN: u32 = 6;
pub const MOM_COLUMN: u32 = 7;
pub const NARRATIVE_COLUMN: u32 = 8;

pub const HEADER_LABEL: &str = "Month";
pub const TOTAL_LABEL: &str = "Total";
pub const PERCENT_CHANGE_LABEL: &str = "% Change";

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("Hardcode regex pattern"));

/// Title and first row of one table, in sheet order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub title: String,
    pub start_row: u32,
}

/// Row positions of one table.
///
/// Always `header_row < data_start <= data_end < total_row`, with
/// `percent_change_row == total_row + 1` when present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoundarySet {
    pub header_row: u32,
    pub data_start: u32,
    pub data_end: u32,
    pub total_row: u32,
    /// False when `total_row` is a fallback that belongs to other content,
    /// such as the header of a packed neighbour; such a row is never written.
    pub total_writable: bool,
    pub percent_change_row: Option<u32>,
}

impl BoundarySet {
    pub fn data_rows(&self) -> impl Iterator<Item = u32> {
        self.data_start..=self.data_end
    }
}

/// One data row of a table. Percentages are in the 0-100 range.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MonthlyRecord {
    pub row: u32,
    pub month: String,
    pub year_n_minus_2: Option<f64>,
    pub year_n_minus_1: Option<f64>,
    pub year_n: Option<f64>,
    pub yoy_pct: Option<f64>,
    pub mom_pct: Option<f64>,
}

/// Totals over the rows where both compared years have values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TableTotals {
    pub year_n_minus_1_total: Option<f64>,
    pub year_n_total: Option<f64>,
    pub yoy_total_pct: Option<f64>,
}

/// Display names of the two compared years.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct YearLabels {
    pub previous: String,
    pub current: String,
}

impl Default for YearLabels {
    fn default() -> Self {
        YearLabels {
            previous: "Year N-1".to_owned(),
            current: "Year N".to_owned(),
        }
    }
}

impl YearLabels {
    /// Takes the first four-digit year from the header cells of the compared
    /// years ("Sessions 2024" gives "2024"); missing years keep their fallback.
    pub fn from_header<S: SheetReader + ?Sized>(sheet: &S, header_row: u32) -> YearLabels {
        let year = |column: u32| {
            sheet
                .label(header_row, column)
                .and_then(|label| YEAR_PATTERN.find(&label).map(|found| found.as_str().to_owned()))
        };
        let fallback = YearLabels::default();
        YearLabels {
            previous: year(YEAR_N_MINUS_1_COLUMN).unwrap_or(fallback.previous),
            current: year(YEAR_N_COLUMN).unwrap_or(fallback.current),
        }
    }
}

/// Everything known about one table, exported for the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableReport {
    pub title: String,
    pub boundaries: BoundarySet,
    pub monthly_records: Vec<MonthlyRecord>,
    pub totals: TableTotals,
    pub summary: Option<String>,
}

/// Per-table faults; the affected table is skipped and the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("Table '{title}' at row {row} has no 'Month' header")]
    MissingHeader { title: String, row: u32 },

    #[error("Table '{title}' has no month rows after header row {header_row}")]
    EmptyDataRange { title: String, header_row: u32 },
}
