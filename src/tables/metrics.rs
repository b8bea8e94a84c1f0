//! Year-over-year, month-over-month and total computations for one table
use crate::error::RustyTrendsError;
use crate::spreadsheet::SheetReader;
use crate::tables::BoundarySet;
use crate::tables::MonthlyRecord;
use crate::tables::TableTotals;
use crate::tables::MOM_COLUMN;
use crate::tables::MONTH_COLUMN;
use crate::tables::YEAR_N_COLUMN;
use crate::tables::YEAR_N_MINUS_1_COLUMN;
use crate::tables::YEAR_N_MINUS_2_COLUMN;
use crate::tables::YOY_COLUMN;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

/// A corroborated total must land closer than this to the direct sum.
const TOTAL_TOLERANCE: f64 = 0.01;

/// A corroborated YoY value must land closer than this, in percentage points.
const YOY_TOLERANCE: f64 = 1.0;

/// Totals are only corroborated for a plausible number of months.
const CORROBORATED_VALUES: std::ops::RangeInclusive<usize> = 1..=12;

/// Relative change from `previous` to `current` in percent.
///
/// Absent when either side is absent or `previous` is zero.
pub fn percent_change(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (previous, current) {
        (Some(previous), Some(current)) if previous != 0.0 => {
            Some((current - previous) / previous * 100.0).filter(|change| change.is_finite())
        }
        _ => None,
    }
}

/// Reads the data rows of a table. Percentage columns are read back in the 0-100 range.
pub fn extract_records<S: SheetReader + ?Sized>(sheet: &S, boundaries: &BoundarySet) -> Vec<MonthlyRecord> {
    boundaries
        .data_rows()
        .map(|row| MonthlyRecord {
            row,
            month: sheet.label(row, MONTH_COLUMN).unwrap_or_default(),
            year_n_minus_2: sheet.value(row, YEAR_N_MINUS_2_COLUMN).to_number(),
            year_n_minus_1: sheet.value(row, YEAR_N_MINUS_1_COLUMN).to_number(),
            year_n: sheet.value(row, YEAR_N_COLUMN).to_number(),
            yoy_pct: sheet.value(row, YOY_COLUMN).to_percent(),
            mom_pct: sheet.value(row, MOM_COLUMN).to_percent(),
        })
        .collect()
}

/// Sums both compared years over the rows where both have values.
pub fn totals(records: &[MonthlyRecord]) -> TableTotals {
    let aligned: Vec<(f64, f64)> = aligned_values(records);
    if aligned.is_empty() {
        return TableTotals::default();
    }
    let previous: f64 = aligned.iter().map(|(previous, _)| previous).sum();
    let current: f64 = aligned.iter().map(|(_, current)| current).sum();
    TableTotals {
        year_n_minus_1_total: Some(previous),
        year_n_total: Some(current),
        yoy_total_pct: total_change(previous, current),
    }
}

fn aligned_values(records: &[MonthlyRecord]) -> Vec<(f64, f64)> {
    records
        .iter()
        .filter_map(|record| record.year_n_minus_1.zip(record.year_n))
        .collect()
}

fn total_change(previous: f64, current: f64) -> Option<f64> {
    if current == 0.0 {
        None
    } else {
        percent_change(Some(previous), Some(current))
    }
}

/// External source asked to repeat a calculation as a cross-check.
pub trait Corroborator {
    fn total(&self, values: &[f64]) -> Result<f64, RustyTrendsError>;

    fn yoy_percent(&self, previous: f64, current: f64) -> Result<f64, RustyTrendsError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Ask the corroborator to repeat totals and YoY values
    pub validate_with_external: bool,
}

/// Computes the derived columns and totals of a table.
pub struct MetricEngine<'a> {
    config: MetricConfig,
    corroborator: Option<&'a dyn Corroborator>,
}

impl<'a> MetricEngine<'a> {
    pub fn new(config: MetricConfig) -> Self {
        MetricEngine {
            config,
            corroborator: None,
        }
    }

    pub fn with_corroborator(mut self, corroborator: &'a dyn Corroborator) -> Self {
        self.corroborator = Some(corroborator);
        self
    }

    /// Fills YoY and MoM of every record and returns the aligned totals.
    ///
    /// Existing percentages in the records are replaced, so stale values read
    /// from a previous run never survive.
    pub fn compute(&self, records: &mut [MonthlyRecord]) -> TableTotals {
        let mut previous_year_n = None::<f64>;
        for record in records.iter_mut() {
            record.yoy_pct = percent_change(record.year_n_minus_1, record.year_n)
                .map(|direct| self.corroborate_yoy(record, direct));
            record.mom_pct = percent_change(previous_year_n, record.year_n);
            if record.year_n.is_some() {
                previous_year_n = record.year_n;
            }
        }

        let mut totals = totals(records);
        if let Some(corroborator) = self.active_corroborator() {
            let aligned = aligned_values(records);
            if CORROBORATED_VALUES.contains(&aligned.len()) {
                let previous: Vec<f64> = aligned.iter().map(|(previous, _)| *previous).collect();
                let current: Vec<f64> = aligned.iter().map(|(_, current)| *current).collect();
                totals.year_n_minus_1_total = totals
                    .year_n_minus_1_total
                    .map(|direct| corroborate("total", direct, corroborator.total(&previous), TOTAL_TOLERANCE));
                totals.year_n_total = totals
                    .year_n_total
                    .map(|direct| corroborate("total", direct, corroborator.total(&current), TOTAL_TOLERANCE));
                if let Some((previous, current)) = totals.year_n_minus_1_total.zip(totals.year_n_total) {
                    totals.yoy_total_pct = total_change(previous, current);
                }
            }
        }
        totals
    }

    fn active_corroborator(&self) -> Option<&'a dyn Corroborator> {
        self.corroborator.filter(|_| self.config.validate_with_external)
    }

    fn corroborate_yoy(&self, record: &MonthlyRecord, direct: f64) -> f64 {
        match (self.active_corroborator(), record.year_n_minus_1.zip(record.year_n)) {
            (Some(corroborator), Some((previous, current))) => corroborate(
                "yoy_percent",
                direct,
                corroborator.yoy_percent(previous, current),
                YOY_TOLERANCE,
            ),
            _ => direct,
        }
    }
}

/// Keeps the external value when it agrees with the direct one, the direct value otherwise.
fn corroborate(kind: &str, direct: f64, external: Result<f64, RustyTrendsError>, tolerance: f64) -> f64 {
    match external {
        Ok(external) if (external - direct).abs() < tolerance => {
            debug!(kind, direct, external, "External calculation agrees");
            external
        }
        Ok(external) => {
            warn!(kind, direct, external, "External calculation disagrees, keeping direct value");
            direct
        }
        Err(error) => {
            warn!(kind, direct, %error, "External calculation failed, keeping direct value");
            direct
        }
    }
}
