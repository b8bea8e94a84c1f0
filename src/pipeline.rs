//! Two-pass processing of every table in a worksheet.
//!
//! Pass 1 writes the computed metrics of all tables and saves. Pass 2 asks the
//! summary generator for a narrative per table and saves again, so numbers
//! are on disk before any network call is made. A failing table is logged and
//! skipped; a failing save aborts the run.
use crate::error::RustyTrendsError;
use crate::spreadsheet::Document;
use crate::spreadsheet::SheetReader;
use crate::spreadsheet::SheetWriter;
use crate::summary::build_summary_prompt;
use crate::summary::SummaryGenerator;
use crate::tables::boundary;
use crate::tables::locator::TableLocator;
use crate::tables::metrics;
use crate::tables::metrics::MetricEngine;
use crate::tables::writer;
use crate::tables::BoundarySet;
use crate::tables::TableDescriptor;
use crate::tables::TableReport;
use crate::tables::YearLabels;
use crate::tables::NARRATIVE_COLUMN;
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    Calculation,
    Summary,
}

/// A table that could not be processed in one pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableFailure {
    pub title: String,
    pub start_row: u32,
    pub pass: Pass,
    pub message: String,
}

/// Outcome of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub tables: usize,
    pub calculated: usize,
    pub summarized: usize,
    pub failures: Vec<TableFailure>,
}

pub struct Pipeline<'a> {
    sheet: String,
    engine: MetricEngine<'a>,
    summaries: Option<&'a dyn SummaryGenerator>,
    summary_timeout: Duration,
}

impl<'a> Pipeline<'a> {
    pub fn new(sheet: &str, engine: MetricEngine<'a>) -> Self {
        Pipeline {
            sheet: sheet.to_owned(),
            engine,
            summaries: None,
            summary_timeout: Duration::from_secs(60),
        }
    }

    /// Enables the summary pass.
    pub fn with_summaries(mut self, generator: &'a dyn SummaryGenerator, timeout: Duration) -> Self {
        self.summaries = Some(generator);
        self.summary_timeout = timeout;
        self
    }

    pub fn run<D: Document + ?Sized>(&self, document: &mut D) -> Result<RunSummary, RustyTrendsError> {
        let mut summary = RunSummary::default();

        let sheet = document.worksheet(&self.sheet)?;
        let tables: Vec<TableDescriptor> = TableLocator::new(&*sheet).collect();
        summary.tables = tables.len();
        info!(sheet = self.sheet.as_str(), tables = tables.len(), "Pass 1: calculating tables");
        for table in &tables {
            match self.calculate(sheet, table) {
                Ok(()) => {
                    info!(title = table.title.as_str(), "Calculated table");
                    summary.calculated += 1;
                }
                Err(error) => summary.failures.push(failure(table, Pass::Calculation, error)),
            }
        }
        document.save()?;
        info!(calculated = summary.calculated, "Pass 1 saved");

        let Some(generator) = self.summaries else {
            return Ok(summary);
        };
        let sheet = document.worksheet(&self.sheet)?;
        info!(tables = tables.len(), "Pass 2: generating summaries");
        for table in &tables {
            match self.summarize(sheet, generator, table) {
                Ok(lines) => {
                    info!(title = table.title.as_str(), lines, "Added summary");
                    summary.summarized += 1;
                }
                Err(error) => summary.failures.push(failure(table, Pass::Summary, error)),
            }
        }
        document.save()?;
        info!(summarized = summary.summarized, "Pass 2 saved");
        Ok(summary)
    }

    fn calculate(&self, sheet: &mut dyn SheetWriter, table: &TableDescriptor) -> Result<(), RustyTrendsError> {
        let boundaries = boundary::resolve(&*sheet, table)?;
        let mut records = metrics::extract_records(&*sheet, &boundaries);
        let totals = self.engine.compute(&mut records);
        writer::write_metrics(sheet, &boundaries, &records, &totals);
        Ok(())
    }

    fn summarize(
        &self,
        sheet: &mut dyn SheetWriter,
        generator: &dyn SummaryGenerator,
        table: &TableDescriptor,
    ) -> Result<usize, RustyTrendsError> {
        let boundaries = boundary::resolve(&*sheet, table)?;
        let records = metrics::extract_records(&*sheet, &boundaries);
        let totals = metrics::totals(&records);
        let labels = YearLabels::from_header(&*sheet, boundaries.header_row);
        let prompt = build_summary_prompt(&table.title, &labels, &records, &totals);
        let text = generator.generate_summary(&prompt, self.summary_timeout)?;
        Ok(writer::write_narrative(sheet, &boundaries, &text))
    }
}

fn failure(table: &TableDescriptor, pass: Pass, error: RustyTrendsError) -> TableFailure {
    warn!(title = table.title.as_str(), row = table.start_row, ?pass, %error, "Skipped table");
    TableFailure {
        title: table.title.to_owned(),
        start_row: table.start_row,
        pass,
        message: error.to_string(),
    }
}

/// Read-only export of every resolvable table, as shown on the dashboard.
///
/// Percentages come from what pass 1 stored in the sheet; totals are
/// recomputed from the monthly values.
pub fn report_tables<S: SheetReader + ?Sized>(sheet: &S) -> Vec<TableReport> {
    TableLocator::new(sheet)
        .filter_map(|table| match boundary::resolve(sheet, &table) {
            Ok(boundaries) => Some(report(sheet, table, boundaries)),
            Err(error) => {
                warn!(%error, "Skipped table in report");
                None
            }
        })
        .collect()
}

fn report<S: SheetReader + ?Sized>(sheet: &S, table: TableDescriptor, boundaries: BoundarySet) -> TableReport {
    let monthly_records = metrics::extract_records(sheet, &boundaries);
    let totals = metrics::totals(&monthly_records);
    let lines: Vec<String> = writer::narrative_rows(&boundaries)
        .filter_map(|row| sheet.value(row, NARRATIVE_COLUMN).as_text().map(str::trim).map(str::to_owned))
        .filter(|line| !line.is_empty())
        .collect();
    TableReport {
        title: table.title,
        boundaries,
        monthly_records,
        totals,
        summary: Some(lines.join("\n")).filter(|summary| !summary.is_empty()),
    }
}
