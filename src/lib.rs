//! # Rusty Trends
//!
//! Finds the monthly time-series tables stacked in one worksheet of an `.xlsx`
//! workbook, computes their derived metrics and writes the results back next
//! to the source data.
//!
//! ## Features
//!
//! - **Schema-free discovery**: tables are located by their title, "Month"
//!   header and "Total" rows, wherever they sit in the sheet
//! - **Tolerant numbers**: formulas, header labels and blanks are treated as
//!   missing values instead of errors
//! - **Metrics**: year-over-year and month-over-month change per row, aligned
//!   totals and total year-over-year change, stored as `0.00%` fractions
//! - **Narratives**: optional summaries from an OpenAI-compatible
//!   chat-completions service, written beside each table
//! - **Two passes**: numbers are saved before any network call, and one broken
//!   table never stops the others
//! - **Dashboard export**: a read-only JSON report of every table
//!
//! ## Example
//!
//! ```no_run
//! use rusty_trends::pipeline::Pipeline;
//! use rusty_trends::spreadsheet::document::Workbook;
//! use rusty_trends::tables::metrics::{MetricConfig, MetricEngine};
//!
//! let mut workbook = Workbook::open("keywords.xlsx")?;
//! let summary = Pipeline::new("Traffic-Status", MetricEngine::new(MetricConfig::default()))
//!     .run(&mut workbook)?;
//! println!("{} of {} tables calculated", summary.calculated, summary.tables);
//! # Ok::<(), rusty_trends::error::RustyTrendsError>(())
//! ```
pub mod config;
pub mod error;
mod helpers;
pub mod pipeline;
pub mod spreadsheet;
pub mod summary;
pub mod tables;
