//! # Summary Module
//!
//! Narrative summaries of a table, produced by a text-generation service.
//! The pipeline only sees [`SummaryGenerator`]; [`chat::ChatClient`] talks to
//! an OpenAI-compatible chat-completions endpoint and [`StaticSummary`] returns
//! canned text.
use crate::tables::MonthlyRecord;
use crate::tables::TableTotals;
use crate::tables::YearLabels;
use std::fmt::Write;
use std::time::Duration;
use thiserror::Error;

pub mod chat;

/// Persona used for narrative summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert data analyst specializing in traffic and session data analysis. \
Provide insightful, well-structured summaries that highlight key trends, patterns, and performance metrics. \
Be thorough yet concise, covering growth trends, percentage changes, seasonal patterns, and notable insights.";

const SUMMARY_INSTRUCTIONS: &str = "Analyze the following traffic/session data table and provide a comprehensive yet concise summary (8-10 sentences).

Cover:
1. Overall performance: total volumes and year-over-year growth or decline
2. Year-over-Year (YOY) changes: significant percentages, best and worst months
3. Month-over-Month (LM) momentum: acceleration or deceleration
4. Seasonal patterns and anomalies
5. Key insights and likely drivers";

const SUMMARY_STYLE: &str = "Structure the response as:
- Opening statement on overall performance
- YOY trends with specific percentages
- Recent month-over-month momentum
- Peak and low periods
- Closing insight on implications
- Do not use Markdown formatting.
- Do not use **, *, _, `, or bullet symbols.
- Respond in plain text only.
Be thorough but concise; every sentence should add value.";

/// Errors from the text-generation service. Each one only affects the table being summarized.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("API key variable '{0}' is not set")]
    MissingKey(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service answered {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Response contained no text")]
    Empty,
}

/// A system and a user message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub trait SummaryGenerator {
    /// Generates free-form text for the prompt, giving up after `timeout`.
    fn generate_summary(&self, prompt: &Prompt, timeout: Duration) -> Result<String, SummaryError>;
}

/// Builds the summary prompt from the extracted table.
///
/// Rows without a value in either compared year are left out.
pub fn build_summary_prompt(
    title: &str,
    labels: &YearLabels,
    records: &[MonthlyRecord],
    totals: &TableTotals,
) -> Prompt {
    let mut data = format!("Table: {title}\n\nMonthly Data:\n");
    for record in records {
        if record.year_n_minus_1.is_none() && record.year_n.is_none() {
            continue;
        }
        let mut parts = Vec::new();
        if let Some(value) = record.year_n_minus_1 {
            parts.push(format!("{}={value:.0}", labels.previous));
        }
        if let Some(value) = record.year_n {
            parts.push(format!("{}={value:.0}", labels.current));
        }
        if let Some(yoy) = record.yoy_pct {
            parts.push(format!("YOY={yoy:.2}%"));
        }
        if let Some(mom) = record.mom_pct {
            parts.push(format!("LM={mom:.2}%"));
        }
        let _ = writeln!(data, "{}: {}", record.month, parts.join(", "));
    }

    let mut parts = Vec::new();
    if let Some(total) = totals.year_n_minus_1_total {
        parts.push(format!("{}={total:.0}", labels.previous));
    }
    if let Some(total) = totals.year_n_total {
        parts.push(format!("{}={total:.0}", labels.current));
    }
    if let Some(yoy) = totals.yoy_total_pct {
        parts.push(format!("YOY Total={yoy:.2}%"));
    }
    let _ = write!(data, "\nTotals: {}", parts.join(", "));

    Prompt {
        system: SUMMARY_SYSTEM_PROMPT.to_owned(),
        user: format!("{SUMMARY_INSTRUCTIONS}\n\n{data}\n\n{SUMMARY_STYLE}"),
    }
}

/// Returns the same text for every prompt.
#[derive(Clone, Debug, Default)]
pub struct StaticSummary {
    text: String,
}

impl StaticSummary {
    pub fn new(text: &str) -> Self {
        StaticSummary { text: text.to_owned() }
    }
}

impl SummaryGenerator for StaticSummary {
    fn generate_summary(&self, _prompt: &Prompt, _timeout: Duration) -> Result<String, SummaryError> {
        if self.text.trim().is_empty() {
            Err(SummaryError::Empty)
        } else {
            Ok(self.text.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> YearLabels {
        YearLabels {
            previous: "2024".to_owned(),
            current: "2025".to_owned(),
        }
    }

    #[test]
    fn prompt_lists_months_and_totals() {
        let records = vec![
            MonthlyRecord {
                row: 3,
                month: "Jan".to_owned(),
                year_n_minus_1: Some(5288.0),
                year_n: Some(3892.0),
                yoy_pct: Some(-26.399),
                ..MonthlyRecord::default()
            },
            MonthlyRecord {
                row: 4,
                month: "Feb".to_owned(),
                year_n: Some(3977.0),
                mom_pct: Some(2.1839),
                ..MonthlyRecord::default()
            },
            MonthlyRecord {
                row: 5,
                month: "Mar".to_owned(),
                year_n_minus_2: Some(10.0),
                ..MonthlyRecord::default()
            },
        ];
        let totals = TableTotals {
            year_n_minus_1_total: Some(5288.0),
            year_n_total: Some(3892.0),
            yoy_total_pct: Some(-26.399),
        };
        let prompt = build_summary_prompt("Organic", &labels(), &records, &totals);

        assert_eq!(prompt.system, SUMMARY_SYSTEM_PROMPT);
        assert!(prompt.user.contains("Table: Organic\n\nMonthly Data:\n"));
        assert!(prompt.user.contains("Jan: 2024=5288, 2025=3892, YOY=-26.40%\n"));
        assert!(prompt.user.contains("Feb: 2025=3977, LM=2.18%\n"));
        assert!(!prompt.user.contains("Mar:"));
        assert!(prompt.user.contains("Totals: 2024=5288, 2025=3892, YOY Total=-26.40%"));
        assert!(prompt.user.contains("Respond in plain text only."));
    }

    #[test]
    fn prompt_uses_fallback_labels() {
        let records = vec![MonthlyRecord {
            month: "Jan".to_owned(),
            year_n: Some(1.0),
            ..MonthlyRecord::default()
        }];
        let prompt = build_summary_prompt("Direct", &YearLabels::default(), &records, &TableTotals::default());
        assert!(prompt.user.contains("Jan: Year N=1\n"));
        assert!(prompt.user.contains("Totals: \n"));
    }

    #[test]
    fn static_summary() {
        let prompt = Prompt {
            system: String::new(),
            user: String::new(),
        };
        let summary = StaticSummary::new("Traffic fell.");
        assert_eq!(summary.generate_summary(&prompt, Duration::from_secs(1)).unwrap(), "Traffic fell.");
        assert!(matches!(
            StaticSummary::new(" ").generate_summary(&prompt, Duration::from_secs(1)),
            Err(SummaryError::Empty)
        ));
    }
}
