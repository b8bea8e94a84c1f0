//! Discovers where each table starts by classifying rows on their first two columns
use crate::spreadsheet::SheetReader;
use crate::tables::TableDescriptor;
use crate::tables::HEADER_LABEL;
use crate::tables::MONTH_COLUMN;
use crate::tables::PERCENT_CHANGE_LABEL;
use crate::tables::TITLE_COLUMN;
use crate::tables::TOTAL_LABEL;
use tracing::debug;

/// Month names and abbreviations recognized in the month column.
const MONTHS: [&str; 23] = [
    "Jan", "January", "Feb", "February", "March", "Mar", "Apr", "April", "May", "June", "Jun",
    "July", "Jul", "Aug", "August", "Sep", "September", "Oct", "October", "Nov", "November",
    "Dec", "December",
];

/// What a single row looks like to the table scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowRole {
    /// Title in column 1 and "Month" in column 2
    TitledHeader,
    /// "Month" in column 2 without a title
    Header,
    Total,
    PercentChange,
    /// Month name or abbreviation in column 2
    Month,
    /// Title in column 1, anything else in column 2
    Titled,
    Blank,
    Other,
}

impl RowRole {
    pub fn classify<S: SheetReader + ?Sized>(sheet: &S, row: u32) -> RowRole {
        let has_title = title(sheet, row).is_some();
        let label = sheet.label(row, MONTH_COLUMN);
        match label.as_deref() {
            Some(HEADER_LABEL) if has_title => RowRole::TitledHeader,
            Some(HEADER_LABEL) => RowRole::Header,
            Some(TOTAL_LABEL) => RowRole::Total,
            Some(PERCENT_CHANGE_LABEL) => RowRole::PercentChange,
            Some(label) if is_month_label(label) => RowRole::Month,
            _ if has_title => RowRole::Titled,
            None if sheet.value(row, TITLE_COLUMN).is_empty() => RowRole::Blank,
            _ => RowRole::Other,
        }
    }

    pub fn is_header(self) -> bool {
        matches!(self, RowRole::Header | RowRole::TitledHeader)
    }
}

/// Trimmed title text of a row; numbers and blanks are not titles.
fn title<S: SheetReader + ?Sized>(sheet: &S, row: u32) -> Option<String> {
    sheet
        .value(row, TITLE_COLUMN)
        .as_text()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
}

/// Whether a label names a month: a case-insensitive substring match in either
/// direction against the known names, so "Jan 2025" and "Sept" both count.
pub fn is_month_label(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    !label.is_empty()
        && MONTHS.iter().any(|month| {
            let month = month.to_lowercase();
            label.contains(&month) || month.contains(&label)
        })
}

/// Lazily yields the start of every table in sheet order.
pub struct TableLocator<'a, S: SheetReader + ?Sized> {
    sheet: &'a S,
    row: u32,
    last_row: u32,
}

impl<'a, S: SheetReader + ?Sized> TableLocator<'a, S> {
    pub fn new(sheet: &'a S) -> Self {
        TableLocator {
            sheet,
            row: 1,
            last_row: sheet.last_row(),
        }
    }
}

impl<S: SheetReader + ?Sized> Iterator for TableLocator<'_, S> {
    type Item = TableDescriptor;

    fn next(&mut self) -> Option<TableDescriptor> {
        let sheet = self.sheet;
        let is_header = |row: u32| sheet.label(row, MONTH_COLUMN).as_deref() == Some(HEADER_LABEL);
        while self.row <= self.last_row {
            let row = self.row;
            self.row += 1;
            let Some(title) = title(sheet, row) else {
                continue;
            };
            // Title beside the header or directly above it
            if is_header(row) || is_header(row + 1) {
                debug!(title = title.as_str(), row, "Found table");
                return Some(TableDescriptor { title, start_row: row });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellValue;
    use crate::spreadsheet::sheet::Sheet;

    fn row(title: &str, label: &str) -> Vec<CellValue> {
        vec![
            if title.is_empty() { CellValue::Empty } else { title.into() },
            if label.is_empty() { CellValue::Empty } else { label.into() },
        ]
    }

    #[test]
    fn month_labels() {
        assert!(is_month_label("Jan"));
        assert!(is_month_label(" september "));
        assert!(is_month_label("Jan 2025"));
        assert!(is_month_label("Sept"));
        assert!(!is_month_label("Total"));
        assert!(!is_month_label("Month"));
        assert!(!is_month_label("% Change"));
        assert!(!is_month_label("  "));
    }

    #[test]
    fn classifies_rows() {
        let sheet = Sheet::from_rows("", vec![
            row("Organic", "Month"),
            row("", "Month"),
            row("", " Total "),
            row("", "% Change"),
            row("", "Feb"),
            row("Notes", ""),
            row("", ""),
            vec![CellValue::Number(3.0), CellValue::Empty],
        ]);
        let roles: Vec<RowRole> = (1..=8).map(|row| RowRole::classify(&sheet, row)).collect();
        assert_eq!(roles, vec![
            RowRole::TitledHeader,
            RowRole::Header,
            RowRole::Total,
            RowRole::PercentChange,
            RowRole::Month,
            RowRole::Titled,
            RowRole::Blank,
            RowRole::Other,
        ]);
    }

    #[test]
    fn finds_both_layouts() {
        let sheet = Sheet::from_rows("", vec![
            row("Organic", "Month"),
            row("", "Jan"),
            row("", "Total"),
            row("", ""),
            row("Paid Search", ""),
            row("", "Month"),
            row("", "Jan"),
            row("", "Total"),
        ]);
        let tables: Vec<TableDescriptor> = TableLocator::new(&sheet).collect();
        assert_eq!(tables, vec![
            TableDescriptor { title: "Organic".to_owned(), start_row: 1 },
            TableDescriptor { title: "Paid Search".to_owned(), start_row: 5 },
        ]);
    }

    #[test]
    fn titles_are_trimmed_and_duplicates_kept() {
        let sheet = Sheet::from_rows("", vec![
            row("  Direct ", "Month"),
            row("", "Total"),
            row("Direct", "Month"),
            row("", "Total"),
        ]);
        let titles: Vec<(String, u32)> = TableLocator::new(&sheet)
            .map(|table| (table.title, table.start_row))
            .collect();
        assert_eq!(titles, vec![("Direct".to_owned(), 1), ("Direct".to_owned(), 3)]);
    }

    #[test]
    fn title_above_titled_header_is_also_a_start() {
        let sheet = Sheet::from_rows("", vec![
            row("Traffic report", ""),
            row("Organic", "Month"),
            row("", "Jan"),
            row("Notes", ""),
            row("", "Total"),
        ]);
        let starts: Vec<u32> = TableLocator::new(&sheet).map(|table| table.start_row).collect();
        assert_eq!(starts, vec![1, 2]);
    }

    #[test]
    fn any_titled_row_above_a_header_starts_a_table() {
        let sheet = Sheet::from_rows("", vec![
            row("Q1", "Jan"),
            row("", "Month"),
            row("", "Feb"),
            row("", "Total"),
            row("Summary", "Total"),
            row("", "Month"),
        ]);
        let titles: Vec<(String, u32)> = TableLocator::new(&sheet)
            .map(|table| (table.title, table.start_row))
            .collect();
        assert_eq!(titles, vec![("Q1".to_owned(), 1), ("Summary".to_owned(), 5)]);
    }

    #[test]
    fn empty_sheet_has_no_tables() {
        let sheet = Sheet::new("");
        assert_eq!(TableLocator::new(&sheet).count(), 0);
    }
}
