use std::fmt::Display;

/// Leading character of formula text.
const FORMULA_MARKER: char = '=';

/// Substrings that only ever appear in header labels such as "Sessions 2024" or "Year".
const HEADER_MARKERS: [&str; 2] = ["Year", "Sessions"];

/// Content of a single worksheet cell.
///
/// Formula cells carry their `=`-prefixed formula text instead of the cached
/// result, so a stale or half-edited formula never leaks into the metrics.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    /// Numeric values, integers included
    Number(f64),
    /// Plain or rich text
    Text(String),
    /// Boolean values
    Bool(bool),
    /// Formula text, always starting with `=`
    Formula(String),
    /// Error literals such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Returns true if the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns the text of a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Trimmed textual rendering used for row labels; empty labels are `None`.
    pub fn label(&self) -> Option<String> {
        let label = match self {
            CellValue::Text(text) => text.trim().to_owned(),
            CellValue::Number(number) => number.to_string(),
            _ => return None,
        };
        Some(label).filter(|label| !label.is_empty())
    }

    /// Coerces the cell to a number, or `None` if it carries no usable number.
    ///
    /// Numbers pass through unchanged. Text is parsed unless it is formula
    /// text or a header label. Never fails: anything unusable is absent.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(number) => Some(*number).filter(|number| number.is_finite()),
            CellValue::Text(text) => parse_number(text),
            _ => None,
        }
    }

    /// Coerces a percentage cell to the 0–100 range.
    ///
    /// Numeric cells are stored fractions (0.264 for 26.4%) and get scaled.
    pub fn to_percent(&self) -> Option<f64> {
        match self {
            CellValue::Number(number) => Some(number * 100.0).filter(|value| value.is_finite()),
            CellValue::Text(text) => parse_percent(text),
            _ => None,
        }
    }
}

/// Parses cell text as a number, rejecting formula text and header labels.
pub fn parse_number(text: &str) -> Option<f64> {
    if text.starts_with(FORMULA_MARKER) || HEADER_MARKERS.iter().any(|marker| text.contains(marker)) {
        return None;
    }
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Parses percentage text such as `26.4%`, `(2.5%)` or a bare fraction `0.264`.
///
/// Text that still contains letters once digits, `.`, `-`, parentheses and `%`
/// are removed is a header like "YOY % (2024-2025)" and yields `None`.
pub fn parse_percent(text: &str) -> Option<f64> {
    let has_letters = text
        .chars()
        .filter(|character| !character.is_ascii_digit() && !matches!(character, '.' | '-' | '(' | ')' | '%'))
        .any(char::is_alphabetic);
    if has_letters {
        return None;
    }

    let trimmed = text.trim();
    let (negative, inner) = match trimmed.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };
    let value = match inner.strip_suffix('%') {
        Some(number) => parse_number(number)?,
        None => parse_number(inner)? * 100.0,
    };
    Some(if negative { -value } else { value })
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(number) => write!(f, "{number}"),
            CellValue::Text(text) | CellValue::Formula(text) | CellValue::Error(text) => write!(f, "{text}"),
            CellValue::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.starts_with(FORMULA_MARKER) {
            CellValue::Formula(value.to_owned())
        } else {
            CellValue::Text(value.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(CellValue::Number(5288.0).to_number(), Some(5288.0));
        assert_eq!(CellValue::Number(-0.5).to_number(), Some(-0.5));
        assert_eq!(CellValue::Number(f64::NAN).to_number(), None);
    }

    #[test]
    fn numeric_text_matches_number() {
        assert_eq!(CellValue::from("3892").to_number(), Some(3892.0));
        assert_eq!(CellValue::from(" 12.5 ").to_number(), Some(12.5));
        assert_eq!(CellValue::from("-7").to_number(), Some(-7.0));
    }

    #[test]
    fn header_and_formula_text_is_absent() {
        assert_eq!(CellValue::from("Sessions 2024").to_number(), None);
        assert_eq!(CellValue::from("Year").to_number(), None);
        assert_eq!(CellValue::Text("=SUM(D3:D14)".to_owned()).to_number(), None);
        assert_eq!(CellValue::Formula("=D3*2".to_owned()).to_number(), None);
        assert_eq!(CellValue::from("n/a").to_number(), None);
    }

    #[test]
    fn other_values_are_absent() {
        assert_eq!(CellValue::Empty.to_number(), None);
        assert_eq!(CellValue::Bool(true).to_number(), None);
        assert_eq!(CellValue::Error("#DIV/0!".to_owned()).to_number(), None);
    }

    #[test]
    fn stored_fractions_become_percentages() {
        let yoy = CellValue::Number(-0.264).to_percent().unwrap();
        assert!((yoy + 26.4).abs() < 1e-9);
        let yoy = CellValue::from("0.0218").to_percent().unwrap();
        assert!((yoy - 2.18).abs() < 1e-9);
    }

    #[test]
    fn percent_text_is_already_scaled() {
        assert_eq!(CellValue::from("26.4%").to_percent(), Some(26.4));
        assert_eq!(CellValue::from("(2.5%)").to_percent(), Some(-2.5));
        assert_eq!(CellValue::from("-3 %").to_percent(), Some(-3.0));
    }

    #[test]
    fn percent_headers_are_absent() {
        assert_eq!(CellValue::from("YOY % (2024-2025)").to_percent(), None);
        assert_eq!(CellValue::from("LM %").to_percent(), None);
        assert_eq!(CellValue::from("%").to_percent(), None);
        assert_eq!(CellValue::Empty.to_percent(), None);
    }

    #[test]
    fn labels_are_trimmed() {
        assert_eq!(CellValue::from("  Jan ").label().as_deref(), Some("Jan"));
        assert_eq!(CellValue::from("   ").label(), None);
        assert_eq!(CellValue::Number(3.0).label().as_deref(), Some("3"));
        assert_eq!(CellValue::Bool(false).label(), None);
    }
}
