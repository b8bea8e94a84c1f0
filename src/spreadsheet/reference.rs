//! Conversions between 1-based (row, column) indexes and A1-style references

/// Converts a 1-based column number to its letters: 1 = A, 26 = Z, 27 = AA.
pub(crate) fn column_letters(column: u32) -> String {
    let mut column = column;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters
}

/// Formats a 1-based (row, column) pair as an A1-style reference.
pub(crate) fn index_to_reference(row: u32, column: u32) -> String {
    format!("{}{}", column_letters(column), row)
}

/// Parses an A1-style reference into a 1-based (row, column) pair.
/// Absolute markers (`$B$12`) are accepted.
pub(crate) fn reference_to_index(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|character: char| character.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|character| character.is_ascii_alphabetic()) {
        return None;
    }
    let column = letters
        .to_ascii_uppercase()
        .chars()
        .map(|letter| letter as u32 - 'A' as u32 + 1)
        .try_fold(0u32, |column, digit| column.checked_mul(26)?.checked_add(digit))?;
    let row = digits.parse::<u32>().ok().filter(|row| *row > 0)?;
    Some((row, column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_for_columns() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(8), "H");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(52), "AZ");
        assert_eq!(column_letters(53), "BA");
    }

    #[test]
    fn references_round_trip() {
        assert_eq!(index_to_reference(12, 2), "B12");
        assert_eq!(reference_to_index("B12"), Some((12, 2)));
        assert_eq!(reference_to_index("$AA$3"), Some((3, 27)));
        assert_eq!(reference_to_index("h1"), Some((1, 8)));
    }

    #[test]
    fn malformed_references() {
        assert_eq!(reference_to_index("12"), None);
        assert_eq!(reference_to_index("B"), None);
        assert_eq!(reference_to_index("B0"), None);
        assert_eq!(reference_to_index("B1C"), None);
    }
}
