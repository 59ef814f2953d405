/// Converts an A1-style cell reference into a 0-based column index.
///
/// Only the leading alphabetic run is considered (`"AC7"` → `"AC"`), read as
/// a 1-indexed base-26 numeral. Returns `None` when the reference has no
/// leading letters or the numeral overflows.
#[must_use]
pub fn column_index(reference: &str) -> Option<usize> {
    let letters = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase());

    let mut value = 0usize;
    let mut seen = false;
    for letter in letters {
        seen = true;
        let digit = usize::from(letter - b'A') + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    if seen { value.checked_sub(1) } else { None }
}

/// Renders a 0-based column index back into its letters (`26` → `"AA"`).
#[must_use]
pub fn column_letters(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index;
    loop {
        letters.push(b'A' + u8::try_from(remaining % 26).unwrap_or(0));
        if remaining < 26 {
            break;
        }
        remaining = remaining / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_letter_runs() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("AZ"), Some(51));
        assert_eq!(column_index("BA"), Some(52));
        assert_eq!(column_index("AC7"), Some(28));
        assert_eq!(column_index("bc12"), Some(54));
    }

    #[test]
    fn rejects_references_without_letters() {
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("12"), None);
        assert_eq!(column_index("$A$1"), None);
    }

    #[test]
    fn rejects_overflowing_runs() {
        let huge = "Z".repeat(64);
        assert_eq!(column_index(&huge), None);
    }

    #[test]
    fn letters_invert_index() {
        for index in [0, 25, 26, 51, 52, 54, 701, 702] {
            assert_eq!(column_index(&column_letters(index)), Some(index), "index {index}");
        }
        assert_eq!(column_letters(54), "BC");
    }

    #[test]
    fn letters_of_largest_index() {
        let letters = column_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.bytes().all(|b| b.is_ascii_uppercase()), "{letters}");
        assert_eq!(column_index(&letters), None, "{letters} overflows back");
    }
}
