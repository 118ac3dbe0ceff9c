//! Positional option labels
//!
//! Option lists never store their labels; the list ordering is the source
//! of truth and labels are derived from position on demand. Two styles
//! exist: letters (`A`, `B`, ... `Z`, `AA`, ...) for answer banks and
//! multiple choice, and lowercase Roman numerals (`i`, `ii`, ...) for
//! heading and title banks.
//!
//! Parsing is strict: only canonical subtractive Roman forms are accepted
//! (`iv` yes, `iiii` no), so learner input like "ivx" cannot silently map
//! to a position.

/// Letter label for a 0-based option position: `A`..`Z`, then `AA`, `AB`, ...
pub fn letter_label(index: usize) -> String {
    let mut n = index;
    let mut label = String::new();
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}

/// Parse a letter label back to its 0-based position.
///
/// Case-insensitive. Returns `None` for anything that is not purely
/// ASCII letters.
pub fn parse_letter_label(label: &str) -> Option<usize> {
    let label = label.trim();
    if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut n: usize = 0;
    for c in label.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize;
        n = n.checked_mul(26)?.checked_add(digit + 1)?;
    }
    Some(n - 1)
}

/// Value/symbol pairs for Roman rendering, largest first.
const ROMAN_PAIRS: [(u32, &str); 13] = [
    (1000, "m"),
    (900, "cm"),
    (500, "d"),
    (400, "cd"),
    (100, "c"),
    (90, "xc"),
    (50, "l"),
    (40, "xl"),
    (10, "x"),
    (9, "ix"),
    (5, "v"),
    (4, "iv"),
    (1, "i"),
];

/// Lowercase Roman numeral for a 0-based option position (`0` -> `i`).
pub fn roman_label(index: usize) -> String {
    let mut n = index as u32 + 1;
    let mut out = String::new();
    for (value, symbol) in ROMAN_PAIRS {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// Parse a Roman numeral back to its 0-based position.
///
/// Case-insensitive and strict: input must re-render to itself, so
/// non-canonical forms (`iiii`, `vv`, `il`) are rejected.
pub fn parse_roman(label: &str) -> Option<usize> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    let mut total: u32 = 0;
    let mut prev: u32 = 0;
    for c in label.chars() {
        let value = match c {
            'i' => 1,
            'v' => 5,
            'x' => 10,
            'l' => 50,
            'c' => 100,
            'd' => 500,
            'm' => 1000,
            _ => return None,
        };
        total = total.checked_add(value)?;
        if value > prev && prev > 0 {
            // Subtractive pair: undo the previous addition
            total = total.checked_sub(2 * prev)?;
        }
        prev = value;
    }
    if total == 0 || roman_label((total - 1) as usize) != label {
        return None;
    }
    Some((total - 1) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_labels() {
        assert_eq!(letter_label(0), "A");
        assert_eq!(letter_label(1), "B");
        assert_eq!(letter_label(25), "Z");
        assert_eq!(letter_label(26), "AA");
        assert_eq!(letter_label(27), "AB");
    }

    #[test]
    fn test_parse_letter_label() {
        assert_eq!(parse_letter_label("A"), Some(0));
        assert_eq!(parse_letter_label("b"), Some(1));
        assert_eq!(parse_letter_label(" Z "), Some(25));
        assert_eq!(parse_letter_label("AA"), Some(26));
        assert_eq!(parse_letter_label(""), None);
        assert_eq!(parse_letter_label("B1"), None);
    }

    #[test]
    fn test_roman_labels() {
        assert_eq!(roman_label(0), "i");
        assert_eq!(roman_label(1), "ii");
        assert_eq!(roman_label(3), "iv");
        assert_eq!(roman_label(8), "ix");
        assert_eq!(roman_label(13), "xiv");
    }

    #[test]
    fn test_parse_roman() {
        assert_eq!(parse_roman("i"), Some(0));
        assert_eq!(parse_roman("III"), Some(2));
        assert_eq!(parse_roman(" iv "), Some(3));
        assert_eq!(parse_roman("xiv"), Some(13));
        assert_eq!(parse_roman("xl"), Some(39));
    }

    #[test]
    fn test_parse_roman_rejects_non_canonical() {
        assert_eq!(parse_roman("iiii"), None);
        assert_eq!(parse_roman("vv"), None);
        assert_eq!(parse_roman("il"), None);
        assert_eq!(parse_roman("ivx"), None);
        assert_eq!(parse_roman(""), None);
        assert_eq!(parse_roman("abc"), None);
    }

    #[test]
    fn test_roman_round_trip() {
        for i in 0..200 {
            assert_eq!(parse_roman(&roman_label(i)), Some(i), "index {i}");
        }
    }
}
