//! Conversions of literal operand text into values.

/// Value of the decimal literal `text`, which must lie in `min..=max`.
pub(crate) fn decimal_in_range(text: &str, min: i64, max: i64) -> Result<i64, String> {
    match text.parse::<i64>() {
        Ok(n) if (min..=max).contains(&n) => Ok(n),
        _ => Err(format!(
            "Decimal constant {text} is out of range ({min} to {max})."
        )),
    }
}

/// Value of the hexadecimal literal `text` (including its `0x`
/// prefix), which may have at most `max_digits` digits.
pub(crate) fn hex_with_max_digits(text: &str, max_digits: usize) -> Result<u16, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.len() > max_digits {
        return Err(format!(
            "Hexadecimal constant {text} is too long; at most {max_digits} digits are allowed."
        ));
    }
    u16::from_str_radix(digits, 16).map_err(|e| format!("Invalid hexadecimal constant {text}: {e}"))
}

/// Negative values are stored in two's complement.
pub(crate) fn to_word(n: i64) -> u16 {
    n.rem_euclid(0x1_0000) as u16
}

/// The text between the quotes of a character or string literal.
/// For an unterminated string there is only an opening quote.
pub(crate) fn quoted_body(text: &str) -> &str {
    let without_open = text.get(1..).unwrap_or("");
    match (text.chars().next(), without_open.chars().last()) {
        (Some(open), Some(close)) if open == close && !ends_with_escape(without_open) => {
            &without_open[..without_open.len() - close.len_utf8()]
        }
        _ => without_open,
    }
}

/// True if the final character of `s` is escaped by a backslash.
fn ends_with_escape(s: &str) -> bool {
    let body = &s[..s.len().saturating_sub(1)];
    body.chars().rev().take_while(|ch| *ch == '\\').count() % 2 == 1
}

/// Right-justify one or two bytes into a word.
pub(crate) fn bytes_to_word(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [lo] => Some(u16::from(*lo)),
        [hi, lo] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

#[test]
fn test_decimal_in_range() {
    assert_eq!(decimal_in_range("-32768", -32768, 65535), Ok(-32768));
    assert_eq!(decimal_in_range("+7", -32768, 65535), Ok(7));
    assert!(decimal_in_range("65536", -32768, 65535).is_err());
    assert!(decimal_in_range("99999999999999999999999", -32768, 65535).is_err());
}

#[test]
fn test_hex_with_max_digits() {
    assert_eq!(hex_with_max_digits("0xFFFF", 4), Ok(0xFFFF));
    assert_eq!(hex_with_max_digits("0X0a", 2), Ok(0x0A));
    assert!(hex_with_max_digits("0x100", 2).is_err());
    assert!(hex_with_max_digits("0x10000", 4).is_err());
}

#[test]
fn test_to_word() {
    assert_eq!(to_word(-1), 0xFFFF);
    assert_eq!(to_word(-32768), 0x8000);
    assert_eq!(to_word(65535), 0xFFFF);
}

#[test]
fn test_quoted_body() {
    assert_eq!(quoted_body("'a'"), "a");
    assert_eq!(quoted_body("\"Hi\""), "Hi");
    assert_eq!(quoted_body("\"\""), "");
    assert_eq!(quoted_body("\"abc"), "abc");
    assert_eq!(quoted_body(r#""ab\""#), r#"ab\""#);
}

#[test]
fn test_bytes_to_word() {
    assert_eq!(bytes_to_word(b"A"), Some(0x41));
    assert_eq!(bytes_to_word(b"AB"), Some(0x4142));
    assert_eq!(bytes_to_word(b""), None);
    assert_eq!(bytes_to_word(b"ABC"), None);
}
