//! Character set conversions.
//!
//! Pep/9 character and string literals are 8-bit ASCII.  Inside the
//! quotes a backslash introduces an escape sequence; the accepted
//! sequences are those of the Pep/9 assembler:
//!
//! | Escape | Byte |
//! |--------|------|
//! | `\b`   | 0x08 |
//! | `\f`   | 0x0C |
//! | `\n`   | 0x0A |
//! | `\r`   | 0x0D |
//! | `\t`   | 0x09 |
//! | `\v`   | 0x0B |
//! | `\0`   | 0x00 |
//! | `\\`   | 0x5C |
//! | `\'`   | 0x27 |
//! | `\"`   | 0x22 |
//! | `\xHH` | 0xHH |
use std::error::Error;
use std::fmt::{self, Display, Formatter};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    /// The text ends with a lone backslash.
    Dangling,
    UnknownEscape(char),
    /// `\x` was not followed by two hex digits.
    BadHexEscape(String),
    NotAscii(char),
}

impl Display for EscapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            EscapeError::Dangling => f.write_str("backslash at end of literal"),
            EscapeError::UnknownEscape(ch) => write!(f, "'\\{ch}' is not a valid escape sequence"),
            EscapeError::BadHexEscape(digits) => write!(
                f,
                "'\\x{digits}' is not a valid hex escape; two hex digits are required"
            ),
            EscapeError::NotAscii(ch) => write!(f, "'{ch}' is not an ASCII character"),
        }
    }
}

impl Error for EscapeError {}

fn simple_escape(ch: char) -> Option<u8> {
    match ch {
        'b' => Some(0x08),
        'f' => Some(0x0C),
        'n' => Some(0x0A),
        'r' => Some(0x0D),
        't' => Some(0x09),
        'v' => Some(0x0B),
        '0' => Some(0x00),
        '\\' => Some(b'\\'),
        '\'' => Some(b'\''),
        '"' => Some(b'"'),
        _ => None,
    }
}

/// Convert the body of a character or string literal (that is, the
/// text between the quotes) into the bytes it denotes.
pub fn decode_escapes(body: &str) -> Result<Vec<u8>, EscapeError> {
    let mut result: Vec<u8> = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            if ch.is_ascii() {
                result.push(ch as u8);
                continue;
            }
            return Err(EscapeError::NotAscii(ch));
        }
        match chars.next() {
            None => return Err(EscapeError::Dangling),
            Some('x' | 'X') => {
                let digits: String = chars.clone().take(2).collect();
                match u8::from_str_radix(&digits, 16) {
                    Ok(byte) if digits.len() == 2 => {
                        result.push(byte);
                        chars.nth(1);
                    }
                    _ => return Err(EscapeError::BadHexEscape(digits)),
                }
            }
            Some(other) => match simple_escape(other) {
                Some(byte) => result.push(byte),
                None => return Err(EscapeError::UnknownEscape(other)),
            },
        }
    }
    Ok(result)
}
