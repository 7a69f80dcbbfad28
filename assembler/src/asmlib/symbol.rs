use std::fmt::{self, Debug, Display, Formatter};

use serde::Serialize;

/// Symbols are case-sensitive.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SymbolName {
    pub(crate) canonical: String,
}

impl SymbolName {
    /// Longest permitted symbol, in characters.
    pub const MAX_LEN: usize = 8;

    pub fn as_str(&self) -> &str {
        self.canonical.as_str()
    }

    pub(crate) fn is_too_long(&self) -> bool {
        self.canonical.chars().count() > SymbolName::MAX_LEN
    }
}

impl From<String> for SymbolName {
    fn from(s: String) -> SymbolName {
        SymbolName { canonical: s }
    }
}

impl From<&str> for SymbolName {
    fn from(s: &str) -> SymbolName {
        SymbolName::from(s.to_string())
    }
}

impl Display for SymbolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.canonical, f)
    }
}

impl Debug for SymbolName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolName {{ canonical: \"{}\" }}", self.canonical)
    }
}

#[test]
fn test_symbol_length() {
    assert!(!SymbolName::from("abcdefgh").is_too_long());
    assert!(SymbolName::from("abcdefghi").is_too_long());
}

#[test]
fn test_symbols_are_case_sensitive() {
    assert_ne!(SymbolName::from("Start"), SymbolName::from("START"));
}
