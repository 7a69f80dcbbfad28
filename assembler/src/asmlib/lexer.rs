//! Tokens of a single Pep/9 source line.
use std::fmt::{self, Display, Formatter};
use std::ops::Range;

use logos::Logos;

mod rx;
#[cfg(test)]
mod tests;

pub(crate) use rx::LazyRegex;

fn capture_text(lex: &mut logos::Lexer<Token>) -> String {
    lex.slice().to_string()
}

fn capture_label(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    slice.strip_suffix(':').unwrap_or(slice).to_string()
}

/// The parser consumes these tokens.
///
/// Tokens which carry text carry it exactly as it appears in the
/// source (quotes, signs and `0x` prefixes included) so that the
/// listing can show an operand the way the programmer wrote it.
#[derive(Debug, PartialEq, Eq, Logos, Clone)]
#[logos(skip r"[ \t\r\f]+")]
pub(crate) enum Token {
    // In order for the parser to recover from tokenization errors, we
    // need to be able to emit an error token.
    Error(String),

    /// A symbol definition; the text excludes the colon.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*:", capture_label)]
    Label(String),

    /// A mnemonic, a symbol used as an operand, or an addressing mode.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", capture_text)]
    Ident(String),

    #[regex(r"\.[A-Za-z]+", capture_text)]
    DotCommand(String),

    #[regex(r"[+-]?[0-9]+", capture_text)]
    Decimal(String),

    #[regex(r"0[xX][0-9A-Fa-f]+", capture_text)]
    Hex(String),

    #[regex(r"'([^'\\\n]|\\[^\n])*'", capture_text)]
    CharLit(String),

    #[regex(r#""([^"\\\n]|\\[^\n])*""#, capture_text)]
    StrLit(String),

    /// A string literal with no closing quote.  This only matches
    /// when `StrLit` cannot, because `StrLit` always matches a longer
    /// slice.
    #[regex(r#""([^"\\\n]|\\[^\n])*"#, capture_text)]
    UnterminatedStr(String),

    #[token(",")]
    Comma,

    /// Comments run to the end of the line and include the `;`.
    #[regex(r";[^\n]*", capture_text)]
    Comment(String),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Token::Error(msg) => f.write_str(msg),
            Token::Label(name) => write!(f, "{name}:"),
            Token::Ident(text)
            | Token::DotCommand(text)
            | Token::Decimal(text)
            | Token::Hex(text)
            | Token::CharLit(text)
            | Token::StrLit(text)
            | Token::UnterminatedStr(text) => f.write_str(text),
            Token::Comma => f.write_str(","),
            Token::Comment(_) => f.write_str("comment"),
        }
    }
}

/// Split `line` into tokens.  Characters the lexer does not
/// recognise become [`Token::Error`] tokens, leaving it to the
/// parser to report them.
pub(crate) fn tokenize(line: &str) -> Vec<(Token, Range<usize>)> {
    Token::lexer(line)
        .spanned()
        .map(|item| match item {
            (Ok(tok), span) => (tok, span),
            (Err(()), span) => {
                let msg = format!("unexpected character {:?}", &line[span.clone()]);
                (Token::Error(msg), span)
            }
        })
        .collect()
}
