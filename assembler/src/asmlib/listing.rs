//! The assembler listing.
//!
//! The listing is rebuilt from the code records whenever it is
//! asked for, so it always reflects the current (possibly relocated)
//! addresses.  Diagnostics are structured until this point; here they
//! are rendered as `; ERROR: ...` or `; WARNING: ...` after the line.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

use super::ast::{CodeKind, CodeRecord};
use super::diagnostic::Diagnostic;
use super::lexer::LazyRegex;
use super::symtab::{SymbolTable, SymbolTableEntry};
use super::types::LineNumber;

const RULE_WIDTH: usize = 79;
const SYMBOL_RULE_WIDTH: usize = 38;
const CODE_BYTES_PER_LINE: usize = 3;

static ANNOTATION: LazyRegex = LazyRegex::new(r"(?m)[ \t]*; (?:ERROR|WARNING): .*$");

/// One line of the body of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingLine {
    pub line: LineNumber,
    pub address: Option<Address>,
    /// The generated bytes shown on this line, in hex.
    pub code: String,
    /// The text of the line, without any diagnostic.
    pub source: String,
    pub diagnostic: Option<Diagnostic>,
    pub has_check_box: bool,
}

impl ListingLine {
    pub fn display_text(&self, show_diagnostics: bool) -> String {
        match (&self.diagnostic, show_diagnostics) {
            (Some(diagnostic), true) => annotate(&self.source, diagnostic),
            _ => self.source.clone(),
        }
    }
}

/// A listing line as the simulator's trace view needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceLine {
    pub line: LineNumber,
    pub address: Option<Address>,
    pub text: String,
    pub has_check_box: bool,
}

impl From<ListingLine> for TraceLine {
    fn from(listing_line: ListingLine) -> TraceLine {
        TraceLine {
            line: listing_line.line,
            address: listing_line.address,
            text: listing_line.source,
            has_check_box: listing_line.has_check_box,
        }
    }
}

/// Append the text form of `diagnostic` to `text`.
pub fn annotate(text: &str, diagnostic: &Diagnostic) -> String {
    let marker = diagnostic.severity.marker();
    if text.is_empty() {
        format!("{marker}{}", diagnostic.kind)
    } else {
        format!("{text} {marker}{}", diagnostic.kind)
    }
}

/// Remove a diagnostic annotation from each line of `text`.  Text
/// without annotations is returned unchanged.
///
/// This works on the text alone, so a comment of the programmer's own
/// which reads `; ERROR: ...` or `; WARNING: ...` is removed as
/// well.  [`AssemblySession::remove_error_messages`] works from the
/// structured diagnostics and does not have this problem.
///
/// [`AssemblySession::remove_error_messages`]: crate::AssemblySession::remove_error_messages
pub fn strip_diagnostic_annotations(text: &str) -> String {
    ANNOTATION.replace_all(text, "").into_owned()
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn shows_address(kind: &CodeKind) -> bool {
    !matches!(
        kind,
        CodeKind::CommentOnly | CodeKind::Equate { .. } | CodeKind::Unparsed
    )
}

/// `.BLOCK` can reserve a great deal of memory; only the first few
/// bytes are shown.
fn shows_continuation(kind: &CodeKind) -> bool {
    !matches!(kind, CodeKind::BlockStorage { .. } | CodeKind::Align { .. })
}

struct Columns<'a> {
    address: &'a str,
    code: &'a str,
    symbol: &'a str,
    mnemonic: &'a str,
    operand: &'a str,
    comment: &'a str,
}

impl Display for Columns<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6}{:<7}{:<9}{:<8}{:<12}{}",
            self.address, self.code, self.symbol, self.mnemonic, self.operand, self.comment
        )
    }
}

fn first_line_text(record: &CodeRecord, code: &str) -> String {
    match &record.kind {
        CodeKind::Unparsed => record.source.trim_end().to_string(),
        CodeKind::CommentOnly => match &record.comment {
            // Stand-alone comments start in the symbol column.
            Some(comment) => format!("{:<13}{comment}", ""),
            None => String::new(),
        },
        kind => {
            let address = if shows_address(kind) {
                record.address.to_string()
            } else {
                String::new()
            };
            let symbol = record
                .label
                .as_ref()
                .map(|name| format!("{name}:"))
                .unwrap_or_default();
            Columns {
                address: &address,
                code,
                symbol: &symbol,
                mnemonic: &record.mnemonic,
                operand: &record.operand,
                comment: record.comment.as_deref().unwrap_or(""),
            }
            .to_string()
            .trim_end()
            .to_string()
        }
    }
}

/// The body of the listing: one line per source line, plus
/// continuation lines for records which generate more than three
/// bytes.
pub(crate) fn body_lines(records: &[CodeRecord]) -> Vec<ListingLine> {
    let mut result: Vec<ListingLine> = Vec::with_capacity(records.len());
    for record in records {
        let mut chunks = record.bytes.chunks(CODE_BYTES_PER_LINE);
        let code = chunks.next().map(hex_bytes).unwrap_or_default();
        result.push(ListingLine {
            line: record.line,
            address: shows_address(&record.kind).then_some(record.address),
            source: first_line_text(record, &code),
            code,
            diagnostic: record.diagnostic.clone(),
            has_check_box: record.is_executable_instruction(),
        });
        if shows_continuation(&record.kind) {
            for chunk in chunks {
                let code = hex_bytes(chunk);
                result.push(ListingLine {
                    line: record.line,
                    address: None,
                    source: format!("{:<6}{code}", ""),
                    code,
                    diagnostic: None,
                    has_check_box: false,
                });
            }
        }
    }
    result
}

fn rule(width: usize) -> String {
    "-".repeat(width)
}

pub(crate) fn header() -> Vec<String> {
    vec![
        rule(RULE_WIDTH),
        "      Object".to_string(),
        "Addr  code   Symbol   Mnemon  Operand     Comment".to_string(),
        rule(RULE_WIDTH),
    ]
}

fn symbol_pair(entry: &SymbolTableEntry) -> (String, String) {
    (entry.name.to_string(), format!("{:04X}", entry.value))
}

pub(crate) fn symbol_table_lines(symtab: &SymbolTable) -> Vec<String> {
    let entries: Vec<&SymbolTableEntry> = symtab.defined_entries().collect();
    if entries.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![
        String::new(),
        "Symbol table".to_string(),
        rule(SYMBOL_RULE_WIDTH),
        "Symbol    Value        Symbol    Value".to_string(),
        rule(SYMBOL_RULE_WIDTH),
    ];
    for pair in entries.chunks(2) {
        let line = match pair {
            [left, right] => {
                let (left_name, left_value) = symbol_pair(left);
                let (right_name, right_value) = symbol_pair(right);
                format!("{left_name:<10}{left_value:<13}{right_name:<10}{right_value}")
            }
            [only] => {
                let (name, value) = symbol_pair(only);
                format!("{name:<10}{value}")
            }
            _ => continue,
        };
        lines.push(line);
    }
    lines.push(rule(SYMBOL_RULE_WIDTH));
    lines
}

/// The complete listing: header, body, closing rule and symbol table.
pub(crate) fn render_listing(
    records: &[CodeRecord],
    symtab: &SymbolTable,
    show_diagnostics: bool,
) -> Vec<String> {
    let mut lines = header();
    lines.extend(
        body_lines(records)
            .iter()
            .map(|line| line.display_text(show_diagnostics)),
    );
    lines.push(rule(RULE_WIDTH));
    lines.extend(symbol_table_lines(symtab));
    lines
}
