//! Abstract syntax representation.
//!
//! Each source line is first parsed into a [`ParsedLine`], which is
//! a purely syntactic description.  Lowering (see [`lower`]) then
//! turns that into a [`CodeRecord`], which the two passes fill in.
use std::fmt::{self, Display, Formatter};

use base::prelude::*;

use super::diagnostic::Diagnostic;
use super::span::Span;
use super::symbol::SymbolName;
use super::types::LineNumber;

pub(crate) mod lower;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommandName {
    Mnemonic(String),
    Dot(String),
}

/// An operand as written.  Each variant holds the source text of the
/// operand, including any quotes, sign or `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Argument {
    Decimal(String),
    Hex(String),
    Char(String),
    Str(String),
    UnterminatedStr(String),
    Symbol(String),
}

impl Display for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Decimal(text)
            | Argument::Hex(text)
            | Argument::Char(text)
            | Argument::Str(text)
            | Argument::UnterminatedStr(text)
            | Argument::Symbol(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedCommand {
    pub(crate) name: CommandName,
    pub(crate) name_span: Span,
    pub(crate) argument: Option<(Argument, Span)>,
    pub(crate) mode: Option<(AddressingMode, Span)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedLine {
    pub(crate) label: Option<(String, Span)>,
    pub(crate) command: Option<ParsedCommand>,
    pub(crate) comment: Option<String>,
}

/// Operand of an instruction or `.ADDRSS`: either known now, or a
/// symbol to be resolved in pass 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(u16),
    Symbol(SymbolName),
}

/// What a source line does.  One variant per kind of line; the code
/// generator matches on this exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeKind {
    UnaryInstruction {
        mnemonic: Mnemonic,
    },
    NonUnaryInstruction {
        mnemonic: Mnemonic,
        operand: Operand,
        mode: AddressingMode,
    },
    /// The symbol being defined is the line's label.
    Equate {
        value: u16,
    },
    BlockStorage {
        size: u16,
    },
    AsciiBytes {
        bytes: Vec<u8>,
    },
    Burn {
        target: Address,
    },
    End,
    Addrss {
        symbol: SymbolName,
    },
    Align {
        boundary: u16,
    },
    Byte {
        value: u8,
    },
    Word {
        value: u16,
    },
    CommentOnly,
    /// The line could not be understood; it generates nothing.
    Unparsed,
}

impl CodeKind {
    pub fn is_executable_instruction(&self) -> bool {
        matches!(
            self,
            CodeKind::UnaryInstruction { .. } | CodeKind::NonUnaryInstruction { .. }
        )
    }

    /// Number of bytes generated when the record starts at `address`.
    /// Only `.ALIGN` depends on the address.
    pub(crate) fn width_at(&self, address: usize) -> usize {
        match self {
            CodeKind::UnaryInstruction { .. } => UNARY_WIDTH,
            CodeKind::NonUnaryInstruction { .. } => NONUNARY_WIDTH,
            CodeKind::Addrss { .. } | CodeKind::Word { .. } => 2,
            CodeKind::Byte { .. } => 1,
            CodeKind::BlockStorage { size } => usize::from(*size),
            CodeKind::AsciiBytes { bytes } => bytes.len(),
            CodeKind::Align { boundary } => {
                let boundary = usize::from(*boundary);
                (boundary - address % boundary) % boundary
            }
            CodeKind::Equate { .. }
            | CodeKind::Burn { .. }
            | CodeKind::End
            | CodeKind::CommentOnly
            | CodeKind::Unparsed => 0,
        }
    }
}

/// One source line, as it moves through the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    pub line: LineNumber,
    /// The line exactly as it appeared in the source.
    pub source: String,
    pub label: Option<SymbolName>,
    pub kind: CodeKind,
    /// Upper-case mnemonic or dot command, for the listing.
    pub mnemonic: String,
    /// Operand (and addressing mode) as written, for the listing.
    pub operand: String,
    pub comment: Option<String>,
    /// Assigned in pass 1.
    pub address: Address,
    /// Assigned in pass 1.
    pub width: usize,
    /// Generated in pass 2.
    pub bytes: Vec<u8>,
    pub diagnostic: Option<Diagnostic>,
}

impl CodeRecord {
    pub fn is_executable_instruction(&self) -> bool {
        self.kind.is_executable_instruction()
    }

    pub fn has_error(&self) -> bool {
        self.diagnostic.as_ref().is_some_and(Diagnostic::is_error)
    }
}

#[test]
fn test_align_width() {
    let align = CodeKind::Align { boundary: 4 };
    assert_eq!(align.width_at(0), 0);
    assert_eq!(align.width_at(1), 3);
    assert_eq!(align.width_at(6), 2);
    assert_eq!(align.width_at(8), 0);
}

#[test]
fn test_instruction_widths() {
    assert_eq!(
        CodeKind::UnaryInstruction {
            mnemonic: Mnemonic::Stop
        }
        .width_at(0),
        1
    );
    assert_eq!(
        CodeKind::NonUnaryInstruction {
            mnemonic: Mnemonic::Br,
            operand: Operand::Value(0),
            mode: AddressingMode::Immediate,
        }
        .width_at(7),
        3
    );
    assert_eq!(CodeKind::Equate { value: 9 }.width_at(0), 0);
}
