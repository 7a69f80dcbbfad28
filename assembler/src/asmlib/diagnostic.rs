//! Problems found in the program being assembled.
//!
//! A diagnostic is attached to the source line it concerns.  Only
//! the listing renders it as text (see [`crate::listing`]); here it
//! stays structured so that the pass/fail decision does not depend
//! on what happens to the displayed text.
use std::fmt::{self, Display, Formatter};

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use base::prelude::{Address, AddressingMode, Mnemonic};

use super::symbol::SymbolName;
use super::types::LineNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// The marker used when the diagnostic is appended to a listing line.
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Error => "; ERROR: ",
            Severity::Warning => "; WARNING: ",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressingModeProblem {
    /// The instruction needs an addressing mode but none was given.
    Missing,
    /// The mode is not one this instruction accepts.
    Illegal(AddressingMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnPlacement {
    /// `.BURN` means nothing in a user program.
    IgnoredInUserProgram,
    /// Code generated ahead of the `.BURN` lands in ROM along with
    /// everything else.
    FollowsCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax(String),
    MissingMnemonic,
    SymbolTooLong(SymbolName),
    DuplicateSymbol(SymbolName),
    UndefinedSymbol(SymbolName),
    InvalidAddressingMode {
        mnemonic: Mnemonic,
        problem: AddressingModeProblem,
    },
    OperandRange(String),
    MalformedDirective(String),
    MissingEnd,
    TextAfterEnd,
    MemoryOverflow {
        address: Address,
        len: usize,
    },
    DuplicateBurn,
    MissingBurn,
    BurnPlacement(BurnPlacement),
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::BurnPlacement(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Syntax(msg)
            | DiagnosticKind::OperandRange(msg)
            | DiagnosticKind::MalformedDirective(msg) => f.write_str(msg),
            DiagnosticKind::MissingMnemonic => {
                f.write_str("Must have mnemonic or dot command after symbol definition.")
            }
            DiagnosticKind::SymbolTooLong(name) => write!(
                f,
                "Symbol {name} cannot have more than {} characters.",
                SymbolName::MAX_LEN
            ),
            DiagnosticKind::DuplicateSymbol(name) => {
                write!(f, "Symbol {name} was previously defined.")
            }
            DiagnosticKind::UndefinedSymbol(name) => {
                write!(f, "Symbol {name} is used but not defined.")
            }
            DiagnosticKind::InvalidAddressingMode { mnemonic, problem } => match problem {
                AddressingModeProblem::Missing => {
                    write!(f, "Addressing mode required for {mnemonic}.")
                }
                AddressingModeProblem::Illegal(mode) => write!(
                    f,
                    "Illegal addressing mode {mode} for {mnemonic}; it accepts {}.",
                    mnemonic.info().legal_modes
                ),
            },
            DiagnosticKind::MissingEnd => f.write_str("Missing .END sentinel."),
            DiagnosticKind::TextAfterEnd => f.write_str("Only comments can follow .END."),
            DiagnosticKind::MemoryOverflow { address, len } => write!(
                f,
                "{len} bytes at {address} do not fit in memory."
            ),
            DiagnosticKind::DuplicateBurn => {
                f.write_str("Only one .BURN is allowed in a program.")
            }
            DiagnosticKind::MissingBurn => {
                f.write_str("An operating system must contain a .BURN directive.")
            }
            DiagnosticKind::BurnPlacement(BurnPlacement::IgnoredInUserProgram) => {
                f.write_str(".BURN is ignored in a user program.")
            }
            DiagnosticKind::BurnPlacement(BurnPlacement::FollowsCode) => {
                f.write_str("Code before .BURN is burned into ROM as well.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: LineNumber,
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: LineNumber, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic {
            line,
            severity: kind.severity(),
            kind,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.line, self.severity, self.kind)
    }
}

/// A host sees a diagnostic as `{line, severity, message}`.
impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Diagnostic", 3)?;
        state.serialize_field("line", &self.line)?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

/// Attach `incoming` to a line which may already have a diagnostic.
/// An error displaces a warning; otherwise the first diagnostic wins.
pub(crate) fn merge(slot: &mut Option<Diagnostic>, incoming: Diagnostic) {
    match slot {
        None => {
            *slot = Some(incoming);
        }
        Some(existing) if !existing.is_error() && incoming.is_error() => {
            *slot = Some(incoming);
        }
        Some(_) => (),
    }
}

#[test]
fn test_error_displaces_warning() {
    let mut slot = Some(Diagnostic::new(
        3,
        DiagnosticKind::BurnPlacement(BurnPlacement::IgnoredInUserProgram),
    ));
    merge(&mut slot, Diagnostic::new(3, DiagnosticKind::DuplicateBurn));
    assert_eq!(
        slot.map(|d| d.kind),
        Some(DiagnosticKind::DuplicateBurn)
    );
}

#[test]
fn test_first_error_is_kept() {
    let mut slot = Some(Diagnostic::new(1, DiagnosticKind::MissingEnd));
    merge(&mut slot, Diagnostic::new(1, DiagnosticKind::MissingBurn));
    merge(
        &mut slot,
        Diagnostic::new(
            1,
            DiagnosticKind::BurnPlacement(BurnPlacement::FollowsCode),
        ),
    );
    assert_eq!(slot.map(|d| d.kind), Some(DiagnosticKind::MissingEnd));
}

#[test]
fn test_message_text() {
    let d = Diagnostic::new(2, DiagnosticKind::DuplicateSymbol(SymbolName::from("START")));
    assert_eq!(d.message(), "Symbol START was previously defined.");
    assert_eq!(d.to_string(), "line 2: ERROR: Symbol START was previously defined.");
}
