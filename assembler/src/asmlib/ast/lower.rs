//! Lowering turns a [`ParsedLine`] into the [`CodeKind`] the passes
//! work with.  This is where mnemonics, dot commands and operand
//! values are checked.
use base::prelude::{decode_escapes, Address, AddressingMode, Mnemonic};

use super::super::diagnostic::{AddressingModeProblem, DiagnosticKind};
use super::super::parser::helpers::{
    bytes_to_word, decimal_in_range, hex_with_max_digits, quoted_body, to_word,
};
use super::super::span::{extract_span, join, Span};
use super::super::symbol::SymbolName;
use super::{Argument, CodeKind, CommandName, Operand, ParsedCommand, ParsedLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lowered {
    pub(crate) label: Option<SymbolName>,
    pub(crate) kind: CodeKind,
    pub(crate) mnemonic: String,
    pub(crate) operand: String,
    pub(crate) comment: Option<String>,
    pub(crate) problem: Option<DiagnosticKind>,
}

fn symbol(text: &str) -> Result<SymbolName, DiagnosticKind> {
    let name = SymbolName::from(text);
    if name.is_too_long() {
        Err(DiagnosticKind::SymbolTooLong(name))
    } else {
        Ok(name)
    }
}

fn decode_literal(text: &str) -> Result<Vec<u8>, DiagnosticKind> {
    decode_escapes(quoted_body(text))
        .map_err(|e| DiagnosticKind::Syntax(format!("Invalid constant {text}: {e}.")))
}

/// A constant which fills a word: the operand of an instruction,
/// `.WORD` or `.EQUATE`.
fn word_constant(arg: &Argument) -> Result<u16, DiagnosticKind> {
    match arg {
        Argument::Decimal(text) => decimal_in_range(text, -32768, 65535)
            .map(to_word)
            .map_err(DiagnosticKind::OperandRange),
        Argument::Hex(text) => hex_with_max_digits(text, 4).map_err(DiagnosticKind::OperandRange),
        Argument::Char(text) => match decode_literal(text)?.as_slice() {
            [byte] => Ok(u16::from(*byte)),
            _ => Err(DiagnosticKind::Syntax(format!(
                "Character constant {text} must contain exactly one character."
            ))),
        },
        Argument::Str(text) => bytes_to_word(&decode_literal(text)?).ok_or_else(|| {
            DiagnosticKind::OperandRange(format!(
                "String constant {text} must have length one or two."
            ))
        }),
        Argument::UnterminatedStr(text) => Err(DiagnosticKind::Syntax(format!(
            "Unterminated string constant {text}."
        ))),
        Argument::Symbol(text) => Err(DiagnosticKind::Syntax(format!(
            "{text} is a symbol, but a constant is required here."
        ))),
    }
}

/// A constant which fills a single byte: the operand of `.BYTE`.
fn byte_constant(arg: &Argument) -> Result<u8, DiagnosticKind> {
    match arg {
        Argument::Decimal(text) => decimal_in_range(text, -128, 255)
            .map(|n| to_word(n).to_be_bytes()[1])
            .map_err(DiagnosticKind::OperandRange),
        Argument::Hex(text) => hex_with_max_digits(text, 2)
            .map(|n| n.to_be_bytes()[1])
            .map_err(DiagnosticKind::OperandRange),
        Argument::Str(text) => match decode_literal(text)?.as_slice() {
            [byte] => Ok(*byte),
            _ => Err(DiagnosticKind::OperandRange(format!(
                "String constant {text} must have length one for .BYTE."
            ))),
        },
        // A character constant is a single byte.
        Argument::Char(_) | Argument::UnterminatedStr(_) | Argument::Symbol(_) => {
            word_constant(arg).map(|value| value.to_be_bytes()[1])
        }
    }
}

fn instruction(
    name: &str,
    argument: Option<&Argument>,
    mode: Option<AddressingMode>,
) -> Result<CodeKind, DiagnosticKind> {
    let mnemonic: Mnemonic = name
        .parse()
        .map_err(|_| DiagnosticKind::Syntax(format!("Invalid mnemonic {name}.")))?;
    if mnemonic.is_unary() {
        return match argument {
            None => Ok(CodeKind::UnaryInstruction { mnemonic }),
            Some(_) => Err(DiagnosticKind::Syntax(format!(
                "{mnemonic} is a unary instruction and takes no operand."
            ))),
        };
    }
    let Some(argument) = argument else {
        return Err(DiagnosticKind::Syntax(format!(
            "{mnemonic} requires an operand."
        )));
    };
    let mode = match mode.or(mnemonic.default_mode()) {
        Some(mode) if mnemonic.allows(mode) => mode,
        Some(mode) => {
            return Err(DiagnosticKind::InvalidAddressingMode {
                mnemonic,
                problem: AddressingModeProblem::Illegal(mode),
            });
        }
        None => {
            return Err(DiagnosticKind::InvalidAddressingMode {
                mnemonic,
                problem: AddressingModeProblem::Missing,
            });
        }
    };
    let operand = match argument {
        Argument::Symbol(text) => Operand::Symbol(symbol(text)?),
        constant => Operand::Value(word_constant(constant)?),
    };
    Ok(CodeKind::NonUnaryInstruction {
        mnemonic,
        operand,
        mode,
    })
}

fn directive(
    name: &str,
    argument: Option<&Argument>,
    has_mode: bool,
    has_label: bool,
) -> Result<CodeKind, DiagnosticKind> {
    let malformed = |msg: &str| DiagnosticKind::MalformedDirective(format!("{name} {msg}"));
    if has_mode {
        return Err(DiagnosticKind::Syntax(format!(
            "{name} does not take an addressing mode."
        )));
    }
    if name == ".END" {
        return match argument {
            None => Ok(CodeKind::End),
            Some(_) => Err(malformed("takes no operand.")),
        };
    }
    if !matches!(
        name,
        ".ADDRSS" | ".ALIGN" | ".ASCII" | ".BLOCK" | ".BURN" | ".BYTE" | ".EQUATE" | ".WORD"
    ) {
        return Err(DiagnosticKind::Syntax(format!(
            "Invalid dot command {name}."
        )));
    }
    let Some(argument) = argument else {
        return Err(malformed("requires an operand."));
    };
    match (name, argument) {
        (".ADDRSS", Argument::Symbol(text)) => Ok(CodeKind::Addrss {
            symbol: symbol(text)?,
        }),
        (".ADDRSS", _) => Err(malformed("requires a symbol operand.")),
        (".ALIGN", Argument::Decimal(text)) => match text.parse::<u16>() {
            Ok(boundary @ (2 | 4 | 8)) => Ok(CodeKind::Align { boundary }),
            _ => Err(malformed("requires an operand of 2, 4 or 8.")),
        },
        (".ALIGN", _) => Err(malformed("requires an operand of 2, 4 or 8.")),
        (".ASCII", Argument::Str(text)) => decode_escapes(quoted_body(text))
            .map(|bytes| CodeKind::AsciiBytes { bytes })
            .map_err(|e| malformed(&format!("has an invalid string: {e}."))),
        (".ASCII", Argument::UnterminatedStr(_)) => Err(malformed("has an unterminated string.")),
        (".ASCII", _) => Err(malformed("requires a string operand.")),
        (".BLOCK", Argument::Decimal(text)) => decimal_in_range(text, 0, 65535)
            .map(|n| CodeKind::BlockStorage { size: to_word(n) })
            .map_err(DiagnosticKind::OperandRange),
        (".BLOCK", Argument::Hex(text)) => hex_with_max_digits(text, 4)
            .map(|size| CodeKind::BlockStorage { size })
            .map_err(DiagnosticKind::OperandRange),
        (".BLOCK", _) => Err(malformed("requires a decimal or hexadecimal operand.")),
        (".BURN", Argument::Hex(text)) => hex_with_max_digits(text, 4)
            .map(|target| CodeKind::Burn {
                target: Address::new(target),
            })
            .map_err(DiagnosticKind::OperandRange),
        (".BURN", _) => Err(malformed("requires a hexadecimal operand.")),
        (".BYTE" | ".WORD" | ".EQUATE", Argument::Symbol(_)) => {
            Err(malformed("requires a constant operand."))
        }
        (".BYTE", arg) => byte_constant(arg).map(|value| CodeKind::Byte { value }),
        (".WORD", arg) => word_constant(arg).map(|value| CodeKind::Word { value }),
        (".EQUATE", _) if !has_label => Err(malformed("must have a symbol definition.")),
        (_, arg) => word_constant(arg).map(|value| CodeKind::Equate { value }),
    }
}

fn operand_text(text: &str, command: &ParsedCommand) -> String {
    let span: Option<Span> = match (&command.argument, &command.mode) {
        (Some((_, arg_span)), Some((_, mode_span))) => Some(join(arg_span, mode_span)),
        (Some((_, arg_span)), None) => Some(*arg_span),
        (None, _) => None,
    };
    span.map(|span| extract_span(text, &span).to_string())
        .unwrap_or_default()
}

fn lower_command(command: &ParsedCommand, has_label: bool) -> Result<CodeKind, DiagnosticKind> {
    let argument = command.argument.as_ref().map(|(arg, _)| arg);
    let mode = command.mode.as_ref().map(|(mode, _)| *mode);
    match &command.name {
        CommandName::Mnemonic(name) => instruction(name, argument, mode),
        CommandName::Dot(name) => directive(
            &name.to_ascii_uppercase(),
            argument,
            mode.is_some(),
            has_label,
        ),
    }
}

/// Lower the parsed form of the source line `text`.
pub(crate) fn lower(text: &str, parsed: ParsedLine) -> Lowered {
    let label_result: Option<Result<SymbolName, DiagnosticKind>> =
        parsed.label.as_ref().map(|(name, _)| symbol(name));
    let (mnemonic, operand) = match &parsed.command {
        Some(command) => (
            match &command.name {
                CommandName::Mnemonic(name) | CommandName::Dot(name) => name.to_ascii_uppercase(),
            },
            operand_text(text, command),
        ),
        None => (String::new(), String::new()),
    };
    let kind_result: Result<CodeKind, DiagnosticKind> = match (&parsed.command, &parsed.label) {
        (Some(command), label) => lower_command(command, label.is_some()),
        (None, Some(_)) => Err(DiagnosticKind::MissingMnemonic),
        (None, None) => Ok(CodeKind::CommentOnly),
    };

    let (label, label_problem) = match label_result {
        None => (None, None),
        Some(Ok(name)) => (Some(name), None),
        Some(Err(problem)) => (None, Some(problem)),
    };
    let (kind, problem) = match (kind_result, label_problem) {
        (_, Some(problem)) | (Err(problem), None) => (CodeKind::Unparsed, Some(problem)),
        (Ok(kind), None) => (kind, None),
    };
    Lowered {
        label,
        kind,
        mnemonic,
        operand,
        comment: parsed.comment,
        problem,
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::parser::parse_source_line;
    use super::*;

    fn lower_text(text: &str) -> Lowered {
        match parse_source_line(text) {
            Ok(parsed) => lower(text, parsed),
            Err(e) => panic!("{text:?} should have parsed, but: {e}"),
        }
    }

    fn kind_of(text: &str) -> CodeKind {
        let lowered = lower_text(text);
        assert_eq!(lowered.problem, None, "unexpected problem in {text:?}");
        lowered.kind
    }

    fn problem_of(text: &str) -> DiagnosticKind {
        let lowered = lower_text(text);
        assert_eq!(lowered.kind, CodeKind::Unparsed);
        match lowered.problem {
            Some(problem) => problem,
            None => panic!("expected a problem in {text:?}"),
        }
    }

    #[test]
    fn test_instruction_with_mode() {
        let lowered = lower_text("START: ldwa 5,i ;load");
        assert_eq!(lowered.label, Some(SymbolName::from("START")));
        assert_eq!(
            lowered.kind,
            CodeKind::NonUnaryInstruction {
                mnemonic: Mnemonic::Ldwa,
                operand: Operand::Value(5),
                mode: AddressingMode::Immediate,
            }
        );
        assert_eq!(lowered.mnemonic, "LDWA");
        assert_eq!(lowered.operand, "5,i");
        assert_eq!(lowered.comment.as_deref(), Some(";load"));
    }

    #[test]
    fn test_branch_defaults_to_immediate() {
        assert_eq!(
            kind_of("BR START"),
            CodeKind::NonUnaryInstruction {
                mnemonic: Mnemonic::Br,
                operand: Operand::Symbol(SymbolName::from("START")),
                mode: AddressingMode::Immediate,
            }
        );
    }

    #[test]
    fn test_negative_operand() {
        assert_eq!(
            kind_of("LDWA -1,i"),
            CodeKind::NonUnaryInstruction {
                mnemonic: Mnemonic::Ldwa,
                operand: Operand::Value(0xFFFF),
                mode: AddressingMode::Immediate,
            }
        );
    }

    #[test]
    fn test_string_operand_is_right_justified() {
        assert_eq!(
            kind_of("LDWA \"A\",i"),
            CodeKind::NonUnaryInstruction {
                mnemonic: Mnemonic::Ldwa,
                operand: Operand::Value(0x41),
                mode: AddressingMode::Immediate,
            }
        );
    }

    #[test]
    fn test_unary_instruction() {
        assert_eq!(
            kind_of("stop"),
            CodeKind::UnaryInstruction {
                mnemonic: Mnemonic::Stop
            }
        );
        assert!(matches!(problem_of("STOP 3"), DiagnosticKind::Syntax(_)));
    }

    #[test]
    fn test_addressing_mode_problems() {
        assert_eq!(
            problem_of("LDWA 5"),
            DiagnosticKind::InvalidAddressingMode {
                mnemonic: Mnemonic::Ldwa,
                problem: AddressingModeProblem::Missing,
            }
        );
        assert_eq!(
            problem_of("STWA 5,i"),
            DiagnosticKind::InvalidAddressingMode {
                mnemonic: Mnemonic::Stwa,
                problem: AddressingModeProblem::Illegal(AddressingMode::Immediate),
            }
        );
        assert!(matches!(
            problem_of("BR x,d"),
            DiagnosticKind::InvalidAddressingMode { .. }
        ));
    }

    #[test]
    fn test_operand_range() {
        assert!(matches!(
            problem_of("LDWA 65536,i"),
            DiagnosticKind::OperandRange(_)
        ));
        assert!(matches!(
            problem_of("LDWA 0x12345,i"),
            DiagnosticKind::OperandRange(_)
        ));
        assert!(matches!(
            problem_of(".BYTE 256"),
            DiagnosticKind::OperandRange(_)
        ));
        assert!(matches!(
            problem_of(".BYTE 0x100"),
            DiagnosticKind::OperandRange(_)
        ));
    }

    #[test]
    fn test_unknown_mnemonic() {
        assert_eq!(
            problem_of("FROB 1,i"),
            DiagnosticKind::Syntax("Invalid mnemonic FROB.".to_string())
        );
    }

    #[test]
    fn test_symbol_too_long() {
        assert_eq!(
            problem_of("abcdefghi: STOP"),
            DiagnosticKind::SymbolTooLong(SymbolName::from("abcdefghi"))
        );
        assert_eq!(
            problem_of("BR abcdefghi"),
            DiagnosticKind::SymbolTooLong(SymbolName::from("abcdefghi"))
        );
    }

    #[test]
    fn test_label_only() {
        assert_eq!(problem_of("here:"), DiagnosticKind::MissingMnemonic);
        assert_eq!(lower_text("here: ;x").label, Some(SymbolName::from("here")));
    }

    #[test]
    fn test_comment_and_blank_lines() {
        assert_eq!(kind_of(""), CodeKind::CommentOnly);
        assert_eq!(kind_of("  ;just a comment"), CodeKind::CommentOnly);
    }

    #[test]
    fn test_ascii() {
        assert_eq!(
            kind_of(".ASCII \"Hi\\x00\""),
            CodeKind::AsciiBytes {
                bytes: vec![b'H', b'i', 0]
            }
        );
        assert!(matches!(
            problem_of(".ASCII \"Hi"),
            DiagnosticKind::MalformedDirective(_)
        ));
        assert!(matches!(
            problem_of(".ASCII 12"),
            DiagnosticKind::MalformedDirective(_)
        ));
    }

    #[test]
    fn test_block_and_burn() {
        assert_eq!(kind_of(".BLOCK 4"), CodeKind::BlockStorage { size: 4 });
        assert_eq!(kind_of(".block 0x10"), CodeKind::BlockStorage { size: 16 });
        assert_eq!(
            kind_of(".BURN 0xFFFF"),
            CodeKind::Burn {
                target: Address::new(0xFFFF)
            }
        );
        assert!(matches!(
            problem_of(".BURN 65535"),
            DiagnosticKind::MalformedDirective(_)
        ));
    }

    #[test]
    fn test_equate() {
        let lowered = lower_text("TRUE: .EQUATE 1");
        assert_eq!(lowered.kind, CodeKind::Equate { value: 1 });
        assert_eq!(lowered.label, Some(SymbolName::from("TRUE")));
        assert!(matches!(
            problem_of(".EQUATE 1"),
            DiagnosticKind::MalformedDirective(_)
        ));
    }

    #[test]
    fn test_byte_word_addrss_align() {
        assert_eq!(kind_of(".BYTE -1"), CodeKind::Byte { value: 0xFF });
        assert_eq!(kind_of(".BYTE 'A'"), CodeKind::Byte { value: 0x41 });
        assert_eq!(kind_of(".WORD 0x1234"), CodeKind::Word { value: 0x1234 });
        assert_eq!(kind_of(".WORD \"AB\""), CodeKind::Word { value: 0x4142 });
        assert_eq!(
            kind_of(".ADDRSS main"),
            CodeKind::Addrss {
                symbol: SymbolName::from("main")
            }
        );
        assert_eq!(kind_of(".ALIGN 8"), CodeKind::Align { boundary: 8 });
        assert!(matches!(
            problem_of(".ALIGN 3"),
            DiagnosticKind::MalformedDirective(_)
        ));
    }

    #[test]
    fn test_end() {
        assert_eq!(kind_of(".end"), CodeKind::End);
        assert!(matches!(
            problem_of(".END 1"),
            DiagnosticKind::MalformedDirective(_)
        ));
    }

    #[test]
    fn test_unknown_dot_command() {
        assert!(matches!(problem_of(".FROB 1"), DiagnosticKind::Syntax(_)));
    }
}
