use std::fmt::Debug;

use chumsky::Parser;

use base::prelude::AddressingMode;

use super::super::ast::{Argument, CommandName, ParsedCommand, ParsedLine};
use super::super::span::span;
use super::*;

fn parse_successfully_with<'a, O, P>(input: &'a str, parser: P) -> O
where
    P: Parser<'a, Mi, O, Extra<'a>>,
    O: Debug,
{
    let (output, errors) = tokenize_and_parse_with(input, parser);
    if !errors.is_empty() {
        panic!("{input:?} should parse without errors, but got {errors:?}");
    }
    match output {
        Some(out) => out,
        None => panic!("{input:?} produced no output"),
    }
}

fn parse_line(input: &str) -> ParsedLine {
    parse_successfully_with(input, source_line())
}

#[test]
fn test_full_line() {
    assert_eq!(
        parse_line("START: LDWA 5,i ;load"),
        ParsedLine {
            label: Some(("START".to_string(), span(0..6))),
            command: Some(ParsedCommand {
                name: CommandName::Mnemonic("LDWA".to_string()),
                name_span: span(7..11),
                argument: Some((Argument::Decimal("5".to_string()), span(12..13))),
                mode: Some((AddressingMode::Immediate, span(14..15))),
            }),
            comment: Some(";load".to_string()),
        }
    );
}

#[test]
fn test_blank_line() {
    assert_eq!(
        parse_line(""),
        ParsedLine {
            label: None,
            command: None,
            comment: None,
        }
    );
}

#[test]
fn test_comment_only() {
    let line = parse_line("   ; hello");
    assert_eq!(line.label, None);
    assert_eq!(line.command, None);
    assert_eq!(line.comment.as_deref(), Some("; hello"));
}

#[test]
fn test_label_without_command() {
    let line = parse_line("loop:");
    assert_eq!(line.label, Some(("loop".to_string(), span(0..5))));
    assert_eq!(line.command, None);
}

#[test]
fn test_dot_command_with_string() {
    let line = parse_line("msg: .ASCII \"Hi\"");
    let command = line.command.expect("should have a command");
    assert_eq!(command.name, CommandName::Dot(".ASCII".to_string()));
    assert_eq!(
        command.argument.map(|(arg, _)| arg),
        Some(Argument::Str("\"Hi\"".to_string()))
    );
    assert_eq!(command.mode, None);
}

#[test]
fn test_symbolic_operand_with_stack_mode() {
    let line = parse_line("  LDWA  total,sfx");
    let command = line.command.expect("should have a command");
    assert_eq!(
        command.argument.map(|(arg, _)| arg),
        Some(Argument::Symbol("total".to_string()))
    );
    assert_eq!(
        command.mode.map(|(mode, _)| mode),
        Some(AddressingMode::StackDeferredIndexed)
    );
}

#[test]
fn test_unterminated_string_is_still_an_operand() {
    let line = parse_line(".ASCII \"oops");
    let command = line.command.expect("should have a command");
    assert_eq!(
        command.argument.map(|(arg, _)| arg),
        Some(Argument::UnterminatedStr("\"oops".to_string()))
    );
}

#[test]
fn test_syntax_errors() {
    assert!(parse_source_line("LDWA 5,").is_err());
    assert!(parse_source_line("LDWA 5 6").is_err());
    assert!(parse_source_line("a: b: STOP").is_err());
    assert!(parse_source_line("LDWA 5,q").is_err());
    assert!(parse_source_line("5 STOP").is_err());
}

#[test]
fn test_lexer_error_is_reported() {
    match parse_source_line("STOP @") {
        Err(msg) => assert!(msg.contains('@'), "unexpected message {msg}"),
        Ok(line) => panic!("expected an error but got {line:?}"),
    }
}

#[test]
fn test_parse_source_line_succeeds() {
    let line = parse_source_line("BR main ;go").expect("should parse");
    assert_eq!(line.comment.as_deref(), Some(";go"));
}
