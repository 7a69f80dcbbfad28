//! Grammar of a single source line:
//!
//! ```text
//! [label:] [mnemonic-or-dot-command [operand [,addressing-mode]]] [;comment]
//! ```
//!
//! The parser only checks the shape of the line.  Whether the
//! mnemonic exists, whether the operand suits it and so on is decided
//! when the parsed line is lowered (see `ast::lower`).
pub(crate) mod helpers;
#[cfg(test)]
mod tests;

use chumsky::error::{Rich, RichReason};
use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::{end, just, Input, SimpleSpan};
use chumsky::select;
use chumsky::Parser;

use base::prelude::AddressingMode;

use super::ast::{Argument, CommandName, ParsedCommand, ParsedLine};
use super::lexer::{self, Token as Tok};
use super::span::Span;

pub(crate) type Extra<'a> = chumsky::extra::Err<Rich<'a, Tok>>;

fn label<'a, I>() -> impl Parser<'a, I, (String, Span), Extra<'a>> + Clone
where
    I: Input<'a, Token = Tok, Span = Span> + ValueInput<'a>,
{
    select! {
        Tok::Label(name) => name,
    }
    .map_with(|name, extra| (name, extra.span()))
    .labelled("symbol definition")
}

fn command_name<'a, I>() -> impl Parser<'a, I, (CommandName, Span), Extra<'a>> + Clone
where
    I: Input<'a, Token = Tok, Span = Span> + ValueInput<'a>,
{
    select! {
        Tok::Ident(name) => CommandName::Mnemonic(name),
        Tok::DotCommand(name) => CommandName::Dot(name),
    }
    .map_with(|name, extra| (name, extra.span()))
    .labelled("mnemonic or dot command")
}

fn argument<'a, I>() -> impl Parser<'a, I, (Argument, Span), Extra<'a>> + Clone
where
    I: Input<'a, Token = Tok, Span = Span> + ValueInput<'a>,
{
    select! {
        Tok::Decimal(text) => Argument::Decimal(text),
        Tok::Hex(text) => Argument::Hex(text),
        Tok::CharLit(text) => Argument::Char(text),
        Tok::StrLit(text) => Argument::Str(text),
        Tok::UnterminatedStr(text) => Argument::UnterminatedStr(text),
        Tok::Ident(text) => Argument::Symbol(text),
    }
    .map_with(|arg, extra| (arg, extra.span()))
    .labelled("operand")
}

fn addressing_mode<'a, I>() -> impl Parser<'a, I, (AddressingMode, Span), Extra<'a>> + Clone
where
    I: Input<'a, Token = Tok, Span = Span> + ValueInput<'a>,
{
    just(Tok::Comma)
        .ignore_then(
            select! {
                Tok::Ident(text) => text,
            }
            .try_map(|text, span| match text.parse::<AddressingMode>() {
                Ok(mode) => Ok((mode, span)),
                Err(e) => Err(Rich::custom(span, e.to_string())),
            })
            .labelled("addressing mode"),
        )
}

fn comment<'a, I>() -> impl Parser<'a, I, String, Extra<'a>> + Clone
where
    I: Input<'a, Token = Tok, Span = Span> + ValueInput<'a>,
{
    select! {
        Tok::Comment(text) => text,
    }
    .labelled("comment")
}

pub(crate) fn source_line<'a, I>() -> impl Parser<'a, I, ParsedLine, Extra<'a>> + Clone
where
    I: Input<'a, Token = Tok, Span = Span> + ValueInput<'a>,
{
    let command = command_name()
        .then(argument().then(addressing_mode().or_not()).or_not())
        .map(|((name, name_span), operands)| {
            let (argument, mode) = match operands {
                Some((argument, mode)) => (Some(argument), mode),
                None => (None, None),
            };
            ParsedCommand {
                name,
                name_span,
                argument,
                mode,
            }
        });

    label()
        .or_not()
        .then(command.or_not())
        .then(comment().or_not())
        .then_ignore(end())
        .map(|((label, command), comment)| ParsedLine {
            label,
            command,
            comment,
        })
}

type Mig<I, O> = chumsky::input::MappedInput<
    Tok,
    SimpleSpan,
    chumsky::input::Stream<std::vec::IntoIter<(Tok, SimpleSpan)>>,
    fn(I) -> O,
>;
pub(crate) type Mi = Mig<(Tok, SimpleSpan), (Tok, SimpleSpan)>;

pub(crate) fn tokenize_and_parse_with<'a, P, T>(
    input: &'a str,
    parser: P,
) -> (Option<T>, Vec<Rich<'a, Tok>>)
where
    P: Parser<'a, Mi, T, Extra<'a>>,
{
    let tokens: Vec<(Tok, SimpleSpan)> = lexer::tokenize(input)
        .into_iter()
        .map(|(tok, range)| (tok, range.into()))
        .collect();
    let end_span: SimpleSpan = SimpleSpan::from(input.len()..input.len());
    let token_stream: Mi = Stream::from_iter(tokens).map(end_span, |unchanged| unchanged);
    parser.parse(token_stream).into_output_errors()
}

fn describe_error(e: &Rich<'_, Tok>) -> String {
    match e.reason() {
        RichReason::Custom(msg) => msg.to_string(),
        _ => match e.found() {
            Some(Tok::Error(msg)) => format!("Syntax error: {msg}"),
            Some(Tok::Comma) => "Syntax error: unexpected ','".to_string(),
            Some(tok) => format!("Syntax error: unexpected '{tok}'"),
            None => "Syntax error: unexpected end of line".to_string(),
        },
    }
}

/// Parse one line of source.  On failure, the result is the message
/// for the first problem found.
pub(crate) fn parse_source_line(text: &str) -> Result<ParsedLine, String> {
    let (output, errors) = tokenize_and_parse_with(text, source_line());
    match (output, errors.first()) {
        (_, Some(e)) => Err(describe_error(e)),
        (Some(line), None) => Ok(line),
        (None, None) => Err("Syntax error".to_string()),
    }
}
