use super::{tokenize, Token};

fn tokens_of(line: &str) -> Vec<Token> {
    tokenize(line).into_iter().map(|(tok, _)| tok).collect()
}

#[test]
fn test_instruction_line() {
    assert_eq!(
        tokens_of("START: LDWA 5,i ;load"),
        vec![
            Token::Label("START".to_string()),
            Token::Ident("LDWA".to_string()),
            Token::Decimal("5".to_string()),
            Token::Comma,
            Token::Ident("i".to_string()),
            Token::Comment(";load".to_string()),
        ]
    );
}

#[test]
fn test_blank_line() {
    assert_eq!(tokens_of(""), Vec::<Token>::new());
    assert_eq!(tokens_of(" \t "), Vec::<Token>::new());
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokens_of("-12 +3 0x1F 0XaB"),
        vec![
            Token::Decimal("-12".to_string()),
            Token::Decimal("+3".to_string()),
            Token::Hex("0x1F".to_string()),
            Token::Hex("0XaB".to_string()),
        ]
    );
}

#[test]
fn test_dot_command() {
    assert_eq!(
        tokens_of(".ascii \"Hi\""),
        vec![
            Token::DotCommand(".ascii".to_string()),
            Token::StrLit("\"Hi\"".to_string()),
        ]
    );
}

#[test]
fn test_char_literals() {
    assert_eq!(
        tokens_of(r"'a' '\n' '\''"),
        vec![
            Token::CharLit("'a'".to_string()),
            Token::CharLit(r"'\n'".to_string()),
            Token::CharLit(r"'\''".to_string()),
        ]
    );
}

#[test]
fn test_string_with_escaped_quote() {
    assert_eq!(
        tokens_of(r#""say \"hi\"""#),
        vec![Token::StrLit(r#""say \"hi\"""#.to_string())]
    );
}

#[test]
fn test_unterminated_string() {
    assert_eq!(
        tokens_of("\"abc"),
        vec![Token::UnterminatedStr("\"abc".to_string())]
    );
}

#[test]
fn test_comment_swallows_rest_of_line() {
    assert_eq!(
        tokens_of("; x: .WORD 'q',"),
        vec![Token::Comment("; x: .WORD 'q',".to_string())]
    );
}

#[test]
fn test_unexpected_character() {
    let tokens = tokens_of("LDWA @");
    assert_eq!(tokens.len(), 2);
    assert!(matches!(&tokens[1], Token::Error(msg) if msg.contains('@')));
}

#[test]
fn test_spans() {
    let spans: Vec<_> = tokenize("BR x").into_iter().map(|(_, span)| span).collect();
    assert_eq!(spans, vec![0..2, 3..4]);
}
