use super::{decode_escapes, EscapeError};

#[test]
fn test_plain_text() {
    assert_eq!(decode_escapes("Hi"), Ok(b"Hi".to_vec()));
    assert_eq!(decode_escapes(""), Ok(Vec::new()));
}

#[test]
fn test_simple_escapes() {
    assert_eq!(decode_escapes(r"a\nb"), Ok(vec![b'a', 0x0A, b'b']));
    assert_eq!(decode_escapes(r#"\"\'\\"#), Ok(vec![b'"', b'\'', b'\\']));
    assert_eq!(decode_escapes(r"\0"), Ok(vec![0]));
    assert_eq!(
        decode_escapes(r"\b\f\r\t\v"),
        Ok(vec![0x08, 0x0C, 0x0D, 0x09, 0x0B])
    );
}

#[test]
fn test_hex_escapes() {
    assert_eq!(decode_escapes(r"\x00"), Ok(vec![0]));
    assert_eq!(decode_escapes(r"\x4aZ"), Ok(vec![0x4A, b'Z']));
    assert_eq!(decode_escapes(r"\XFF"), Ok(vec![0xFF]));
}

#[test]
fn test_bad_escapes() {
    assert_eq!(decode_escapes("\\"), Err(EscapeError::Dangling));
    assert_eq!(decode_escapes(r"\q"), Err(EscapeError::UnknownEscape('q')));
    assert_eq!(
        decode_escapes(r"\x4"),
        Err(EscapeError::BadHexEscape("4".to_string()))
    );
    assert_eq!(
        decode_escapes(r"\xG1"),
        Err(EscapeError::BadHexEscape("G1".to_string()))
    );
    assert_eq!(decode_escapes("é"), Err(EscapeError::NotAscii('é')));
}
