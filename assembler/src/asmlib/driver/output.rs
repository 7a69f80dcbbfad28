use std::io::Write;
use std::path::Path;

use tracing::{event, span, Level};

use super::super::types::AssemblerFailure;

/// Number of bytes on each line of an object file.
const BYTES_PER_LINE: usize = 16;

/// Marks the end of the object code.
const SENTINEL: &str = "zz";

/// Render object code in the loader's text format: upper-case hex
/// bytes separated by spaces, sixteen to a line, followed by the
/// `zz` sentinel.
#[must_use]
pub fn format_object_code(bytes: &[u8]) -> String {
    let tokens: Vec<String> = bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .chain(std::iter::once(SENTINEL.to_string()))
        .collect();
    let mut result = String::with_capacity(tokens.len() * 3);
    for line in tokens.chunks(BYTES_PER_LINE) {
        result.push_str(&line.join(" "));
        result.push('\n');
    }
    result
}

/// Write the object code of a program.
///
/// # Errors
///
/// Failure to write the output file.
pub fn write_object_code<W: Write>(
    writer: &mut W,
    output_file_name: &Path,
    bytes: &[u8],
) -> Result<(), AssemblerFailure> {
    let span = span!(Level::ERROR, "write object code");
    let _enter = span.enter();

    event!(
        Level::DEBUG,
        "writing {} bytes of object code to {}",
        bytes.len(),
        output_file_name.display()
    );
    let fail = |error| AssemblerFailure::IoErrorOnOutput {
        filename: output_file_name.to_path_buf(),
        error,
    };
    writer
        .write_all(format_object_code(bytes).as_bytes())
        .map_err(fail)?;
    writer.flush().map_err(fail)
}

#[test]
fn test_format_short_program() {
    assert_eq!(
        format_object_code(&[0x49, 0x00, 0x04, 0x00, 0x48, 0x69, 0x00]),
        "49 00 04 00 48 69 00 zz\n"
    );
}

#[test]
fn test_format_empty_program() {
    assert_eq!(format_object_code(&[]), "zz\n");
}

#[test]
fn test_format_wraps_after_sixteen_bytes() {
    let bytes: Vec<u8> = (0..17).collect();
    assert_eq!(
        format_object_code(&bytes),
        "00 01 02 03 04 05 06 07 08 09 0A 0B 0C 0D 0E 0F\n10 zz\n"
    );
}

#[test]
fn test_write_object_code() {
    let mut buf: Vec<u8> = Vec::new();
    write_object_code(&mut buf, Path::new("test.pepo"), &[0xC0, 0x00, 0x05])
        .expect("writing to a Vec should succeed");
    assert_eq!(buf, b"C0 00 05 zz\n");
}
