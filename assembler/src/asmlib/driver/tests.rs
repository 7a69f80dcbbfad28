use base::prelude::*;

use super::super::ast::CodeKind;
use super::super::diagnostic::{BurnPlacement, DiagnosticKind, Severity};
use super::super::symbol::SymbolName;
use super::super::symtab::SymbolDefinition;
use super::super::types::AssemblerFailure;
use super::{assemble, assemble_file, AssemblyOptions, AssemblySession, OutputOptions};

fn user(source: &str) -> AssemblySession {
    assemble(source, &AssemblyOptions::default())
}

fn os(source: &str) -> AssemblySession {
    assemble(source, &AssemblyOptions::operating_system())
}

fn diagnostic_kinds(session: &AssemblySession) -> Vec<(u32, DiagnosticKind)> {
    session
        .diagnostics()
        .map(|d| (d.line, d.kind.clone()))
        .collect()
}

fn symbol_value(session: &AssemblySession, name: &str) -> Option<u16> {
    session.symbol_table().value_of(&SymbolName::from(name))
}

#[test]
fn test_pass1_assigns_addresses() {
    let session = user("a: STOP\nb: LDWA 1,i\nc: .BLOCK 5\nd: .WORD 1\n.END\n");
    let addresses: Vec<u16> = session
        .records()
        .iter()
        .map(|r| u16::from(r.address))
        .collect();
    assert_eq!(addresses, vec![0, 1, 4, 9, 11]);
    assert_eq!(symbol_value(&session, "a"), Some(0));
    assert_eq!(symbol_value(&session, "b"), Some(1));
    assert_eq!(symbol_value(&session, "c"), Some(4));
    assert_eq!(symbol_value(&session, "d"), Some(9));
    assert_eq!(session.byte_count(), 11);
    assert_eq!(session.object_code().len(), 11);
}

#[test]
fn test_user_program_at_load_address() {
    let session = assemble(
        "BR main\nmain: STOP\n.END\n",
        &AssemblyOptions::user_program_at(Address::new(0x0100)),
    );
    assert!(session.succeeded());
    assert_eq!(symbol_value(&session, "main"), Some(0x0103));
    assert_eq!(session.object_code(), &[0x12, 0x01, 0x03, 0x00]);
    assert_eq!(session.start_address(), Some(Address::new(0x0100)));
}

#[test]
fn test_align_pads_to_boundary() {
    let session = user("STOP\n.ALIGN 4\nx: .BYTE 7\n.END\n");
    assert!(session.succeeded());
    assert_eq!(symbol_value(&session, "x"), Some(4));
    assert_eq!(session.object_code(), &[0x00, 0x00, 0x00, 0x00, 0x07]);
}

#[test]
fn test_equate_and_addrss() {
    let session = user("five: .EQUATE 5\nLDWA five,i\nptr: .ADDRSS ptr\n.END\n");
    assert!(session.succeeded(), "{:?}", diagnostic_kinds(&session));
    assert_eq!(symbol_value(&session, "five"), Some(5));
    assert_eq!(
        session.symbol_table().get(&SymbolName::from("five")).map(|e| e.definition),
        Some(SymbolDefinition::Equate)
    );
    assert_eq!(session.object_code(), &[0xC0, 0x00, 0x05, 0x00, 0x03]);
}

#[test]
fn test_undefined_symbol_is_zero_filled() {
    let session = user("BR nowhere\nSTOP\n.END\n");
    assert!(!session.succeeded());
    assert_eq!(
        diagnostic_kinds(&session),
        vec![(1, DiagnosticKind::UndefinedSymbol(SymbolName::from("nowhere")))]
    );
    // Later code keeps its address.
    assert_eq!(session.object_code(), &[0x00, 0x00, 0x00, 0x00]);
    let entry = session
        .symbol_table()
        .get(&SymbolName::from("nowhere"))
        .expect("undefined symbols should be recorded");
    assert!(!entry.defined);
}

#[test]
fn test_every_duplicate_definition_is_flagged() {
    let session = user("x: STOP\ny: STOP\nx: STOP\n.END\n");
    assert!(!session.succeeded());
    assert_eq!(
        diagnostic_kinds(&session),
        vec![
            (1, DiagnosticKind::DuplicateSymbol(SymbolName::from("x"))),
            (3, DiagnosticKind::DuplicateSymbol(SymbolName::from("x"))),
        ]
    );
}

#[test]
fn test_missing_end() {
    let session = user("STOP\n");
    assert!(!session.succeeded());
    assert_eq!(diagnostic_kinds(&session), vec![(1, DiagnosticKind::MissingEnd)]);
}

#[test]
fn test_only_comments_follow_end() {
    let session = user(".END\nSTOP\n;fine\n");
    assert!(!session.succeeded());
    assert_eq!(diagnostic_kinds(&session), vec![(2, DiagnosticKind::TextAfterEnd)]);
    assert_eq!(session.records()[1].kind, CodeKind::Unparsed);
    assert!(session.object_code().is_empty());
}

#[test]
fn test_program_larger_than_memory() {
    let session = user(".BLOCK 0xFFFF\n.BLOCK 2\n.END\n");
    assert!(!session.succeeded());
    let kinds = diagnostic_kinds(&session);
    assert!(
        matches!(
            kinds.as_slice(),
            [(2, DiagnosticKind::MemoryOverflow { len: 2, .. })]
        ),
        "unexpected diagnostics {kinds:?}"
    );
}

#[test]
fn test_burn_in_user_program_is_a_warning() {
    let session = user(".BURN 0xFFFF\nSTOP\n.END\n");
    assert!(session.succeeded());
    let diagnostics: Vec<_> = session.diagnostics().collect();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(
        diagnostics[0].kind,
        DiagnosticKind::BurnPlacement(BurnPlacement::IgnoredInUserProgram)
    );
    assert_eq!(session.object_code(), &[0x00]);
    assert_eq!(session.rom_start(), None);
}

#[test]
fn test_operating_system_is_placed_by_burn() {
    let session = os(".BURN 0xFFFF\nentry: STOP\nval: .WORD 0x1234\nk: .EQUATE 9\n.END\n");
    assert!(session.succeeded(), "{:?}", diagnostic_kinds(&session));
    assert_eq!(session.burn_count(), 1);
    assert_eq!(session.burn_address(), Some(Address::MAX));
    assert_eq!(session.rom_start(), Some(Address::new(0xFFFD)));
    assert_eq!(session.start_address(), Some(Address::new(0xFFFD)));
    assert_eq!(symbol_value(&session, "entry"), Some(0xFFFD));
    assert_eq!(symbol_value(&session, "val"), Some(0xFFFE));
    assert_eq!(symbol_value(&session, "k"), Some(9));
    assert_eq!(session.object_code(), &[0x00, 0x12, 0x34]);
}

#[test]
fn test_relocated_symbols_reach_the_object_code() {
    let session = os(".BURN 0x00FF\nBR there\nthere: STOP\n.END\n");
    assert!(session.succeeded());
    assert_eq!(session.rom_start(), Some(Address::new(0x00FC)));
    assert_eq!(session.object_code(), &[0x12, 0x00, 0xFF, 0x00]);
}

#[test]
fn test_code_before_burn_is_a_warning() {
    let session = os("top: STOP\n.BURN 0x00FF\n.END\n");
    assert!(session.succeeded());
    assert_eq!(
        diagnostic_kinds(&session),
        vec![(
            2,
            DiagnosticKind::BurnPlacement(BurnPlacement::FollowsCode)
        )]
    );
    assert_eq!(symbol_value(&session, "top"), Some(0x00FF));
}

#[test]
fn test_alignment_in_operating_system_uses_final_addresses() {
    let session = os(".BURN 0xFFFF\n.BYTE 1\n.ALIGN 2\nx: .WORD 5\n.END\n");
    assert!(session.succeeded(), "{:?}", diagnostic_kinds(&session));
    assert_eq!(session.rom_start(), Some(Address::new(0xFFFD)));
    assert_eq!(symbol_value(&session, "x"), Some(0xFFFE));
    assert_eq!(session.object_code(), &[0x01, 0x00, 0x05]);
    assert_eq!(session.byte_count(), 3);
}

#[test]
fn test_alignment_which_cannot_end_on_burn_address() {
    // Starting on an even address needs a pad byte, which then makes
    // the program one byte too long; starting on an odd one leaves
    // the last byte of memory unused.
    let session = os(".BURN 0xFFFF\n.BYTE 1\n.ALIGN 2\nx: .WORD 5\n.BYTE 2\n.END\n");
    assert!(session.succeeded(), "{:?}", diagnostic_kinds(&session));
    let x = symbol_value(&session, "x").expect("x should be defined");
    assert_eq!(x % 2, 0);
    assert_eq!(x, 0xFFFC);
    assert_eq!(session.rom_start(), Some(Address::new(0xFFFB)));
    assert_eq!(session.object_code(), &[0x01, 0x00, 0x05, 0x02]);
    assert_eq!(session.byte_count(), session.object_code().len());
}

#[test]
fn test_alignment_pads_inside_operating_system() {
    let session = os(".BURN 0x00FF\nSTOP\n.ALIGN 4\nv: .WORD 7\nSTOP\n.END\n");
    assert!(session.succeeded(), "{:?}", diagnostic_kinds(&session));
    let v = symbol_value(&session, "v").expect("v should be defined");
    assert_eq!(v % 4, 0);
    let rom_start = session.rom_start().expect("should be placed");
    let end = usize::from(rom_start) + session.byte_count();
    assert!(end <= 0x100);
    assert_eq!(session.byte_count(), session.object_code().len());
}

#[test]
fn test_operating_system_needs_burn() {
    let session = os("STOP\n.END\n");
    assert!(!session.succeeded());
    assert_eq!(diagnostic_kinds(&session), vec![(2, DiagnosticKind::MissingBurn)]);
}

#[test]
fn test_second_burn_is_an_error() {
    let session = os(".BURN 0xFFFF\n.BURN 0xFFFF\nSTOP\n.END\n");
    assert!(!session.succeeded());
    assert_eq!(session.burn_count(), 2);
    assert_eq!(diagnostic_kinds(&session), vec![(2, DiagnosticKind::DuplicateBurn)]);
}

#[test]
fn test_operating_system_too_large_for_burn_address() {
    let session = os(".BURN 0x0001\n.BLOCK 4\n.END\n");
    assert!(!session.succeeded());
    assert_eq!(
        diagnostic_kinds(&session),
        vec![(
            1,
            DiagnosticKind::MemoryOverflow {
                address: Address::new(1),
                len: 4
            }
        )]
    );
    assert_eq!(session.rom_start(), None);
}

#[test]
fn test_adjust_code_list_leaves_object_code_alone() {
    let mut session = user("x: LDWA 5,i\nBR x\n.END\n");
    let code = session.object_code().to_vec();
    session.adjust_code_list(0x1000);
    assert_eq!(session.records()[1].address, Address::new(0x1003));
    assert_eq!(session.object_code(), code.as_slice());
    assert_eq!(symbol_value(&session, "x"), Some(0));
    session.adjust_code_list(-0x1000);
    assert_eq!(session.records()[1].address, Address::new(0x0003));
}

#[test]
fn test_trace_line_for_address() {
    let session = user(";intro\nLDWA 5,i\nSTOP\n.END\n");
    assert_eq!(session.trace_line_for_address(Address::new(3)), Some(2));
    assert_eq!(session.trace_line_for_address(Address::new(1)), None);
}

#[test]
fn test_last_record_ends_at_byte_count() {
    let session = assemble(
        "LDWA 5,i\nmsg: .ASCII \"hello\"\n.BLOCK 3\n.END\n",
        &AssemblyOptions::user_program_at(Address::new(0x20)),
    );
    assert!(session.succeeded());
    let first = session.records().first().expect("has records");
    let last = session.records().last().expect("has records");
    assert_eq!(
        usize::from(last.address) + last.width,
        usize::from(first.address) + session.byte_count()
    );
}

fn write_source(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("should be able to write the test source");
    path
}

#[test]
fn test_assemble_file_writes_object_code() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = write_source(&dir, "loop.pep", "START: LDWA 5,i\nBR START\n.END\n");
    let output = dir.path().join("loop.pepo");
    let session = assemble_file(
        input.as_os_str(),
        Some(output.as_path()),
        &AssemblyOptions::default(),
        OutputOptions::default(),
    )
    .expect("should be able to assemble the file");
    assert!(session.succeeded());
    assert_eq!(session.records().len(), 3);
    assert_eq!(session.records()[2].line, 3);
    assert_eq!(
        std::fs::read_to_string(&output).expect("object file should exist"),
        "C0 00 05 12 00 00 zz\n"
    );
}

#[test]
fn test_assemble_file_with_errors_writes_nothing() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = write_source(&dir, "bad.pep", "STOP\n");
    let output = dir.path().join("bad.pepo");
    let session = assemble_file(
        input.as_os_str(),
        Some(output.as_path()),
        &AssemblyOptions::default(),
        OutputOptions::default(),
    )
    .expect("reading the source should succeed");
    assert!(!session.succeeded());
    assert!(!output.exists());
}

#[test]
fn test_assemble_file_missing_input() {
    let dir = tempfile::tempdir().expect("should be able to create a temporary directory");
    let input = dir.path().join("absent.pep");
    let result = assemble_file(
        input.as_os_str(),
        None,
        &AssemblyOptions::default(),
        OutputOptions::default(),
    );
    assert!(matches!(
        result,
        Err(AssemblerFailure::IoErrorOnInput {
            line_number: None,
            ..
        })
    ));
}
