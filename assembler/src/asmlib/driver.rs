//! The two-pass assembler.
//!
//! [`assemble`] runs the whole pipeline over a source text and
//! returns an [`AssemblySession`].  Pass 1 assigns addresses and
//! builds the symbol table; pass 2 generates code.  Neither pass
//! stops at the first problem; diagnostics are attached to the line
//! they concern and the session is failed if any of them is an error.
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tracing::{event, span, Level};

use base::prelude::*;

use super::ast::lower::{lower, Lowered};
use super::ast::{CodeKind, CodeRecord, Operand};
use super::diagnostic::{
    merge, AddressingModeProblem, BurnPlacement, Diagnostic, DiagnosticKind,
};
use super::listing::{self, ListingLine, TraceLine};
use super::parser::parse_source_line;
use super::source::Source;
use super::state::AssemblyPhase;
use super::symbol::SymbolName;
use super::symtab::{SymbolDefinition, SymbolTable};
use super::types::AssemblerFailure;

mod output;
#[cfg(test)]
mod tests;

pub use output::{format_object_code, write_object_code};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    #[default]
    User,
    OperatingSystem,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AssemblyOptions {
    pub kind: ProgramKind,
    /// Where a user program starts.  Operating systems are placed by
    /// their `.BURN` directive instead.
    pub load_address: Address,
}

impl AssemblyOptions {
    pub fn user_program_at(load_address: Address) -> AssemblyOptions {
        AssemblyOptions {
            kind: ProgramKind::User,
            load_address,
        }
    }

    pub fn operating_system() -> AssemblyOptions {
        AssemblyOptions {
            kind: ProgramKind::OperatingSystem,
            load_address: Address::ZERO,
        }
    }

    fn start_address(&self) -> Address {
        match self.kind {
            ProgramKind::User => self.load_address,
            ProgramKind::OperatingSystem => Address::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// When set, print the assembler listing on stdout.
    pub list: bool,
}

/// Everything one run of the assembler produces.
#[derive(Debug, Clone)]
pub struct AssemblySession {
    options: AssemblyOptions,
    records: Vec<CodeRecord>,
    symtab: SymbolTable,
    object_code: Vec<u8>,
    byte_count: usize,
    burn_count: usize,
    burn_address: Option<Address>,
    rom_start: Option<Address>,
    phase: AssemblyPhase,
    show_diagnostics: bool,
}

impl AssemblySession {
    fn new(options: AssemblyOptions) -> AssemblySession {
        AssemblySession {
            options,
            records: Vec::new(),
            symtab: SymbolTable::new(),
            object_code: Vec::new(),
            byte_count: 0,
            burn_count: 0,
            burn_address: None,
            rom_start: None,
            phase: AssemblyPhase::NotStarted,
            show_diagnostics: true,
        }
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    pub fn phase(&self) -> AssemblyPhase {
        self.phase
    }

    /// True when both passes ran and no line has an error.  Warnings
    /// do not count.
    pub fn succeeded(&self) -> bool {
        self.phase.is_finished() && !self.records.iter().any(CodeRecord::has_error)
    }

    pub fn records(&self) -> &[CodeRecord] {
        &self.records
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symtab
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter_map(|r| r.diagnostic.as_ref())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics().filter(|d| d.is_error())
    }

    pub fn object_code(&self) -> &[u8] {
        &self.object_code
    }

    /// Length of the object code, counted before any relocation.
    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    /// Number of `.BURN` directives in the program.
    pub fn burn_count(&self) -> usize {
        self.burn_count
    }

    pub fn burn_address(&self) -> Option<Address> {
        self.burn_address
    }

    /// For an operating system, the address of its first byte.
    pub fn rom_start(&self) -> Option<Address> {
        self.rom_start
    }

    /// Address of the first record, which is where the object code
    /// belongs in memory.
    pub fn start_address(&self) -> Option<Address> {
        self.records.first().map(|r| r.address)
    }

    /// Shift the address of every record (and so every listing line)
    /// by `delta`.  The object code and symbol table are unchanged.
    /// Successive shifts accumulate.
    pub fn adjust_code_list(&mut self, delta: i32) {
        event!(Level::DEBUG, "relocating code list by {delta}");
        for record in &mut self.records {
            record.address = record.address.index_by(delta);
        }
    }

    /// Stop showing diagnostics in the listing.  The diagnostics
    /// themselves are kept, so [`AssemblySession::succeeded`] is
    /// unaffected.
    pub fn remove_error_messages(&mut self) {
        self.show_diagnostics = false;
    }

    pub fn listing_lines(&self) -> Vec<ListingLine> {
        listing::body_lines(&self.records)
    }

    pub fn assembler_listing_list(&self) -> Vec<String> {
        listing::render_listing(&self.records, &self.symtab, self.show_diagnostics)
    }

    pub fn trace_lines(&self) -> Vec<TraceLine> {
        self.listing_lines().into_iter().map(TraceLine::from).collect()
    }

    pub fn listing_trace_list(&self) -> Vec<String> {
        self.listing_lines()
            .into_iter()
            .map(|line| line.source)
            .collect()
    }

    pub fn has_check_box(&self) -> Vec<bool> {
        self.listing_lines()
            .into_iter()
            .map(|line| line.has_check_box)
            .collect()
    }

    /// Index in the trace list of the instruction which starts at
    /// `addr`.
    pub fn trace_line_for_address(&self, addr: Address) -> Option<usize> {
        self.listing_lines()
            .iter()
            .position(|line| line.has_check_box && line.address == Some(addr))
    }

    fn error_count(&self) -> usize {
        self.errors().count()
    }
}

fn unparsed(msg: String) -> Lowered {
    Lowered {
        label: None,
        kind: CodeKind::Unparsed,
        mnemonic: String::new(),
        operand: String::new(),
        comment: None,
        problem: Some(DiagnosticKind::Syntax(msg)),
    }
}

fn parse_lines(source: &str) -> Vec<CodeRecord> {
    let mut records: Vec<CodeRecord> = Vec::new();
    let mut end_seen = false;
    for line in Source::new(source).lines() {
        let lowered = match parse_source_line(line.text) {
            Ok(parsed) => lower(line.text, parsed),
            Err(msg) => unparsed(msg),
        };
        let mut record = CodeRecord {
            line: line.number,
            source: line.text.to_string(),
            label: lowered.label,
            kind: lowered.kind,
            mnemonic: lowered.mnemonic,
            operand: lowered.operand,
            comment: lowered.comment,
            address: Address::ZERO,
            width: 0,
            bytes: Vec::new(),
            diagnostic: lowered
                .problem
                .map(|problem| Diagnostic::new(line.number, problem)),
        };
        if end_seen && record.kind != CodeKind::CommentOnly {
            record.kind = CodeKind::Unparsed;
            record.label = None;
            merge(
                &mut record.diagnostic,
                Diagnostic::new(line.number, DiagnosticKind::TextAfterEnd),
            );
        }
        if record.kind == CodeKind::End {
            end_seen = true;
        }
        records.push(record);
    }
    if !end_seen {
        if let Some(last) = records.last_mut() {
            merge(
                &mut last.diagnostic,
                Diagnostic::new(last.line, DiagnosticKind::MissingEnd),
            );
        }
    }
    records
}

fn attach(record: &mut CodeRecord, kind: DiagnosticKind) {
    merge(&mut record.diagnostic, Diagnostic::new(record.line, kind));
}

/// The address counter can reach the end of memory exactly, in which
/// case any following (empty) records sit at address zero.
fn address_at(counter: usize) -> Address {
    Address::try_from(counter % Address::SPACE).unwrap_or_default()
}

/// Does this record put code or initialised data into memory (as
/// opposed to merely reserving space)?
fn generates_code(kind: &CodeKind) -> bool {
    matches!(
        kind,
        CodeKind::UnaryInstruction { .. }
            | CodeKind::NonUnaryInstruction { .. }
            | CodeKind::AsciiBytes { .. }
            | CodeKind::Addrss { .. }
            | CodeKind::Byte { .. }
            | CodeKind::Word { .. }
    )
}

fn pass1(session: &mut AssemblySession) {
    let span = span!(Level::DEBUG, "pass 1");
    let _enter = span.enter();

    let start = usize::from(session.options.start_address());
    let mut counter: usize = start;
    let mut code_seen = false;
    let mut burn_index: Option<usize> = None;
    for (index, record) in session.records.iter_mut().enumerate() {
        record.address = address_at(counter);
        let width = record.kind.width_at(counter);
        if counter + width > Address::SPACE {
            attach(
                record,
                DiagnosticKind::MemoryOverflow {
                    address: record.address,
                    len: width,
                },
            );
            record.kind = CodeKind::Unparsed;
            record.width = 0;
        } else {
            record.width = width;
            counter += width;
        }

        if let Some(name) = record.label.clone() {
            let (value, definition) = match record.kind {
                CodeKind::Equate { value } => (value, SymbolDefinition::Equate),
                _ => (u16::from(record.address), SymbolDefinition::Address),
            };
            if session
                .symtab
                .define(name.clone(), value, definition, record.line)
                .is_err()
            {
                attach(record, DiagnosticKind::DuplicateSymbol(name));
            }
        }

        if let CodeKind::Burn { target } = record.kind {
            session.burn_count += 1;
            if session.burn_count > 1 {
                attach(record, DiagnosticKind::DuplicateBurn);
            } else {
                match session.options.kind {
                    ProgramKind::User => attach(
                        record,
                        DiagnosticKind::BurnPlacement(BurnPlacement::IgnoredInUserProgram),
                    ),
                    ProgramKind::OperatingSystem => {
                        session.burn_address = Some(target);
                        burn_index = Some(index);
                        if code_seen {
                            attach(
                                record,
                                DiagnosticKind::BurnPlacement(BurnPlacement::FollowsCode),
                            );
                        }
                    }
                }
            }
        }
        code_seen = code_seen || (generates_code(&record.kind) && record.width > 0);
    }
    session.byte_count = counter - start;

    // Every definition of a multiply-defined symbol is an error, not
    // just the second.
    for record in &mut session.records {
        if let Some(name) = &record.label {
            if session
                .symtab
                .get(name)
                .is_some_and(|entry| entry.multiply_defined)
            {
                let name = name.clone();
                attach(record, DiagnosticKind::DuplicateSymbol(name));
            }
        }
    }

    if session.options.kind == ProgramKind::OperatingSystem {
        match (burn_index, session.burn_address) {
            (Some(index), Some(target)) => place_by_burn(session, index, target),
            _ => {
                if let Some(last) = session.records.last_mut() {
                    attach(last, DiagnosticKind::MissingBurn);
                }
            }
        }
    }
    event!(
        Level::DEBUG,
        "pass 1 assigned {} bytes; burn count {}",
        session.byte_count,
        session.burn_count
    );
}

/// `.ALIGN` boundaries all divide this, so the length of a program
/// depends only on its start address modulo `ALIGN_PERIOD`.
const ALIGN_PERIOD: usize = 8;

/// Length of the program when it is laid out from `start`.
fn image_length(records: &[CodeRecord], start: usize) -> usize {
    records
        .iter()
        .fold(start, |counter, record| counter + record.kind.width_at(counter))
        - start
}

/// The highest start address from which the program ends at or
/// before `end`, together with its length from there.  When `.ALIGN`
/// padding makes an exact fit impossible, the program ends a little
/// short of `end`.
fn rom_placement(records: &[CodeRecord], end: usize) -> Option<(usize, usize)> {
    (0..ALIGN_PERIOD)
        .filter_map(|residue| {
            let len = image_length(records, residue);
            let latest = end.checked_sub(len)?;
            let start = latest.checked_sub((latest + ALIGN_PERIOD - residue) % ALIGN_PERIOD)?;
            Some((start, len))
        })
        .max_by_key(|(start, _)| *start)
}

/// Lay an operating system out again so that its last byte lands on
/// the `.BURN` address.
fn place_by_burn(session: &mut AssemblySession, burn_index: usize, target: Address) {
    let end = usize::from(target) + 1;
    let Some((rom_start, len)) = rom_placement(&session.records, end) else {
        let len = session.byte_count;
        if let Some(record) = session.records.get_mut(burn_index) {
            attach(
                record,
                DiagnosticKind::MemoryOverflow {
                    address: target,
                    len,
                },
            );
        }
        return;
    };
    let mut counter = rom_start;
    for record in &mut session.records {
        record.address = address_at(counter);
        record.width = record.kind.width_at(counter);
        counter += record.width;
        if let Some(name) = &record.label {
            session.symtab.place(name, record.line, record.address);
        }
    }
    if len != session.byte_count {
        event!(
            Level::DEBUG,
            "alignment changed the operating system from {} to {len} bytes",
            session.byte_count
        );
    }
    session.byte_count = len;
    session.rom_start = Address::try_from(rom_start).ok();
    event!(
        Level::INFO,
        "operating system of {len} bytes placed at {rom_start:04X} by .BURN {target}",
    );
}

fn resolve(operand: &Operand, symtab: &SymbolTable) -> Result<u16, DiagnosticKind> {
    match operand {
        Operand::Value(value) => Ok(*value),
        Operand::Symbol(name) => symtab
            .value_of(name)
            .ok_or_else(|| DiagnosticKind::UndefinedSymbol(name.clone())),
    }
}

fn generate(record: &CodeRecord, symtab: &SymbolTable) -> Result<Vec<u8>, DiagnosticKind> {
    match &record.kind {
        CodeKind::UnaryInstruction { mnemonic } => encode(*mnemonic, None, 0).ok_or_else(|| {
            DiagnosticKind::Syntax(format!("{mnemonic} cannot be encoded."))
        }),
        CodeKind::NonUnaryInstruction {
            mnemonic,
            operand,
            mode,
        } => {
            let value = resolve(operand, symtab)?;
            encode(*mnemonic, Some(*mode), value).ok_or_else(|| {
                DiagnosticKind::InvalidAddressingMode {
                    mnemonic: *mnemonic,
                    problem: AddressingModeProblem::Illegal(*mode),
                }
            })
        }
        CodeKind::Addrss { symbol } => {
            resolve(&Operand::Symbol(symbol.clone()), symtab).map(|v| v.to_be_bytes().to_vec())
        }
        CodeKind::Align { .. } | CodeKind::BlockStorage { .. } => Ok(vec![0; record.width]),
        CodeKind::AsciiBytes { bytes } => Ok(bytes.clone()),
        CodeKind::Byte { value } => Ok(vec![*value]),
        CodeKind::Word { value } => Ok(value.to_be_bytes().to_vec()),
        CodeKind::Equate { .. }
        | CodeKind::Burn { .. }
        | CodeKind::End
        | CodeKind::CommentOnly
        | CodeKind::Unparsed => Ok(Vec::new()),
    }
}

fn undefined_symbol(kind: &DiagnosticKind) -> Option<&SymbolName> {
    match kind {
        DiagnosticKind::UndefinedSymbol(name) => Some(name),
        _ => None,
    }
}

fn pass2(session: &mut AssemblySession) {
    let span = span!(Level::DEBUG, "pass 2");
    let _enter = span.enter();

    let AssemblySession {
        records, symtab, ..
    } = session;
    for record in records.iter_mut() {
        match generate(record, symtab) {
            Ok(bytes) => {
                record.bytes = bytes;
            }
            Err(problem) => {
                if let Some(name) = undefined_symbol(&problem) {
                    symtab.note_undefined(name, record.line);
                }
                attach(record, problem);
                // Keep every record at its assigned width so that
                // later addresses still line up with the object code.
                record.bytes = vec![0; record.width];
            }
        }
    }
    session.object_code = session
        .records
        .iter()
        .flat_map(|r| r.bytes.iter().copied())
        .collect();
}

/// Run both passes over `source`.
#[must_use]
pub fn assemble(source: &str, options: &AssemblyOptions) -> AssemblySession {
    let span = span!(Level::INFO, "assemble", kind = ?options.kind);
    let _enter = span.enter();

    let mut session = AssemblySession::new(*options);
    session.phase = session.phase.next(false);
    session.records = parse_lines(source);
    let mut errors = session.error_count();
    session.phase = session.phase.next(errors > 0);
    event!(
        Level::DEBUG,
        "parsed {} lines, phase {}",
        session.records.len(),
        session.phase
    );

    session.phase = session.phase.next(false);
    pass1(&mut session);
    let pass1_errors = session.error_count();
    session.phase = session.phase.next(pass1_errors > errors);
    errors = pass1_errors;

    session.phase = session.phase.next(false);
    pass2(&mut session);
    session.phase = session.phase.next(session.error_count() > errors);

    if session.succeeded() {
        event!(
            Level::INFO,
            "assembled {} bytes of object code",
            session.object_code.len()
        );
    } else {
        for diagnostic in session.diagnostics() {
            event!(
                Level::DEBUG,
                line = diagnostic.line,
                severity = %diagnostic.severity,
                "{}",
                diagnostic.kind
            );
        }
        event!(
            Level::WARN,
            "assembly failed with {} errors",
            session.error_count()
        );
    }
    session
}

fn read_source(input_file: &OsStr) -> Result<String, AssemblerFailure> {
    let input: File = OpenOptions::new()
        .read(true)
        .open(input_file)
        .map_err(|e| AssemblerFailure::IoErrorOnInput {
            filename: input_file.to_owned(),
            error: e,
            line_number: None,
        })?;
    let mut body = String::new();
    for (input_item, line) in BufReader::new(input).lines().zip(1..) {
        match input_item {
            Err(e) => {
                return Err(AssemblerFailure::IoErrorOnInput {
                    filename: input_file.to_owned(),
                    error: e,
                    line_number: Some(line),
                });
            }
            Ok(source_line) => {
                body.push_str(&source_line);
                body.push('\n');
            }
        }
    }
    Ok(body)
}

/// Assemble the file `input_file`.  The object code is written to
/// `output_file` (if given) only when assembly succeeds.  Whether it
/// did is reported by the returned session; the error return is kept
/// for failures to read or write files.
///
/// # Errors
///
/// Failure to read the input, to write the object file or to write
/// the listing on stdout.
pub fn assemble_file(
    input_file: &OsStr,
    output_file: Option<&Path>,
    assembly_options: &AssemblyOptions,
    output_options: OutputOptions,
) -> Result<AssemblySession, AssemblerFailure> {
    let source = read_source(input_file)?;
    let session = assemble(&source, assembly_options);

    if output_options.list {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        for line in session.assembler_listing_list() {
            writeln!(handle, "{line}")
                .map_err(|error| AssemblerFailure::IoErrorOnStdout { error })?;
        }
    }

    if let Some(output_file) = output_file {
        if session.succeeded() {
            let mut writer =
                File::create(output_file).map_err(|error| AssemblerFailure::IoErrorOnOutput {
                    filename: output_file.to_path_buf(),
                    error,
                })?;
            write_object_code(&mut writer, output_file, session.object_code())?;
        } else {
            event!(
                Level::INFO,
                "not writing {} because assembly failed",
                output_file.display()
            );
        }
    }
    Ok(session)
}
