use std::error::Error;
use std::ffi::OsString;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use clap::ArgAction::{Set, SetTrue};
use clap::Parser;
use tracing::{event, span, Level};
use tracing_subscriber::prelude::*;

use assembler::*;
use base::prelude::Address;

/// Assembler for the Pep/9 virtual machine
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Cli {
    /// File from which assembly source is read.
    #[clap(action = Set)]
    input: OsString,

    /// File to which object code is written.  Nothing is written if
    /// the program has errors.
    #[clap(action = Set, short = 'o', long)]
    output: Option<OsString>,

    /// Print the assembler listing on standard output.
    #[clap(action = SetTrue, long)]
    list: bool,

    /// Assemble an operating system, placed in memory by its .BURN
    /// directive.
    #[clap(action = SetTrue, long)]
    os: bool,

    /// Address at which a user program starts (decimal, or hex with a
    /// 0x prefix).
    #[clap(action = Set, long, default_value = "0", value_parser = parse_address)]
    load_address: Address,
}

fn parse_address(s: &str) -> Result<Address, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed
        .map(Address::new)
        .map_err(|e| format!("{s} is not a valid address: {e}"))
}

#[derive(Debug)]
enum Fail {
    /// We could not read the input or write the output.
    AsmFail(AssemblerFailure),
    /// The program has errors.
    Rejected(usize),
    /// We were not able to correctly initialise the assembler.
    InitialisationFailure(String),
}

impl Display for Fail {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Fail::AsmFail(assembler_failure) => assembler_failure.fmt(f),
            Fail::Rejected(1) => f.write_str("the program has an error"),
            Fail::Rejected(n) => write!(f, "the program has {n} errors"),
            Fail::InitialisationFailure(msg) => f.write_str(msg.as_str()),
        }
    }
}

impl Error for Fail {}

fn run_assembler() -> Result<(), Fail> {
    let cli = Cli::parse();

    // Set RUST_LOG to select which trace messages get printed; see
    // the tracing_subscriber::EnvFilter documentation.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    let filter_layer = match tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
    {
        Err(e) => {
            return Err(Fail::InitialisationFailure(format!(
                "failed to initialise tracing filter (perhaps there is a problem with environment variables): {e}"
            )));
        }
        Ok(layer) => layer,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let span = span!(Level::ERROR, "assemble", input=?cli.input, output=?cli.output);
    let _enter = span.enter();
    let assembly_options = if cli.os {
        AssemblyOptions::operating_system()
    } else {
        AssemblyOptions::user_program_at(cli.load_address)
    };
    let output_path: Option<PathBuf> = cli.output.map(PathBuf::from);
    let output_options = OutputOptions { list: cli.list };
    let session = assemble_file(
        &cli.input,
        output_path.as_deref(),
        &assembly_options,
        output_options,
    )
    .map_err(Fail::AsmFail)?;

    let mut errors = 0;
    for line in session.listing_lines() {
        if let Some(diagnostic) = &line.diagnostic {
            eprintln!("{}", annotate(&line.source, diagnostic));
            if diagnostic.is_error() {
                errors += 1;
            }
        }
    }
    if session.succeeded() {
        event!(Level::INFO, "assembly succeeded");
        Ok(())
    } else {
        Err(Fail::Rejected(errors))
    }
}

fn main() {
    unsafe { backtrace_on_stack_overflow::enable() };

    match run_assembler() {
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}
