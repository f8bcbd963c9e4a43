//! CLI entry point for the RV32I simulator binary.
//!
//! Loads a flat binary memory image, constructs a software-backed core with
//! the host-console environment-call handler, and runs until the guest
//! reaches a breakpoint (clean termination) or a terminal trap.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::PathBuf;

use rv32_core::{Core, HostConsole, Ram, StepOutcome};

/// Default memory size in bytes (64 KiB).
const DEFAULT_MEMORY_BYTES: u32 = 1 << 16;

const USAGE_TEXT: &str = "\
Usage: rv32-sim [options] <image>

Runs a flat RV32I binary image from address 0 until the guest executes
an ebreak (exit 0) or raises a fault (diagnostic on stderr, exit 1).

Options:
  -m, --memory <bytes>  Memory size in bytes (default: 65536)
  -t, --trace           Print pc and mnemonic of each instruction to stderr
  -h, --help            Show this help message

Examples:
  rv32-sim program.bin
  rv32-sim --trace -m 131072 program.bin
";

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    image: PathBuf,
    memory_bytes: u32,
    trace: bool,
}

#[derive(Debug)]
enum ParseResult {
    Run(RunArgs),
    Help,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut image: Option<PathBuf> = None;
    let mut memory_bytes = DEFAULT_MEMORY_BYTES;
    let mut trace = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--trace" || arg == "-t" {
            trace = true;
            continue;
        }

        if arg == "-m" || arg == "--memory" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -m".to_string())?;
            let value = value.to_string_lossy();
            memory_bytes = value
                .parse::<u32>()
                .map_err(|_| format!("invalid memory size: {value}"))?;
            if memory_bytes % 4 != 0 {
                return Err(format!("memory size must be word aligned: {value}"));
            }
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if image.is_some() {
            return Err("multiple image paths provided".to_string());
        }
        image = Some(PathBuf::from(arg));
    }

    let image = image.ok_or_else(|| "missing image path".to_string())?;
    Ok(ParseResult::Run(RunArgs {
        image,
        memory_bytes,
        trace,
    }))
}

fn run(args: &RunArgs) -> Result<(), i32> {
    let image = fs::read(&args.image).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", args.image.display());
        1
    })?;

    let mut ram = Ram::new(args.memory_bytes);
    ram.load_image(&image).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    let mut console = HostConsole::new(io::stdout());
    let mut core = Core::new(&mut ram, &mut console);

    loop {
        match core.step() {
            StepOutcome::Retired { pc, op } => {
                if args.trace {
                    eprintln!("{pc:#010x}\t{}", op.mnemonic());
                }
            }
            StepOutcome::Breakpoint { .. } => return Ok(()),
            StepOutcome::Trapped(trap) => {
                eprintln!("error: {trap}");
                return Err(1);
            }
        }
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => match run(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
