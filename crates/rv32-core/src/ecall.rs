//! Environment-call handler contract and reference handlers.
//!
//! On an `ecall` the core suspends dispatch and hands the full register file
//! to the handler, which may mutate any register. The numeric convention is
//! caller-defined policy; [`HostConsole`] implements the one the software
//! simulator uses, [`SilentEcall`] the empty handler a hardware top wrapper
//! starts from.

use std::io::Write;

use crate::registers::{Registers, REG_A0, REG_A1};

/// Receives control on every `ecall` instruction.
///
/// The handler cannot redirect control flow: the core resumes at retirement
/// and the pc advances normally.
pub trait EcallHandler {
    /// Services one environment call against the live register file.
    fn handle(&mut self, regs: &mut Registers);
}

/// Host-console environment-call convention of the software simulator.
///
/// `a0` selects the behavior, `a1` supplies the value:
///
/// | selector | behavior                                        |
/// |----------|-------------------------------------------------|
/// | 0        | emit `a1`'s low byte as one character           |
/// | 1        | emit `a1` as a signed decimal integer + newline |
/// | other    | no-op                                           |
///
/// Host I/O failure is not a guest-visible condition, so write errors are
/// discarded.
#[derive(Debug)]
pub struct HostConsole<W: Write> {
    out: W,
}

impl<W: Write> HostConsole<W> {
    /// Wraps an output stream.
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Releases the output stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EcallHandler for HostConsole<W> {
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    fn handle(&mut self, regs: &mut Registers) {
        let argument = regs.read(REG_A1);
        match regs.read(REG_A0) {
            0 => {
                let _ = self.out.write_all(&[argument as u8]);
            }
            1 => {
                let _ = writeln!(self.out, "{}", argument as i32);
            }
            _ => {}
        }
    }
}

/// Handler that ignores every environment call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentEcall;

impl EcallHandler for SilentEcall {
    fn handle(&mut self, _regs: &mut Registers) {}
}
