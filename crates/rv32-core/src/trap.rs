use thiserror::Error;

use crate::decode::DecodeError;

/// Causes routed through the core's single trap entry point.
///
/// The set is closed: every exceptional condition the core can detect maps to
/// exactly one of these tags. `Breakpoint` is the only resumable cause; the
/// other two latch the core in [`CoreState::Trapped`](crate::CoreState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TrapCause {
    /// Explicit `ebreak` instruction.
    #[error("breakpoint")]
    Breakpoint,
    /// Data or fetch access that violated the width's alignment rule.
    #[error("misaligned memory access at {addr:#010x}")]
    MisalignedAccess {
        /// The offending effective address.
        addr: u32,
    },
    /// Decoder rejected an instruction encoding.
    #[error("unrecognized instruction encoding {word:#010x}")]
    DecodeFailure {
        /// The raw instruction word that failed to decode.
        word: u32,
    },
}

impl TrapCause {
    /// Returns `true` for causes that permanently halt forward progress.
    ///
    /// Breakpoints are reported to the caller and execution may continue;
    /// everything else is terminal under the current policy.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Breakpoint)
    }
}

impl From<DecodeError> for TrapCause {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Unrecognized(word) => Self::DecodeFailure { word },
        }
    }
}

/// A fault record: the cause plus the pc of the faulting instruction.
///
/// A terminal trap halts forward progress but stays observable through
/// [`CoreState::Trapped`](crate::CoreState), so callers can report the cause
/// and location instead of watching a hung core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("trap at pc {pc:#010x}: {cause}")]
pub struct Trap {
    /// What went wrong.
    pub cause: TrapCause,
    /// Program counter of the instruction that trapped.
    pub pc: u32,
}
