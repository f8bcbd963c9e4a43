//! RV32I execution core with pluggable word-memory ports.
//!
//! One execution-semantics description drives two realizations: a software
//! simulator backed by an in-process byte buffer, and a synthesized core
//! driving a clocked external memory bus. The seam between them is the
//! word-granular [`MemoryPort`]; everything above it (alignment enforcement,
//! sub-word composition, decode, dispatch, traps, environment calls) is
//! shared and bit-exact across both.

/// The fetch-decode-dispatch-retire state machine.
pub mod core;
pub use crate::core::{Core, CoreState, RunExit, StepOutcome};

/// RV32I instruction decoder contract and implementation.
pub mod decode;
pub use decode::{decode, DecodeError, Instruction, Opcode};

/// Environment-call handler contract and reference handlers.
pub mod ecall;
pub use ecall::{EcallHandler, HostConsole, SilentEcall};

/// Memory ports and the sub-word access composition.
pub mod mem;
pub use mem::{BusPort, ImageError, MemoryBus, MemoryPort, Ram};

/// Architectural register file.
pub mod registers;
pub use registers::{Registers, REGISTER_COUNT, REG_A0, REG_A1, REG_SP};

/// Trap taxonomy and fault records.
pub mod trap;
pub use trap::{Trap, TrapCause};
