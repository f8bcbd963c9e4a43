//! Word-addressable memory ports and the sub-word access composition.
//!
//! A [`MemoryPort`] is a pure bit-transfer primitive: word-granular, trap
//! free, defined only for word-aligned addresses. Alignment enforcement and
//! byte/halfword composition live in [`access`], so the execution core drives
//! a software buffer ([`ram::Ram`]) and a clocked external bus
//! ([`bus::BusPort`]) through identical code.

/// Alignment-checked word access plus byte/halfword composition.
pub mod access;
/// Clocked external-bus realization of the port.
pub mod bus;
/// Software byte-buffer realization of the port.
pub mod ram;

pub use bus::{BusPort, MemoryBus};
pub use ram::{ImageError, Ram};

/// A 32-bit-word-addressable memory.
///
/// Both operations are defined only for `addr % 4 == 0`; callers go through
/// [`access`], which checks alignment and raises the misaligned-access trap
/// before the port ever sees the address. The port itself has no knowledge of
/// byte or halfword semantics.
pub trait MemoryPort {
    /// Total backing size in bytes.
    fn size(&self) -> u32;

    /// Reads the word at a word-aligned byte address.
    fn read_word(&mut self, addr: u32) -> u32;

    /// Writes the word at a word-aligned byte address.
    fn write_word(&mut self, addr: u32, value: u32);
}
