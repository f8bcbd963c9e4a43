//! Alignment-checked memory access and sub-word composition.
//!
//! The [`MemoryPort`] is word-granular and trap free, so this layer is the
//! last line of defense for alignment: word accesses trap unless `addr % 4 ==
//! 0`, halfword accesses unless `addr % 2 == 0`. Bytes and halfwords are not
//! port primitives; they are composed from the containing word at bit offset
//! `8 * (addr & 3)` (bytes) or `8 * (addr & 2)` (halfwords), with sub-word
//! stores performing a read-modify-write of that word.

#![allow(clippy::cast_possible_truncation)]

use super::MemoryPort;
use crate::trap::TrapCause;

/// Reads an aligned 32-bit word.
///
/// # Errors
///
/// Returns [`TrapCause::MisalignedAccess`] when `addr % 4 != 0`.
pub fn read_word<M: MemoryPort>(mem: &mut M, addr: u32) -> Result<u32, TrapCause> {
    check_word_aligned(addr)?;
    Ok(mem.read_word(addr))
}

/// Writes an aligned 32-bit word.
///
/// # Errors
///
/// Returns [`TrapCause::MisalignedAccess`] when `addr % 4 != 0`.
pub fn write_word<M: MemoryPort>(mem: &mut M, addr: u32, value: u32) -> Result<(), TrapCause> {
    check_word_aligned(addr)?;
    mem.write_word(addr, value);
    Ok(())
}

/// Reads the halfword at an even address.
///
/// # Errors
///
/// Returns [`TrapCause::MisalignedAccess`] when `addr % 2 != 0`.
pub fn read_half<M: MemoryPort>(mem: &mut M, addr: u32) -> Result<u16, TrapCause> {
    check_half_aligned(addr)?;
    let word = mem.read_word(addr & !3);
    Ok((word >> (8 * (addr & 2))) as u16)
}

/// Reads the byte at any address.
///
/// Never misaligns: the containing word address is aligned by construction.
///
/// # Errors
///
/// Infallible today; kept fallible so all data accesses share one signature.
pub fn read_byte<M: MemoryPort>(mem: &mut M, addr: u32) -> Result<u8, TrapCause> {
    let word = mem.read_word(addr & !3);
    Ok((word >> (8 * (addr & 3))) as u8)
}

/// Writes the halfword at an even address via read-modify-write.
///
/// # Errors
///
/// Returns [`TrapCause::MisalignedAccess`] when `addr % 2 != 0`.
pub fn write_half<M: MemoryPort>(mem: &mut M, addr: u32, value: u16) -> Result<(), TrapCause> {
    check_half_aligned(addr)?;
    let offset = 8 * (addr & 2);
    let mut word = mem.read_word(addr & !3);
    word &= !(0xFFFF << offset);
    word |= u32::from(value) << offset;
    mem.write_word(addr & !3, word);
    Ok(())
}

/// Writes the byte at any address via read-modify-write.
///
/// # Errors
///
/// Infallible today; kept fallible so all data accesses share one signature.
pub fn write_byte<M: MemoryPort>(mem: &mut M, addr: u32, value: u8) -> Result<(), TrapCause> {
    let offset = 8 * (addr & 3);
    let mut word = mem.read_word(addr & !3);
    word &= !(0xFF << offset);
    word |= u32::from(value) << offset;
    mem.write_word(addr & !3, word);
    Ok(())
}

const fn check_word_aligned(addr: u32) -> Result<(), TrapCause> {
    if addr & 3 == 0 {
        Ok(())
    } else {
        Err(TrapCause::MisalignedAccess { addr })
    }
}

const fn check_half_aligned(addr: u32) -> Result<(), TrapCause> {
    if addr & 1 == 0 {
        Ok(())
    } else {
        Err(TrapCause::MisalignedAccess { addr })
    }
}
