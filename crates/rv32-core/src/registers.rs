/// Number of architectural integer registers (`x0..x31`).
pub const REGISTER_COUNT: usize = 32;

/// Conventional stack pointer register index (`x2`/`sp`).
pub const REG_SP: u8 = 2;
/// Environment-call selector register index (`x10`/`a0`).
pub const REG_A0: u8 = 10;
/// Environment-call argument register index (`x11`/`a1`).
pub const REG_A1: u8 = 11;

/// The RV32I integer register file.
///
/// Register 0 is hardwired to zero: writes to index 0 are accepted and
/// discarded, so any later read observes zero regardless of what the guest
/// (or an environment-call handler) attempted to store there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Registers {
    regs: [u32; REGISTER_COUNT],
}

impl Registers {
    /// Reads register `index`. Index 0 always reads as zero.
    ///
    /// # Panics
    ///
    /// Panics when `index >= 32`; the decoder only produces 5-bit indices, so
    /// an out-of-range index is an implementation invariant violation.
    #[must_use]
    pub const fn read(&self, index: u8) -> u32 {
        self.regs[index as usize]
    }

    /// Writes register `index`. A write to index 0 is discarded.
    ///
    /// # Panics
    ///
    /// Panics when `index >= 32` (implementation invariant violation, as for
    /// [`Self::read`]).
    pub const fn write(&mut self, index: u8, value: u32) {
        if index != 0 {
            self.regs[index as usize] = value;
        }
    }
}
