use super::MemoryPort;

/// Signal-level contract of the synchronous external memory bus.
///
/// An implementation owns the physical pins: a word-index address line, a
/// write-data line, a write-enable line, a read-data line, and the clock.
/// [`BusPort`] drives these in the fixed single-request/single-response
/// protocol; implementations only latch and present values.
pub trait MemoryBus {
    /// Drives the address line with a *word* index (byte address >> 2).
    fn set_address(&mut self, word_index: u32);

    /// Drives the write-data line.
    fn set_write_data(&mut self, value: u32);

    /// Asserts or deasserts the write-enable line.
    fn set_write_enable(&mut self, enable: bool);

    /// Samples the read-data line.
    fn read_data(&self) -> u32;

    /// Advances the bus by one clock unit.
    fn clock(&mut self);
}

/// Hardware memory realization: adapts a [`MemoryBus`] to [`MemoryPort`].
///
/// A read drives the address, waits one clock, and samples the returned
/// data. A write drives address, data, and write-enable for exactly one
/// clock, then deasserts write-enable. The execution core never sees the
/// difference between this and a software buffer.
#[derive(Debug)]
pub struct BusPort<B: MemoryBus> {
    bus: B,
    size: u32,
}

impl<B: MemoryBus> BusPort<B> {
    /// Wraps a bus fronting `size` bytes of external memory.
    pub const fn new(bus: B, size: u32) -> Self {
        Self { bus, size }
    }

    /// Releases the underlying bus.
    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B: MemoryBus> MemoryPort for BusPort<B> {
    fn size(&self) -> u32 {
        self.size
    }

    fn read_word(&mut self, addr: u32) -> u32 {
        self.bus.set_address(addr >> 2);
        self.bus.clock();
        self.bus.read_data()
    }

    fn write_word(&mut self, addr: u32, value: u32) {
        self.bus.set_address(addr >> 2);
        self.bus.set_write_data(value);
        self.bus.set_write_enable(true);
        self.bus.clock();
        self.bus.set_write_enable(false);
    }
}
