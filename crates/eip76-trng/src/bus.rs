//! Register bus abstraction
//!
//! The driver core is written against this trait so the same state machine
//! runs over real memory-mapped hardware ([`crate::MmioBus`]) and over the
//! simulated register model ([`crate::SimTrng`]) used in CI.

/// 32-bit register access to one EIP76 register window.
///
/// Implementations must perform single, non-coalesced accesses: the
/// hardware advances its internal state machine on specific reads and
/// writes, so accesses may not be cached, fused, or reordered relative to
/// program order.
pub trait RegisterBus: Send + Sync {
    /// Read the 32-bit register at `offset` bytes from the window base.
    fn read32(&self, offset: usize) -> u32;

    /// Write the 32-bit register at `offset` bytes from the window base.
    fn write32(&self, offset: usize, value: u32);
}
