//! EIP76 driver core
//!
//! Owns the entropy acquisition state machine: bring-up, the
//! readiness/alarm polling loop, FRO shutdown recovery, and the 16-byte
//! FIFO that turns 128-bit device reads into an arbitrary-length byte
//! stream for callers.

use crate::bus::RegisterBus;
use crate::error::{Result, TrngError};
use crate::mmio::MmioBus;
use eip76_chip::regs;
use eip76_chip::regs::{config, control, status, tunables};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default bound on the readiness polling loop. A healthy block refills
/// in microseconds; a full second of polling means the FROs are dead.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

const FIFO_BYTES: usize = regs::SAMPLE_BYTES;

/// Byte FIFO fed by 128-bit device reads.
///
/// `pos == 0` means the buffer is stale and must be refilled before any
/// byte is consumed; otherwise bytes at `[pos, 16)` hold produced but
/// not-yet-consumed entropy. Consuming byte 15 wraps `pos` to 0, which
/// simultaneously invalidates the buffer for the next request.
#[derive(Debug)]
struct Fifo {
    bytes: [u8; FIFO_BYTES],
    pos: usize,
}

impl Fifo {
    const fn new() -> Self {
        Self {
            bytes: [0; FIFO_BYTES],
            pos: 0,
        }
    }

    /// Load a fresh 128-bit sample. Byte order is the little-endian
    /// interpretation of the four sequential OUTPUT words.
    fn refill(&mut self, words: [u32; 4]) {
        for (chunk, word) in self.bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }

    fn take_byte(&mut self) -> u8 {
        let byte = self.bytes[self.pos];
        self.pos = (self.pos + 1) % FIFO_BYTES;
        byte
    }
}

/// Handle to one EIP76 TRNG block.
///
/// Generic over the [`RegisterBus`] so the same state machine drives real
/// memory-mapped hardware and the [`crate::SimTrng`] register model. The
/// handle is `Sync`; concurrent callers are serialised through the
/// internal FIFO lock.
#[derive(Debug)]
pub struct Trng<B: RegisterBus> {
    bus: B,
    poll_timeout: Duration,
    fifo: Mutex<Fifo>,
}

impl Trng<MmioBus> {
    /// Map the block at `phys_base` and bring it up.
    ///
    /// Call once during platform bring-up, before any entropy consumer
    /// runs.
    ///
    /// # Errors
    ///
    /// Returns [`TrngError::Map`] if the register window cannot be
    /// mapped.
    pub fn init(phys_base: usize) -> Result<Self> {
        let bus = MmioBus::map(phys_base)?;
        Ok(Self::with_bus(bus))
    }
}

impl<B: RegisterBus> Trng<B> {
    /// Bring up the block behind an already-constructed bus.
    pub fn with_bus(bus: B) -> Self {
        let trng = Self {
            bus,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            fifo: Mutex::new(Fifo::new()),
        };
        trng.bring_up();

        let rev = trng.bus.read32(regs::EIP_REV);
        if rev & 0xFF != regs::EIP_NUMBER {
            tracing::warn!("Unexpected EIP number in revision register: {rev:#010x}");
        }
        tracing::info!("EIP76 TRNG initialized (rev {rev:#010x})");

        trng
    }

    /// Replace the bound on the readiness polling loop.
    #[must_use]
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Access the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Tear down the handle, returning the bus.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Fill `buf` with fresh entropy.
    ///
    /// A zero-length `buf` is a no-op; no device access occurs. The FIFO
    /// lock is re-acquired per byte to keep the critical section short —
    /// the throughput cost is negligible against the device refill
    /// latency, and it lets latency-sensitive callers interleave.
    ///
    /// # Errors
    ///
    /// Returns [`TrngError::Stalled`] if the READY bit never rises within
    /// the configured poll timeout despite FRO recovery.
    pub fn fetch_random_bytes(&self, buf: &mut [u8]) -> Result<()> {
        for slot in buf.iter_mut() {
            let mut fifo = self.fifo.lock().unwrap_or_else(PoisonError::into_inner);
            if fifo.pos == 0 {
                let words = self.read128()?;
                fifo.refill(words);
            }
            *slot = fifo.take_byte();
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.bus.read32(regs::CONTROL) & control::ENABLE != 0
    }

    /// Program refill bounds, FRO masks, and the master enable bit.
    ///
    /// Idempotent: re-running against an enabled block re-asserts the
    /// same configuration. The startup-cycle field of CONTROL is left
    /// zero.
    fn bring_up(&self) {
        // Ensure initial latency
        let cfg = (tunables::MIN_REFILL_CYCLES << config::MIN_REFILL_CYCLES_SHIFT)
            | (tunables::MAX_REFILL_CYCLES << config::MAX_REFILL_CYCLES_SHIFT);
        self.bus.write32(regs::CONFIG, cfg);

        // All FROs at their nominal operating point
        self.bus.write32(regs::FRODETUNE, 0);

        // Enable all 24 FROs
        self.bus.write32(regs::FROENABLE, regs::FRO_MASK);

        self.bus.write32(regs::CONTROL, control::ENABLE);
        tracing::debug!("TRNG bring-up complete");
    }

    /// Produce one fresh 128-bit sample.
    ///
    /// Must be called with the FIFO lock held: the four OUTPUT reads form
    /// one atomic transaction and interleaving another caller between
    /// them would corrupt both byte streams.
    fn read128(&self) -> Result<[u32; 4]> {
        // Covers first use and recovery from an external reset.
        if !self.is_enabled() {
            self.bring_up();
        }

        let start = Instant::now();
        loop {
            let st = self.bus.read32(regs::STATUS);
            if st & status::READY != 0 {
                break;
            }
            // Shutdown threshold reached: de-tune the offending FROs and
            // resume polling. READY need not rise on the same cycle.
            if st & status::SHUTDOWN_OFLO != 0 {
                self.recover_fros();
                std::thread::yield_now();
            }
            if start.elapsed() >= self.poll_timeout {
                return Err(TrngError::stalled(self.poll_timeout));
            }
            std::hint::spin_loop();
        }

        let words = [
            self.bus.read32(regs::OUTPUT_0),
            self.bus.read32(regs::OUTPUT_1),
            self.bus.read32(regs::OUTPUT_2),
            self.bus.read32(regs::OUTPUT_3),
        ];

        // Acknowledge read complete; the block starts refilling on this
        // write.
        self.bus.write32(regs::INTACK, status::READY);
        Ok(words)
    }

    /// FRO shutdown recovery: toggle the detune bit of every FRO that
    /// tripped the alarm and re-enable the bank. Recovery itself cannot
    /// fail; persistent trouble shows up as READY never rising.
    fn recover_fros(&self) {
        let alarm = self.bus.read32(regs::ALARMSTOP);
        let tune = self.bus.read32(regs::FRODETUNE);

        // Clear the alarm events
        self.bus.write32(regs::ALARMMASK, 0);
        self.bus.write32(regs::ALARMSTOP, 0);
        // De-tune offending FROs
        self.bus.write32(regs::FRODETUNE, tune ^ alarm);
        // Re-enable the shut down FROs
        self.bus.write32(regs::FROENABLE, regs::FRO_MASK);
        // Clear the shutdown overflow event
        self.bus.write32(regs::INTACK, status::SHUTDOWN_OFLO);

        tracing::debug!("Fixed FRO shutdown (alarmed mask {alarm:#08x})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_refill_is_little_endian_word_order() {
        let mut fifo = Fifo::new();
        fifo.refill([0x0302_0100, 0x0706_0504, 0x0B0A_0908, 0x0F0E_0D0C]);
        let drained: Vec<u8> = (0..16).map(|_| fifo.take_byte()).collect();
        let expected: Vec<u8> = (0..16).collect();
        assert_eq!(drained, expected);
    }

    #[test]
    fn fifo_cursor_wraps_to_zero_after_byte_15() {
        let mut fifo = Fifo::new();
        fifo.refill([0; 4]);
        for _ in 0..16 {
            let _ = fifo.take_byte();
        }
        assert_eq!(fifo.pos, 0);
    }

    #[test]
    fn fifo_partial_drain_leaves_cursor_mid_buffer() {
        let mut fifo = Fifo::new();
        fifo.refill([0xDEAD_BEEF, 0, 0, 0]);
        for _ in 0..4 {
            let _ = fifo.take_byte();
        }
        assert_eq!(fifo.pos, 4);
    }
}
