//! Simulated EIP76 device
//!
//! Implements the [`RegisterBus`] trait over a pure software register
//! model of the TRNG block. This enables:
//!
//! 1. **CI without hardware**: every driver state machine path (bring-up,
//!    readiness polling, FRO shutdown recovery, FIFO draining) runs against
//!    the model with no SoC attached.
//!
//! 2. **Scripted fault injection**: readiness latency and shutdown-overflow
//!    events are scriptable per test, which real silicon cannot do on
//!    demand.
//!
//! 3. **Access auditing**: every register read and write is recorded in
//!    order, so tests can assert the exact MMIO transaction sequence the
//!    hardware would have seen.
//!
//! ## Model
//!
//! The register file lives behind a mutex. `STATUS` is synthesised:
//! READY rises only while `CONTROL.ENABLE` is set, after a scriptable
//! number of status polls; SHUTDOWN_OFLO is reported for a scriptable
//! number of status reads. Output words come from a scripted sample queue
//! and fall back to a deterministic counter generator, so tests can
//! predict the byte stream for any request length.

use crate::bus::RegisterBus;
use eip76_chip::regs;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Revision word the model reports: EIP number 76 (0x4C) with its one's
/// complement in bits 15:8.
pub const SIM_EIP_REV: u32 = 0xB34C;

/// One recorded register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// 32-bit read at the given byte offset.
    Read(usize),
    /// 32-bit write of the given value at the given byte offset.
    Write(usize, u32),
}

#[derive(Debug)]
struct SimState {
    control: u32,
    config: u32,
    alarmcnt: u32,
    fro_enable: u32,
    fro_detune: u32,
    alarm_mask: u32,
    alarm_stop: u32,

    /// READY is latched and the four OUTPUT words hold a fresh sample.
    ready: bool,
    /// Status polls (while enabled) remaining before READY rises.
    polls_until_ready: u32,
    /// Value `polls_until_ready` resets to after each acknowledged sample.
    ready_delay: u32,
    /// Status reads remaining that report SHUTDOWN_OFLO.
    oflo_reads: u32,

    /// Currently latched 128-bit sample.
    sample: [u32; 4],
    /// Scripted samples, consumed front to back.
    queue: VecDeque<[u32; 4]>,
    /// Counter generator used once the queue is exhausted.
    next_word: u32,

    log: Vec<Access>,
}

impl SimState {
    fn latch_next_sample(&mut self) {
        self.sample = self.queue.pop_front().unwrap_or_else(|| {
            let base = self.next_word;
            self.next_word += 4;
            [base, base + 1, base + 2, base + 3]
        });
    }

    fn enabled(&self) -> bool {
        self.control & regs::control::ENABLE != 0
    }
}

/// Software model of the EIP76 register file.
///
/// Cold-start state: all registers zero, in particular `CONTROL.ENABLE`
/// clear, matching the block after reset.
#[derive(Debug)]
pub struct SimTrng {
    state: Mutex<SimState>,
}

impl Default for SimTrng {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTrng {
    /// Create a cold-start model: disabled, no sample latched, READY
    /// rising on the first status poll after enable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                control: 0,
                config: 0,
                alarmcnt: 0,
                fro_enable: 0,
                fro_detune: 0,
                alarm_mask: 0,
                alarm_stop: 0,
                ready: false,
                polls_until_ready: 0,
                ready_delay: 0,
                oflo_reads: 0,
                sample: [0; 4],
                queue: VecDeque::new(),
                next_word: 0,
                log: Vec::new(),
            }),
        }
    }

    /// Script the OUTPUT samples returned, in order. Once exhausted the
    /// model falls back to the counter generator.
    #[must_use]
    pub fn with_samples(self, samples: impl IntoIterator<Item = [u32; 4]>) -> Self {
        self.lock().queue.extend(samples);
        self
    }

    /// Script how many status polls (while enabled) each sample takes to
    /// become READY.
    #[must_use]
    pub fn with_ready_delay(self, polls: u32) -> Self {
        {
            let mut st = self.lock();
            st.ready_delay = polls;
            st.polls_until_ready = polls;
        }
        self
    }

    /// Script a shutdown-overflow event: SHUTDOWN_OFLO is reported for the
    /// next `reads` status reads, with `alarm_stop` latched in ALARMSTOP.
    #[must_use]
    pub fn with_shutdown_overflow(self, reads: u32, alarm_stop: u32) -> Self {
        self.trip_shutdown_overflow(reads, alarm_stop);
        self
    }

    /// Inject a shutdown-overflow event mid-test.
    pub fn trip_shutdown_overflow(&self, reads: u32, alarm_stop: u32) {
        let mut st = self.lock();
        st.oflo_reads = reads;
        st.alarm_stop = alarm_stop;
    }

    /// Read a register without recording the access — for assertions.
    ///
    /// `STATUS` reads return the currently latched bits without advancing
    /// the readiness countdown.
    #[must_use]
    pub fn peek(&self, offset: usize) -> u32 {
        let st = self.lock();
        match offset {
            regs::OUTPUT_0 => st.sample[0],
            regs::OUTPUT_1 => st.sample[1],
            regs::OUTPUT_2 => st.sample[2],
            regs::OUTPUT_3 => st.sample[3],
            regs::STATUS => {
                let mut bits = 0;
                if st.ready {
                    bits |= regs::status::READY;
                }
                if st.oflo_reads > 0 {
                    bits |= regs::status::SHUTDOWN_OFLO;
                }
                bits
            }
            regs::CONTROL => st.control,
            regs::CONFIG => st.config,
            regs::ALARMCNT => st.alarmcnt,
            regs::FROENABLE => st.fro_enable,
            regs::FRODETUNE => st.fro_detune,
            regs::ALARMMASK => st.alarm_mask,
            regs::ALARMSTOP => st.alarm_stop,
            regs::EIP_REV => SIM_EIP_REV,
            _ => 0,
        }
    }

    /// Ordered log of every register access so far.
    #[must_use]
    pub fn log(&self) -> Vec<Access> {
        self.lock().log.clone()
    }

    /// Clear the access log (register state is untouched).
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// All values written to `offset`, in order.
    #[must_use]
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.lock()
            .log
            .iter()
            .filter_map(|a| match a {
                Access::Write(o, v) if *o == offset => Some(*v),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegisterBus for SimTrng {
    fn read32(&self, offset: usize) -> u32 {
        let mut st = self.lock();
        st.log.push(Access::Read(offset));
        match offset {
            regs::OUTPUT_0 => st.sample[0],
            regs::OUTPUT_1 => st.sample[1],
            regs::OUTPUT_2 => st.sample[2],
            regs::OUTPUT_3 => st.sample[3],
            regs::STATUS => {
                let mut bits = 0;
                if st.oflo_reads > 0 {
                    bits |= regs::status::SHUTDOWN_OFLO;
                    st.oflo_reads -= 1;
                }
                if st.enabled() && !st.ready {
                    if st.polls_until_ready == 0 {
                        st.ready = true;
                        st.latch_next_sample();
                    } else {
                        st.polls_until_ready -= 1;
                    }
                }
                if st.ready {
                    bits |= regs::status::READY;
                }
                bits
            }
            regs::CONTROL => st.control,
            regs::CONFIG => st.config,
            regs::ALARMCNT => st.alarmcnt,
            regs::FROENABLE => st.fro_enable,
            regs::FRODETUNE => st.fro_detune,
            regs::ALARMMASK => st.alarm_mask,
            regs::ALARMSTOP => st.alarm_stop,
            regs::EIP_REV => SIM_EIP_REV,
            _ => 0,
        }
    }

    fn write32(&self, offset: usize, value: u32) {
        let mut st = self.lock();
        st.log.push(Access::Write(offset, value));
        match offset {
            regs::INTACK => {
                // Write-1-to-clear: acknowledging READY retires the
                // current sample and restarts the refill countdown.
                if value & regs::status::READY != 0 {
                    st.ready = false;
                    st.polls_until_ready = st.ready_delay;
                }
            }
            regs::CONTROL => st.control = value,
            regs::CONFIG => st.config = value,
            regs::ALARMCNT => st.alarmcnt = value,
            regs::FROENABLE => st.fro_enable = value,
            regs::FRODETUNE => st.fro_detune = value,
            regs::ALARMMASK => st.alarm_mask = value,
            regs::ALARMSTOP => st.alarm_stop = value,
            _ => {}
        }
    }
}
