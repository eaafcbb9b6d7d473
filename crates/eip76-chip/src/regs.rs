//! EIP76 register map.
//!
//! All offsets are byte offsets from the block's base address. Every
//! register is 32 bits wide and naturally aligned. The block contains a
//! bank of 24 free-running oscillators (FROs) feeding a conditioning
//! pipeline that latches 128 bits at a time into the four OUTPUT words.
//!
//! STATUS and INTACK share offset 0x10: reads return latched status
//! events, writes of the same bits acknowledge (and clear) them.

// ── Output register file ─────────────────────────────────────────────────────

/// Conditioned entropy word 0 (bits 31:0 of the 128-bit sample).
pub const OUTPUT_0: usize = 0x00;
/// Conditioned entropy word 1.
pub const OUTPUT_1: usize = 0x04;
/// Conditioned entropy word 2.
pub const OUTPUT_2: usize = 0x08;
/// Conditioned entropy word 3 (bits 127:96 of the 128-bit sample).
pub const OUTPUT_3: usize = 0x0C;

// ── Status / acknowledge ─────────────────────────────────────────────────────

/// Latched status events (read).
pub const STATUS: usize = 0x10;
/// Write-1-to-clear acknowledgement of status events (write).
///
/// Shares offset 0x10 with [`STATUS`]. Acknowledging READY advances the
/// block's internal state machine to produce the next 128-bit sample.
pub const INTACK: usize = 0x10;

/// STATUS / INTACK bit definitions.
pub mod status {
    /// The four OUTPUT registers hold a fresh, unread 128-bit sample.
    pub const READY: u32 = 1 << 0;
    /// Cumulative FRO alarm count crossed the shutdown threshold.
    pub const SHUTDOWN_OFLO: u32 = 1 << 1;
}

// ── Control ──────────────────────────────────────────────────────────────────

/// Master control register.
pub const CONTROL: usize = 0x14;

/// CONTROL bit definitions.
pub mod control {
    /// Master enable for the TRNG engine.
    pub const ENABLE: u32 = 1 << 10;
    /// Startup-cycle count field (bits 31:16).
    pub const STARTUP_CYCLES_SHIFT: u32 = 16;
    /// Mask for the startup-cycle count field.
    pub const STARTUP_CYCLES_MASK: u32 = 0xFFFF_0000;
}

// ── Refill configuration ─────────────────────────────────────────────────────

/// Sample refill timing configuration.
pub const CONFIG: usize = 0x18;

/// CONFIG field definitions.
pub mod config {
    /// Minimum refill cycles field (bits 7:0).
    pub const MIN_REFILL_CYCLES_SHIFT: u32 = 0;
    /// Mask for the minimum refill cycles field.
    pub const MIN_REFILL_CYCLES_MASK: u32 = 0x0000_00FF;
    /// Maximum refill cycles field (bits 31:16).
    pub const MAX_REFILL_CYCLES_SHIFT: u32 = 16;
    /// Mask for the maximum refill cycles field.
    pub const MAX_REFILL_CYCLES_MASK: u32 = 0xFFFF_0000;
}

// ── Alarm machinery ──────────────────────────────────────────────────────────

/// Alarm counter thresholds.
pub const ALARMCNT: usize = 0x1C;

/// ALARMCNT field definitions.
pub mod alarmcnt {
    /// Per-FRO alarm threshold field (bits 7:0).
    pub const ALARM_THRESHOLD_SHIFT: u32 = 0;
    /// Mask for the alarm threshold field.
    pub const ALARM_THRESHOLD_MASK: u32 = 0x0000_00FF;
    /// Cumulative shutdown threshold field (bits 20:16).
    pub const SHUTDOWN_THRESHOLD_SHIFT: u32 = 16;
    /// Mask for the shutdown threshold field.
    pub const SHUTDOWN_THRESHOLD_MASK: u32 = 0x001F_0000;
}

/// Per-FRO enable mask (24 bits).
pub const FROENABLE: usize = 0x20;
/// Per-FRO detune mask — a set bit shifts that FRO to its alternate
/// operating frequency.
pub const FRODETUNE: usize = 0x24;
/// Per-FRO alarm event mask.
pub const ALARMMASK: usize = 0x28;
/// Per-FRO latched alarm-stop status — set bits identify FROs the
/// hardware shut down for failing its statistics envelope.
pub const ALARMSTOP: usize = 0x2C;

// ── Identity ─────────────────────────────────────────────────────────────────

/// Hardware configuration options.
pub const OPTIONS: usize = 0x78;
/// EIP number and revision. Bits 7:0 read 0x4C (decimal 76); bits 15:8
/// are the one's complement of bits 7:0.
pub const EIP_REV: usize = 0x7C;

/// EIP number encoded in the low byte of [`EIP_REV`].
pub const EIP_NUMBER: u32 = 0x4C;

// ── Constants and tunables ───────────────────────────────────────────────────

/// Mask covering all 24 FROs.
pub const FRO_MASK: u32 = 0x00FF_FFFF;

/// Size in bytes of the register window.
pub const REG_WINDOW_SIZE: usize = 0x80;

/// Bytes produced per READY cycle (four 32-bit OUTPUT words).
pub const SAMPLE_BYTES: usize = 16;

/// Documented tunable values.
///
/// Bring-up programs the refill cycle bounds; the alarm thresholds and
/// startup-cycle count are carried for configuration paths that need
/// them but are left at hardware reset values by the default sequence.
pub mod tunables {
    /// Minimum refill cycles between samples.
    pub const MIN_REFILL_CYCLES: u32 = 0x05;
    /// Maximum refill cycles between samples.
    pub const MAX_REFILL_CYCLES: u32 = 0x22;
    /// FRO warm-up cycles before the first sample.
    pub const STARTUP_CYCLES: u32 = 0xFF;
    /// Per-FRO alarm threshold.
    pub const ALARM_THRESHOLD: u32 = 0xFF;
    /// Cumulative shutdown threshold.
    pub const SHUTDOWN_THRESHOLD: u32 = 0x4;
}
