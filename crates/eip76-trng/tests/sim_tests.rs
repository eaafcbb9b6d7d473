//! Driver state machine tests against the simulated register model
//!
//! Every test runs the real driver over [`SimTrng`], asserting both the
//! bytes delivered to callers and the exact register transaction sequence
//! the hardware would have seen.

use eip76_chip::regs;
use eip76_trng::{Access, RegisterBus, SimTrng, Trng, TrngError};
use std::time::Duration;

/// Bytes the counter generator produces for the first `blocks` samples.
fn generated_bytes(blocks: u32) -> Vec<u8> {
    (0..blocks * 4).flat_map(u32::to_le_bytes).collect()
}

fn index_of(log: &[Access], access: Access) -> usize {
    log.iter()
        .position(|a| *a == access)
        .unwrap_or_else(|| panic!("{access:?} not found in {log:#?}"))
}

fn ready_acks(sim: &SimTrng) -> usize {
    sim.writes_to(regs::INTACK)
        .iter()
        .filter(|&&v| v == regs::status::READY)
        .count()
}

#[test]
fn init_programs_documented_constants() {
    let trng = Trng::with_bus(SimTrng::new());
    let sim = trng.bus();

    assert_ne!(sim.peek(regs::CONTROL) & regs::control::ENABLE, 0);
    assert_eq!(sim.peek(regs::CONFIG), 0x0022_0005);
    assert_eq!(sim.peek(regs::FROENABLE), regs::FRO_MASK);
    assert_eq!(sim.peek(regs::FRODETUNE), 0);
}

#[test]
fn block_read_drains_four_outputs_then_acks() {
    let trng = Trng::with_bus(SimTrng::new());
    trng.bus().clear_log();

    let mut buf = [0u8; 16];
    trng.fetch_random_bytes(&mut buf).unwrap();

    let log = trng.bus().log();
    assert_eq!(
        &log[log.len() - 5..],
        &[
            Access::Read(regs::OUTPUT_0),
            Access::Read(regs::OUTPUT_1),
            Access::Read(regs::OUTPUT_2),
            Access::Read(regs::OUTPUT_3),
            Access::Write(regs::INTACK, regs::status::READY),
        ]
    );
    assert_eq!(ready_acks(trng.bus()), 1);
}

#[test]
fn fifo_conservation_one_block_per_16_bytes() {
    let trng = Trng::with_bus(SimTrng::new());

    let mut buf = [0u8; 16];
    trng.fetch_random_bytes(&mut buf).unwrap();
    assert_eq!(ready_acks(trng.bus()), 1);

    // Cursor back at 0: the next byte forces a second block read.
    let mut buf = [0u8; 4];
    trng.fetch_random_bytes(&mut buf).unwrap();
    assert_eq!(ready_acks(trng.bus()), 2);

    // Bytes 4..16 of the second block drain without device access.
    let mut buf = [0u8; 12];
    trng.fetch_random_bytes(&mut buf).unwrap();
    assert_eq!(ready_acks(trng.bus()), 2);
}

#[test]
fn no_byte_of_entropy_repeats_across_calls() {
    let trng = Trng::with_bus(SimTrng::new());

    let mut first = [0u8; 16];
    let mut second = [0u8; 16];
    trng.fetch_random_bytes(&mut first).unwrap();
    trng.fetch_random_bytes(&mut second).unwrap();

    let expected = generated_bytes(2);
    assert_eq!(&first, &expected[..16]);
    assert_eq!(&second, &expected[16..]);
}

#[test]
fn fifo_byte_order_is_little_endian_word_sequence() {
    let sim = SimTrng::new().with_samples([[0x0302_0100, 0x0706_0504, 0x0B0A_0908, 0x0F0E_0D0C]]);
    let trng = Trng::with_bus(sim);

    let mut buf = [0u8; 16];
    trng.fetch_random_bytes(&mut buf).unwrap();

    let expected: Vec<u8> = (0..16).collect();
    assert_eq!(&buf[..], &expected[..]);
}

#[test]
fn fro_recovery_on_shutdown_overflow() {
    let sim = SimTrng::new()
        .with_ready_delay(2)
        .with_shutdown_overflow(1, 0x0000_00A5);
    let trng = Trng::with_bus(sim);

    let mut buf = [0u8; 16];
    trng.fetch_random_bytes(&mut buf).unwrap();

    let sim = trng.bus();
    // Bring-up wrote FRODETUNE=0; recovery toggled in the alarmed mask.
    assert_eq!(sim.writes_to(regs::FRODETUNE), vec![0, 0x0000_00A5]);
    assert_eq!(sim.writes_to(regs::FROENABLE), vec![regs::FRO_MASK; 2]);
    assert_eq!(
        sim.writes_to(regs::INTACK),
        vec![regs::status::SHUTDOWN_OFLO, regs::status::READY]
    );
    assert_eq!(sim.peek(regs::FRODETUNE), 0x0000_00A5);

    // Recovery completed before the outputs were drained.
    let log = sim.log();
    assert!(
        index_of(&log, Access::Write(regs::INTACK, regs::status::SHUTDOWN_OFLO))
            < index_of(&log, Access::Read(regs::OUTPUT_0))
    );
}

#[test]
fn bring_up_is_idempotent() {
    let snapshot = |sim: &SimTrng| {
        [
            regs::CONTROL,
            regs::CONFIG,
            regs::ALARMCNT,
            regs::FROENABLE,
            regs::FRODETUNE,
            regs::ALARMMASK,
            regs::ALARMSTOP,
        ]
        .map(|off| sim.peek(off))
    };

    let trng = Trng::with_bus(SimTrng::new());
    let once = snapshot(trng.bus());

    let trng = Trng::with_bus(trng.into_bus());
    let twice = snapshot(trng.bus());

    assert_eq!(once, twice);
}

#[test]
fn concurrent_fetches_partition_the_device_stream() {
    const THREADS: usize = 4;
    const BYTES_PER_THREAD: usize = 32;

    let trng = Trng::with_bus(SimTrng::new());

    let mut streams: Vec<Vec<u8>> = Vec::new();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    let mut buf = [0u8; BYTES_PER_THREAD];
                    trng.fetch_random_bytes(&mut buf).unwrap();
                    buf.to_vec()
                })
            })
            .collect();
        for h in handles {
            streams.push(h.join().unwrap());
        }
    });

    // Each byte the device produced went to exactly one caller.
    let mut delivered: Vec<u8> = streams.concat();
    let mut expected = generated_bytes((THREADS * BYTES_PER_THREAD / 16) as u32);
    delivered.sort_unstable();
    expected.sort_unstable();
    assert_eq!(delivered, expected);
    assert_eq!(ready_acks(trng.bus()), THREADS * BYTES_PER_THREAD / 16);
}

// ── End-to-end scenarios ─────────────────────────────────────────────────────

#[test]
fn s1_single_fetch_after_cold_start() {
    let sim = SimTrng::new().with_samples([[0xDEAD_BEEF, 0, 0, 0]]);
    let trng = Trng::with_bus(sim);

    // Externally reset: enable bit cleared behind the driver's back.
    trng.bus().write32(regs::CONTROL, 0);
    trng.bus().clear_log();

    let mut buf = [0u8; 4];
    trng.fetch_random_bytes(&mut buf).unwrap();
    assert_eq!(buf, [0xEF, 0xBE, 0xAD, 0xDE]);

    // Bring-up ran before the first poll.
    let log = trng.bus().log();
    assert_eq!(log[0], Access::Read(regs::CONTROL));
    assert!(
        index_of(&log, Access::Write(regs::CONTROL, regs::control::ENABLE))
            < index_of(&log, Access::Read(regs::STATUS))
    );

    // Cursor sits at 4: the remaining 12 bytes drain with no new block.
    let mut rest = [0u8; 12];
    trng.fetch_random_bytes(&mut rest).unwrap();
    assert_eq!(ready_acks(trng.bus()), 1);
    assert_eq!(rest, [0u8; 12]);
}

#[test]
fn s2_straddling_fetch_refills_exactly_once() {
    let trng = Trng::with_bus(SimTrng::new());
    let expected = generated_bytes(2);

    let mut first = [0u8; 10];
    trng.fetch_random_bytes(&mut first).unwrap();
    assert_eq!(&first, &expected[..10]);
    assert_eq!(ready_acks(trng.bus()), 1);

    let mut second = [0u8; 10];
    trng.fetch_random_bytes(&mut second).unwrap();
    assert_eq!(&second, &expected[10..20]);
    assert_eq!(ready_acks(trng.bus()), 2);
}

#[test]
fn s3_overflow_during_poll_recovers_and_delivers() {
    let sim = SimTrng::new()
        .with_ready_delay(3)
        .with_shutdown_overflow(3, 0x0000_0001);
    let trng = Trng::with_bus(sim);

    let mut buf = [0u8; 16];
    trng.fetch_random_bytes(&mut buf).unwrap();

    assert_eq!(trng.bus().peek(regs::FRODETUNE), 0x0000_0001);
    assert_eq!(&buf[..], &generated_bytes(1)[..]);
}

#[test]
fn s4_zero_length_fetch_touches_nothing() {
    let trng = Trng::with_bus(SimTrng::new());
    trng.bus().clear_log();

    trng.fetch_random_bytes(&mut []).unwrap();
    assert!(trng.bus().log().is_empty());
}

#[test]
fn s5_re_enable_after_external_disable() {
    let trng = Trng::with_bus(SimTrng::new());

    let mut buf = [0u8; 16];
    trng.fetch_random_bytes(&mut buf).unwrap();

    trng.bus().write32(regs::CONTROL, 0);
    trng.bus().clear_log();

    trng.fetch_random_bytes(&mut buf).unwrap();
    assert_eq!(&buf[..], &generated_bytes(2)[16..]);

    let log = trng.bus().log();
    assert!(
        index_of(&log, Access::Write(regs::CONTROL, regs::control::ENABLE))
            < index_of(&log, Access::Read(regs::OUTPUT_0))
    );
}

#[test]
fn stalled_device_surfaces_timeout_error() {
    let sim = SimTrng::new().with_ready_delay(u32::MAX);
    let trng = Trng::with_bus(sim).with_poll_timeout(Duration::from_millis(5));

    let mut buf = [0u8; 1];
    let err = trng.fetch_random_bytes(&mut buf).unwrap_err();
    assert!(matches!(err, TrngError::Stalled { .. }), "got {err}");
}
