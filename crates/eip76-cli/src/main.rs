//! `eip76` — command-line interface for the EIP76 TRNG block.
//!
//! ```text
//! USAGE:
//!   eip76 status --base <phys-addr>        Dump decoded register state
//!   eip76 fetch --base <phys-addr> <len>   Fetch <len> random bytes (hex)
//! ```
//!
//! Both commands map the register window through `/dev/mem`, so they need
//! root (or `CAP_SYS_RAWIO`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eip76_chip::regs;
use eip76_trng::{MmioBus, RegisterBus, Trng};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eip76", about = "EIP76 TRNG command-line interface", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Dump decoded register state without disturbing the block.
    Status {
        /// Physical base address of the register window (hex, e.g. 0x4e10000).
        #[arg(long, value_parser = parse_hex)]
        base: usize,
    },
    /// Bring the block up and fetch random bytes.
    Fetch {
        /// Physical base address of the register window (hex).
        #[arg(long, value_parser = parse_hex)]
        base: usize,
        /// Number of bytes to fetch.
        len: usize,
    },
}

fn parse_hex(s: &str) -> Result<usize, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    usize::from_str_radix(digits, 16).map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Status { base } => cmd_status(base)?,
        Cmd::Fetch { base, len } => cmd_fetch(base, len)?,
    }

    Ok(())
}

fn cmd_status(base: usize) -> Result<()> {
    let bus = MmioBus::map(base).context("mapping register window")?;

    let control = bus.read32(regs::CONTROL);
    let status = bus.read32(regs::STATUS);
    let rev = bus.read32(regs::EIP_REV);

    println!("EIP76 TRNG @ {base:#x}");
    println!("  EIP_REV   {rev:#010x} (EIP number {})", rev & 0xFF);
    println!(
        "  CONTROL   {control:#010x} (enable={})",
        (control & regs::control::ENABLE != 0) as u8
    );
    println!(
        "  STATUS    {status:#010x} (ready={} shutdown_oflo={})",
        (status & regs::status::READY != 0) as u8,
        (status & regs::status::SHUTDOWN_OFLO != 0) as u8
    );
    println!("  CONFIG    {:#010x}", bus.read32(regs::CONFIG));
    println!("  ALARMCNT  {:#010x}", bus.read32(regs::ALARMCNT));
    println!("  FROENABLE {:#010x}", bus.read32(regs::FROENABLE));
    println!("  FRODETUNE {:#010x}", bus.read32(regs::FRODETUNE));
    println!("  ALARMSTOP {:#010x}", bus.read32(regs::ALARMSTOP));

    Ok(())
}

fn cmd_fetch(base: usize, len: usize) -> Result<()> {
    let trng = Trng::init(base).context("initializing TRNG")?;

    let mut bytes = vec![0u8; len];
    trng.fetch_random_bytes(&mut bytes)
        .context("fetching random bytes")?;

    for chunk in bytes.chunks(16) {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{}", hex.join(" "));
    }

    Ok(())
}
