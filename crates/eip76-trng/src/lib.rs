//! Userspace driver for the Inside Secure EIP76 true random number
//! generator, the FRO-based TRNG block found on TI K3-family SoCs.
//!
//! The driver brings the block up, reads conditioned 128-bit samples from
//! its output register file, and exposes a byte-oriented
//! [`fetch_random_bytes`](Trng::fetch_random_bytes) service. Concurrent
//! callers are serialised through an internal 16-byte FIFO guarded by a
//! mutex; the device itself is strictly polled (no interrupts).
//!
//! # Bus hierarchy
//!
//! ```text
//! Hardware:
//!   MmioBus — register window mapped through /dev/mem (needs root)
//!
//! Development / CI:
//!   SimTrng — scripted software model of the register file
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use eip76_trng::Trng;
//!
//! # fn main() -> eip76_trng::Result<()> {
//! let trng = Trng::init(0x4e10_0000)?;
//! let mut key = [0u8; 32];
//! trng.fetch_random_bytes(&mut key)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

mod bus;
mod error;
mod mmio;
mod sim;
mod trng;

pub use bus::RegisterBus;
pub use error::{Result, TrngError};
pub use mmio::MmioBus;
pub use sim::{Access, SimTrng, SIM_EIP_REV};
pub use trng::{Trng, DEFAULT_POLL_TIMEOUT};
