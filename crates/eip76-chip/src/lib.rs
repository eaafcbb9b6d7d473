//! Silicon model for the Inside Secure EIP76 true random number generator.
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the silicon: register offsets, status/control bit
//! definitions, and the documented refill/alarm tunables. The EIP76 is the
//! FRO-based TRNG block integrated on TI K3-family SoCs among others.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Register map — all offsets, bit definitions, tunables |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod regs;
