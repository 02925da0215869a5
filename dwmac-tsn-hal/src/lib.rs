//! # HAL for Time-Sensitive Networking on DesignWare EQOS and MGBE Ethernet MACs
//!
//! This crate builds on the [dwmac-tsn](../dwmac_tsn/index.html) peripheral access crate and
//! provides Enhanced Scheduled Traffic (EST, IEEE 802.1Qbv) and Frame Preemption (FPE)
//! support:
//!
//! - validation and programming of gate control lists through the indirect EST table access,
//! - the frame preemption configuration and its mutual exclusion with MACsec,
//! - interrupt driven recovery which disables a faulty schedule and keeps fault counters.
//!
//! All state is owned by one [controller::TsnController] per physical MAC. Register access and
//! delays are injected, so the same code runs against hardware or a register level simulator.
#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod api;
pub mod controller;
pub mod est;
pub mod fpe;
pub mod params;
pub mod recovery;
pub mod regs;
pub mod time;
pub mod transport;
pub mod variant;

#[cfg(test)]
pub(crate) mod sim;

pub use controller::TsnController;
