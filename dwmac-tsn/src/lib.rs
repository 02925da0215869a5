//! # PAC for the TSN register blocks of the DesignWare EQOS and MGBE Ethernet MACs
//!
//! This crate covers the subset of the MAC and MTL register space used for Enhanced Scheduled
//! Traffic (EST, IEEE 802.1Qbv) and Frame Preemption (FPE, IEEE 802.1Qbu/802.3br).
//!
//! The MTL EST/FPE block has the same layout on both MAC families and is located at a family
//! specific offset from the MAC base address. The [mac::EqosMac] and [mac::MgbeMac] register
//! blocks embed it at the correct offset.
#![no_std]

pub mod mac;
pub mod mtl;
