//! MAC family specific behaviour.
//!
//! The EST and FPE logic is shared between the EQOS and MGBE MAC families. The differences,
//! which are mostly bit positions, recommended timing values and a few policy decisions, are
//! captured by the [Variant] trait, which is implemented once per family.
use arbitrary_int::{u2, u3, u4, u6, u9, u12};
use dwmac_tsn::{
    mac::{
        EqosHwFeature3, EqosInterruptEnable, EqosRxQueueControl1, GclDepth, GclWidth,
        MgbeHwFeature3, MgbeInterruptEnable, MgbeRxQueueControl1, MgbeRxQueueControl4,
    },
    mtl::{EqosEstTimeouts, EstControl, MgbeEstTimeouts},
};

use crate::regs::{Reg, RegisterAccess};

/// Number of traffic classes supported by the EST and FPE blocks.
pub const MAX_TRAFFIC_CLASSES: usize = 8;

/// EQOS core version 5.30. This revision may run frame preemption and MACsec concurrently.
pub const EQOS_MAC_5_30: u8 = 0x53;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacFamily {
    Eqos,
    Mgbe,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Mbps10,
    Mbps100,
    #[default]
    Mbps1000,
    Mbps2500,
    Gbps5,
    Gbps10,
    Gbps25,
}

impl Speed {
    /// Frame preemption hold advance in nanoseconds for this link speed.
    pub const fn fpe_hold_advance(&self) -> u16 {
        match self {
            Speed::Mbps10 | Speed::Mbps100 | Speed::Mbps1000 => 0x380,
            Speed::Mbps2500 | Speed::Gbps5 | Speed::Gbps10 => 0x59,
            Speed::Gbps25 => 0x23,
        }
    }
}

/// TSN related hardware features, decoded from hardware feature register 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwFeatures {
    pub est: bool,
    pub fpe: bool,
    pub gcl_depth: Result<GclDepth, u3>,
    pub gcl_width: Result<GclWidth, u2>,
}

pub trait Variant {
    fn family(&self) -> MacFamily;

    /// Guard band in nanoseconds, which is 8 PTP clock cycles. A schedule truncation or a
    /// schedule switch closer than this to a cycle boundary can not be handled deterministically.
    fn guard_band_ns(&self) -> u64;

    /// Number of receive queues. Valid residual queues are `1..max_rx_queues()`.
    fn max_rx_queues(&self) -> u8;

    /// Whether frame preemption and MACsec must never be enabled at the same time.
    fn fpe_excludes_macsec(&self) -> bool;

    fn hw_features(&self, hw_feature_3: u32) -> HwFeatures;

    /// Apply the recommended EST timing and policy defaults to a raw EST control value.
    fn est_control_defaults(&self, control: u32, macsec_enabled: bool) -> u32;

    /// Recommended per-frame overhead for the EST overhead register.
    fn est_overhead(&self) -> u6;

    /// Whether the schedule must be disabled after a head-of-line blocking event due to
    /// scheduling, given the current EST control value.
    fn disable_on_hlb_scheduling(&self, control: EstControl) -> bool;

    /// Program the receive queue which receives preemptable traffic.
    fn set_residual_queue<R: RegisterAccess>(&self, regs: &mut R, queue: u8);

    fn enable_fpe_interrupt<R: RegisterAccess>(&self, regs: &mut R);
}

/// Recommended PTP time offset in units of PTP clock periods.
const PTOV_RECOMMENDED: u16 = 32;

/// EQOS MAC family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eqos {
    /// Core version as reported by the MAC version register, for example [EQOS_MAC_5_30].
    pub version: u8,
}

impl Eqos {
    pub const fn new(version: u8) -> Self {
        Self { version }
    }
}

impl Variant for Eqos {
    #[inline]
    fn family(&self) -> MacFamily {
        MacFamily::Eqos
    }

    #[inline]
    fn guard_band_ns(&self) -> u64 {
        40
    }

    #[inline]
    fn max_rx_queues(&self) -> u8 {
        8
    }

    #[inline]
    fn fpe_excludes_macsec(&self) -> bool {
        self.version != EQOS_MAC_5_30
    }

    fn hw_features(&self, hw_feature_3: u32) -> HwFeatures {
        let hfr3 = EqosHwFeature3::new_with_raw_value(hw_feature_3);
        HwFeatures {
            est: hfr3.est_sel(),
            fpe: hfr3.fpe_sel(),
            gcl_depth: hfr3.gcl_depth().map_err(u3::new),
            gcl_width: hfr3.gcl_width().map_err(u2::new),
        }
    }

    fn est_control_defaults(&self, control: u32, macsec_enabled: bool) -> u32 {
        let ctov = if macsec_enabled { 758 } else { 94 };
        let timeouts = EqosEstTimeouts::new_with_raw_value(control)
            .with_ptp_time_offset(PTOV_RECOMMENDED as u8)
            .with_current_time_offset(u12::new(ctov));
        EstControl::new_with_raw_value(timeouts.raw_value())
            .with_loop_count_sched_err(u2::new(0))
            .with_drop_frames_hlbs(false)
            .with_dont_drop_frames_hlbf(true)
            .raw_value()
    }

    #[inline]
    fn est_overhead(&self) -> u6 {
        u6::new(0x17)
    }

    #[inline]
    fn disable_on_hlb_scheduling(&self, control: EstControl) -> bool {
        // Frames causing the blocking are only dropped when DFBS is set. Otherwise the queue
        // stays blocked.
        !control.drop_frames_hlbs()
    }

    fn set_residual_queue<R: RegisterAccess>(&self, regs: &mut R, queue: u8) {
        regs.modify(Reg::RxQueueControl1, |raw| {
            EqosRxQueueControl1::new_with_raw_value(raw)
                .with_fp_residual_queue(u3::new(queue & 0b111))
                .raw_value()
        });
    }

    fn enable_fpe_interrupt<R: RegisterAccess>(&self, regs: &mut R) {
        regs.modify(Reg::MacInterruptEnable, |raw| {
            EqosInterruptEnable::new_with_raw_value(raw)
                .with_fpe(true)
                .raw_value()
        });
    }
}

/// MGBE MAC family.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Mgbe;

impl Variant for Mgbe {
    #[inline]
    fn family(&self) -> MacFamily {
        MacFamily::Mgbe
    }

    #[inline]
    fn guard_band_ns(&self) -> u64 {
        26
    }

    #[inline]
    fn max_rx_queues(&self) -> u8 {
        10
    }

    #[inline]
    fn fpe_excludes_macsec(&self) -> bool {
        true
    }

    fn hw_features(&self, hw_feature_3: u32) -> HwFeatures {
        let hfr3 = MgbeHwFeature3::new_with_raw_value(hw_feature_3);
        HwFeatures {
            est: hfr3.est_sel(),
            fpe: hfr3.fpe_sel(),
            gcl_depth: hfr3.gcl_depth().map_err(u3::new),
            gcl_width: hfr3.gcl_width().map_err(u2::new),
        }
    }

    fn est_control_defaults(&self, control: u32, macsec_enabled: bool) -> u32 {
        let ctov = if macsec_enabled { 295 } else { 42 };
        let timeouts = MgbeEstTimeouts::new_with_raw_value(control)
            .with_ptp_time_offset(u9::new(PTOV_RECOMMENDED))
            .with_current_time_offset(u12::new(ctov));
        EstControl::new_with_raw_value(timeouts.raw_value())
            .with_loop_count_sched_err(u2::new(0))
            .with_dont_drop_frames_hlbf(true)
            .raw_value()
    }

    #[inline]
    fn est_overhead(&self) -> u6 {
        u6::new(56)
    }

    #[inline]
    fn disable_on_hlb_scheduling(&self, _control: EstControl) -> bool {
        // No drop policy for scheduling blocking on this family.
        true
    }

    fn set_residual_queue<R: RegisterAccess>(&self, regs: &mut R, queue: u8) {
        let queue = u4::new(queue & 0xF);
        regs.modify(Reg::RxQueueControl1, |raw| {
            MgbeRxQueueControl1::new_with_raw_value(raw)
                .with_residual_queue(queue)
                .raw_value()
        });
        regs.modify(Reg::RxQueueControl4, |raw| {
            MgbeRxQueueControl4::new_with_raw_value(raw)
                .with_preemption_mc_bc_queue(queue)
                .raw_value()
        });
    }

    fn enable_fpe_interrupt<R: RegisterAccess>(&self, regs: &mut R) {
        regs.modify(Reg::MacInterruptEnable, |raw| {
            MgbeInterruptEnable::new_with_raw_value(raw)
                .with_fpe(true)
                .raw_value()
        });
    }
}
