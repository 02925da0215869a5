//! # MAC register module.
//!
//! Only the registers touched by the TSN code are modelled. Everything else is covered by
//! reserved gaps so that the register offsets match the hardware.
use arbitrary_int::{u3, u4, u31};

use crate::mtl::{MmioMtlTsn, MtlTsn};

/// Depth of the gate control list reported by the hardware feature register.
#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum GclDepth {
    Entries64 = 1,
    Entries128 = 2,
    Entries256 = 3,
    Entries512 = 4,
    Entries1024 = 5,
}

impl GclDepth {
    pub const fn entries(&self) -> usize {
        match self {
            GclDepth::Entries64 => 64,
            GclDepth::Entries128 => 128,
            GclDepth::Entries256 => 256,
            GclDepth::Entries512 => 512,
            GclDepth::Entries1024 => 1024,
        }
    }
}

/// Width of one gate control list word reported by the hardware feature register.
#[bitbybit::bitenum(u2, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum GclWidth {
    Bits24 = 1,
    Bits28 = 2,
    Bits32 = 3,
}

impl GclWidth {
    /// Width of the complete entry word.
    pub const fn word_bits(&self) -> u32 {
        match self {
            GclWidth::Bits24 => 24,
            GclWidth::Bits28 => 28,
            GclWidth::Bits32 => 32,
        }
    }

    /// Width of the time interval part of an entry word. The remaining upper 8 bits hold
    /// the gate states.
    pub const fn interval_bits(&self) -> u32 {
        self.word_bits() - 8
    }
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EqosHwFeature3 {
    #[bit(26, r)]
    fpe_sel: bool,
    #[bits(20..=21, r)]
    gcl_width: Option<GclWidth>,
    #[bits(17..=19, r)]
    gcl_depth: Option<GclDepth>,
    #[bit(16, r)]
    est_sel: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MgbeHwFeature3 {
    #[bit(26, r)]
    fpe_sel: bool,
    #[bits(23..=24, r)]
    gcl_width: Option<GclWidth>,
    #[bits(20..=22, r)]
    gcl_depth: Option<GclDepth>,
    #[bit(19, r)]
    est_sel: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EqosRxQueueControl1 {
    /// Frame preemption residual queue.
    #[bits(24..=26, rw)]
    fp_residual_queue: u3,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MgbeRxQueueControl1 {
    /// Residual queue for preemptable frames.
    #[bits(4..=7, rw)]
    residual_queue: u4,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MgbeRxQueueControl4 {
    /// Queue for preemptable multicast and broadcast frames.
    #[bits(24..=27, rw)]
    preemption_mc_bc_queue: u4,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EqosInterruptEnable {
    #[bit(17, rw)]
    fpe: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MgbeInterruptEnable {
    #[bit(15, rw)]
    fpe: bool,
}

/// MAC frame preemption control and status. The verification handshake bits in the upper
/// half word are cleared on read on some revisions and write-one-to-clear on others.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MacFpeControl {
    /// Transmitted respond mPacket.
    #[bit(19, rw)]
    tx_respond: bool,
    /// Transmitted verify mPacket.
    #[bit(18, rw)]
    tx_verify: bool,
    /// Received respond mPacket.
    #[bit(17, rw)]
    rx_respond: bool,
    /// Received verify mPacket.
    #[bit(16, rw)]
    rx_verify: bool,
    /// Send respond mPacket.
    #[bit(2, rw)]
    send_respond: bool,
    /// Send verify mPacket.
    #[bit(1, rw)]
    send_verify: bool,
    /// Enable transmit frame preemption.
    #[bit(0, rw)]
    enable: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct SystemTimeNanoseconds {
    #[bits(0..=30, r)]
    nanoseconds: u31,
}

/// EQOS MAC register subset.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct EqosMac {
    _reserved0: [u32; 0x29],
    rx_queue_ctrl_1: EqosRxQueueControl1,
    _reserved1: [u32; 3],
    interrupt_enable: EqosInterruptEnable,
    _reserved2: [u32; 0x1C],
    #[mmio(PureRead)]
    hw_feature_3: EqosHwFeature3,
    _reserved3: [u32; 0x42],
    fpe_ctrl: MacFpeControl,
    _reserved4: [u32; 0x234],
    #[mmio(PureRead)]
    system_time_seconds: u32,
    #[mmio(PureRead)]
    system_time_nanoseconds: SystemTimeNanoseconds,
    _reserved5: [u32; 0x50],
    #[mmio(Inner)]
    mtl_tsn: MtlTsn,
}

static_assertions::const_assert_eq!(core::mem::size_of::<EqosMac>(), 0xC98);
static_assertions::const_assert_eq!(
    core::mem::offset_of!(EqosMac, mtl_tsn),
    crate::mtl::EQOS_MTL_TSN_OFFSET
);

impl EqosMac {
    /// Create a new EQOS MMIO instance for a MAC at the given base address.
    ///
    /// # Safety
    ///
    /// The address must point to an EQOS MAC register block. This API can be used to
    /// potentially create a driver to the same peripheral structure from multiple threads.
    /// The user must ensure that concurrent accesses are safe and do not interfere with each
    /// other.
    #[inline]
    pub const unsafe fn new_mmio_at_base(base_addr: usize) -> MmioEqosMac<'static> {
        unsafe { Self::new_mmio_at(base_addr) }
    }
}

/// MGBE MAC register subset.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct MgbeMac {
    _reserved0: [u32; 0x25],
    rx_queue_ctrl_4: MgbeRxQueueControl4,
    _reserved1: [u32; 3],
    rx_queue_ctrl_1: MgbeRxQueueControl1,
    _reserved2: [u32; 3],
    interrupt_enable: MgbeInterruptEnable,
    _reserved3: [u32; 0x1C],
    #[mmio(PureRead)]
    hw_feature_3: MgbeHwFeature3,
    _reserved4: [u32; 0x55],
    fpe_ctrl: MacFpeControl,
    _reserved5: [u32; 0x2A1],
    #[mmio(PureRead)]
    system_time_seconds: u32,
    #[mmio(PureRead)]
    system_time_nanoseconds: SystemTimeNanoseconds,
    _reserved6: [u32; 0xD0],
    #[mmio(Inner)]
    mtl_tsn: MtlTsn,
}

static_assertions::const_assert_eq!(core::mem::size_of::<MgbeMac>(), 0x1098);
static_assertions::const_assert_eq!(
    core::mem::offset_of!(MgbeMac, mtl_tsn),
    crate::mtl::MGBE_MTL_TSN_OFFSET
);

impl MgbeMac {
    /// Create a new MGBE MMIO instance for a MAC at the given base address.
    ///
    /// # Safety
    ///
    /// The address must point to an MGBE MAC register block. This API can be used to
    /// potentially create a driver to the same peripheral structure from multiple threads.
    /// The user must ensure that concurrent accesses are safe and do not interfere with each
    /// other.
    #[inline]
    pub const unsafe fn new_mmio_at_base(base_addr: usize) -> MmioMgbeMac<'static> {
        unsafe { Self::new_mmio_at(base_addr) }
    }
}
