//! # MTL Enhanced Scheduled Traffic and Frame Preemption register module.
//!
//! The block layout is shared by the EQOS and MGBE MAC families. Only the timing fields of the
//! EST control register differ in position, see [EqosEstTimeouts] and [MgbeEstTimeouts].
use arbitrary_int::{u2, u3, u4, u6, u9, u12, u15};

/// Offset of the MTL EST block from the EQOS MAC base address.
pub const EQOS_MTL_TSN_OFFSET: usize = 0xC50;
/// Offset of the MTL EST block from the MGBE MAC base address.
pub const MGBE_MTL_TSN_OFFSET: usize = 0x1050;

/// Shared bits of the EST control register.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EstControl {
    /// Loop count to report a scheduling error.
    #[bits(6..=7, rw)]
    loop_count_sched_err: u2,
    /// Drop frames causing head-of-line blocking due to scheduling. Only implemented by EQOS,
    /// reserved on MGBE.
    #[bit(5, rw)]
    drop_frames_hlbs: bool,
    /// Do not drop frames during a frame size error.
    #[bit(4, rw)]
    dont_drop_frames_hlbf: bool,
    /// Queue head-of-line blocking frames instead of dropping them when the schedule truncates.
    #[bit(3, rw)]
    queue_hlb_frames: bool,
    /// Switch to the software owned list. Self-clearing once the switch completed.
    #[bit(1, rw)]
    switch_sw_owned_list: bool,
    /// Enable enhanced scheduled traffic.
    #[bit(0, rw)]
    enable: bool,
}

/// Timing fields of the EST control register for the EQOS family.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EqosEstTimeouts {
    /// PTP time offset value in units of PTP clock periods.
    #[bits(24..=31, rw)]
    ptp_time_offset: u8,
    /// Current time offset value in units of TX clock periods.
    #[bits(12..=23, rw)]
    current_time_offset: u12,
}

/// Timing fields of the EST control register for the MGBE family.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MgbeEstTimeouts {
    #[bits(23..=31, rw)]
    ptp_time_offset: u9,
    #[bits(11..=22, rw)]
    current_time_offset: u12,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EstOverhead {
    /// Per-frame overhead in bytes added to the frame length for scheduling decisions.
    #[bits(0..=5, rw)]
    overhead: u6,
}

/// EST status register. All event bits are write-one-to-clear.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct EstStatus {
    /// Current GCL slot number.
    #[bits(16..=19, r)]
    current_slot: u4,
    /// Software owned list. Selects the bank which software may currently write.
    #[bit(7, r)]
    sw_owned_list: bool,
    /// Constant gate control error.
    #[bit(4, rw)]
    constant_gate_ctrl_err: bool,
    /// Head-of-line blocking due to scheduling.
    #[bit(3, rw)]
    hlb_scheduling: bool,
    /// Head-of-line blocking due to frame size.
    #[bit(2, rw)]
    hlb_frame_size: bool,
    /// Base time register error.
    #[bit(1, rw)]
    base_time_reg_err: bool,
    /// Switch to software owned list complete.
    #[bit(0, rw)]
    switch_complete: bool,
}

/// Per traffic class error bitmap. Used for both the scheduling error and frame size error
/// registers. Write-one-to-clear.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct TcErrorBitmap {
    #[bits(0..=7, rw)]
    traffic_classes: u8,
}

/// Frame size capture register, latched on a frame size error.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct FrameSizeCapture {
    /// Queue number of the blocked frame.
    #[bits(16..=18, r)]
    queue: u3,
    /// Size of the blocked frame.
    #[bits(0..=14, r)]
    frame_size: u15,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct EstInterruptEnable {
    #[bit(4, rw)]
    constant_gate_ctrl_err: bool,
    #[bit(3, rw)]
    hlb_scheduling: bool,
    #[bit(2, rw)]
    hlb_frame_size: bool,
    #[bit(1, rw)]
    base_time_reg_err: bool,
    #[bit(0, rw)]
    switch_complete: bool,
}

/// Control word for the indirect GCL and EST register table access.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct GclControl {
    /// Error during the last indirect access.
    #[bit(20, rw)]
    error: bool,
    /// Address into the selected table.
    #[bits(8..=19, rw)]
    addr: u12,
    /// Debug bank select. Only evaluated when [Self::debug_mode] is set.
    #[bit(5, rw)]
    debug_bank: bool,
    /// Debug mode. Allows reading the hardware owned bank.
    #[bit(4, rw)]
    debug_mode: bool,
    /// Table select. Set for the EST register table, cleared for the GCL memory.
    #[bit(2, rw)]
    register_table: bool,
    /// Read when set, write when cleared.
    #[bit(1, rw)]
    read: bool,
    /// Start the access. Self-clears once the access completed.
    #[bit(0, rw)]
    start_busy: bool,
}

/// Entries of the indirectly accessed EST register table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum EstRegister {
    BaseTimeLow = 0,
    BaseTimeHigh = 1,
    CycleTimeLow = 2,
    CycleTimeHigh = 3,
    TimeExtension = 4,
    ListLength = 5,
}

impl EstRegister {
    #[inline]
    pub const fn addr(&self) -> u12 {
        u12::new(*self as u16)
    }
}

/// Maximum value of the cycle time seconds field.
pub const CYCLE_TIME_HIGH_MAX: u32 = 0xFF;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MtlFpeControl {
    /// Preemption classification. One bit per traffic class, set for preemptable.
    #[bits(8..=15, rw)]
    preemption_classes: u8,
    /// Additional fragment size.
    #[bits(0..=1, rw)]
    additional_fragment_size: u2,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct MtlFpeAdvance {
    /// Release advance in nanoseconds.
    #[bits(16..=31, rw)]
    release_advance: u16,
    /// Hold advance in nanoseconds.
    #[bits(0..=15, rw)]
    hold_advance: u16,
}

/// MTL Enhanced Scheduled Traffic and Frame Preemption registers.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct MtlTsn {
    control: EstControl,
    overhead: EstOverhead,
    #[mmio(PureRead, Write)]
    status: EstStatus,
    _reserved0: u32,
    #[mmio(PureRead, Write)]
    sch_error: TcErrorBitmap,
    #[mmio(PureRead, Write)]
    frame_size_error: TcErrorBitmap,
    #[mmio(PureRead)]
    frame_size_capture: FrameSizeCapture,
    _reserved1: u32,
    interrupt_enable: EstInterruptEnable,
    _reserved2: [u32; 3],
    gcl_control: GclControl,
    gcl_data: u32,
    _reserved3: [u32; 2],
    fpe_control: MtlFpeControl,
    fpe_advance: MtlFpeAdvance,
}

static_assertions::const_assert_eq!(core::mem::size_of::<MtlTsn>(), 0x48);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcl_control_read_word() {
        let ctrl = GclControl::new_with_raw_value(0)
            .with_start_busy(true)
            .with_read(true)
            .with_register_table(true)
            .with_debug_mode(true)
            .with_debug_bank(true)
            .with_addr(EstRegister::CycleTimeHigh.addr());
        assert_eq!(ctrl.raw_value(), 0x0000_0337);
    }

    #[test]
    fn gcl_entry_write_word() {
        let ctrl = GclControl::new_with_raw_value(0)
            .with_start_busy(true)
            .with_addr(u12::new(0x3FF));
        assert_eq!(ctrl.raw_value(), 0x0003_FF01);
        assert!(!ctrl.register_table());
    }

    #[test]
    fn est_control_timeouts_do_not_overlap_common_bits() {
        let eqos = EqosEstTimeouts::new_with_raw_value(0)
            .with_ptp_time_offset(0xFF)
            .with_current_time_offset(u12::new(0xFFF));
        let mgbe = MgbeEstTimeouts::new_with_raw_value(0)
            .with_ptp_time_offset(u9::new(0x1FF))
            .with_current_time_offset(u12::new(0xFFF));
        assert_eq!(eqos.raw_value() & 0xFF, 0);
        assert_eq!(mgbe.raw_value() & 0xFF, 0);
        assert_eq!(eqos.raw_value(), 0xFFFF_F000);
        assert_eq!(mgbe.raw_value(), 0xFFFF_F800);
    }

    #[test]
    fn status_bits() {
        let status = EstStatus::new_with_raw_value(0x9F);
        assert!(status.switch_complete());
        assert!(status.base_time_reg_err());
        assert!(status.hlb_frame_size());
        assert!(status.hlb_scheduling());
        assert!(status.constant_gate_ctrl_err());
        assert!(status.sw_owned_list());
    }

    #[test]
    fn fpe_control_classes() {
        let ctrl = MtlFpeControl::new_with_raw_value(0).with_preemption_classes(0xA5);
        assert_eq!(ctrl.raw_value(), 0xA500);
    }
}
