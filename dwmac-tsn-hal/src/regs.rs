//! Register access abstraction.
//!
//! The TSN logic only talks to the hardware through [RegisterAccess]. [EqosRegisters] and
//! [MgbeRegisters] implement it on top of the MMIO register blocks of the PAC, tests use a
//! register level simulator instead.
use dwmac_tsn::{
    mac::{
        EqosInterruptEnable, EqosMac, EqosRxQueueControl1, MacFpeControl, MgbeInterruptEnable,
        MgbeMac, MgbeRxQueueControl1, MgbeRxQueueControl4, MmioEqosMac, MmioMgbeMac,
    },
    mtl::{
        EstControl, EstInterruptEnable, EstOverhead, EstStatus, GclControl, MtlFpeAdvance,
        MtlFpeControl, TcErrorBitmap,
    },
};

/// Registers used by the TSN logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    EstControl,
    EstOverhead,
    EstStatus,
    EstSchError,
    EstFrameSizeError,
    EstFrameSizeCapture,
    EstInterruptEnable,
    GclControl,
    GclData,
    MtlFpeControl,
    MtlFpeAdvance,
    RxQueueControl1,
    /// Only implemented by the MGBE family.
    RxQueueControl4,
    MacInterruptEnable,
    HwFeature3,
    MacFpeControl,
    SystemTimeSeconds,
    SystemTimeNanoseconds,
}

/// Raw 32-bit register access.
pub trait RegisterAccess {
    fn read(&mut self, reg: Reg) -> u32;

    fn write(&mut self, reg: Reg, value: u32);

    #[inline]
    fn modify(&mut self, reg: Reg, f: impl FnOnce(u32) -> u32) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

impl<T: RegisterAccess> RegisterAccess for &mut T {
    #[inline]
    fn read(&mut self, reg: Reg) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: Reg, value: u32) {
        (**self).write(reg, value)
    }
}

/// Register access for an EQOS MAC.
pub struct EqosRegisters {
    regs: MmioEqosMac<'static>,
}

impl EqosRegisters {
    #[inline]
    pub const fn new(regs: MmioEqosMac<'static>) -> Self {
        Self { regs }
    }

    /// Create the register access for the EQOS MAC at the given base address.
    ///
    /// # Safety
    ///
    /// The address must point to an EQOS register block and no other driver may access the
    /// TSN registers of that MAC concurrently.
    pub unsafe fn new_at_base(base_addr: usize) -> Self {
        Self::new(unsafe { EqosMac::new_mmio_at_base(base_addr) })
    }
}

impl RegisterAccess for EqosRegisters {
    fn read(&mut self, reg: Reg) -> u32 {
        match reg {
            Reg::EstControl => self.regs.mtl_tsn().read_control().raw_value(),
            Reg::EstOverhead => self.regs.mtl_tsn().read_overhead().raw_value(),
            Reg::EstStatus => self.regs.mtl_tsn().read_status().raw_value(),
            Reg::EstSchError => self.regs.mtl_tsn().read_sch_error().raw_value(),
            Reg::EstFrameSizeError => self.regs.mtl_tsn().read_frame_size_error().raw_value(),
            Reg::EstFrameSizeCapture => self.regs.mtl_tsn().read_frame_size_capture().raw_value(),
            Reg::EstInterruptEnable => self.regs.mtl_tsn().read_interrupt_enable().raw_value(),
            Reg::GclControl => self.regs.mtl_tsn().read_gcl_control().raw_value(),
            Reg::GclData => self.regs.mtl_tsn().read_gcl_data(),
            Reg::MtlFpeControl => self.regs.mtl_tsn().read_fpe_control().raw_value(),
            Reg::MtlFpeAdvance => self.regs.mtl_tsn().read_fpe_advance().raw_value(),
            Reg::RxQueueControl1 => self.regs.read_rx_queue_ctrl_1().raw_value(),
            Reg::RxQueueControl4 => 0,
            Reg::MacInterruptEnable => self.regs.read_interrupt_enable().raw_value(),
            Reg::HwFeature3 => self.regs.read_hw_feature_3().raw_value(),
            Reg::MacFpeControl => self.regs.read_fpe_ctrl().raw_value(),
            Reg::SystemTimeSeconds => self.regs.read_system_time_seconds(),
            Reg::SystemTimeNanoseconds => self.regs.read_system_time_nanoseconds().raw_value(),
        }
    }

    fn write(&mut self, reg: Reg, value: u32) {
        match reg {
            Reg::EstControl => self
                .regs
                .mtl_tsn()
                .write_control(EstControl::new_with_raw_value(value)),
            Reg::EstOverhead => self
                .regs
                .mtl_tsn()
                .write_overhead(EstOverhead::new_with_raw_value(value)),
            Reg::EstStatus => self
                .regs
                .mtl_tsn()
                .write_status(EstStatus::new_with_raw_value(value)),
            Reg::EstSchError => self
                .regs
                .mtl_tsn()
                .write_sch_error(TcErrorBitmap::new_with_raw_value(value)),
            Reg::EstFrameSizeError => self
                .regs
                .mtl_tsn()
                .write_frame_size_error(TcErrorBitmap::new_with_raw_value(value)),
            Reg::EstInterruptEnable => self
                .regs
                .mtl_tsn()
                .write_interrupt_enable(EstInterruptEnable::new_with_raw_value(value)),
            Reg::GclControl => self
                .regs
                .mtl_tsn()
                .write_gcl_control(GclControl::new_with_raw_value(value)),
            Reg::GclData => self.regs.mtl_tsn().write_gcl_data(value),
            Reg::MtlFpeControl => self
                .regs
                .mtl_tsn()
                .write_fpe_control(MtlFpeControl::new_with_raw_value(value)),
            Reg::MtlFpeAdvance => self
                .regs
                .mtl_tsn()
                .write_fpe_advance(MtlFpeAdvance::new_with_raw_value(value)),
            Reg::RxQueueControl1 => self
                .regs
                .write_rx_queue_ctrl_1(EqosRxQueueControl1::new_with_raw_value(value)),
            Reg::MacInterruptEnable => self
                .regs
                .write_interrupt_enable(EqosInterruptEnable::new_with_raw_value(value)),
            Reg::MacFpeControl => self
                .regs
                .write_fpe_ctrl(MacFpeControl::new_with_raw_value(value)),
            // Read-only or not implemented by this MAC family.
            Reg::EstFrameSizeCapture
            | Reg::RxQueueControl4
            | Reg::HwFeature3
            | Reg::SystemTimeSeconds
            | Reg::SystemTimeNanoseconds => {
                log::warn!("ignoring write to read-only EQOS register {reg:?}");
            }
        }
    }
}

/// Register access for an MGBE MAC.
pub struct MgbeRegisters {
    regs: MmioMgbeMac<'static>,
}

impl MgbeRegisters {
    #[inline]
    pub const fn new(regs: MmioMgbeMac<'static>) -> Self {
        Self { regs }
    }

    /// Create the register access for the MGBE MAC at the given base address.
    ///
    /// # Safety
    ///
    /// The address must point to an MGBE register block and no other driver may access the
    /// TSN registers of that MAC concurrently.
    pub unsafe fn new_at_base(base_addr: usize) -> Self {
        Self::new(unsafe { MgbeMac::new_mmio_at_base(base_addr) })
    }
}

impl RegisterAccess for MgbeRegisters {
    fn read(&mut self, reg: Reg) -> u32 {
        match reg {
            Reg::EstControl => self.regs.mtl_tsn().read_control().raw_value(),
            Reg::EstOverhead => self.regs.mtl_tsn().read_overhead().raw_value(),
            Reg::EstStatus => self.regs.mtl_tsn().read_status().raw_value(),
            Reg::EstSchError => self.regs.mtl_tsn().read_sch_error().raw_value(),
            Reg::EstFrameSizeError => self.regs.mtl_tsn().read_frame_size_error().raw_value(),
            Reg::EstFrameSizeCapture => self.regs.mtl_tsn().read_frame_size_capture().raw_value(),
            Reg::EstInterruptEnable => self.regs.mtl_tsn().read_interrupt_enable().raw_value(),
            Reg::GclControl => self.regs.mtl_tsn().read_gcl_control().raw_value(),
            Reg::GclData => self.regs.mtl_tsn().read_gcl_data(),
            Reg::MtlFpeControl => self.regs.mtl_tsn().read_fpe_control().raw_value(),
            Reg::MtlFpeAdvance => self.regs.mtl_tsn().read_fpe_advance().raw_value(),
            Reg::RxQueueControl1 => self.regs.read_rx_queue_ctrl_1().raw_value(),
            Reg::RxQueueControl4 => self.regs.read_rx_queue_ctrl_4().raw_value(),
            Reg::MacInterruptEnable => self.regs.read_interrupt_enable().raw_value(),
            Reg::HwFeature3 => self.regs.read_hw_feature_3().raw_value(),
            Reg::MacFpeControl => self.regs.read_fpe_ctrl().raw_value(),
            Reg::SystemTimeSeconds => self.regs.read_system_time_seconds(),
            Reg::SystemTimeNanoseconds => self.regs.read_system_time_nanoseconds().raw_value(),
        }
    }

    fn write(&mut self, reg: Reg, value: u32) {
        match reg {
            Reg::EstControl => self
                .regs
                .mtl_tsn()
                .write_control(EstControl::new_with_raw_value(value)),
            Reg::EstOverhead => self
                .regs
                .mtl_tsn()
                .write_overhead(EstOverhead::new_with_raw_value(value)),
            Reg::EstStatus => self
                .regs
                .mtl_tsn()
                .write_status(EstStatus::new_with_raw_value(value)),
            Reg::EstSchError => self
                .regs
                .mtl_tsn()
                .write_sch_error(TcErrorBitmap::new_with_raw_value(value)),
            Reg::EstFrameSizeError => self
                .regs
                .mtl_tsn()
                .write_frame_size_error(TcErrorBitmap::new_with_raw_value(value)),
            Reg::EstInterruptEnable => self
                .regs
                .mtl_tsn()
                .write_interrupt_enable(EstInterruptEnable::new_with_raw_value(value)),
            Reg::GclControl => self
                .regs
                .mtl_tsn()
                .write_gcl_control(GclControl::new_with_raw_value(value)),
            Reg::GclData => self.regs.mtl_tsn().write_gcl_data(value),
            Reg::MtlFpeControl => self
                .regs
                .mtl_tsn()
                .write_fpe_control(MtlFpeControl::new_with_raw_value(value)),
            Reg::MtlFpeAdvance => self
                .regs
                .mtl_tsn()
                .write_fpe_advance(MtlFpeAdvance::new_with_raw_value(value)),
            Reg::RxQueueControl1 => self
                .regs
                .write_rx_queue_ctrl_1(MgbeRxQueueControl1::new_with_raw_value(value)),
            Reg::RxQueueControl4 => self
                .regs
                .write_rx_queue_ctrl_4(MgbeRxQueueControl4::new_with_raw_value(value)),
            Reg::MacInterruptEnable => self
                .regs
                .write_interrupt_enable(MgbeInterruptEnable::new_with_raw_value(value)),
            Reg::MacFpeControl => self
                .regs
                .write_fpe_ctrl(MacFpeControl::new_with_raw_value(value)),
            Reg::EstFrameSizeCapture
            | Reg::HwFeature3
            | Reg::SystemTimeSeconds
            | Reg::SystemTimeNanoseconds => {
                log::warn!("ignoring write to read-only MGBE register {reg:?}");
            }
        }
    }
}
