//! Register level simulator of the TSN register space, used by the unit tests.
//!
//! The indirect table is modelled with two banks. Software writes into the bank selected by
//! the software owned list bit, the hardware executes the other one. Setting the list switch
//! bit together with the enable bit switches the banks immediately and reports the switch
//! completion in the status register.
use dwmac_tsn::mtl::{EstControl, EstRegister, EstStatus, GclControl};

use crate::{
    est::MAX_GCL_DEPTH,
    regs::{Reg, RegisterAccess},
    time::Time,
    transport::{PollDelay, Table},
};

const REG_COUNT: usize = Reg::SystemTimeNanoseconds as usize + 1;
const EST_REGISTER_COUNT: usize = EstRegister::ListLength as usize + 1;
const WRITE_LOG_CAPACITY: usize = 2 * MAX_GCL_DEPTH;
/// Status bits which are cleared by writing one.
const STATUS_W1C_MASK: u32 = 0x1F;
const SW_OWNED_LIST_BIT: u32 = 1 << 7;

/// One indirect write as seen by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectWrite {
    pub table: Table,
    pub addr: u16,
    pub data: u32,
}

impl IndirectWrite {
    pub const fn register(reg: EstRegister, data: u32) -> Self {
        Self {
            table: Table::Registers,
            addr: reg.addr().value(),
            data,
        }
    }

    pub const fn gcl(index: u16, data: u32) -> Self {
        Self {
            table: Table::Gcl,
            addr: index,
            data,
        }
    }
}

#[derive(Clone)]
struct Bank {
    gcl: [u32; MAX_GCL_DEPTH],
    registers: [u32; EST_REGISTER_COUNT],
}

impl Bank {
    const fn new() -> Self {
        Self {
            gcl: [0; MAX_GCL_DEPTH],
            registers: [0; EST_REGISTER_COUNT],
        }
    }
}

pub struct Simulator {
    regs: [u32; REG_COUNT],
    banks: [Bank; 2],
    sw_owned_list: bool,
    write_log: heapless::Vec<IndirectWrite, WRITE_LOG_CAPACITY>,
    // Indirect access state.
    busy_polls: u32,
    busy_remaining: u32,
    stuck_busy: bool,
    inject_error: bool,
    fail_write_at: Option<usize>,
    access_failed: bool,
    control_polls: u32,
    // Device time.
    device_time: Time,
    rolled_time: Option<Time>,
}

impl Simulator {
    fn new(hw_feature_3: u32) -> Self {
        let mut sim = Self {
            regs: [0; REG_COUNT],
            banks: [Bank::new(), Bank::new()],
            sw_owned_list: false,
            write_log: heapless::Vec::new(),
            busy_polls: 0,
            busy_remaining: 0,
            stuck_busy: false,
            inject_error: false,
            fail_write_at: None,
            access_failed: false,
            control_polls: 0,
            device_time: Time::ZERO,
            rolled_time: None,
        };
        sim.regs[Reg::HwFeature3 as usize] = hw_feature_3;
        sim
    }

    /// EQOS with EST and FPE, 64 entries of 32 bits.
    pub fn new_eqos() -> Self {
        Self::new((1 << 26) | (3 << 20) | (1 << 17) | (1 << 16))
    }

    /// MGBE with EST and FPE, 128 entries of 32 bits.
    pub fn new_mgbe() -> Self {
        Self::new((1 << 26) | (3 << 23) | (2 << 20) | (1 << 19))
    }

    /// Raw register value, without side effects.
    pub fn register(&self, reg: Reg) -> u32 {
        match reg {
            Reg::EstStatus => {
                let status = self.regs[reg as usize] & !SW_OWNED_LIST_BIT;
                if self.sw_owned_list {
                    status | SW_OWNED_LIST_BIT
                } else {
                    status
                }
            }
            Reg::SystemTimeSeconds => self.device_time.seconds,
            Reg::SystemTimeNanoseconds => self.device_time.nanoseconds,
            _ => self.regs[reg as usize],
        }
    }

    /// Set a raw register value, bypassing any write side effects. This is how tests raise
    /// status bits.
    pub fn set_register(&mut self, reg: Reg, value: u32) {
        if reg == Reg::EstStatus {
            self.sw_owned_list = value & SW_OWNED_LIST_BIT != 0;
        }
        self.regs[reg as usize] = value;
    }

    pub fn set_device_time(&mut self, time: Time) {
        self.device_time = time;
    }

    /// Advance the device time to `time` right after the next read of the seconds register.
    pub fn roll_seconds_after_first_read(&mut self, time: Time) {
        self.rolled_time = Some(time);
    }

    pub fn sw_owned_list(&self) -> bool {
        self.sw_owned_list
    }

    fn sw_bank(&self) -> usize {
        self.sw_owned_list as usize
    }

    fn hw_bank(&self) -> usize {
        !self.sw_owned_list as usize
    }

    pub fn sw_gcl(&self, index: usize) -> u32 {
        self.banks[self.sw_bank()].gcl[index]
    }

    pub fn hw_gcl(&self, index: usize) -> u32 {
        self.banks[self.hw_bank()].gcl[index]
    }

    pub fn sw_register(&self, reg: EstRegister) -> u32 {
        self.banks[self.sw_bank()].registers[reg as usize]
    }

    pub fn set_hw_register(&mut self, reg: EstRegister, value: u32) {
        let bank = self.hw_bank();
        self.banks[bank].registers[reg as usize] = value;
    }

    pub fn indirect_writes(&self) -> &[IndirectWrite] {
        &self.write_log
    }

    /// Keep the busy bit set for the first `polls` polls of every indirect access.
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Complete every indirect access with the error bit set.
    pub fn set_inject_error(&mut self, inject: bool) {
        self.inject_error = inject;
    }

    /// Let the indirect write with the given index, counted from zero, fail with the error
    /// bit. The failed write is still recorded, but does not reach the table.
    pub fn fail_indirect_write_at(&mut self, index: usize) {
        self.fail_write_at = Some(index);
    }

    /// Number of reads of the GCL control register.
    pub fn control_polls(&self) -> u32 {
        self.control_polls
    }

    pub fn reset_counters(&mut self) {
        self.control_polls = 0;
        self.write_log.clear();
    }

    fn start_indirect_access(&mut self, ctrl: GclControl) {
        self.busy_remaining = self.busy_polls;
        self.access_failed = self.inject_error;
        let table = if ctrl.register_table() {
            Table::Registers
        } else {
            Table::Gcl
        };
        let addr = ctrl.addr().value() as usize;

        if ctrl.read() {
            let bank = if ctrl.debug_mode() {
                ctrl.debug_bank() as usize
            } else {
                self.sw_bank()
            };
            let data = match table {
                Table::Gcl => self.banks[bank].gcl.get(addr).copied(),
                Table::Registers => self.banks[bank].registers.get(addr).copied(),
            };
            match data {
                Some(data) if !self.access_failed => self.regs[Reg::GclData as usize] = data,
                Some(_) => (),
                None => self.access_failed = true,
            }
            return;
        }

        let index = self.write_log.len();
        let _ = self.write_log.push(IndirectWrite {
            table,
            addr: addr as u16,
            data: self.regs[Reg::GclData as usize],
        });
        if self.fail_write_at == Some(index) {
            self.access_failed = true;
        }
        if self.access_failed {
            return;
        }
        let bank = self.sw_bank();
        let data = self.regs[Reg::GclData as usize];
        let slot = match table {
            Table::Gcl => self.banks[bank].gcl.get_mut(addr),
            Table::Registers => self.banks[bank].registers.get_mut(addr),
        };
        match slot {
            Some(slot) => *slot = data,
            None => self.access_failed = true,
        }
    }

    fn poll_gcl_control(&mut self) -> u32 {
        self.control_polls += 1;
        let ctrl = GclControl::new_with_raw_value(self.regs[Reg::GclControl as usize]);
        if !ctrl.start_busy() {
            return ctrl.raw_value();
        }
        if self.stuck_busy {
            return ctrl.raw_value();
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return ctrl.raw_value();
        }
        let done = ctrl.with_start_busy(false).with_error(self.access_failed);
        self.regs[Reg::GclControl as usize] = done.raw_value();
        done.raw_value()
    }

    fn write_est_control(&mut self, value: u32) {
        let mut control = EstControl::new_with_raw_value(value);
        if control.switch_sw_owned_list() && control.enable() {
            self.sw_owned_list = !self.sw_owned_list;
            control.set_switch_sw_owned_list(false);
            let status = EstStatus::new_with_raw_value(self.regs[Reg::EstStatus as usize])
                .with_switch_complete(true);
            self.regs[Reg::EstStatus as usize] = status.raw_value();
        }
        self.regs[Reg::EstControl as usize] = control.raw_value();
    }
}

impl RegisterAccess for Simulator {
    fn read(&mut self, reg: Reg) -> u32 {
        match reg {
            Reg::GclControl => self.poll_gcl_control(),
            Reg::SystemTimeSeconds => {
                let seconds = self.device_time.seconds;
                if let Some(time) = self.rolled_time.take() {
                    self.device_time = time;
                }
                seconds
            }
            _ => self.register(reg),
        }
    }

    fn write(&mut self, reg: Reg, value: u32) {
        match reg {
            Reg::EstStatus => self.regs[reg as usize] &= !(value & STATUS_W1C_MASK),
            Reg::EstSchError | Reg::EstFrameSizeError => self.regs[reg as usize] &= !value,
            Reg::EstControl => self.write_est_control(value),
            Reg::GclControl => {
                let ctrl = GclControl::new_with_raw_value(value);
                self.regs[reg as usize] = value;
                if ctrl.start_busy() {
                    self.start_indirect_access(ctrl);
                }
            }
            Reg::EstFrameSizeCapture
            | Reg::HwFeature3
            | Reg::SystemTimeSeconds
            | Reg::SystemTimeNanoseconds => (),
            _ => self.regs[reg as usize] = value,
        }
    }
}

/// [PollDelay] which never waits and counts the requested delays instead.
#[derive(Debug, Default)]
pub struct FakeClock {
    pub busy_waits: u32,
    pub sleeps: u32,
    pub slept_us: u32,
}

impl PollDelay for FakeClock {
    fn busy_wait_us(&mut self, _us: u32) {
        self.busy_waits += 1;
    }

    fn sleep_us(&mut self, us: u32) {
        self.sleeps += 1;
        self.slept_us += us;
    }
}

#[cfg(test)]
mod tests {
    use arbitrary_int::u12;

    use super::*;

    #[test]
    fn status_is_write_one_to_clear() {
        let mut sim = Simulator::new_eqos();
        sim.set_register(Reg::EstStatus, 0b1_0101);
        sim.write(Reg::EstStatus, 0b0_0100);
        assert_eq!(sim.read(Reg::EstStatus), 0b1_0001);
    }

    #[test]
    fn list_switch_toggles_banks() {
        let mut sim = Simulator::new_eqos();
        assert!(!sim.sw_owned_list());
        let arm = EstControl::new_with_raw_value(0)
            .with_enable(true)
            .with_switch_sw_owned_list(true);
        sim.write(Reg::EstControl, arm.raw_value());
        assert!(sim.sw_owned_list());
        assert!(EstStatus::new_with_raw_value(sim.read(Reg::EstStatus)).switch_complete());
        assert!(!EstControl::new_with_raw_value(sim.read(Reg::EstControl)).switch_sw_owned_list());
    }

    #[test]
    fn out_of_range_address_fails() {
        let mut sim = Simulator::new_eqos();
        let ctrl = GclControl::new_with_raw_value(0)
            .with_register_table(true)
            .with_addr(u12::new(0x20))
            .with_start_busy(true);
        sim.write(Reg::GclControl, ctrl.raw_value());
        assert!(GclControl::new_with_raw_value(sim.read(Reg::GclControl)).error());
    }
}
