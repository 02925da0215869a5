//! Indirect access to the gate control list memory and the EST register table.
//!
//! One 32-bit word is moved per access. The access is started by writing the GCL control
//! register with the start bit set, after which the start bit is polled until the hardware
//! clears it. The first poll which sees the busy bit uses a short busy wait, all further
//! polls sleep.
use arbitrary_int::u12;
use dwmac_tsn::mtl::{EstRegister, GclControl};
use embedded_hal::delay::DelayNs;

use crate::regs::{Reg, RegisterAccess};

/// Total polling budget in microseconds.
const RETRY_BUDGET_US: u32 = 1000;
/// Busy wait after the first poll.
pub const BUSY_WAIT_US: u32 = 1;
/// Sleep granularity for all further polls.
pub const SLEEP_US: u32 = 10;
/// Number of times the control register is polled before giving up.
pub const POLL_ATTEMPTS: u32 = RETRY_BUDGET_US / SLEEP_US + 1;

/// Delay capability used while polling.
pub trait PollDelay {
    /// Short busy wait which does not yield.
    fn busy_wait_us(&mut self, us: u32);

    /// Longer wait which may yield to other users of the CPU.
    fn sleep_us(&mut self, us: u32);
}

impl<T: PollDelay> PollDelay for &mut T {
    #[inline]
    fn busy_wait_us(&mut self, us: u32) {
        (**self).busy_wait_us(us)
    }

    #[inline]
    fn sleep_us(&mut self, us: u32) {
        (**self).sleep_us(us)
    }
}

/// [PollDelay] implementation on top of two [DelayNs] providers.
pub struct Delays<B, S> {
    busy: B,
    sleep: S,
}

impl<B: DelayNs, S: DelayNs> Delays<B, S> {
    pub const fn new(busy: B, sleep: S) -> Self {
        Self { busy, sleep }
    }

    pub fn release(self) -> (B, S) {
        (self.busy, self.sleep)
    }
}

impl<B: DelayNs, S: DelayNs> PollDelay for Delays<B, S> {
    #[inline]
    fn busy_wait_us(&mut self, us: u32) {
        self.busy.delay_us(us);
    }

    #[inline]
    fn sleep_us(&mut self, us: u32) {
        self.sleep.delay_us(us);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("indirect access not acknowledged by hardware")]
    Timeout,
    #[error("hardware reported an indirect access error")]
    HwFault,
}

/// Target table of an indirect access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// Gate control list memory.
    Gcl,
    /// EST register table, see [EstRegister].
    Registers,
}

/// One of the two gate control list banks. Software writes to the software owned bank, the
/// hardware executes the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Bank0,
    Bank1,
}

impl Bank {
    /// Bank currently executed by hardware, derived from the software owned list status bit.
    #[inline]
    pub const fn hw_owned(sw_owned_list: bool) -> Self {
        if sw_owned_list {
            Bank::Bank0
        } else {
            Bank::Bank1
        }
    }
}

/// Indirect access on borrowed register and delay capabilities.
pub struct Transport<'a, R, D> {
    regs: &'a mut R,
    delay: &'a mut D,
}

impl<'a, R: RegisterAccess, D: PollDelay> Transport<'a, R, D> {
    pub fn new(regs: &'a mut R, delay: &'a mut D) -> Self {
        Self { regs, delay }
    }

    /// Write one word into the software owned bank of the given table.
    pub fn write(&mut self, table: Table, addr: u12, data: u32) -> Result<(), TransportError> {
        log::trace!("EST indirect write {table:?}[{addr}] = {data:#010x}");
        self.regs.write(Reg::GclData, data);
        let ctrl = GclControl::new_with_raw_value(0)
            .with_register_table(table == Table::Registers)
            .with_addr(addr)
            .with_start_busy(true);
        self.regs.write(Reg::GclControl, ctrl.raw_value());
        self.poll_done()
    }

    /// Read one word from the given bank of the given table.
    pub fn read(&mut self, table: Table, addr: u12, bank: Bank) -> Result<u32, TransportError> {
        let ctrl = GclControl::new_with_raw_value(0)
            .with_register_table(table == Table::Registers)
            .with_addr(addr)
            .with_debug_mode(true)
            .with_debug_bank(bank == Bank::Bank1)
            .with_read(true)
            .with_start_busy(true);
        self.regs.write(Reg::GclControl, ctrl.raw_value());
        self.poll_done()?;
        let data = self.regs.read(Reg::GclData);
        log::trace!("EST indirect read {table:?}[{addr}] from {bank:?} = {data:#010x}");
        Ok(data)
    }

    #[inline]
    pub fn write_register(&mut self, reg: EstRegister, data: u32) -> Result<(), TransportError> {
        self.write(Table::Registers, reg.addr(), data)
    }

    #[inline]
    pub fn read_register(&mut self, reg: EstRegister, bank: Bank) -> Result<u32, TransportError> {
        self.read(Table::Registers, reg.addr(), bank)
    }

    fn poll_done(&mut self) -> Result<(), TransportError> {
        let mut busy_waited = false;
        for _ in 0..POLL_ATTEMPTS {
            let ctrl = GclControl::new_with_raw_value(self.regs.read(Reg::GclControl));
            if !ctrl.start_busy() {
                if ctrl.error() {
                    log::error!("EST indirect access error, control {:#010x}", ctrl.raw_value());
                    return Err(TransportError::HwFault);
                }
                return Ok(());
            }
            if !busy_waited {
                self.delay.busy_wait_us(BUSY_WAIT_US);
                busy_waited = true;
            } else {
                self.delay.sleep_us(SLEEP_US);
            }
        }
        log::error!("EST indirect access timed out");
        Err(TransportError::Timeout)
    }
}
