//! # Enhanced Scheduled Traffic (IEEE 802.1Qbv)
//!
//! A schedule is a gate control list (GCL) of `{gate states, time interval}` entries which
//! repeats every cycle time, starting at the base time. New schedules are written into the
//! software owned list through the indirect [crate::transport] and become active once the
//! hardware switches the lists at the next cycle boundary after the base time.
use arbitrary_int::u12;
use dwmac_tsn::mtl::{EstControl, EstRegister, EstStatus};

use crate::{
    params::GclParams,
    regs::{Reg, RegisterAccess},
    time::{Time, read_device_time},
    transport::{Bank, PollDelay, Table, Transport, TransportError},
};

pub mod validate;

pub use validate::{ValidationError, validate};

/// Largest gate control list depth supported by any MAC.
pub const MAX_GCL_DEPTH: usize = 1024;

/// One gate control list entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GclEntry {
    /// One bit per traffic class, set for an open gate.
    pub gate_states: u8,
    /// Duration of this entry in nanoseconds.
    pub interval: u32,
}

impl GclEntry {
    #[inline]
    pub const fn new(gate_states: u8, interval: u32) -> Self {
        Self {
            gate_states,
            interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Disabling clears the EST enable bit, all other fields are ignored in that case.
    pub enabled: bool,
    /// Number of entries of [Self::entries] which are programmed.
    pub list_length: usize,
    /// Cycle time. The seconds part is limited to 8 bits by hardware.
    pub cycle_time: Time,
    /// Time extension in nanoseconds for the last entry of a cycle before a list switch.
    pub time_extension: u32,
    /// Base time. Zero selects the current device time.
    pub base_time: Time,
    /// Offset added to the base time before it is programmed.
    pub base_time_offset: Time,
    pub entries: heapless::Vec<GclEntry, MAX_GCL_DEPTH>,
}

impl ScheduleConfig {
    /// Create an enabled schedule with an empty list.
    pub fn new(cycle_time: Time) -> Self {
        Self {
            enabled: true,
            list_length: 0,
            cycle_time,
            time_extension: 0,
            base_time: Time::ZERO,
            base_time_offset: Time::ZERO,
            entries: heapless::Vec::new(),
        }
    }

    /// Schedule which disables EST.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Time::ZERO)
        }
    }

    /// Append an entry and extend the list length accordingly.
    pub fn push(&mut self, entry: GclEntry) -> Result<(), GclEntry> {
        self.entries.push(entry)?;
        self.list_length = self.entries.len();
        Ok(())
    }

    /// Entries which are programmed.
    #[inline]
    pub fn active_entries(&self) -> &[GclEntry] {
        &self.entries[..self.list_length.min(self.entries.len())]
    }

    /// Base time with the offset applied, as written to the base time registers.
    #[inline]
    pub fn effective_base_time(&self) -> Time {
        self.base_time.field_add(self.base_time_offset)
    }
}

/// Timing of the schedule executed by the hardware, read back from the hardware owned bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningSchedule {
    pub base_time: Time,
    pub cycle_time: Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EstError {
    #[error("invalid schedule: {0}")]
    Validation(#[from] ValidationError),
    #[error("indirect register access failed: {0}")]
    Transport(#[from] TransportError),
    #[error("EST not supported by hardware")]
    Unsupported,
}

/// Clear the EST enable bit. This is the only way a schedule is stopped.
pub fn disable<R: RegisterAccess>(regs: &mut R) {
    regs.modify(Reg::EstControl, |raw| {
        EstControl::new_with_raw_value(raw)
            .with_enable(false)
            .raw_value()
    });
}

#[inline]
pub fn is_enabled<R: RegisterAccess>(regs: &mut R) -> bool {
    EstControl::new_with_raw_value(regs.read(Reg::EstControl)).enable()
}

/// Read base time and cycle time of the schedule executed by the hardware.
///
/// Returns [None] if EST is disabled.
pub fn read_running_schedule<R: RegisterAccess, D: PollDelay>(
    regs: &mut R,
    delay: &mut D,
) -> Result<Option<RunningSchedule>, TransportError> {
    if !is_enabled(regs) {
        return Ok(None);
    }
    let status = EstStatus::new_with_raw_value(regs.read(Reg::EstStatus));
    let bank = Bank::hw_owned(status.sw_owned_list());
    let mut transport = Transport::new(regs, delay);
    let btr_low = transport.read_register(EstRegister::BaseTimeLow, bank)?;
    let btr_high = transport.read_register(EstRegister::BaseTimeHigh, bank)?;
    let ctr_low = transport.read_register(EstRegister::CycleTimeLow, bank)?;
    let ctr_high = transport.read_register(EstRegister::CycleTimeHigh, bank)?;
    Ok(Some(RunningSchedule {
        base_time: Time::new(btr_high, btr_low),
        cycle_time: Time::new(ctr_high, ctr_low),
    }))
}

/// Program a schedule which already passed [validate].
///
/// Writes are issued in a fixed order: cycle time, time extension and list length, then the
/// list entries in index order, then the base time, and finally the control bits which arm
/// the list switch. The first failing write aborts and leaves all earlier writes in place.
/// Every write is an unconditional overwrite, so issuing the same call again is safe.
pub fn program<R: RegisterAccess, D: PollDelay>(
    regs: &mut R,
    delay: &mut D,
    params: &GclParams,
    config: &ScheduleConfig,
) -> Result<(), EstError> {
    if !config.enabled {
        log::debug!("disabling EST");
        disable(regs);
        return Ok(());
    }
    let base_time = if config.base_time.is_zero() {
        read_device_time(regs)
    } else {
        config.base_time
    };

    let mut transport = Transport::new(regs, delay);
    log::debug!(
        "programming EST schedule: {} entries, cycle {:?}",
        config.list_length,
        config.cycle_time
    );
    transport.write_register(EstRegister::CycleTimeLow, config.cycle_time.nanoseconds)?;
    transport.write_register(
        EstRegister::CycleTimeHigh,
        config.cycle_time.seconds.min(dwmac_tsn::mtl::CYCLE_TIME_HIGH_MAX),
    )?;
    transport.write_register(EstRegister::TimeExtension, config.time_extension)?;
    transport.write_register(EstRegister::ListLength, config.list_length as u32)?;

    for (index, entry) in config.active_entries().iter().enumerate() {
        transport.write(
            Table::Gcl,
            u12::new(index as u16),
            params.pack(entry.gate_states, entry.interval),
        )?;
    }

    let base_time = base_time.field_add(config.base_time_offset);
    log::debug!("EST base time {base_time:?}");
    transport.write_register(EstRegister::BaseTimeLow, base_time.nanoseconds)?;
    transport.write_register(EstRegister::BaseTimeHigh, base_time.seconds)?;

    regs.modify(Reg::EstControl, |raw| {
        EstControl::new_with_raw_value(raw)
            .with_switch_sw_owned_list(true)
            .with_enable(true)
            .with_queue_hlb_frames(true)
            .raw_value()
    });
    Ok(())
}
