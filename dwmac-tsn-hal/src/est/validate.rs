//! Gate control list validation.
//!
//! Validation is a pure computation over the schedule, the gate control list parameters of
//! the MAC and the currently running schedule, if any. It never touches the hardware.
use crate::{
    params::GclParams,
    time::{NSEC_PER_SEC, Time},
};

use super::{RunningSchedule, ScheduleConfig};

/// Largest value of the 31-bit time extension register.
pub const TIME_EXTENSION_MAX: u32 = 0x7FFF_FFFF;
/// Largest value of the cycle time seconds register.
pub const CYCLE_TIME_SECONDS_MAX: u32 = dwmac_tsn::mtl::CYCLE_TIME_HIGH_MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid enable value {0}")]
    InvalidEnable(u32),
    #[error("list length {length} not in 1..={depth}")]
    InvalidListLength { length: usize, depth: usize },
    #[error("list length {length} but only {available} entries supplied")]
    MissingEntries { length: usize, available: usize },
    #[error("time extension {0:#x} exceeds 31 bits")]
    InvalidTimeExtension(u32),
    #[error("invalid cycle time {0:?}")]
    InvalidCycleTime(Time),
    #[error("invalid base time {0:?}")]
    InvalidBaseTime(Time),
    #[error("base time offset {0:?} overflows the base time")]
    InvalidBaseTimeOffset(Time),
    #[error("interval {interval} of entry {index} exceeds the GCL width")]
    EntryTooWide { index: usize, interval: u32 },
    #[error("word {word:#x} of entry {index} exceeds the GCL width")]
    WordTooWide { index: usize, word: u32 },
    #[error("entry {index} starts at or after the end of the cycle")]
    EntryBeyondCycle { index: usize },
    #[error("entry {index} truncated less than one guard band before the cycle end")]
    TruncationWithoutGuard { index: usize },
    #[error("entries cover {covered} ns of a {cycle} ns cycle")]
    CycleTimeNotCovered { covered: u64, cycle: u64 },
    #[error("base time is {delta} ns from a cycle boundary of the running schedule")]
    IncompatibleBaseTime { delta: u64 },
}

/// Validate an enabled schedule.
///
/// `guard_band_ns` is the minimum distance between a truncation or schedule switch and a
/// cycle boundary. `running` is the schedule currently executed by the hardware.
pub fn validate(
    config: &ScheduleConfig,
    params: &GclParams,
    guard_band_ns: u64,
    running: Option<&RunningSchedule>,
) -> Result<(), ValidationError> {
    check_list_length(config, params)?;
    if config.time_extension > TIME_EXTENSION_MAX {
        return Err(ValidationError::InvalidTimeExtension(config.time_extension));
    }
    check_times(config)?;
    check_entry_widths(config, params)?;
    check_running_sum(config, guard_band_ns)?;
    if let Some(running) = running {
        check_base_time_compatibility(config, running, guard_band_ns)?;
    }
    Ok(())
}

fn check_list_length(config: &ScheduleConfig, params: &GclParams) -> Result<(), ValidationError> {
    let depth = params.depth();
    if config.list_length == 0 || config.list_length > depth {
        return Err(ValidationError::InvalidListLength {
            length: config.list_length,
            depth,
        });
    }
    if config.entries.len() < config.list_length {
        return Err(ValidationError::MissingEntries {
            length: config.list_length,
            available: config.entries.len(),
        });
    }
    Ok(())
}

fn check_times(config: &ScheduleConfig) -> Result<(), ValidationError> {
    let cycle = config.cycle_time;
    if cycle.nanoseconds > NSEC_PER_SEC || cycle.seconds > CYCLE_TIME_SECONDS_MAX || cycle.is_zero()
    {
        return Err(ValidationError::InvalidCycleTime(cycle));
    }
    if config.base_time.nanoseconds > NSEC_PER_SEC {
        return Err(ValidationError::InvalidBaseTime(config.base_time));
    }
    let offset = config.base_time_offset;
    if offset.nanoseconds > NSEC_PER_SEC
        || config.base_time.nanoseconds > NSEC_PER_SEC - offset.nanoseconds
        || config.base_time.seconds > u32::MAX - offset.seconds
    {
        return Err(ValidationError::InvalidBaseTimeOffset(offset));
    }
    Ok(())
}

fn check_entry_widths(config: &ScheduleConfig, params: &GclParams) -> Result<(), ValidationError> {
    let mask = params.interval_mask();
    for (index, entry) in config.active_entries().iter().enumerate() {
        if entry.interval > mask {
            return Err(ValidationError::EntryTooWide {
                index,
                interval: entry.interval,
            });
        }
    }
    Ok(())
}

/// The hardware truncates the entry which crosses the cycle end. That entry must start at
/// least one guard band before the cycle end, and an entry ending before the cycle end must
/// leave either no time or at least one guard band.
fn check_running_sum(config: &ScheduleConfig, guard_band_ns: u64) -> Result<(), ValidationError> {
    let cycle = config.cycle_time.as_nanos();
    let mut start: u64 = 0;
    for (index, entry) in config.active_entries().iter().enumerate() {
        if start >= cycle {
            return Err(ValidationError::EntryBeyondCycle { index });
        }
        let end = start + entry.interval as u64;
        let remaining = if end > cycle {
            cycle - start
        } else {
            cycle - end
        };
        if remaining != 0 && remaining < guard_band_ns {
            return Err(ValidationError::TruncationWithoutGuard { index });
        }
        start = end;
    }
    if start < cycle {
        return Err(ValidationError::CycleTimeNotCovered {
            covered: start,
            cycle,
        });
    }
    Ok(())
}

fn check_base_time_compatibility(
    config: &ScheduleConfig,
    running: &RunningSchedule,
    guard_band_ns: u64,
) -> Result<(), ValidationError> {
    let old_cycle = running.cycle_time.as_nanos();
    if old_cycle == 0 {
        return Ok(());
    }
    let new_base = config.effective_base_time().as_nanos();
    let old_base = running.base_time.as_nanos();
    let delta = new_base.abs_diff(old_base) % old_cycle;
    if delta != 0 && delta < guard_band_ns {
        return Err(ValidationError::IncompatibleBaseTime { delta });
    }
    Ok(())
}
