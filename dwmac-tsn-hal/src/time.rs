//! PTP time values as used by the EST base time and cycle time registers.
use dwmac_tsn::mac::SystemTimeNanoseconds;

use crate::regs::{Reg, RegisterAccess};

pub const NSEC_PER_SEC: u32 = 1_000_000_000;

/// Seconds and nanoseconds pair.
///
/// The nanoseconds part is not normalized. The hardware registers accept the value
/// [NSEC_PER_SEC] itself, so this type does as well.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time {
    pub seconds: u32,
    pub nanoseconds: u32,
}

impl Time {
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(seconds: u32, nanoseconds: u32) -> Self {
        Self {
            seconds,
            nanoseconds,
        }
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanoseconds == 0
    }

    /// Total time in nanoseconds.
    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.seconds as u64 * NSEC_PER_SEC as u64 + self.nanoseconds as u64
    }

    /// Field wise wrapping addition, matching how the hardware consumes the base time
    /// registers. Callers validate that neither field overflows beforehand.
    #[inline]
    pub const fn field_add(&self, other: Time) -> Self {
        Self {
            seconds: self.seconds.wrapping_add(other.seconds),
            nanoseconds: self.nanoseconds.wrapping_add(other.nanoseconds),
        }
    }
}

/// Read the current MAC system time.
///
/// The seconds register is read again after the nanoseconds register, and the read is retried
/// if the seconds rolled over in between.
pub fn read_device_time<R: RegisterAccess>(regs: &mut R) -> Time {
    let mut seconds = regs.read(Reg::SystemTimeSeconds);
    loop {
        let nanoseconds =
            SystemTimeNanoseconds::new_with_raw_value(regs.read(Reg::SystemTimeNanoseconds))
                .nanoseconds()
                .value();
        let seconds_again = regs.read(Reg::SystemTimeSeconds);
        if seconds_again == seconds {
            return Time::new(seconds, nanoseconds);
        }
        // Rollover, read nanoseconds again.
        seconds = seconds_again;
    }
}
