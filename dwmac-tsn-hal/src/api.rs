//! Flat configuration interface.
//!
//! Management layers pass schedules and preemption settings as plain structures of 32-bit
//! words and expect a result code, `0` on success or a negative errno value on failure. This
//! module converts between that representation and the typed API of [TsnController].
use crate::{
    controller::TsnController,
    est::{EstError, GclEntry, MAX_GCL_DEPTH, ScheduleConfig, ValidationError},
    fpe::{ConflictError, FpeConfig, FpeError},
    params::{GclParams, ParamError},
    regs::RegisterAccess,
    time::Time,
    transport::{PollDelay, TransportError},
    variant::Variant,
};

const EIO: i32 = 5;
const EBUSY: i32 = 16;
const EINVAL: i32 = 22;
const EOPNOTSUPP: i32 = 95;
const ETIMEDOUT: i32 = 110;

/// Schedule as passed by a management layer. Time values are `[nanoseconds, seconds]` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct FlatScheduleConfig {
    /// `0` disables, `1` enables EST.
    pub en_dis: u32,
    pub btr: [u32; 2],
    pub btr_offset: [u32; 2],
    pub ctr: [u32; 2],
    pub ter: u32,
    pub llr: u32,
    /// Packed entry words, gate states in the upper bits.
    pub gcl: [u32; MAX_GCL_DEPTH],
}

impl Default for FlatScheduleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatScheduleConfig {
    pub const fn new() -> Self {
        Self {
            en_dis: 0,
            btr: [0; 2],
            btr_offset: [0; 2],
            ctr: [0; 2],
            ter: 0,
            llr: 0,
            gcl: [0; MAX_GCL_DEPTH],
        }
    }

    /// Heap allocated, zero initialized configuration.
    #[cfg(feature = "alloc")]
    pub fn new_boxed() -> alloc::boxed::Box<Self> {
        alloc::boxed::Box::new(Self::new())
    }

    /// Convert into a [ScheduleConfig], unpacking the entry words with the given parameters.
    pub fn to_schedule(&self, params: &GclParams) -> Result<ScheduleConfig, ValidationError> {
        let enabled = match self.en_dis {
            0 => false,
            1 => true,
            other => return Err(ValidationError::InvalidEnable(other)),
        };
        let mut config = ScheduleConfig::new(Time::new(self.ctr[1], self.ctr[0]));
        config.enabled = enabled;
        config.time_extension = self.ter;
        config.base_time = Time::new(self.btr[1], self.btr[0]);
        config.base_time_offset = Time::new(self.btr_offset[1], self.btr_offset[0]);
        if !enabled {
            return Ok(config);
        }

        let length = self.llr as usize;
        if length == 0 || length > params.depth() {
            return Err(ValidationError::InvalidListLength {
                length,
                depth: params.depth(),
            });
        }
        for (index, &word) in self.gcl.iter().take(length).enumerate() {
            if word > params.word_max() {
                return Err(ValidationError::WordTooWide { index, word });
            }
            let (gate_states, interval) = params.unpack(word);
            // Never fails, the list has room for every word.
            let _ = config.entries.push(GclEntry::new(gate_states, interval));
        }
        config.list_length = length;
        Ok(config)
    }
}

/// Preemption settings as passed by a management layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct FlatFpeConfig {
    /// One bit per traffic class, set for preemptable.
    pub tx_queue_preemption_enable: u32,
    /// Residual receive queue.
    pub rq: u32,
}

impl FlatFpeConfig {
    pub fn to_fpe_config(&self) -> Result<FpeConfig, FpeError> {
        let preemptable_tcs = u8::try_from(self.tx_queue_preemption_enable)
            .map_err(|_| FpeError::InvalidPreemptionMask(self.tx_queue_preemption_enable))?;
        let rx_queue = match u8::try_from(self.rq) {
            Ok(queue) => queue,
            // The queue is ignored when preemption is disabled.
            Err(_) if preemptable_tcs == 0 => 0,
            Err(_) => return Err(FpeError::InvalidRxQueue(self.rq)),
        };
        Ok(FpeConfig {
            preemptable_tcs,
            rx_queue,
        })
    }
}

/// Configure EST from a flat configuration. Returns `0` or a negative error code.
pub fn config_est<R: RegisterAccess, D: PollDelay, V: Variant>(
    ctrl: &mut TsnController<R, D, V>,
    flat: &FlatScheduleConfig,
) -> i32 {
    let Some(params) = ctrl.params().copied() else {
        return EstError::Unsupported.error_code();
    };
    let result = flat
        .to_schedule(&params)
        .map_err(EstError::from)
        .and_then(|config| ctrl.configure_est(&config));
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("EST configuration failed: {e}");
            e.error_code()
        }
    }
}

/// Configure frame preemption from a flat configuration. Returns `0` or a negative error
/// code.
pub fn config_fpe<R: RegisterAccess, D: PollDelay, V: Variant>(
    ctrl: &mut TsnController<R, D, V>,
    flat: &FlatFpeConfig,
) -> i32 {
    match flat
        .to_fpe_config()
        .and_then(|config| ctrl.set_fpe(&config))
    {
        Ok(()) => 0,
        Err(e) => {
            log::error!("FPE configuration failed: {e}");
            e.error_code()
        }
    }
}

impl ValidationError {
    #[inline]
    pub const fn error_code(&self) -> i32 {
        -EINVAL
    }
}

impl TransportError {
    pub const fn error_code(&self) -> i32 {
        match self {
            TransportError::Timeout => -ETIMEDOUT,
            TransportError::HwFault => -EIO,
        }
    }
}

impl EstError {
    pub const fn error_code(&self) -> i32 {
        match self {
            EstError::Validation(e) => e.error_code(),
            EstError::Transport(e) => e.error_code(),
            EstError::Unsupported => -EOPNOTSUPP,
        }
    }
}

impl ConflictError {
    #[inline]
    pub const fn error_code(&self) -> i32 {
        -EBUSY
    }
}

impl FpeError {
    pub const fn error_code(&self) -> i32 {
        match self {
            FpeError::Conflict(e) => e.error_code(),
            FpeError::InvalidRxQueue(_) | FpeError::InvalidPreemptionMask(_) => -EINVAL,
            FpeError::Unsupported => -EOPNOTSUPP,
        }
    }
}

impl ParamError {
    pub const fn error_code(&self) -> i32 {
        match self {
            ParamError::EstUnsupported => -EOPNOTSUPP,
            ParamError::InvalidDepth(_) | ParamError::InvalidWidth(_) => -EIO,
            ParamError::InvalidResidualQueue(_) => -EINVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use dwmac_tsn::mac::{GclDepth, GclWidth};

    use super::*;
    use crate::{
        controller::Config,
        fpe::CoexistenceGate,
        sim::{FakeClock, Simulator},
        variant::{Eqos, Mgbe},
    };

    fn flat_schedule() -> FlatScheduleConfig {
        let mut flat = FlatScheduleConfig::new();
        flat.en_dis = 1;
        flat.btr = [0, 20];
        flat.ctr = [1_000_000, 0];
        flat.llr = 2;
        flat.gcl[0] = 0xFF07_A120;
        flat.gcl[1] = 0x0007_A120;
        flat
    }

    #[test]
    fn unpack_flat_schedule() {
        let params = GclParams::new(GclDepth::Entries64, GclWidth::Bits32);
        let config = flat_schedule().to_schedule(&params).unwrap();
        assert!(config.enabled);
        assert_eq!(config.cycle_time, Time::new(0, 1_000_000));
        assert_eq!(config.base_time, Time::new(20, 0));
        assert_eq!(
            config.active_entries(),
            &[GclEntry::new(0xFF, 500_000), GclEntry::new(0x00, 500_000)]
        );
    }

    #[test]
    fn flat_word_wider_than_gcl() {
        let params = GclParams::new(GclDepth::Entries64, GclWidth::Bits24);
        let mut flat = flat_schedule();
        flat.gcl[1] = 0x0100_0000;
        assert_eq!(
            flat.to_schedule(&params).map(|_| ()),
            Err(ValidationError::WordTooWide {
                index: 0,
                word: 0xFF07_A120
            })
        );
        flat.gcl[0] = 0x00FF_FFFF;
        assert_eq!(
            flat.to_schedule(&params).map(|_| ()),
            Err(ValidationError::WordTooWide {
                index: 1,
                word: 0x0100_0000
            })
        );
    }

    #[test]
    fn list_length_checked_before_word_width() {
        let params = GclParams::new(GclDepth::Entries64, GclWidth::Bits24);
        let mut flat = flat_schedule();
        flat.llr = 65;
        flat.gcl[3] = u32::MAX;
        assert_eq!(
            flat.to_schedule(&params).map(|_| ()),
            Err(ValidationError::InvalidListLength {
                length: 65,
                depth: 64
            })
        );
        flat.llr = 0;
        assert_eq!(
            flat.to_schedule(&params).map(|_| ()),
            Err(ValidationError::InvalidListLength {
                length: 0,
                depth: 64
            })
        );
    }

    #[test]
    fn enable_flag_must_be_boolean() {
        let params = GclParams::new(GclDepth::Entries64, GclWidth::Bits32);
        let mut flat = flat_schedule();
        flat.en_dis = 2;
        assert_eq!(
            flat.to_schedule(&params).map(|_| ()),
            Err(ValidationError::InvalidEnable(2))
        );
    }

    #[test]
    fn config_est_result_codes() {
        static GATE: CoexistenceGate = CoexistenceGate::new();
        let mut ctrl = TsnController::new(
            Simulator::new_eqos(),
            FakeClock::default(),
            Eqos::new(0x52),
            &GATE,
            Config::default(),
        )
        .unwrap();
        assert_eq!(config_est(&mut ctrl, &flat_schedule()), 0);

        let mut flat = flat_schedule();
        flat.llr = 0;
        assert_eq!(config_est(&mut ctrl, &flat), -22);

        ctrl.regs_mut().set_stuck_busy(true);
        assert_eq!(config_est(&mut ctrl, &flat_schedule()), -110);
        ctrl.regs_mut().set_stuck_busy(false);
        ctrl.regs_mut().set_inject_error(true);
        assert_eq!(config_est(&mut ctrl, &flat_schedule()), -5);
        ctrl.regs_mut().set_inject_error(false);

        let mut disable = FlatScheduleConfig::new();
        disable.en_dis = 0;
        assert_eq!(config_est(&mut ctrl, &disable), 0);
        assert_eq!(ctrl.read_running_schedule(), Ok(None));
    }

    #[test]
    fn config_fpe_result_codes() {
        static GATE: CoexistenceGate = CoexistenceGate::new();
        let mut ctrl = TsnController::new(
            Simulator::new_mgbe(),
            FakeClock::default(),
            Mgbe,
            &GATE,
            Config::default(),
        )
        .unwrap();
        let enable = FlatFpeConfig {
            tx_queue_preemption_enable: 0x0F,
            rq: 2,
        };
        assert_eq!(
            config_fpe(
                &mut ctrl,
                &FlatFpeConfig {
                    tx_queue_preemption_enable: 0x100,
                    rq: 2
                }
            ),
            -22
        );
        assert_eq!(
            config_fpe(
                &mut ctrl,
                &FlatFpeConfig {
                    rq: 10,
                    ..enable
                }
            ),
            -22
        );
        ctrl.set_macsec_enabled(true).unwrap();
        assert_eq!(config_fpe(&mut ctrl, &enable), -16);
        ctrl.set_macsec_enabled(false).unwrap();
        assert_eq!(config_fpe(&mut ctrl, &enable), 0);
        let disable = FlatFpeConfig {
            tx_queue_preemption_enable: 0,
            rq: 0x1_0000,
        };
        assert_eq!(config_fpe(&mut ctrl, &disable), 0);
    }

    #[test]
    fn unsupported_is_eopnotsupp() {
        static GATE: CoexistenceGate = CoexistenceGate::new();
        let mut sim = Simulator::new_eqos();
        sim.set_register(crate::regs::Reg::HwFeature3, 0);
        let mut ctrl = TsnController::new(
            sim,
            FakeClock::default(),
            Eqos::new(0x52),
            &GATE,
            Config::default(),
        )
        .unwrap();
        assert_eq!(config_est(&mut ctrl, &flat_schedule()), -95);
        assert_eq!(config_fpe(&mut ctrl, &FlatFpeConfig::default()), -95);
    }
}
