//! TSN controller, the owner of all EST and FPE state of one MAC.
use dwmac_tsn::mtl::{EstInterruptEnable, EstOverhead, MtlFpeAdvance};

use crate::{
    est::{self, EstError, RunningSchedule, ScheduleConfig},
    fpe::{self, CoexistenceGate, ConflictError, FpeConfig, FpeError},
    params::{GclParams, ParamError},
    recovery::{self, EstEvent, EstEventQueue, EstRecovery, FaultCounters, RecoveryState},
    regs::{Reg, RegisterAccess},
    time::{Time, read_device_time},
    transport::{PollDelay, TransportError},
    variant::{HwFeatures, Speed, Variant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Receive queue for preemptable traffic which is programmed during initialization.
    pub residual_queue: u8,
    pub speed: Speed,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            residual_queue: 1,
            speed: Speed::default(),
        }
    }
}

/// EST and FPE driver for one MAC.
pub struct TsnController<R, D, V> {
    regs: R,
    delay: D,
    variant: V,
    gate: &'static CoexistenceGate,
    features: HwFeatures,
    params: Option<GclParams>,
    speed: Speed,
    fpe_ready: bool,
    recovery: EstRecovery,
}

impl<R: RegisterAccess, D: PollDelay, V: Variant> TsnController<R, D, V> {
    /// Create the controller and initialize the EST and FPE blocks.
    ///
    /// The hardware feature register is evaluated once. If EST is present, the recommended
    /// EST timing and overhead values are programmed and all EST interrupts are enabled. If
    /// FPE is present, the residual queue is programmed and the MAC FPE interrupt is enabled.
    pub fn new(
        mut regs: R,
        delay: D,
        variant: V,
        gate: &'static CoexistenceGate,
        config: Config,
    ) -> Result<Self, ParamError> {
        let features = variant.hw_features(regs.read(Reg::HwFeature3));
        let params = if features.est {
            Some(GclParams::from_hw_features(&features)?)
        } else {
            None
        };
        if features.fpe
            && (config.residual_queue == 0 || config.residual_queue >= variant.max_rx_queues())
        {
            return Err(ParamError::InvalidResidualQueue(config.residual_queue));
        }

        if let Some(params) = &params {
            log::debug!(
                "EST with {} entries of {} bits",
                params.depth(),
                params.width().word_bits()
            );
            let macsec_enabled = gate.macsec_enabled();
            regs.modify(Reg::EstControl, |raw| {
                variant.est_control_defaults(raw, macsec_enabled)
            });
            regs.modify(Reg::EstOverhead, |raw| {
                EstOverhead::new_with_raw_value(raw)
                    .with_overhead(variant.est_overhead())
                    .raw_value()
            });
            regs.modify(Reg::EstInterruptEnable, |raw| {
                EstInterruptEnable::new_with_raw_value(raw)
                    .with_constant_gate_ctrl_err(true)
                    .with_hlb_scheduling(true)
                    .with_hlb_frame_size(true)
                    .with_base_time_reg_err(true)
                    .with_switch_complete(true)
                    .raw_value()
            });
        }
        if features.fpe {
            variant.set_residual_queue(&mut regs, config.residual_queue);
            variant.enable_fpe_interrupt(&mut regs);
        }

        Ok(Self {
            regs,
            delay,
            variant,
            gate,
            features,
            params,
            speed: config.speed,
            fpe_ready: false,
            recovery: EstRecovery::new(),
        })
    }

    #[inline]
    pub fn features(&self) -> &HwFeatures {
        &self.features
    }

    /// Gate control list parameters, [None] if the MAC does not support EST.
    #[inline]
    pub fn params(&self) -> Option<&GclParams> {
        self.params.as_ref()
    }

    #[inline]
    pub fn variant(&self) -> &V {
        &self.variant
    }

    /// Direct register access.
    #[inline]
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Validate and program a schedule.
    ///
    /// A zero base time is replaced by the current device time before validation. The
    /// schedule is checked against the schedule currently executed by the hardware, if any.
    pub fn configure_est(&mut self, config: &ScheduleConfig) -> Result<(), EstError> {
        let params = self.params.ok_or(EstError::Unsupported)?;
        if !config.enabled {
            self.recovery.schedule_disabled();
            return est::program(&mut self.regs, &mut self.delay, &params, config);
        }

        let resolved;
        let config = if config.base_time.is_zero() {
            resolved = ScheduleConfig {
                base_time: read_device_time(&mut self.regs),
                ..config.clone()
            };
            &resolved
        } else {
            config
        };

        let running = est::read_running_schedule(&mut self.regs, &mut self.delay)?;
        if let Err(e) = est::validate(
            config,
            &params,
            self.variant.guard_band_ns(),
            running.as_ref(),
        ) {
            log::error!("rejecting EST schedule: {e}");
            return Err(e.into());
        }
        est::program(&mut self.regs, &mut self.delay, &params, config)
    }

    /// Schedule currently executed by the hardware, [None] if EST is disabled.
    pub fn read_running_schedule(&mut self) -> Result<Option<RunningSchedule>, TransportError> {
        est::read_running_schedule(&mut self.regs, &mut self.delay)
    }

    #[inline]
    pub fn current_device_time(&mut self) -> Time {
        read_device_time(&mut self.regs)
    }

    /// Configure frame preemption, see [fpe::set_fpe].
    pub fn set_fpe(&mut self, config: &FpeConfig) -> Result<(), FpeError> {
        if !self.features.fpe {
            return Err(FpeError::Unsupported);
        }
        // Verification restarts with any change, including a rejected one.
        self.fpe_ready = false;
        fpe::set_fpe(&mut self.regs, &self.variant, self.gate, config, self.speed)
    }

    /// Enable or disable MACsec on this MAC.
    ///
    /// Fails if frame preemption is enabled on a MAC which can not run both. The EST current
    /// time offset depends on the MACsec pipeline latency and is updated accordingly.
    pub fn set_macsec_enabled(&mut self, enable: bool) -> Result<(), ConflictError> {
        self.gate
            .set_macsec_enabled(enable, self.variant.fpe_excludes_macsec())?;
        if self.params.is_some() {
            let variant = &self.variant;
            self.regs.modify(Reg::EstControl, |raw| {
                variant.est_control_defaults(raw, enable)
            });
        }
        Ok(())
    }

    /// Update the link speed. The FPE hold advance is reprogrammed if preemption is enabled.
    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
        if self.gate.fpe_enabled() {
            self.regs.modify(Reg::MtlFpeAdvance, |raw| {
                MtlFpeAdvance::new_with_raw_value(raw)
                    .with_hold_advance(speed.fpe_hold_advance())
                    .raw_value()
            });
        }
    }

    #[inline]
    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Service the MAC FPE interrupt.
    pub fn handle_fpe_interrupt(&mut self) {
        if let Some(ready) = fpe::handle_fpe_interrupt(&mut self.regs) {
            self.fpe_ready = ready;
        }
    }

    /// Whether the link partner completed the preemption verification.
    #[inline]
    pub fn fpe_ready(&self) -> bool {
        self.fpe_ready
    }

    #[inline]
    pub fn fpe_enabled(&self) -> bool {
        self.gate.fpe_enabled()
    }

    /// Apply one captured EST event.
    pub fn process_est_event(&mut self, event: &EstEvent) {
        self.recovery.handle(event, &mut self.regs, &self.variant);
    }

    /// Apply all queued EST events. Returns the number of processed events.
    pub fn process_est_events<const N: usize>(&mut self, queue: &EstEventQueue<N>) -> usize {
        let mut processed = 0;
        while let Some(event) = queue.try_receive() {
            self.process_est_event(&event);
            processed += 1;
        }
        processed
    }

    /// Capture and apply pending EST events directly, for users which poll the status instead
    /// of using [recovery::on_interrupt] and a queue.
    pub fn handle_est_interrupt(&mut self) -> Option<EstEvent> {
        let event = recovery::capture_est_event(&mut self.regs)?;
        self.process_est_event(&event);
        Some(event)
    }

    #[inline]
    pub fn est_ready(&self) -> bool {
        self.recovery.est_ready()
    }

    #[inline]
    pub fn recovery_state(&self) -> RecoveryState {
        self.recovery.state()
    }

    #[inline]
    pub fn counters(&self) -> &FaultCounters {
        self.recovery.counters()
    }

    pub fn release(self) -> (R, D, V) {
        (self.regs, self.delay, self.variant)
    }
}
