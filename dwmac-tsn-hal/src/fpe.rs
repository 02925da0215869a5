//! # Frame Preemption
//!
//! Frame preemption allows express traffic to interrupt the transmission of preemptable
//! frames. On most MAC revisions it can not be used together with MACsec. The
//! [CoexistenceGate] enforces this with a check under a critical section which is shared by
//! the FPE configuration and the MACsec enable path.
use core::cell::Cell;

use critical_section::Mutex;
use dwmac_tsn::{
    mac::MacFpeControl,
    mtl::{MtlFpeAdvance, MtlFpeControl},
};

use crate::{
    regs::{Reg, RegisterAccess},
    variant::{Speed, Variant},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FpeConfig {
    /// One bit per traffic class, set for preemptable. Zero reverts all classes to express.
    pub preemptable_tcs: u8,
    /// Receive queue for preemptable traffic. Must be in `1..max_rx_queues`.
    pub rx_queue: u8,
}

/// FPE and MACsec can not be active at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("frame preemption and MACsec can not be enabled at the same time")]
pub struct ConflictError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FpeError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("invalid residual receive queue {0}")]
    InvalidRxQueue(u32),
    #[error("invalid preemptable traffic class mask {0:#x}")]
    InvalidPreemptionMask(u32),
    #[error("FPE not supported by hardware")]
    Unsupported,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct GateState {
    fpe_enabled: bool,
    macsec_enabled: bool,
}

/// Mutual exclusion between frame preemption and MACsec for one MAC.
///
/// This is meant to be placed in a static, so it can be shared by the TSN controller and the
/// MACsec driver of the same MAC.
pub struct CoexistenceGate {
    state: Mutex<Cell<GateState>>,
}

impl Default for CoexistenceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CoexistenceGate {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(GateState {
                fpe_enabled: false,
                macsec_enabled: false,
            })),
        }
    }

    pub fn fpe_enabled(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().fpe_enabled)
    }

    pub fn macsec_enabled(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().macsec_enabled)
    }

    /// Record a MACsec enable or disable request.
    ///
    /// Enabling fails with [ConflictError] if `exclusive` is set and frame preemption is
    /// currently enabled. Disabling always succeeds.
    pub fn set_macsec_enabled(&self, enable: bool, exclusive: bool) -> Result<(), ConflictError> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if enable && exclusive && state.fpe_enabled {
                return Err(ConflictError);
            }
            state.macsec_enabled = enable;
            cell.set(state);
            Ok(())
        })
    }

    /// Run `f` with the lock held. `f` receives the current FPE enabled state and returns the
    /// new one. If `exclusive` is set and MACsec is enabled, `f` is not called and
    /// [ConflictError] is returned.
    fn update_fpe<E: From<ConflictError>>(
        &self,
        exclusive: bool,
        f: impl FnOnce(bool) -> Result<bool, E>,
    ) -> Result<(), E> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if exclusive && state.macsec_enabled {
                return Err(ConflictError.into());
            }
            state.fpe_enabled = f(state.fpe_enabled)?;
            cell.set(state);
            Ok(())
        })
    }
}

/// Configure frame preemption.
///
/// A zero traffic class mask disables preemption. Otherwise the preemptable classes, the
/// residual receive queue and the hold advance for the given link speed are programmed and a
/// verify mPacket is sent to the link partner. Preemption becomes active once the verification
/// handshake completed, see [handle_fpe_interrupt].
pub fn set_fpe<R: RegisterAccess, V: Variant>(
    regs: &mut R,
    variant: &V,
    gate: &CoexistenceGate,
    config: &FpeConfig,
    speed: Speed,
) -> Result<(), FpeError> {
    let exclusive = variant.fpe_excludes_macsec();
    gate.update_fpe(exclusive, |_| {
        if config.preemptable_tcs == 0 {
            log::debug!("disabling frame preemption");
            regs.modify(Reg::MtlFpeControl, |raw| {
                MtlFpeControl::new_with_raw_value(raw)
                    .with_preemption_classes(0)
                    .raw_value()
            });
            regs.modify(Reg::MacFpeControl, |raw| {
                MacFpeControl::new_with_raw_value(raw)
                    .with_enable(false)
                    .raw_value()
            });
            return Ok(false);
        }

        if config.rx_queue == 0 || config.rx_queue >= variant.max_rx_queues() {
            log::error!("invalid FPE residual queue {}", config.rx_queue);
            return Err(FpeError::InvalidRxQueue(config.rx_queue as u32));
        }
        log::debug!(
            "enabling frame preemption for classes {:#04x}, residual queue {}",
            config.preemptable_tcs,
            config.rx_queue
        );
        regs.modify(Reg::MtlFpeControl, |raw| {
            MtlFpeControl::new_with_raw_value(raw)
                .with_preemption_classes(config.preemptable_tcs)
                .raw_value()
        });
        variant.set_residual_queue(regs, config.rx_queue);
        regs.modify(Reg::MacFpeControl, |raw| {
            MacFpeControl::new_with_raw_value(raw)
                .with_send_verify(true)
                .raw_value()
        });
        regs.modify(Reg::MtlFpeAdvance, |raw| {
            MtlFpeAdvance::new_with_raw_value(raw)
                .with_hold_advance(speed.fpe_hold_advance())
                .raw_value()
        });
        Ok(true)
    })
}

/// Service the MAC FPE verification handshake interrupt.
///
/// Returns the new FPE ready state if the handshake changed it.
pub fn handle_fpe_interrupt<R: RegisterAccess>(regs: &mut R) -> Option<bool> {
    let mut ctrl = MacFpeControl::new_with_raw_value(regs.read(Reg::MacFpeControl));
    let mut ready = None;

    if ctrl.rx_verify() {
        ctrl.set_rx_verify(false);
        ctrl.set_send_respond(true);
    }
    if ctrl.rx_respond() {
        // The link partner supports preemption.
        ctrl.set_rx_respond(false);
        ctrl.set_tx_verify(false);
        ctrl.set_enable(true);
        ready = Some(true);
    }
    if ctrl.tx_respond() {
        ctrl.set_tx_respond(false);
        ctrl.set_tx_verify(false);
        ctrl.set_enable(true);
        ready = Some(true);
    }
    if ctrl.tx_verify() {
        ctrl.set_tx_verify(false);
        ctrl.set_enable(false);
        ready = Some(false);
    }

    regs.write(Reg::MacFpeControl, ctrl.raw_value());
    if let Some(ready) = ready {
        log::debug!("FPE ready: {ready}");
    }
    ready
}
