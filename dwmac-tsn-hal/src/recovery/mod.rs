//! # EST fault recovery
//!
//! The EST block raises an interrupt on schedule errors and on a completed list switch. The
//! interrupt half, [on_interrupt] or [capture_est_event], only snapshots and clears the status
//! and the per traffic class detail registers. The captured [EstEvent]s are consumed by
//! [EstRecovery], which keeps the [FaultCounters], tracks whether the schedule is healthy and
//! disables a schedule which would otherwise block a traffic class.
use core::cell::Cell;

use critical_section::Mutex;
use dwmac_tsn::mtl::{EstControl, EstStatus, TcErrorBitmap};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

use crate::{
    est,
    regs::{Reg, RegisterAccess},
    variant::{MAX_TRAFFIC_CLASSES, Variant},
};

pub mod asynch;

/// Status bits which are handled as events.
const EVENT_MASK: u32 = EstStatus::new_with_raw_value(0)
    .with_constant_gate_ctrl_err(true)
    .with_hlb_scheduling(true)
    .with_hlb_frame_size(true)
    .with_base_time_reg_err(true)
    .with_switch_complete(true)
    .raw_value();

/// Snapshot of one EST interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstEvent {
    pub status: EstStatus,
    /// Traffic classes with a head-of-line blocking due to scheduling.
    pub sch_error: u8,
    /// Traffic classes with a head-of-line blocking due to frame size.
    pub frame_size_error: u8,
}

/// Read and clear the pending EST events.
///
/// Returns [None] if no event bit is set. The detail registers are only read and cleared if
/// the matching status bit is set.
pub fn capture_est_event<R: RegisterAccess>(regs: &mut R) -> Option<EstEvent> {
    let raw = regs.read(Reg::EstStatus) & EVENT_MASK;
    if raw == 0 {
        return None;
    }
    let status = EstStatus::new_with_raw_value(raw);
    let mut sch_error = 0;
    let mut frame_size_error = 0;
    if status.hlb_scheduling() {
        let raw = regs.read(Reg::EstSchError);
        sch_error = TcErrorBitmap::new_with_raw_value(raw).traffic_classes();
        regs.write(Reg::EstSchError, sch_error as u32);
    }
    if status.hlb_frame_size() {
        let raw = regs.read(Reg::EstFrameSizeError);
        frame_size_error = TcErrorBitmap::new_with_raw_value(raw).traffic_classes();
        regs.write(Reg::EstFrameSizeError, frame_size_error as u32);
    }
    regs.write(Reg::EstStatus, raw);
    Some(EstEvent {
        status,
        sch_error,
        frame_size_error,
    })
}

/// Bounded queue between the interrupt half and the recovery consumer.
pub struct EstEventQueue<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, EstEvent, N>,
    dropped: Mutex<Cell<u32>>,
}

impl<const N: usize> Default for EstEventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EstEventQueue<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: Mutex::new(Cell::new(0)),
        }
    }

    /// Post an event. If the queue is full, the event is dropped and counted.
    pub fn post(&self, event: EstEvent) {
        if self.channel.try_send(event).is_err() {
            critical_section::with(|cs| {
                let dropped = self.dropped.borrow(cs);
                dropped.set(dropped.get().saturating_add(1));
            });
        }
    }

    #[inline]
    pub fn try_receive(&self) -> Option<EstEvent> {
        self.channel.try_receive().ok()
    }

    #[inline]
    pub async fn receive(&self) -> EstEvent {
        self.channel.receive().await
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.dropped.borrow(cs).get())
    }
}

/// Interrupt handler for the EST interrupt.
///
/// The user has to call this in the interrupt handler responsible for the MTL EST interrupt of
/// the MAC. Returns whether an event was captured.
pub fn on_interrupt<R: RegisterAccess, const N: usize>(
    regs: &mut R,
    queue: &EstEventQueue<N>,
) -> bool {
    match capture_est_event(regs) {
        Some(event) => {
            queue.post(event);
            true
        }
        None => false,
    }
}

/// Fault counters. They only ever increase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultCounters {
    pub const_gate_ctrl_err: u64,
    pub head_of_line_blk_sch: u64,
    pub head_of_line_blk_frm: u64,
    /// Head-of-line blocking due to scheduling, per traffic class.
    pub hlbs_per_tc: [u64; MAX_TRAFFIC_CLASSES],
    /// Head-of-line blocking due to frame size, per traffic class.
    pub hlbf_per_tc: [u64; MAX_TRAFFIC_CLASSES],
    pub base_time_reg_err: u64,
    pub sw_own_list_complete: u64,
}

fn count_per_tc(counters: &mut [u64; MAX_TRAFFIC_CLASSES], traffic_classes: u8) {
    for (tc, counter) in counters.iter_mut().enumerate() {
        if traffic_classes & (1 << tc) != 0 {
            *counter = counter.saturating_add(1);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    #[default]
    Healthy,
    Faulted,
}

/// Consumer side of the EST events. One instance per MAC.
#[derive(Debug, Default)]
pub struct EstRecovery {
    state: RecoveryState,
    /// Set by a completed list switch, cleared by any fault and by disabling the schedule.
    ready: bool,
    counters: FaultCounters,
}

impl EstRecovery {
    pub const fn new() -> Self {
        Self {
            state: RecoveryState::Healthy,
            ready: false,
            counters: FaultCounters {
                const_gate_ctrl_err: 0,
                head_of_line_blk_sch: 0,
                head_of_line_blk_frm: 0,
                hlbs_per_tc: [0; MAX_TRAFFIC_CLASSES],
                hlbf_per_tc: [0; MAX_TRAFFIC_CLASSES],
                base_time_reg_err: 0,
                sw_own_list_complete: 0,
            },
        }
    }

    #[inline]
    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Whether a programmed schedule completed its list switch and has not faulted since.
    #[inline]
    pub fn est_ready(&self) -> bool {
        self.ready
    }

    /// Called when the schedule is disabled administratively.
    #[inline]
    pub fn schedule_disabled(&mut self) {
        self.ready = false;
    }

    #[inline]
    pub fn counters(&self) -> &FaultCounters {
        &self.counters
    }

    /// Apply one event. The event bits are evaluated in hardware priority order, so a switch
    /// completion in the same event as a constant gate control error still marks the schedule
    /// healthy, while a base time error always wins.
    pub fn handle<R: RegisterAccess, V: Variant>(
        &mut self,
        event: &EstEvent,
        regs: &mut R,
        variant: &V,
    ) {
        let status = event.status;
        let control = EstControl::new_with_raw_value(regs.read(Reg::EstControl));
        let mut disable = false;

        if status.constant_gate_ctrl_err() {
            log::error!("EST constant gate control error");
            self.state = RecoveryState::Faulted;
            self.counters.const_gate_ctrl_err = self.counters.const_gate_ctrl_err.saturating_add(1);
        }
        if status.hlb_scheduling() {
            log::error!(
                "EST head-of-line blocking due to scheduling, classes {:#04x}",
                event.sch_error
            );
            self.state = RecoveryState::Faulted;
            self.counters.head_of_line_blk_sch =
                self.counters.head_of_line_blk_sch.saturating_add(1);
            count_per_tc(&mut self.counters.hlbs_per_tc, event.sch_error);
            disable |= variant.disable_on_hlb_scheduling(control);
        }
        if status.hlb_frame_size() {
            log::error!(
                "EST head-of-line blocking due to frame size, classes {:#04x}",
                event.frame_size_error
            );
            self.state = RecoveryState::Faulted;
            self.counters.head_of_line_blk_frm =
                self.counters.head_of_line_blk_frm.saturating_add(1);
            count_per_tc(&mut self.counters.hlbf_per_tc, event.frame_size_error);
            disable |= control.dont_drop_frames_hlbf();
        }
        if status.switch_complete() {
            self.counters.sw_own_list_complete =
                self.counters.sw_own_list_complete.saturating_add(1);
            if !status.base_time_reg_err() {
                log::debug!("EST list switch complete");
                self.state = RecoveryState::Healthy;
                self.ready = true;
            }
        }
        if status.base_time_reg_err() {
            log::error!("EST base time register error");
            self.state = RecoveryState::Faulted;
            self.counters.base_time_reg_err = self.counters.base_time_reg_err.saturating_add(1);
        }
        if self.state == RecoveryState::Faulted {
            self.ready = false;
        }

        if disable && control.enable() {
            log::warn!("disabling EST schedule after head-of-line blocking");
            est::disable(regs);
        }
    }
}
