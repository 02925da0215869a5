//! Asynchronous EST recovery consumer.
//!
//! The interrupt handler calls [super::on_interrupt] with a statically allocated
//! [EstEventQueue]. A single task then runs [run] to apply the events to the controller.
use crate::{
    controller::TsnController, regs::RegisterAccess, transport::PollDelay, variant::Variant,
};

use super::{EstEvent, EstEventQueue};

/// Wait for the next EST event and apply it.
pub async fn handle_next<R: RegisterAccess, D: PollDelay, V: Variant, const N: usize>(
    ctrl: &mut TsnController<R, D, V>,
    queue: &EstEventQueue<N>,
) -> EstEvent {
    let event = queue.receive().await;
    ctrl.process_est_event(&event);
    event
}

/// Recovery task body. Never returns.
pub async fn run<R: RegisterAccess, D: PollDelay, V: Variant, const N: usize>(
    ctrl: &mut TsnController<R, D, V>,
    queue: &EstEventQueue<N>,
) -> ! {
    loop {
        let event = handle_next(ctrl, queue).await;
        if !ctrl.est_ready() {
            log::warn!("EST schedule faulted, status {:#010x}", event.status.raw_value());
        }
    }
}
