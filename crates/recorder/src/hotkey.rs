//! Global hotkey intake.
//!
//! Hotkey registration is an external collaborator: a platform library
//! (conventionally bound to command/control + shift + R) invokes
//! [`HotkeyHandle`] from its own callback thread. The handle does nothing
//! but a non-blocking hand-off to the coordinator worker, so the callback
//! thread is never stalled by recording work. Auto-repeat and stray events
//! are the coordinator's problem; everything is forwarded as-is.

use tokio::sync::mpsc;

/// A press-and-hold gesture edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    Pressed,
    Released,
}

/// Thread-safe dispatch handle given to the hotkey provider.
#[derive(Clone)]
pub struct HotkeyHandle {
    tx: mpsc::UnboundedSender<HotkeyEvent>,
}

impl HotkeyHandle {
    pub fn dispatch(&self, event: HotkeyEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!(?event, "Hotkey event dropped, coordinator is gone");
        }
    }

    pub fn press(&self) {
        self.dispatch(HotkeyEvent::Pressed);
    }

    pub fn release(&self) {
        self.dispatch(HotkeyEvent::Released);
    }
}

/// Create the hotkey channel: the handle for the provider, the receiver
/// for the coordinator.
pub fn channel() -> (HotkeyHandle, mpsc::UnboundedReceiver<HotkeyEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (HotkeyHandle { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_dispatch_order() {
        let (handle, mut rx) = channel();
        handle.press();
        handle.release();
        assert_eq!(rx.recv().await, Some(HotkeyEvent::Pressed));
        assert_eq!(rx.recv().await, Some(HotkeyEvent::Released));
    }

    #[test]
    fn dispatch_after_shutdown_does_not_panic() {
        let (handle, rx) = channel();
        drop(rx);
        handle.press();
    }
}
