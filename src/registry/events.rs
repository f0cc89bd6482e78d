//! Lifecycle events emitted to the embedding application.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::platform::WindowHandle;

/// Registry lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyEvent {
    /// A registration attempt reached the platform.
    Registered { success: bool, spec: String, id: i16 },
    /// A held claim was released.
    Unregistered { spec: String, id: i16 },
    /// A registered hotkey was pressed.
    Fired {
        window: WindowHandle,
        id: i16,
        spec: String,
    },
}

/// Fan-out to every live subscriber. Receivers that were dropped are
/// pruned on the next emit.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<UnboundedSender<HotkeyEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> UnboundedReceiver<HotkeyEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn emit(&mut self, event: HotkeyEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
