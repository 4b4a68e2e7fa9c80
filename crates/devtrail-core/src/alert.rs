//! User-facing alerts raised by failed mutations.

use tokio::sync::mpsc;

/// Receiver of blocking, user-facing failure notifications.
///
/// The CLI prints them to stderr before exiting non-zero; an event loop can
/// drain them from a [`ChannelAlerts`].
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Drops every alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlerts;

impl AlertSink for NoAlerts {
    fn alert(&self, _message: &str) {}
}

/// Forwards alerts into a channel drained by the UI loop.
#[derive(Debug, Clone)]
pub struct ChannelAlerts {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelAlerts {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Convenience constructor returning the sink and its receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertSink for ChannelAlerts {
    fn alert(&self, message: &str) {
        // Receiver gone means the UI is shutting down.
        let _ = self.tx.send(message.to_owned());
    }
}
