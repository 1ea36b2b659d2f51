//! Transient notifications ("snackbars") raised by the controllers.

use std::time::Duration;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

pub const SUCCESS_DURATION: Duration = Duration::from_secs(3);
pub const ERROR_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// How long the UI should keep it on screen.
    pub duration: Duration,
}

/// Fan-out of notifications to whoever renders them.
///
/// Sending never fails from the caller's point of view; with no subscriber the
/// notification is only logged.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message.into(), SUCCESS_DURATION);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message.into(), ERROR_DURATION);
    }

    fn notify(&self, level: NotificationLevel, message: String, duration: Duration) {
        tracing::debug!(?level, message = %message, "Notification raised");
        let _ = self.tx.send(Notification {
            level,
            message,
            duration,
        });
    }
}
