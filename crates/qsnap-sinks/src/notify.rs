//! Transient user notifications

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    IdCopied,
    IdCopyFailed,
    ImageCopied,
    RenderFailed,
    ClipboardFailed,
    MissingIdentifier,
    Imported,
    ImportFailed,
}

impl NotificationKind {
    pub fn message(self) -> &'static str {
        match self {
            NotificationKind::IdCopied => "ID copied to clipboard",
            NotificationKind::IdCopyFailed => "Failed to copy ID",
            NotificationKind::ImageCopied => "Image copied to clipboard, ready to paste",
            NotificationKind::RenderFailed => "Failed to render image",
            NotificationKind::ClipboardFailed => "Failed to write image to clipboard",
            NotificationKind::MissingIdentifier => "Question ID is empty",
            NotificationKind::Imported => "Imported into question library",
            NotificationKind::ImportFailed => "Import failed",
        }
    }

    pub fn is_failure(self) -> bool {
        !matches!(
            self,
            NotificationKind::IdCopied | NotificationKind::ImageCopied | NotificationKind::Imported
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    /// How long the overlay stays visible
    pub ttl: Duration,
}

/// Surface that shows notifications to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        if notification.kind.is_failure() {
            warn!(kind = ?notification.kind, "{}", notification.message);
        } else {
            info!(kind = ?notification.kind, "{}", notification.message);
        }
    }
}

/// Forwards notifications to the host overlay.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            debug!(kind = ?e.0.kind, "Notification dropped, overlay receiver closed");
        }
    }
}

/// Builds notifications with the configured lifetime and hands them to a [`Notifier`].
#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
    ttl: Duration,
}

impl Notifications {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(1);

    pub fn new(notifier: Arc<dyn Notifier>, ttl: Duration) -> Self {
        Self { notifier, ttl }
    }

    pub fn show(&self, kind: NotificationKind) {
        self.notifier.notify(Notification {
            kind,
            message: kind.message().to_string(),
            ttl: self.ttl,
        });
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(Arc::new(LogNotifier), Self::DEFAULT_TTL)
    }
}
