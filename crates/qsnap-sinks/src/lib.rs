//! Destinations for captured images and user-facing status
//!
//! - Clipboard (image and text payloads)
//! - Import endpoint of the local question library
//! - Transient notifications

pub mod clipboard;
pub mod import;
pub mod notify;

pub use clipboard::{ClipboardError, ClipboardSink, SystemClipboard};
pub use import::{
    classify, data_url, HttpImportClient, ImportError, ImportRequest, ImportResponse,
    ImportTransport, TransportError,
};
pub use notify::{
    ChannelNotifier, LogNotifier, Notification, NotificationKind, Notifications, Notifier,
};
