//! Control handlers
//!
//! Each handler is a user-interaction boundary: every failure is caught
//! here and turned into a notification. The shown notification kind is
//! returned so callers can observe the outcome.

use std::sync::Arc;

use qsnap_core::{CaptureOptions, NodeRef};
use qsnap_engine::{CaptureError, CapturePipeline};
use qsnap_sinks::{
    classify, ClipboardSink, ImportError, ImportRequest, ImportTransport, NotificationKind,
    Notifications,
};
use thiserror::Error;
use tracing::{error, info, warn};

pub struct Actions {
    pipeline: Arc<CapturePipeline>,
    clipboard: Arc<dyn ClipboardSink>,
    transport: Arc<dyn ImportTransport>,
    notifications: Notifications,
    token: String,
}

impl Actions {
    pub fn new(
        pipeline: Arc<CapturePipeline>,
        clipboard: Arc<dyn ClipboardSink>,
        transport: Arc<dyn ImportTransport>,
        notifications: Notifications,
        token: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            clipboard,
            transport,
            notifications,
            token: token.into(),
        }
    }

    pub fn pipeline(&self) -> &Arc<CapturePipeline> {
        &self.pipeline
    }

    /// Copy the node identifier as clipboard text.
    pub async fn copy_id(&self, node: &NodeRef) -> NotificationKind {
        let kind = match self.clipboard.write_text(&node.id()).await {
            Ok(()) => NotificationKind::IdCopied,
            Err(e) => {
                warn!(node = %node.id(), "Failed to copy ID: {}", e);
                NotificationKind::IdCopyFailed
            }
        };
        self.notifications.show(kind);
        kind
    }

    /// Capture the node and place the image on the clipboard.
    pub async fn capture_to_clipboard(
        &self,
        node: &NodeRef,
        options: &CaptureOptions,
    ) -> NotificationKind {
        let kind = match self.pipeline.capture(node, options).await {
            Err(e) => {
                error!(node = %node.id(), "Capture failed: {}", e);
                NotificationKind::RenderFailed
            }
            Ok(image) => match self.clipboard.write_image(&image).await {
                Ok(()) => NotificationKind::ImageCopied,
                Err(e) => {
                    error!(node = %node.id(), "Clipboard write failed: {}", e);
                    NotificationKind::ClipboardFailed
                }
            },
        };
        self.notifications.show(kind);
        kind
    }

    /// Capture the node and send it to the import endpoint.
    ///
    /// Nodes without an identifier are rejected before anything is rendered.
    pub async fn import(&self, node: &NodeRef, options: &CaptureOptions) -> NotificationKind {
        let id = node.id();
        if id.is_empty() {
            warn!("Import requested for a node without an ID");
            self.notifications.show(NotificationKind::MissingIdentifier);
            return NotificationKind::MissingIdentifier;
        }

        let kind = match self.submit(&id, node, options).await {
            Ok(()) => {
                info!(node = %id, "Imported into question library");
                NotificationKind::Imported
            }
            Err(e) => {
                warn!(node = %id, "Import failed: {}", e);
                NotificationKind::ImportFailed
            }
        };
        self.notifications.show(kind);
        kind
    }

    async fn submit(
        &self,
        id: &str,
        node: &NodeRef,
        options: &CaptureOptions,
    ) -> Result<(), ImportFailure> {
        let image = self.pipeline.capture(node, options).await?;
        let request = ImportRequest::new(id, &image, self.token.as_str());
        let response = self
            .transport
            .submit(&request)
            .await
            .map_err(ImportError::from)?;
        classify(response)?;
        Ok(())
    }
}

/// Everything that can go wrong between capture and a 2xx.
#[derive(Error, Debug)]
enum ImportFailure {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Import(#[from] ImportError),
}
