use std::time::Duration;

use qsnap_core::NodeError;
use thiserror::Error;

use crate::renderer::RenderError;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Timed out after {0:?} waiting for embedded assets")]
    AssetWaitTimeout(Duration),

    #[error("Redaction step {index} could not be applied: {source}")]
    Redaction {
        index: usize,
        #[source]
        source: NodeError,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to encode image: {0}")]
    Encoding(String),
}

impl CaptureError {
    /// Render and encoding failures are reported the same way to users.
    pub fn is_render_failure(&self) -> bool {
        matches!(self, CaptureError::Render(_) | CaptureError::Encoding(_))
    }
}
