//! System clipboard sink

use std::borrow::Cow;

use arboard::{Clipboard, ImageData};
use async_trait::async_trait;
use qsnap_core::CaptureResult;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard write failed: {0}")]
    Write(String),

    #[error("Invalid image payload: {0}")]
    Decode(String),
}

/// Abstraction over writing to the clipboard.
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_image(&self, image: &CaptureResult) -> Result<(), ClipboardError>;

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// OS clipboard through `arboard`.
///
/// `arboard` blocks, so every write runs on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[async_trait]
impl ClipboardSink for SystemClipboard {
    async fn write_image(&self, image: &CaptureResult) -> Result<(), ClipboardError> {
        let data = to_image_data(image)?;
        run_blocking(move |clipboard| clipboard.set_image(data)).await?;
        debug!(width = image.width, height = image.height, "Image written to clipboard");
        Ok(())
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_string();
        run_blocking(move |clipboard| clipboard.set_text(text)).await
    }
}

async fn run_blocking<F>(write: F) -> Result<(), ClipboardError>
where
    F: FnOnce(&mut Clipboard) -> Result<(), arboard::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut clipboard =
            Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        write(&mut clipboard).map_err(|e| ClipboardError::Write(e.to_string()))
    })
    .await
    .map_err(|e| ClipboardError::Write(e.to_string()))?
}

/// The OS clipboard takes raw RGBA pixels, not PNG.
fn to_image_data(image: &CaptureResult) -> Result<ImageData<'static>, ClipboardError> {
    let decoded = image::load_from_memory_with_format(&image.png, image::ImageFormat::Png)
        .map_err(|e| ClipboardError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();

    Ok(ImageData {
        width: width as usize,
        height: height as usize,
        bytes: Cow::Owned(decoded.into_raw()),
    })
}
