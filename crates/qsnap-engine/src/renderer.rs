//! Raster renderer collaborator

use async_trait::async_trait;
use qsnap_core::{Extent, NodeRef};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer is not available")]
    Unavailable,

    #[error("Render failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Options passed to the renderer for one capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Load cross-origin assets through CORS instead of tainting the output
    pub use_cross_origin: bool,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    pub logging: bool,
}

impl RenderOptions {
    pub fn new(extent: Extent, scale: f32) -> Self {
        Self {
            use_cross_origin: true,
            scale,
            width: extent.width,
            height: extent.height,
            logging: false,
        }
    }
}

/// Raw RGBA8 raster produced by a renderer
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Bitmap {
    /// Bitmap filled with one colour.
    pub fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            rgba: pixel.repeat(len),
        }
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Renders a node subtree into a bitmap.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Whether the rendering engine is loaded. Discovery skips ticks while it is not.
    fn is_available(&self) -> bool {
        true
    }

    async fn render(&self, node: &NodeRef, options: &RenderOptions) -> Result<Bitmap, RenderError>;
}
