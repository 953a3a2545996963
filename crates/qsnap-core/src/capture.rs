//! Capture request and result types

use serde::{Deserialize, Serialize};

/// Options for a single capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// Hide every direct child at or after this position.
    ///
    /// Positions past the last child hide nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_children_from: Option<usize>,
}

impl CaptureOptions {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn hide_from(index: usize) -> Self {
        Self {
            hide_children_from: Some(index),
        }
    }
}

/// Natural content size of a node in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Encoded capture: a single PNG image plus its pixel dimensions
#[derive(Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl CaptureResult {
    pub const MIME_TYPE: &'static str = "image/png";

    pub fn len(&self) -> usize {
        self.png.len()
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }
}

impl std::fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureResult")
            .field("bytes", &self.png.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
