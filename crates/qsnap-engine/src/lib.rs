//! Capture pipeline
//!
//! Waits for embedded assets, redacts the node for the duration of a single
//! render, restores it whatever the render outcome, and encodes the result.

pub mod encode;
pub mod error;
pub mod pipeline;
pub mod renderer;

pub use encode::encode_png;
pub use error::CaptureError;
pub use pipeline::{CapturePipeline, CaptureSettings};
pub use renderer::{Bitmap, RenderError, RenderOptions, Renderer};
