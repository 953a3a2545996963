//! Core domain models for qsnap
//!
//! This crate contains:
//! - The content node model the host document exposes (ContentNode, Property)
//! - Asset readiness handles
//! - Capture request/result types
//! - An in-memory reference host (MemoryNode)

pub mod asset;
pub mod capture;
pub mod error;
pub mod memory;
pub mod node;

pub use asset::{AssetHandle, AssetLoader, AssetState};
pub use capture::{CaptureOptions, CaptureResult, Extent};
pub use error::{NodeError, Result};
pub use memory::{snapshot_presentation, MemoryNode, MemoryNodeBuilder};
pub use node::{ContentNode, NodeRef, Property, PropertyValue, HIDDEN_DISPLAY};
