//! Control discovery for question nodes
//!
//! A recurring scan finds eligible question nodes in the host document and
//! inserts a control set in front of each one, exactly once per node.

pub mod actions;
pub mod controls;
pub mod discovery;
pub mod document;

pub use actions::Actions;
pub use controls::{find_key_point_child, Control, ControlKind, KeyPointIndex};
pub use discovery::{Discovery, DiscoveryRules, TickReport};
pub use document::{Document, MemoryDocument};
