//! Content node model
//!
//! The host document owns its nodes. qsnap only reads structure and text and
//! mutates the small set of presentation properties listed in [`Property`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::asset::AssetHandle;
use crate::capture::Extent;
use crate::error::Result;

/// Display value that hides a node.
pub const HIDDEN_DISPLAY: &str = "none";

/// Shared handle to a node of the host document.
pub type NodeRef = Arc<dyn ContentNode>;

/// Presentation properties qsnap is allowed to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Inline display style (`""` for the stylesheet default, `"none"` for hidden)
    Display,
    /// Inline markup of the node
    Markup,
    /// Selection highlight
    Selected,
    /// Checked state of an input-like node
    Checked,
}

impl Property {
    /// Whether values of this property are flags rather than text.
    pub fn is_flag(self) -> bool {
        matches!(self, Property::Selected | Property::Checked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Flag(bool),
}

impl PropertyValue {
    pub fn text(value: impl Into<String>) -> Self {
        PropertyValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            PropertyValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PropertyValue::Flag(flag) => Some(*flag),
            PropertyValue::Text(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(text) => write!(f, "{:?}", text),
            PropertyValue::Flag(flag) => write!(f, "{}", flag),
        }
    }
}

/// A node in the live, externally mutated document tree.
///
/// Implementations must be cheap to query repeatedly: the discovery loop and
/// the redaction plan builder walk the tree on every tick and capture.
pub trait ContentNode: Send + Sync {
    /// Stable identifier, empty when the node has none.
    fn id(&self) -> String;

    /// Structural kind (tag name), compared case-insensitively.
    fn kind(&self) -> String;

    fn has_class(&self, class: &str) -> bool;

    /// Direct children in document order.
    fn children(&self) -> Vec<NodeRef>;

    /// Concatenated text of the node and all of its descendants.
    fn text_content(&self) -> String;

    fn property(&self, property: Property) -> PropertyValue;

    fn set_property(&self, property: Property, value: PropertyValue) -> Result<()>;

    /// Natural size of the content including overflow.
    fn scroll_extent(&self) -> Extent;

    /// Readiness handles for embedded assets of this node only (not descendants).
    fn assets(&self) -> Vec<AssetHandle> {
        Vec::new()
    }

    /// Node-local metadata (the host's dataset equivalent).
    fn data(&self, key: &str) -> Option<String>;

    fn set_data(&self, key: &str, value: &str);

    /// All descendants in pre-order (document order), excluding `self`.
    fn descendants(&self) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeRef> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// Assets reachable under this node, including its own.
    fn reachable_assets(&self) -> Vec<AssetHandle> {
        let mut assets = self.assets();
        for node in self.descendants() {
            assets.extend(node.assets());
        }
        assets
    }
}

impl fmt::Debug for dyn ContentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentNode")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}
