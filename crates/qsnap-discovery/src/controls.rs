//! Controls inserted in front of question nodes

use std::fmt;
use std::sync::{Arc, OnceLock};

use qsnap_core::{CaptureOptions, ContentNode, NodeRef};
use qsnap_sinks::NotificationKind;

use crate::actions::Actions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    CopyId,
    FullImage,
    /// Capture without the trailing key-point/analysis section
    StemImage,
    Import,
}

/// Index of the first direct child whose text contains `marker`.
pub fn find_key_point_child(node: &dyn ContentNode, marker: &str) -> Option<usize> {
    node.children()
        .iter()
        .position(|child| child.text_content().contains(marker))
}

/// Memoized key-point child lookup.
///
/// Prefers the cached index; on a miss the index is recomputed from the live
/// node and cached once found.
#[derive(Debug)]
pub struct KeyPointIndex {
    marker: String,
    cached: OnceLock<usize>,
}

impl KeyPointIndex {
    pub fn new(marker: impl Into<String>, initial: Option<usize>) -> Self {
        let cached = OnceLock::new();
        if let Some(index) = initial {
            let _ = cached.set(index);
        }
        Self {
            marker: marker.into(),
            cached,
        }
    }

    pub fn cached(&self) -> Option<usize> {
        self.cached.get().copied()
    }

    pub fn resolve(&self, node: &dyn ContentNode) -> Option<usize> {
        if let Some(index) = self.cached.get() {
            return Some(*index);
        }
        let index = find_key_point_child(node, &self.marker)?;
        Some(*self.cached.get_or_init(|| index))
    }
}

/// An interactive trigger bound to one node.
pub struct Control {
    kind: ControlKind,
    label: String,
    node: NodeRef,
    actions: Arc<Actions>,
    key_point: Option<Arc<KeyPointIndex>>,
}

impl Control {
    pub fn new(
        kind: ControlKind,
        label: impl Into<String>,
        node: NodeRef,
        actions: Arc<Actions>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            node,
            actions,
            key_point: None,
        }
    }

    pub fn stem(
        label: impl Into<String>,
        node: NodeRef,
        actions: Arc<Actions>,
        key_point: Arc<KeyPointIndex>,
    ) -> Self {
        Self {
            key_point: Some(key_point),
            ..Self::new(ControlKind::StemImage, label, node, actions)
        }
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Options the control captures with, resolved at activation time.
    pub fn capture_options(&self) -> CaptureOptions {
        self.key_point
            .as_ref()
            .and_then(|key_point| key_point.resolve(self.node.as_ref()))
            .map(CaptureOptions::hide_from)
            .unwrap_or_default()
    }

    /// Handle a click. Never fails; the outcome is reported as a notification.
    pub async fn activate(&self) -> NotificationKind {
        match self.kind {
            ControlKind::CopyId => self.actions.copy_id(&self.node).await,
            ControlKind::FullImage => {
                self.actions
                    .capture_to_clipboard(&self.node, &CaptureOptions::full())
                    .await
            }
            ControlKind::StemImage => {
                let options = self.capture_options();
                self.actions.capture_to_clipboard(&self.node, &options).await
            }
            ControlKind::Import => {
                self.actions
                    .import(&self.node, &CaptureOptions::full())
                    .await
            }
        }
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("node", &self.node.id())
            .finish()
    }
}
