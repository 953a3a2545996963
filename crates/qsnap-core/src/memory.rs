//! In-memory document nodes
//!
//! Reference host used by tests and by embedders that mirror an external
//! document into qsnap.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::asset::AssetHandle;
use crate::capture::Extent;
use crate::error::{NodeError, Result};
use crate::node::{ContentNode, NodeRef, Property, PropertyValue};

#[derive(Debug, Default)]
struct NodeState {
    id: String,
    kind: String,
    classes: Vec<String>,
    markup: String,
    display: String,
    selected: bool,
    checked: bool,
    children: Vec<Arc<MemoryNode>>,
    data: HashMap<String, String>,
    extent: Extent,
    assets: Vec<AssetHandle>,
    locked: HashSet<Property>,
}

#[derive(Debug)]
pub struct MemoryNode {
    state: RwLock<NodeState>,
}

/// Builder for [`MemoryNode`]
#[derive(Debug, Default)]
pub struct MemoryNodeBuilder {
    state: NodeState,
}

impl MemoryNodeBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.state.id = id.into();
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.state.classes.push(class.into());
        self
    }

    /// Own text of the node, exposed as its markup.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.state.markup = text.into();
        self
    }

    pub fn display(mut self, display: impl Into<String>) -> Self {
        self.state.display = display.into();
        self
    }

    pub fn selected(mut self) -> Self {
        self.state.selected = true;
        self
    }

    pub fn checked(mut self) -> Self {
        self.state.checked = true;
        self
    }

    pub fn child(mut self, child: Arc<MemoryNode>) -> Self {
        self.state.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Arc<MemoryNode>>) -> Self {
        self.state.children.extend(children);
        self
    }

    pub fn extent(mut self, width: u32, height: u32) -> Self {
        self.state.extent = Extent::new(width, height);
        self
    }

    pub fn asset(mut self, asset: AssetHandle) -> Self {
        self.state.assets.push(asset);
        self
    }

    pub fn build(self) -> Arc<MemoryNode> {
        Arc::new(MemoryNode {
            state: RwLock::new(self.state),
        })
    }
}

impl MemoryNode {
    pub fn builder(kind: impl Into<String>) -> MemoryNodeBuilder {
        MemoryNodeBuilder {
            state: NodeState {
                kind: kind.into(),
                ..NodeState::default()
            },
        }
    }

    /// Leaf node with text only.
    pub fn leaf(kind: impl Into<String>, text: impl Into<String>) -> Arc<MemoryNode> {
        Self::builder(kind).text(text).build()
    }

    fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_child(&self, child: Arc<MemoryNode>) {
        self.write().children.push(child);
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.write().markup = text.into();
    }

    /// Make writes to `property` fail, simulating a node the host refuses to touch.
    pub fn lock_property(&self, property: Property) {
        self.write().locked.insert(property);
    }

    pub fn unlock_property(&self, property: Property) {
        self.write().locked.remove(&property);
    }
}

impl ContentNode for MemoryNode {
    fn id(&self) -> String {
        self.read().id.clone()
    }

    fn kind(&self) -> String {
        self.read().kind.clone()
    }

    fn has_class(&self, class: &str) -> bool {
        self.read().classes.iter().any(|c| c == class)
    }

    fn children(&self) -> Vec<NodeRef> {
        self.read()
            .children
            .iter()
            .map(|child| child.clone() as NodeRef)
            .collect()
    }

    fn text_content(&self) -> String {
        let (mut text, children) = {
            let state = self.read();
            (state.markup.clone(), state.children.clone())
        };
        for child in children {
            text.push_str(&child.text_content());
        }
        text
    }

    fn property(&self, property: Property) -> PropertyValue {
        let state = self.read();
        match property {
            Property::Display => PropertyValue::Text(state.display.clone()),
            Property::Markup => PropertyValue::Text(state.markup.clone()),
            Property::Selected => PropertyValue::Flag(state.selected),
            Property::Checked => PropertyValue::Flag(state.checked),
        }
    }

    fn set_property(&self, property: Property, value: PropertyValue) -> Result<()> {
        let mut state = self.write();
        if state.locked.contains(&property) {
            return Err(NodeError::Rejected {
                node: state.id.clone(),
                property,
                reason: "property is locked".to_string(),
            });
        }
        match (property, value) {
            (Property::Display, PropertyValue::Text(v)) => state.display = v,
            (Property::Markup, PropertyValue::Text(v)) => state.markup = v,
            (Property::Selected, PropertyValue::Flag(v)) => state.selected = v,
            (Property::Checked, PropertyValue::Flag(v)) => state.checked = v,
            (property, _) => return Err(NodeError::TypeMismatch(property)),
        }
        Ok(())
    }

    fn scroll_extent(&self) -> Extent {
        self.read().extent
    }

    fn assets(&self) -> Vec<AssetHandle> {
        self.read().assets.clone()
    }

    fn data(&self, key: &str) -> Option<String> {
        self.read().data.get(key).cloned()
    }

    fn set_data(&self, key: &str, value: &str) {
        self.write().data.insert(key.to_string(), value.to_string());
    }
}

/// Every presentation property of `node` and its descendants, in document order.
///
/// Two snapshots compare equal exactly when no presentation property changed.
pub fn snapshot_presentation(node: &dyn ContentNode) -> Vec<(String, Property, PropertyValue)> {
    const ALL: [Property; 4] = [
        Property::Display,
        Property::Markup,
        Property::Selected,
        Property::Checked,
    ];

    let mut out: Vec<_> = ALL
        .iter()
        .map(|p| (node.id(), *p, node.property(*p)))
        .collect();
    for n in node.descendants() {
        out.extend(ALL.iter().map(|p| (n.id(), *p, n.property(*p))));
    }
    out
}
