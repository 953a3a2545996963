//! Host document seen by the discovery loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use qsnap_core::{ContentNode, MemoryNode, NodeError, NodeRef};
use tokio::sync::broadcast;

use crate::controls::Control;

/// Query and insertion surface of the host document.
pub trait Document: Send + Sync {
    /// Nodes carrying `class`, in document order.
    fn query(&self, class: &str) -> Vec<NodeRef>;

    /// Insert `controls` immediately before `anchor`, in order.
    fn insert_before(&self, anchor: &NodeRef, controls: Vec<Arc<Control>>) -> qsnap_core::Result<()>;

    /// Tree-mutation notifications, when the host can observe them.
    fn mutations(&self) -> Option<broadcast::Receiver<()>> {
        None
    }
}

/// Document backed by [`MemoryNode`] trees.
///
/// Inserted controls are kept in a side list keyed by their anchor node.
pub struct MemoryDocument {
    roots: RwLock<Vec<Arc<MemoryNode>>>,
    inserted: Mutex<Vec<(NodeRef, Vec<Arc<Control>>)>>,
    mutations: broadcast::Sender<()>,
    reject_inserts: AtomicBool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let (mutations, _) = broadcast::channel(64);
        Self {
            roots: RwLock::new(Vec::new()),
            inserted: Mutex::new(Vec::new()),
            mutations,
            reject_inserts: AtomicBool::new(false),
        }
    }

    /// Append a top-level tree and announce the mutation.
    pub fn append(&self, root: Arc<MemoryNode>) {
        self.roots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(root);
        let _ = self.mutations.send(());
    }

    pub fn reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    /// Controls inserted in front of `anchor`.
    pub fn controls_before(&self, anchor: &NodeRef) -> Vec<Arc<Control>> {
        self.inserted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(node, _)| Arc::ptr_eq(node, anchor))
            .flat_map(|(_, controls)| controls.iter().cloned())
            .collect()
    }

    /// Total number of inserted controls.
    pub fn control_count(&self) -> usize {
        self.inserted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, controls)| controls.len())
            .sum()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn query(&self, class: &str) -> Vec<NodeRef> {
        let roots = self.roots.read().unwrap_or_else(|e| e.into_inner()).clone();
        let mut out = Vec::new();
        for root in roots {
            if root.has_class(class) {
                out.push(root.clone() as NodeRef);
            }
            out.extend(root.descendants().into_iter().filter(|n| n.has_class(class)));
        }
        out
    }

    fn insert_before(&self, anchor: &NodeRef, controls: Vec<Arc<Control>>) -> qsnap_core::Result<()> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(NodeError::Insertion(format!(
                "document refused controls for '{}'",
                anchor.id()
            )));
        }
        self.inserted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((anchor.clone(), controls));
        Ok(())
    }

    fn mutations(&self) -> Option<broadcast::Receiver<()>> {
        Some(self.mutations.subscribe())
    }
}
