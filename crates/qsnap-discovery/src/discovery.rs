//! Discovery loop
//!
//! Every tick queries the document for eligible question nodes and attaches
//! a control set to each node not seen before. A node's attachment state is
//! stored on the node itself, so it lives and dies with the node and never
//! changes once set.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use qsnap_core::{ContentNode, NodeRef};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::actions::Actions;
use crate::controls::{find_key_point_child, Control, ControlKind, KeyPointIndex};
use crate::document::Document;

const ATTACHED: &str = "1";

pub const DEFAULT_ELIGIBILITY_CLASS: &str = "quesborder";
pub const DEFAULT_EXPECTED_KIND: &str = "fieldset";
pub const DEFAULT_KEY_POINT_MARKER: &str = "【考点】";
/// Node data key recording that controls are attached.
pub const DEFAULT_ATTACHED_KEY: &str = "imageButtonsAttached";

/// Shortest interval `run` polls at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Markers that make a node eligible and classify it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRules {
    pub eligibility_class: String,
    pub expected_kind: String,
    pub key_point_marker: String,
    pub attached_key: String,
}

impl Default for DiscoveryRules {
    fn default() -> Self {
        Self {
            eligibility_class: DEFAULT_ELIGIBILITY_CLASS.to_string(),
            expected_kind: DEFAULT_EXPECTED_KIND.to_string(),
            key_point_marker: DEFAULT_KEY_POINT_MARKER.to_string(),
            attached_key: DEFAULT_ATTACHED_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick skipped because the renderer is not loaded yet
    pub renderer_unavailable: bool,
    pub scanned: usize,
    pub attached: usize,
    pub wrong_kind: usize,
    pub already_attached: usize,
    pub failed: usize,
}

pub struct Discovery {
    document: Arc<dyn Document>,
    actions: Arc<Actions>,
    rules: DiscoveryRules,
}

impl Discovery {
    pub fn new(document: Arc<dyn Document>, actions: Arc<Actions>, rules: DiscoveryRules) -> Self {
        Self {
            document,
            actions,
            rules,
        }
    }

    pub fn rules(&self) -> &DiscoveryRules {
        &self.rules
    }

    pub fn is_attached(&self, node: &dyn ContentNode) -> bool {
        node.data(&self.rules.attached_key).as_deref() == Some(ATTACHED)
    }

    /// Run one scan of the document.
    pub fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        if !self.actions.pipeline().renderer().is_available() {
            debug!("Renderer unavailable, skipping discovery tick");
            report.renderer_unavailable = true;
            return report;
        }

        for node in self.document.query(&self.rules.eligibility_class) {
            report.scanned += 1;
            if !node.kind().eq_ignore_ascii_case(&self.rules.expected_kind) {
                report.wrong_kind += 1;
                continue;
            }
            if self.is_attached(node.as_ref()) {
                report.already_attached += 1;
                continue;
            }

            let controls = self.build_controls(&node);
            let count = controls.len();
            match self.document.insert_before(&node, controls) {
                Ok(()) => {
                    node.set_data(&self.rules.attached_key, ATTACHED);
                    report.attached += 1;
                    debug!(node = %node.id(), controls = count, "Controls attached");
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(node = %node.id(), "Failed to insert controls: {}", e);
                }
            }
        }

        if report.attached > 0 {
            info!(attached = report.attached, scanned = report.scanned, "Discovery tick");
        }
        report
    }

    fn build_controls(&self, node: &NodeRef) -> Vec<Arc<Control>> {
        let marker = &self.rules.key_point_marker;
        let control = |kind, label: &str| {
            Arc::new(Control::new(kind, label, node.clone(), self.actions.clone()))
        };

        if node.text_content().contains(marker.as_str()) {
            let key_point = Arc::new(KeyPointIndex::new(
                marker.as_str(),
                find_key_point_child(node.as_ref(), marker),
            ));
            vec![
                control(ControlKind::CopyId, "Copy ID"),
                control(ControlKind::FullImage, "Question image"),
                Arc::new(Control::stem(
                    "Stem image",
                    node.clone(),
                    self.actions.clone(),
                    key_point,
                )),
                control(ControlKind::Import, "Import to library"),
            ]
        } else {
            vec![
                control(ControlKind::CopyId, "Copy ID"),
                control(ControlKind::FullImage, "Question to image"),
                control(ControlKind::Import, "Import to library"),
            ]
        }
    }

    /// Tick every `interval` and on every document mutation until `shutdown` resolves.
    ///
    /// Without a mutation stream from the host, this is plain polling.
    /// Intervals below [`MIN_INTERVAL`] are raised to it.
    pub async fn run<F>(&self, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let interval = interval.max(MIN_INTERVAL);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut mutations = self.document.mutations();
        tokio::pin!(shutdown);

        info!(
            interval_ms = interval.as_millis() as u64,
            observing = mutations.is_some(),
            "Discovery started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick();
                }
                event = next_mutation(&mut mutations) => match event {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        self.tick();
                    }
                    Err(RecvError::Closed) => {
                        debug!("Mutation stream closed, polling only");
                        mutations = None;
                    }
                },
            }
        }

        info!("Discovery stopped");
    }
}

async fn next_mutation(rx: &mut Option<broadcast::Receiver<()>>) -> Result<(), RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
