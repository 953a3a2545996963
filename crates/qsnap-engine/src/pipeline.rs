//! Snapshot-mutate-render-restore pipeline
//!
//! Ordering within one capture: asset wait, redaction, render, restoration,
//! encoding. Restoration runs whether or not the render succeeded, and the
//! node is left with the presentation it had before the call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use qsnap_core::{CaptureOptions, CaptureResult, NodeRef};
use qsnap_redact::{apply, PartialApply, Redactor};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::encode::encode_png;
use crate::error::CaptureError;
use crate::renderer::{RenderOptions, Renderer};

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// Output upscaling factor
    pub scale: f32,
    /// Give up waiting for embedded assets after this long. `None` waits forever.
    pub asset_timeout: Option<Duration>,
    /// Allow only one capture in flight at a time.
    pub single_flight: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            scale: 2.0,
            asset_timeout: None,
            single_flight: true,
        }
    }
}

pub struct CapturePipeline {
    renderer: Arc<dyn Renderer>,
    redactor: Redactor,
    settings: CaptureSettings,
    in_flight: Mutex<()>,
}

impl CapturePipeline {
    pub fn new(renderer: Arc<dyn Renderer>, redactor: Redactor, settings: CaptureSettings) -> Self {
        Self {
            renderer,
            redactor,
            settings,
            in_flight: Mutex::new(()),
        }
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Capture `node` as a PNG image.
    #[tracing::instrument(skip_all, fields(node = %node.id()))]
    pub async fn capture(
        &self,
        node: &NodeRef,
        options: &CaptureOptions,
    ) -> Result<CaptureResult, CaptureError> {
        let started = Instant::now();

        // Asset wait stays outside the single-flight lock.
        self.wait_for_assets(node).await?;

        let _in_flight = if self.settings.single_flight {
            Some(self.in_flight.lock().await)
        } else {
            None
        };

        let plan = self.redactor.plan(node.as_ref(), options);
        let redactions = plan.len();
        let undo = match apply(plan) {
            Ok(undo) => undo,
            Err(PartialApply {
                undo,
                index,
                source,
            }) => {
                undo.run();
                error!(index, "Failed to apply redaction: {}", source);
                return Err(CaptureError::Redaction { index, source });
            }
        };

        let extent = node.scroll_extent();
        let render_options = RenderOptions::new(extent, self.settings.scale);
        debug!(
            width = extent.width,
            height = extent.height,
            redactions,
            "Rendering node"
        );
        let rendered = self.renderer.render(node, &render_options).await;

        let report = undo.run();
        if !report.is_clean() {
            warn!(
                restored = report.restored,
                failed = report.failed,
                "Node only partially restored after render"
            );
        }

        let bitmap = rendered.inspect_err(|e| error!("Render failed: {}", e))?;
        let result = encode_png(bitmap)?;

        info!(
            width = result.width,
            height = result.height,
            bytes = result.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Capture complete"
        );
        Ok(result)
    }

    async fn wait_for_assets(&self, node: &NodeRef) -> Result<(), CaptureError> {
        let assets = node.reachable_assets();
        if assets.is_empty() {
            return Ok(());
        }
        debug!(assets = assets.len(), "Waiting for embedded assets");

        let wait = async {
            for asset in &assets {
                asset.ready().await;
            }
        };

        match self.settings.asset_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| CaptureError::AssetWaitTimeout(limit)),
            None => {
                wait.await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Bitmap, RenderError};
    use async_trait::async_trait;
    use qsnap_core::{
        snapshot_presentation, AssetHandle, ContentNode, MemoryNode, Property, PropertyValue,
    };
    use qsnap_redact::rules::DEFAULT_ATTRIBUTION_TEXT;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct MockRenderer {
        fail: bool,
        delay: Option<Duration>,
        calls: StdMutex<Vec<RenderOptions>>,
        seen_markup: StdMutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl Renderer for MockRenderer {
        async fn render(&self, node: &NodeRef, options: &RenderOptions) -> Result<Bitmap, RenderError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(*options);
            self.seen_markup.lock().unwrap().push(node.text_content());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                return Err(RenderError::Failed("canvas tainted".to_string()));
            }
            Ok(Bitmap::solid(options.width * 2, options.height * 2, [0, 0, 0, 255]))
        }
    }

    fn question() -> Arc<MemoryNode> {
        MemoryNode::builder("fieldset")
            .id("q1")
            .extent(40, 30)
            .child(
                MemoryNode::builder("div")
                    .text("x = ")
                    .child(MemoryNode::builder("span").class("quizPutTag").text("7").build())
                    .build(),
            )
            .child(MemoryNode::builder("label").text("A").selected().build())
            .child(MemoryNode::builder("input").checked().build())
            .child(MemoryNode::leaf("div", DEFAULT_ATTRIBUTION_TEXT))
            .build()
    }

    fn pipeline(renderer: Arc<MockRenderer>, settings: CaptureSettings) -> CapturePipeline {
        CapturePipeline::new(renderer, Redactor::default(), settings)
    }

    #[tokio::test]
    async fn test_capture_success_restores_node() {
        let renderer = Arc::new(MockRenderer::default());
        let pipeline = pipeline(renderer.clone(), CaptureSettings::default());
        let node = question();
        let before = snapshot_presentation(node.as_ref());
        let node_ref: NodeRef = node.clone();

        let result = pipeline.capture(&node_ref, &CaptureOptions::full()).await.unwrap();

        assert_eq!((result.width, result.height), (80, 60));
        assert_eq!(&result.png[1..4], b"PNG");
        assert_eq!(before, snapshot_presentation(node.as_ref()));

        let calls = renderer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].width, 40);
        assert_eq!(calls[0].height, 30);
        assert_eq!(calls[0].scale, 2.0);
        assert!(calls[0].use_cross_origin);
        assert!(!calls[0].logging);
    }

    #[tokio::test]
    async fn test_render_sees_redacted_node() {
        let renderer = Arc::new(MockRenderer::default());
        let pipeline = pipeline(renderer.clone(), CaptureSettings::default());
        let node: NodeRef = question();

        pipeline.capture(&node, &CaptureOptions::full()).await.unwrap();

        let seen = renderer.seen_markup.lock().unwrap();
        assert!(seen[0].starts_with("x = ***"));
        assert!(node.text_content().starts_with("x = 7"));
    }

    #[tokio::test]
    async fn test_capture_failure_restores_node() {
        let renderer = Arc::new(MockRenderer {
            fail: true,
            ..Default::default()
        });
        let pipeline = pipeline(renderer, CaptureSettings::default());
        let node = question();
        let before = snapshot_presentation(node.as_ref());
        let node_ref: NodeRef = node.clone();

        let err = pipeline
            .capture(&node_ref, &CaptureOptions::hide_from(1))
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Render(RenderError::Failed(_))));
        assert!(err.is_render_failure());
        assert_eq!(before, snapshot_presentation(node.as_ref()));
    }

    #[tokio::test]
    async fn test_redaction_failure_skips_render() {
        let renderer = Arc::new(MockRenderer::default());
        let pipeline = pipeline(renderer.clone(), CaptureSettings::default());
        let input = MemoryNode::builder("input").checked().build();
        let node = MemoryNode::builder("fieldset")
            .child(MemoryNode::builder("label").selected().build())
            .child(input.clone())
            .build();
        input.lock_property(Property::Checked);
        let before = snapshot_presentation(node.as_ref());
        let node_ref: NodeRef = node.clone();

        let err = pipeline.capture(&node_ref, &CaptureOptions::full()).await.unwrap_err();

        assert!(matches!(err, CaptureError::Redaction { index: 1, .. }));
        assert!(renderer.calls.lock().unwrap().is_empty());
        assert_eq!(before, snapshot_presentation(node.as_ref()));
    }

    #[tokio::test]
    async fn test_waits_for_pending_assets() {
        let renderer = Arc::new(MockRenderer::default());
        let pipeline = Arc::new(pipeline(renderer.clone(), CaptureSettings::default()));
        let (loader, handle) = AssetHandle::pending();
        let node: NodeRef = MemoryNode::builder("fieldset")
            .extent(2, 2)
            .child(MemoryNode::builder("img").asset(handle).build())
            .build();

        let task = tokio::spawn({
            let pipeline = pipeline.clone();
            let node = node.clone();
            async move { pipeline.capture(&node, &CaptureOptions::full()).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(renderer.calls.lock().unwrap().is_empty());

        loader.failed();
        let result = task.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(renderer.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_asset_timeout() {
        let renderer = Arc::new(MockRenderer::default());
        let settings = CaptureSettings {
            asset_timeout: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let pipeline = pipeline(renderer.clone(), settings);
        let (_loader, handle) = AssetHandle::pending();
        let node = MemoryNode::builder("fieldset")
            .child(MemoryNode::builder("label").selected().asset(handle).build())
            .build();
        let before = snapshot_presentation(node.as_ref());
        let node_ref: NodeRef = node.clone();

        let err = pipeline.capture(&node_ref, &CaptureOptions::full()).await.unwrap_err();

        assert!(matches!(err, CaptureError::AssetWaitTimeout(_)));
        assert!(renderer.calls.lock().unwrap().is_empty());
        assert_eq!(before, snapshot_presentation(node.as_ref()));
    }

    #[tokio::test]
    async fn test_single_flight_serializes_captures() {
        let renderer = Arc::new(MockRenderer {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let pipeline = Arc::new(pipeline(renderer.clone(), CaptureSettings::default()));
        let a: NodeRef = question();
        let b: NodeRef = question();

        let full = CaptureOptions::full();

        let (ra, rb) = tokio::join!(pipeline.capture(&a, &full), pipeline.capture(&b, &full));

        assert!(ra.is_ok() && rb.is_ok());
        assert_eq!(renderer.max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_capture_restores_node() {
        let renderer = Arc::new(MockRenderer {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let pipeline = pipeline(renderer, CaptureSettings::default());
        let node = question();
        let before = snapshot_presentation(node.as_ref());
        let node_ref: NodeRef = node.clone();

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            pipeline.capture(&node_ref, &CaptureOptions::full()),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(before, snapshot_presentation(node.as_ref()));
        assert_eq!(
            node.children()[1].property(Property::Selected),
            PropertyValue::Flag(true)
        );
    }

    #[tokio::test]
    async fn test_stalled_asset_does_not_block_other_captures() {
        let renderer = Arc::new(MockRenderer::default());
        let pipeline = Arc::new(pipeline(renderer.clone(), CaptureSettings::default()));
        let (_loader, handle) = AssetHandle::pending();
        let stalled: NodeRef = MemoryNode::builder("fieldset")
            .extent(2, 2)
            .child(MemoryNode::builder("img").asset(handle).build())
            .build();
        let other: NodeRef = question();

        let waiting = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.capture(&stalled, &CaptureOptions::full()).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let result = tokio::time::timeout(
            Duration::from_millis(500),
            pipeline.capture(&other, &CaptureOptions::full()),
        )
        .await
        .expect("capture of an unrelated node must not wait on another node's assets");

        assert!(result.is_ok());
        assert!(!waiting.is_finished());
        waiting.abort();
    }

    /// Locks the selected label mid-render, then fails the render.
    struct LockingRenderer {
        label: Arc<MemoryNode>,
    }

    #[async_trait]
    impl Renderer for LockingRenderer {
        async fn render(&self, _node: &NodeRef, _options: &RenderOptions) -> Result<Bitmap, RenderError> {
            self.label.lock_property(Property::Selected);
            Err(RenderError::Failed("out of memory".to_string()))
        }
    }

    #[tokio::test]
    async fn test_restore_failure_does_not_mask_render_error() {
        let slot = MemoryNode::builder("span").class("quizPutTag").text("7").build();
        let label = MemoryNode::builder("label").text("A").selected().build();
        let input = MemoryNode::builder("input").checked().build();
        let node = MemoryNode::builder("fieldset")
            .extent(10, 10)
            .child(slot.clone())
            .child(label.clone())
            .child(input.clone())
            .build();
        let pipeline = CapturePipeline::new(
            Arc::new(LockingRenderer {
                label: label.clone(),
            }),
            Redactor::default(),
            CaptureSettings::default(),
        );
        let node_ref: NodeRef = node.clone();

        let err = pipeline
            .capture(&node_ref, &CaptureOptions::full())
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Render(RenderError::Failed(_))));
        assert_eq!(slot.property(Property::Markup), PropertyValue::text("7"));
        assert_eq!(input.property(Property::Checked), PropertyValue::Flag(true));
        // the locked step stays redacted
        assert_eq!(label.property(Property::Selected), PropertyValue::Flag(false));
    }
}
