use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use qsnap_config::{CaptureConfig, Config, DiscoveryConfig, RedactionConfig};
use qsnap_discovery::{Actions, Discovery, DiscoveryRules, Document};
use qsnap_engine::{CapturePipeline, CaptureSettings, Renderer};
use qsnap_redact::{RedactionRules, Redactor};
use qsnap_sinks::{
    ClipboardSink, HttpImportClient, ImportTransport, LogNotifier, Notifications, Notifier,
    SystemClipboard,
};
use tracing::info;

/// A configured capture pipeline plus the discovery loop feeding it.
pub struct Augmenter {
    config: Config,
    actions: Arc<Actions>,
    discovery: Discovery,
}

impl Augmenter {
    pub fn builder(
        config: Config,
        document: Arc<dyn Document>,
        renderer: Arc<dyn Renderer>,
    ) -> AugmenterBuilder {
        AugmenterBuilder {
            config,
            document,
            renderer,
            clipboard: None,
            transport: None,
            notifier: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn actions(&self) -> &Arc<Actions> {
        &self.actions
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Run discovery at the configured interval until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.discovery
            .run(self.config.discovery.interval(), shutdown)
            .await;
    }
}

/// Wires [`Config`] into the collaborators.
///
/// Collaborators left unset fall back to the system clipboard, an HTTP
/// client for the configured endpoint, and log-only notifications.
pub struct AugmenterBuilder {
    config: Config,
    document: Arc<dyn Document>,
    renderer: Arc<dyn Renderer>,
    clipboard: Option<Arc<dyn ClipboardSink>>,
    transport: Option<Arc<dyn ImportTransport>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AugmenterBuilder {
    pub fn clipboard(mut self, clipboard: Arc<dyn ClipboardSink>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn ImportTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<Augmenter> {
        let config = self.config;
        config.validate()?;

        let transport: Arc<dyn ImportTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpImportClient::new(config.import.endpoint.as_str(), config.import.timeout())
                    .context("Failed to create import client")?,
            ),
        };
        let clipboard = self
            .clipboard
            .unwrap_or_else(|| Arc::new(SystemClipboard) as Arc<dyn ClipboardSink>);
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(LogNotifier) as Arc<dyn Notifier>);

        let pipeline = Arc::new(CapturePipeline::new(
            self.renderer,
            Redactor::new(redaction_rules(&config.redaction)),
            capture_settings(&config.capture),
        ));
        let actions = Arc::new(Actions::new(
            pipeline,
            clipboard,
            transport,
            Notifications::new(notifier, config.notifications.ttl()),
            config.import.token.as_str(),
        ));
        let discovery = Discovery::new(
            self.document,
            actions.clone(),
            discovery_rules(&config.discovery),
        );

        info!(endpoint = %config.import.endpoint, "Augmenter ready");
        Ok(Augmenter {
            config,
            actions,
            discovery,
        })
    }
}

fn redaction_rules(config: &RedactionConfig) -> RedactionRules {
    RedactionRules {
        answer_slot_class: config.answer_slot_class.clone(),
        masked_literal: config.masked_literal.clone(),
        attribution_text: config.attribution_text.clone(),
    }
}

fn capture_settings(config: &CaptureConfig) -> CaptureSettings {
    CaptureSettings {
        scale: config.scale,
        asset_timeout: config.asset_timeout(),
        single_flight: config.single_flight,
    }
}

fn discovery_rules(config: &DiscoveryConfig) -> DiscoveryRules {
    DiscoveryRules {
        eligibility_class: config.eligibility_class.clone(),
        expected_kind: config.expected_kind.clone(),
        key_point_marker: config.key_point_marker.clone(),
        attached_key: config.attached_key.clone(),
    }
}
