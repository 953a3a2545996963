use qsnap_discovery::discovery::{
    DEFAULT_ATTACHED_KEY, DEFAULT_ELIGIBILITY_CLASS, DEFAULT_EXPECTED_KIND,
    DEFAULT_KEY_POINT_MARKER,
};
use qsnap_redact::rules::{
    DEFAULT_ANSWER_SLOT_CLASS, DEFAULT_ATTRIBUTION_TEXT, DEFAULT_MASKED_LITERAL,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for qsnap, read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub redaction: RedactionConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Sent verbatim with every import request
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// Unset means wait for embedded assets indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_timeout_ms: Option<u64>,

    #[serde(default = "default_true")]
    pub single_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_eligibility_class")]
    pub eligibility_class: String,

    #[serde(default = "default_expected_kind")]
    pub expected_kind: String,

    #[serde(default = "default_key_point_marker")]
    pub key_point_marker: String,

    #[serde(default = "default_attached_key")]
    pub attached_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionConfig {
    #[serde(default = "default_answer_slot_class")]
    pub answer_slot_class: String,

    #[serde(default = "default_masked_literal")]
    pub masked_literal: String,

    #[serde(default = "default_attribution_text")]
    pub attribution_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import: ImportConfig::default(),
            capture: CaptureConfig::default(),
            discovery: DiscoveryConfig::default(),
            redaction: RedactionConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            asset_timeout_ms: None,
            single_flight: true,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            eligibility_class: default_eligibility_class(),
            expected_kind: default_expected_kind(),
            key_point_marker: default_key_point_marker(),
            attached_key: default_attached_key(),
        }
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            answer_slot_class: default_answer_slot_class(),
            masked_literal: default_masked_literal(),
            attribution_text: default_attribution_text(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:27777/import".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_scale() -> f32 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_eligibility_class() -> String {
    DEFAULT_ELIGIBILITY_CLASS.to_string()
}

fn default_expected_kind() -> String {
    DEFAULT_EXPECTED_KIND.to_string()
}

fn default_key_point_marker() -> String {
    DEFAULT_KEY_POINT_MARKER.to_string()
}

fn default_attached_key() -> String {
    DEFAULT_ATTACHED_KEY.to_string()
}

fn default_answer_slot_class() -> String {
    DEFAULT_ANSWER_SLOT_CLASS.to_string()
}

fn default_masked_literal() -> String {
    DEFAULT_MASKED_LITERAL.to_string()
}

fn default_attribution_text() -> String {
    DEFAULT_ATTRIBUTION_TEXT.to_string()
}

fn default_ttl_ms() -> u64 {
    1000
}

impl ImportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CaptureConfig {
    pub fn asset_timeout(&self) -> Option<Duration> {
        self.asset_timeout_ms.map(Duration::from_millis)
    }
}

impl DiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl NotificationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if the file is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Reject values the capture and discovery loops cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.capture.scale.is_finite() && self.capture.scale > 0.0) {
            anyhow::bail!("capture.scale must be positive, got {}", self.capture.scale);
        }
        if self.discovery.interval_ms == 0 {
            anyhow::bail!("discovery.interval_ms must be greater than zero");
        }
        if self.import.endpoint.trim().is_empty() {
            anyhow::bail!("import.endpoint must not be empty");
        }
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "qsnap", "qsnap") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.qsnap/config.toml")
        }
    }
}
