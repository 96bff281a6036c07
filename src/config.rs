//! Harness configuration.
//!
//! Loaded from YAML (see `cli::runtime::load_config` for the lookup order)
//! and then adjusted from `WEBEXT_HARNESS_*` environment variables.

use std::env;
use std::path::{Path, PathBuf};

use harness_event_ring::DEFAULT_CAPACITY;
use harness_remote_control::WebDriverConfig;
use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, HarnessResult};
use crate::wait::WaitDefaults;

pub const WEBDRIVER_URL_ENV: &str = "WEBEXT_HARNESS_WEBDRIVER_URL";
pub const SESSION_ID_ENV: &str = "WEBEXT_HARNESS_SESSION_ID";
pub const CONTENT_URL_ENV: &str = "WEBEXT_HARNESS_CONTENT_URL";
pub const LISTEN_ENV: &str = "WEBEXT_HARNESS_LISTEN";

pub const DEFAULT_CONTENT_URL: &str = "http://localhost:8000/";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8787";
/// Firefox page listing installed extensions with their internal UUIDs.
pub const DEFAULT_UUID_PAGE: &str = "about:debugging#/runtime/this-firefox";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub webdriver: WebDriverConfig,
    /// HTTP(S) page the relay content script is injected into.
    pub content_url: String,
    /// How long the relay page may take to answer one command.
    pub relay_reply_timeout_ms: u64,
    pub listen: String,
    /// Per-category capacity of the lifecycle event log.
    pub event_capacity: usize,
    /// When set, events buffered by the extension are pulled into the local
    /// log at this period.
    pub remote_feed_ms: Option<u64>,
    pub waits: WaitDefaults,
    /// Allow/deny list for messages to other extensions.
    pub bridge_policy: Option<PathBuf>,
    pub extension_deadline_ms: u64,
    pub uuid_page: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            webdriver: WebDriverConfig::default(),
            content_url: DEFAULT_CONTENT_URL.into(),
            relay_reply_timeout_ms: 5_000,
            listen: DEFAULT_LISTEN.into(),
            event_capacity: DEFAULT_CAPACITY,
            remote_feed_ms: None,
            waits: WaitDefaults::default(),
            bridge_policy: None,
            extension_deadline_ms: extensions_bridge::DEFAULT_DEADLINE_MS,
            uuid_page: DEFAULT_UUID_PAGE.into(),
        }
    }
}

impl HarnessConfig {
    pub fn from_yaml(raw: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|err| HarnessError::Config(format!("invalid configuration: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            HarnessError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    /// Applies `WEBEXT_HARNESS_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup(WEBDRIVER_URL_ENV) {
            self.webdriver.base_url = url;
        }
        if let Some(session) = lookup(SESSION_ID_ENV) {
            self.webdriver.session_id = Some(session);
        }
        if let Some(url) = lookup(CONTENT_URL_ENV) {
            self.content_url = url;
        }
        if let Some(listen) = lookup(LISTEN_ENV) {
            self.listen = listen;
        }
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if !harness_core_types::is_content_url(&self.content_url) {
            return Err(HarnessError::Config(format!(
                "content_url must be an http(s) page, got {}",
                self.content_url
            )));
        }
        if self.event_capacity == 0 {
            return Err(HarnessError::Config(
                "event_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
