//! The harness facade.
//!
//! [`Harness`] ties together the guarded relay client, the typed command
//! forwarder, the local lifecycle event log and the extensions bridge, and
//! layers the polling waiters on top of them.

use std::convert::Infallible;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use extensions_bridge::{BridgePolicyFile, ExtensionId, ExtensionsBridge};
use harness_core_types::{
    BrowserEvent, EventCategory, EventKind, ExtensionUuid, TabId, TabInfo, WindowInfo,
};
use harness_event_ring::EventLog;
use harness_remote_control::{
    BridgeClient, ClientError, CommandForwarder, Driver, Readiness, RelayChannel, RemoteChannel,
    WebDriverClient,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::{HarnessConfig, DEFAULT_UUID_PAGE};
use crate::errors::{HarnessError, HarnessResult};
use crate::messaging::RelayMessenger;
use crate::wait::{wait_for, wait_for_settled_len, WaitDefaults, WaitOptions};

/// Reads the extension table rendered by `about:debugging`.
pub const UUID_TABLE_SCRIPT: &str = r#"
const rows = [];
for (const item of document.querySelectorAll(".debug-target-item")) {
  const fields = {};
  for (const term of item.querySelectorAll("dt")) {
    const detail = term.nextElementSibling;
    if (detail) {
      fields[term.textContent.trim()] = detail.textContent.trim();
    }
  }
  if (fields["Extension ID"] && fields["Internal UUID"]) {
    rows.push({ extensionId: fields["Extension ID"], uuid: fields["Internal UUID"] });
  }
}
return rows;
"#;

const BRIDGE_EVENT_CAPACITY: usize = 64;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessStatus {
    pub readiness: Readiness,
    pub content_url: String,
    pub events: EventTotals,
    pub bridge_enabled: bool,
    pub inflight_messages: usize,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct EventTotals {
    pub tabs: usize,
    pub windows: usize,
}

pub struct Harness {
    client: Arc<BridgeClient>,
    forwarder: CommandForwarder,
    events: Arc<EventLog>,
    bridge: ExtensionsBridge,
    waits: WaitDefaults,
    uuid_page: String,
    pull_on_read: bool,
    pub(crate) running_feeds: AtomicUsize,
}

impl Harness {
    pub fn new(client: Arc<BridgeClient>, events: Arc<EventLog>, bridge: ExtensionsBridge) -> Self {
        Self {
            forwarder: CommandForwarder::new(Arc::clone(&client)),
            client,
            events,
            bridge,
            waits: WaitDefaults::default(),
            uuid_page: DEFAULT_UUID_PAGE.into(),
            pull_on_read: true,
            running_feeds: AtomicUsize::new(0),
        }
    }

    pub fn with_waits(mut self, waits: WaitDefaults) -> Self {
        self.waits = waits;
        self
    }

    pub fn with_uuid_page(mut self, url: impl Into<String>) -> Self {
        self.uuid_page = url.into();
        self
    }

    /// Whether event reads and waits pull the extension's own buffer first.
    /// Disable when only local producers fill the log. A running remote feed
    /// suspends these pulls on its own.
    pub fn with_event_pull(mut self, enabled: bool) -> Self {
        self.pull_on_read = enabled;
        self
    }

    /// Opens (or attaches to) a WebDriver session and wires the relay.
    pub async fn connect(config: &HarnessConfig) -> HarnessResult<Self> {
        let driver = WebDriverClient::connect(&config.webdriver).await?;
        info!(
            target: "harness",
            session = driver.session_id(),
            webdriver = %config.webdriver.base_url,
            "webdriver session ready"
        );
        Self::from_driver(Arc::new(driver), config)
    }

    pub fn from_driver(driver: Arc<dyn Driver>, config: &HarnessConfig) -> HarnessResult<Self> {
        let channel: Arc<dyn RemoteChannel> = Arc::new(
            RelayChannel::new(Arc::clone(&driver))
                .with_reply_timeout(config.relay_reply_timeout_ms),
        );
        let client = Arc::new(BridgeClient::new(
            driver,
            channel,
            config.content_url.clone(),
        ));
        Self::from_client(client, config)
    }

    pub fn from_client(client: Arc<BridgeClient>, config: &HarnessConfig) -> HarnessResult<Self> {
        let policy = match &config.bridge_policy {
            Some(path) => BridgePolicyFile::load(path)?,
            None => BridgePolicyFile::default(),
        };
        let (bus, _) = broadcast::channel(BRIDGE_EVENT_CAPACITY);
        let bridge = ExtensionsBridge::new(bus, Arc::new(RelayMessenger::new(Arc::clone(&client))))
            .with_policy(policy)
            .with_default_deadline(config.extension_deadline_ms);
        bridge.enable();

        Ok(Self::new(client, EventLog::new(config.event_capacity), bridge)
            .with_waits(config.waits.clone())
            .with_uuid_page(config.uuid_page.clone()))
    }

    pub fn client(&self) -> &Arc<BridgeClient> {
        &self.client
    }

    pub fn forwarder(&self) -> &CommandForwarder {
        &self.forwarder
    }

    pub fn event_log(&self) -> &Arc<EventLog> {
        &self.events
    }

    pub fn bridge(&self) -> &ExtensionsBridge {
        &self.bridge
    }

    pub fn waits(&self) -> &WaitDefaults {
        &self.waits
    }

    pub async fn init(&self) -> HarnessResult<()> {
        Ok(self.client.init().await?)
    }

    pub async fn reset(&self) -> HarnessResult<()> {
        Ok(self.client.reset().await?)
    }

    pub async fn ensure_ready(&self) -> HarnessResult<()> {
        Ok(self.client.ensure_ready().await?)
    }

    /// Snapshot of readiness and buffer sizes. Never touches the browser.
    pub fn status(&self) -> HarnessStatus {
        let counts = self.events.counts();
        HarnessStatus {
            readiness: self.client.state(),
            content_url: self.client.content_url().to_string(),
            events: EventTotals {
                tabs: counts.tabs,
                windows: counts.windows,
            },
            bridge_enabled: self.bridge.is_enabled(),
            inflight_messages: self.bridge.inflight(),
        }
    }

    pub fn record_event(&self, event: BrowserEvent) {
        self.events.record(event);
    }

    /// Events of `category` in arrival order, optionally emptying the buffer.
    pub fn events(&self, category: EventCategory, clear: bool) -> Vec<BrowserEvent> {
        self.events.drain(category, clear)
    }

    pub fn clear_events(&self) {
        self.events.clear_all();
    }

    /// Local events of `category` after pulling the extension's buffer, unless
    /// a remote feed already does that. A failed pull falls back to the log.
    pub async fn fetch_events(&self, category: EventCategory, clear: bool) -> Vec<BrowserEvent> {
        if self.pull_on_read && self.running_feeds.load(Ordering::Acquire) == 0 {
            if let Err(err) = self.pull_remote_events().await {
                debug!(target: "harness", error = %err, "remote event pull failed");
            }
        }
        self.events.drain(category, clear)
    }

    /// Moves events buffered inside the extension into the local log.
    pub async fn pull_remote_events(&self) -> HarnessResult<usize> {
        let mut pulled = 0;
        for category in [EventCategory::Tab, EventCategory::Window] {
            let batch = self.forwarder.remote_events(category, true).await?;
            pulled += batch.len();
            self.events.record_all(batch);
        }
        if pulled > 0 {
            debug!(target: "harness", pulled, "pulled remote events");
        }
        Ok(pulled)
    }

    /// First tab whose URL contains `pattern`.
    pub async fn wait_for_tab_url(
        &self,
        pattern: &str,
        options: Option<WaitOptions>,
    ) -> HarnessResult<Option<TabInfo>> {
        self.ensure_ready().await?;
        let forwarder = &self.forwarder;
        Ok(wait_for(
            || async move {
                let tabs = forwarder.tabs().await?;
                Ok::<_, ClientError>(tabs.into_iter().find(|tab| tab.url_contains(pattern)))
            },
            options.unwrap_or(self.waits.tab_url),
        )
        .await)
    }

    /// The tab once its status reads `complete`. A tab that does not exist
    /// yet is polled like an incomplete one.
    pub async fn wait_for_tab_load(
        &self,
        tab: TabId,
        options: Option<WaitOptions>,
    ) -> HarnessResult<Option<TabInfo>> {
        self.ensure_ready().await?;
        let forwarder = &self.forwarder;
        Ok(wait_for(
            || async move {
                let found = forwarder.tab(tab).await?;
                Ok::<_, ClientError>(found.filter(TabInfo::is_complete))
            },
            options.unwrap_or(self.waits.tab_load),
        )
        .await)
    }

    /// First buffered event of `category` and `kind`. The buffer is left
    /// untouched.
    pub async fn wait_for_event(
        &self,
        category: EventCategory,
        kind: EventKind,
        options: Option<WaitOptions>,
    ) -> Option<BrowserEvent> {
        wait_for(
            || async move {
                Ok::<_, Infallible>(
                    self.fetch_events(category, false)
                        .await
                        .into_iter()
                        .find(|event| event.matches(category, kind)),
                )
            },
            options.unwrap_or(self.waits.event),
        )
        .await
    }

    /// Tabs once exactly `count` are open on two observations in a row.
    pub async fn wait_for_tab_count(
        &self,
        count: usize,
        options: Option<WaitOptions>,
    ) -> HarnessResult<Option<Vec<TabInfo>>> {
        self.ensure_ready().await?;
        Ok(wait_for_settled_len(
            || self.forwarder.tabs(),
            count,
            self.waits.count_settle(),
            options.unwrap_or(self.waits.count),
        )
        .await)
    }

    pub async fn wait_for_window_count(
        &self,
        count: usize,
        options: Option<WaitOptions>,
    ) -> HarnessResult<Option<Vec<WindowInfo>>> {
        self.ensure_ready().await?;
        Ok(wait_for_settled_len(
            || self.forwarder.windows(),
            count,
            self.waits.count_settle(),
            options.unwrap_or(self.waits.count),
        )
        .await)
    }

    /// Caller-supplied predicate with the harness's default timing.
    pub async fn wait_for_condition<T, E, F, Fut>(
        &self,
        predicate: F,
        options: Option<WaitOptions>,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: std::fmt::Display,
    {
        wait_for(predicate, options.unwrap_or(self.waits.condition)).await
    }

    /// Sends `message` to another extension and returns its reply verbatim.
    pub async fn send_to_extension(
        &self,
        extension: &ExtensionId,
        message: Value,
    ) -> HarnessResult<Value> {
        self.ensure_ready().await?;
        Ok(self.bridge.send(extension, message).await?)
    }

    /// Installed extensions and their internal UUIDs.
    ///
    /// Reading the table means leaving the content page, so the relay is
    /// unusable afterwards until [`Harness::reset`] is called.
    pub async fn extension_uuids(&self) -> HarnessResult<Vec<ExtensionUuid>> {
        let table = self
            .client
            .visit_privileged(&self.uuid_page, UUID_TABLE_SCRIPT)
            .await?;
        serde_json::from_value(table).map_err(|err| {
            HarnessError::Client(ClientError::Decode {
                command: "extensionUuids".into(),
                reason: err.to_string(),
            })
        })
    }
}
