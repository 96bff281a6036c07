use std::sync::Arc;

use harness_core_types::is_content_url;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::channel::RemoteChannel;
use crate::driver::Driver;
use crate::error::ClientError;
use crate::readiness::{Readiness, ReadinessSignal};

/// Relay command answered by the content script once it is listening.
pub const PING_COMMAND: &str = "ping";

/// Control-channel client: owns the readiness state and guards every relay
/// call with [`BridgeClient::ensure_ready`].
///
/// The state lock is never held across a driver or relay round trip.
pub struct BridgeClient {
    driver: Arc<dyn Driver>,
    channel: Arc<dyn RemoteChannel>,
    content_url: String,
    state: Mutex<Readiness>,
}

impl BridgeClient {
    pub fn new(
        driver: Arc<dyn Driver>,
        channel: Arc<dyn RemoteChannel>,
        content_url: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            channel,
            content_url: content_url.into(),
            state: Mutex::new(Readiness::Uninitialized),
        }
    }

    pub fn content_url(&self) -> &str {
        &self.content_url
    }

    pub fn state(&self) -> Readiness {
        self.state.lock().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().is_ready()
    }

    fn apply(&self, signal: ReadinessSignal) -> Readiness {
        let mut guard = self.state.lock();
        let next = guard.transition(&signal);
        if next.name() != guard.name() {
            debug!(
                target: "readiness",
                from = guard.name(),
                to = next.name(),
                location = next.location().unwrap_or_default(),
                "readiness changed"
            );
        }
        *guard = next.clone();
        next
    }

    /// Moves to a content page if needed and confirms the relay answers.
    pub async fn init(&self) -> Result<(), ClientError> {
        let mut location = self.driver.current_url().await?;
        if !is_content_url(&location) {
            info!(
                target: "readiness",
                from = %location,
                to = %self.content_url,
                "navigating to content page"
            );
            self.driver.navigate(&self.content_url).await?;
            location = self.content_url.clone();
        }

        self.channel
            .invoke(PING_COMMAND, json!({}))
            .await?
            .into_result(PING_COMMAND)?;

        self.apply(ReadinessSignal::Initialized { url: location });
        info!(target: "readiness", "relay ready");
        Ok(())
    }

    /// Guard run before every relay call. Initializes lazily, fails fast with
    /// [`ClientError::NotReady`] once invalidated, and never retries.
    pub async fn ensure_ready(&self) -> Result<(), ClientError> {
        match self.state() {
            Readiness::Uninitialized => self.init().await,
            Readiness::Invalidated { url } => Err(ClientError::NotReady { url }),
            Readiness::Ready { .. } => {
                let url = self.driver.current_url().await?;
                match self.apply(ReadinessSignal::LocationChecked { url }) {
                    Readiness::Invalidated { url } => {
                        warn!(target: "readiness", location = %url, "control channel invalidated");
                        Err(ClientError::NotReady { url })
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    /// Returns to the content page and re-initializes. Safe when already ready.
    pub async fn reset(&self) -> Result<(), ClientError> {
        self.driver.navigate(&self.content_url).await?;
        self.init().await
    }

    /// Guarded relay call returning the unwrapped `data`.
    pub async fn call(&self, command: &str, args: Value) -> Result<Value, ClientError> {
        self.ensure_ready().await?;
        self.channel.invoke(command, args).await?.into_result(command)
    }

    /// Runs `script` on a privileged page. The channel is invalidated
    /// afterwards whether or not the script succeeded.
    pub async fn visit_privileged(&self, url: &str, script: &str) -> Result<Value, ClientError> {
        self.ensure_ready().await?;
        let outcome = match self.driver.navigate(url).await {
            Ok(()) => self.driver.execute(script, Vec::new()).await,
            Err(err) => Err(err),
        };
        self.mark_navigated_away(url);
        Ok(outcome?)
    }

    pub fn mark_navigated_away(&self, url: &str) {
        self.apply(ReadinessSignal::NavigatedAway {
            url: url.to_string(),
        });
    }

    pub async fn current_url(&self) -> Result<String, ClientError> {
        Ok(self.driver.current_url().await?)
    }
}
