//! Policy-checked delivery of JSON messages to other WebExtensions.
//!
//! The harness never talks to a target extension directly: a
//! [`ExtensionMessenger`] (the in-page relay in production) carries the
//! payload and returns the extension's reply. [`ExtensionsBridge`] adds the
//! enable switch, the allow/deny policy, a reply deadline and observer events.

pub mod config;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
pub use harness_core_types::ExtensionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

pub use config::{BridgePolicyEntry, BridgePolicyFile};

/// Reply deadline applied when the policy does not name one.
pub const DEFAULT_DEADLINE_MS: u64 = 5_000;

/// Errors surfaced by the bridge.
#[derive(Clone, Debug, Error)]
pub enum BridgeError {
    #[error("extensions bridge disabled")]
    Disabled,
    #[error("policy denied: {0}")]
    PolicyDenied(String),
    #[error("extension did not reply within {0}ms")]
    Timeout(u64),
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Carries a payload to `target` and returns its reply.
#[async_trait]
pub trait ExtensionMessenger: Send + Sync {
    async fn deliver(&self, target: &ExtensionId, payload: Value) -> Result<Value, BridgeError>;
}

/// Observer channel for bridge activity.
pub type BridgeEventBus = broadcast::Sender<BridgeEvent>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BridgeEvent {
    BridgeReady {
        allowlist: Vec<ExtensionId>,
    },
    Disabled,
    InvokeOk {
        extension: ExtensionId,
        req_id: Uuid,
        elapsed_ms: u64,
    },
    InvokeFail {
        extension: ExtensionId,
        req_id: Uuid,
        error: String,
    },
}

pub struct ExtensionsBridge {
    pub events: BridgeEventBus,
    messenger: Arc<dyn ExtensionMessenger>,
    policy: BridgePolicyFile,
    default_deadline_ms: u64,
    enabled: AtomicBool,
    inflight: DashMap<Uuid, ExtensionId>,
}

impl ExtensionsBridge {
    /// Bridge with an empty policy, which permits every extension.
    pub fn new(events: BridgeEventBus, messenger: Arc<dyn ExtensionMessenger>) -> Self {
        Self {
            events,
            messenger,
            policy: BridgePolicyFile::default(),
            default_deadline_ms: DEFAULT_DEADLINE_MS,
            enabled: AtomicBool::new(false),
            inflight: DashMap::new(),
        }
    }

    /// Once the policy lists any extension, only listed and allowed ids pass.
    pub fn with_policy(mut self, policy: BridgePolicyFile) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_deadline(mut self, deadline_ms: u64) -> Self {
        self.default_deadline_ms = deadline_ms;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn inflight(&self) -> usize {
        self.inflight.len()
    }

    pub fn enable(&self) {
        if self.enabled.swap(true, Ordering::SeqCst) {
            return;
        }
        let allowlist = self
            .policy
            .extensions
            .iter()
            .filter(|entry| entry.allow)
            .map(|entry| ExtensionId(entry.id.clone()))
            .collect();
        let _ = self.events.send(BridgeEvent::BridgeReady { allowlist });
    }

    pub fn disable(&self) {
        if !self.enabled.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.events.send(BridgeEvent::Disabled);
    }

    fn check_policy(&self, extension: &ExtensionId) -> Result<u64, BridgeError> {
        match self.policy.entry(&extension.0) {
            Some(entry) if !entry.allow => Err(BridgeError::PolicyDenied(format!(
                "extension {} is denied",
                extension
            ))),
            Some(entry) => Ok(entry.deadline_ms.unwrap_or(self.default_deadline_ms)),
            None if self.policy.extensions.is_empty() => Ok(self.default_deadline_ms),
            None => Err(BridgeError::PolicyDenied(format!(
                "extension {} not in allowlist",
                extension
            ))),
        }
    }

    /// Delivers `payload` to `extension` and returns its reply unchanged.
    pub async fn send(&self, extension: &ExtensionId, payload: Value) -> Result<Value, BridgeError> {
        if !self.is_enabled() {
            return Err(BridgeError::Disabled);
        }
        let deadline_ms = self.check_policy(extension)?;

        let req_id = Uuid::new_v4();
        let _inflight = InflightEntry::register(&self.inflight, req_id, extension);
        let started = Instant::now();
        debug!(target: "extensions-bridge", %extension, %req_id, "forwarding message");

        let outcome = match timeout(
            Duration::from_millis(deadline_ms),
            self.messenger.deliver(extension, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout(deadline_ms)),
        };

        match &outcome {
            Ok(_) => {
                let _ = self.events.send(BridgeEvent::InvokeOk {
                    extension: extension.clone(),
                    req_id,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }
            Err(err) => {
                warn!(target: "extensions-bridge", %extension, %req_id, error = %err, "message delivery failed");
                let _ = self.events.send(BridgeEvent::InvokeFail {
                    extension: extension.clone(),
                    req_id,
                    error: err.to_string(),
                });
            }
        }
        outcome
    }
}

/// Keeps a request listed as in flight until dropped, so a cancelled `send`
/// does not leave its entry behind.
struct InflightEntry<'a> {
    map: &'a DashMap<Uuid, ExtensionId>,
    req_id: Uuid,
}

impl<'a> InflightEntry<'a> {
    fn register(map: &'a DashMap<Uuid, ExtensionId>, req_id: Uuid, extension: &ExtensionId) -> Self {
        map.insert(req_id, extension.clone());
        Self { map, req_id }
    }
}

impl Drop for InflightEntry<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.req_id);
    }
}
