use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::driver::Driver;
use crate::error::{ClientError, TransportError, TransportErrorKind};

/// Structured reply of the in-page relay.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Unwraps `data`, or turns `success: false` into [`ClientError::Remote`]
    /// carrying the relay's message verbatim.
    pub fn into_result(self, command: &str) -> Result<Value, ClientError> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(ClientError::Remote {
                command: command.to_string(),
                message: self.error.unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }
}

/// Sends a named command to the relay and returns its structured reply.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> Result<RemoteResponse, TransportError>;
}

/// Page-side half of the relay round trip. Posts the request to the content
/// script and resolves with its reply, or with a failure after `timeoutMs`.
pub const RELAY_SCRIPT: &str = r#"
const [command, args, timeoutMs, done] = arguments;
const id = `${Date.now()}-${Math.random().toString(36).slice(2)}`;
const timer = setTimeout(() => {
  window.removeEventListener("message", onMessage);
  done({ success: false, error: "relay did not respond" });
}, timeoutMs);
function onMessage(event) {
  const msg = event.data;
  if (event.source !== window || !msg || msg.type !== "webext-harness:response" || msg.id !== id) {
    return;
  }
  clearTimeout(timer);
  window.removeEventListener("message", onMessage);
  done(msg.response);
}
window.addEventListener("message", onMessage);
window.postMessage({ type: "webext-harness:request", id, command, args }, "*");
"#;

/// [`RemoteChannel`] that reaches the relay through the driver's script API.
pub struct RelayChannel {
    driver: Arc<dyn Driver>,
    reply_timeout_ms: u64,
}

impl RelayChannel {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            reply_timeout_ms: 5_000,
        }
    }

    pub fn with_reply_timeout(mut self, timeout_ms: u64) -> Self {
        self.reply_timeout_ms = timeout_ms;
        self
    }
}

#[async_trait]
impl RemoteChannel for RelayChannel {
    async fn invoke(&self, command: &str, args: Value) -> Result<RemoteResponse, TransportError> {
        debug!(target: "relay", command, "invoking relay command");
        let reply = self
            .driver
            .execute_async(
                RELAY_SCRIPT,
                vec![json!(command), args, json!(self.reply_timeout_ms)],
            )
            .await?;
        serde_json::from_value(reply).map_err(|err| {
            TransportError::new(TransportErrorKind::Script)
                .with_hint(format!("malformed relay reply to {command}: {err}"))
        })
    }
}

/// Channel used when no relay is reachable.
#[derive(Default)]
pub struct NoopChannel;

#[async_trait]
impl RemoteChannel for NoopChannel {
    async fn invoke(&self, command: &str, _args: Value) -> Result<RemoteResponse, TransportError> {
        Ok(RemoteResponse::failed(format!("unknown command {command}")))
    }
}
