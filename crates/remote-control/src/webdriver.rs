//! Minimal W3C WebDriver client covering the calls the harness makes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::driver::Driver;
use crate::error::{TransportError, TransportErrorKind};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Base URL of the WebDriver server, e.g. `http://127.0.0.1:4444`.
    pub base_url: String,
    /// Attach to an existing session instead of creating one.
    pub session_id: Option<String>,
    pub browser_name: String,
    pub request_timeout_ms: u64,
    /// Upper bound for asynchronous scripts such as relay round trips.
    pub script_timeout_ms: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4444".into(),
            session_id: None,
            browser_name: "firefox".into(),
            request_timeout_ms: 30_000,
            script_timeout_ms: 10_000,
        }
    }
}

pub struct WebDriverClient {
    http: Client,
    base_url: String,
    session_id: String,
    owns_session: bool,
}

impl WebDriverClient {
    /// Attaches to `cfg.session_id` or opens a new session.
    pub async fn connect(cfg: &WebDriverConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()?;
        let base_url = cfg.base_url.trim_end_matches('/').to_string();

        let (session_id, owns_session) = match &cfg.session_id {
            Some(id) => (id.clone(), false),
            None => {
                let body = json!({
                    "capabilities": {
                        "alwaysMatch": { "browserName": cfg.browser_name }
                    }
                });
                let value = send(&http, Method::POST, &format!("{base_url}/session"), Some(body))
                    .await?;
                let id = value
                    .get("sessionId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        TransportError::new(TransportErrorKind::Protocol)
                            .with_hint("new session response missing sessionId")
                    })?
                    .to_string();
                info!(target: "webdriver", session = %id, "created webdriver session");
                (id, true)
            }
        };

        let client = Self {
            http,
            base_url,
            session_id,
            owns_session,
        };
        client
            .session_request(
                Method::POST,
                "timeouts",
                Some(json!({ "script": cfg.script_timeout_ms })),
            )
            .await?;
        Ok(client)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Deletes the session when this client created it.
    pub async fn close(&self) -> Result<(), TransportError> {
        if !self.owns_session {
            return Ok(());
        }
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        send(&self.http, Method::DELETE, &url, None).await?;
        debug!(target: "webdriver", session = %self.session_id, "closed webdriver session");
        Ok(())
    }

    async fn session_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let url = format!("{}/session/{}/{}", self.base_url, self.session_id, path);
        send(&self.http, method, &url, body).await
    }
}

#[async_trait]
impl Driver for WebDriverClient {
    async fn current_url(&self) -> Result<String, TransportError> {
        let value = self.session_request(Method::GET, "url", None).await?;
        value.as_str().map(str::to_string).ok_or_else(|| {
            TransportError::new(TransportErrorKind::Protocol)
                .with_hint("current url response is not a string")
        })
    }

    async fn navigate(&self, url: &str) -> Result<(), TransportError> {
        self.session_request(Method::POST, "url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        self.session_request(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn execute_async(&self, script: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        self.session_request(
            Method::POST,
            "execute/async",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }
}

async fn send(
    http: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, TransportError> {
    let mut request = http.request(method.clone(), url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await?;
    let status = response.status();
    let payload: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        warn!(target: "webdriver", %method, url, %status, "webdriver request failed");
    }
    unwrap_w3c(status, payload)
}

/// Extracts `value` from a W3C response body, turning error payloads into
/// [`TransportError`]s that keep the driver's message.
///
/// Only non-2xx responses are errors. A successful script may itself resolve
/// to an object carrying an `error` key, such as a failed relay reply.
pub(crate) fn unwrap_w3c(status: StatusCode, body: Value) -> Result<Value, TransportError> {
    let value = match body {
        Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
        other => other,
    };
    if status.is_success() {
        return Ok(value);
    }

    let code = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let kind = match code {
        "javascript error" | "script timeout" => TransportErrorKind::Script,
        _ => TransportErrorKind::Protocol,
    };
    let hint = if message.is_empty() {
        format!("{code} (http {status})")
    } else {
        format!("{code}: {message}")
    };
    Err(TransportError::new(kind)
        .with_hint(hint)
        .retriable(status == StatusCode::SERVICE_UNAVAILABLE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_success_value() {
        let value = unwrap_w3c(StatusCode::OK, json!({ "value": "http://localhost/" })).unwrap();
        assert_eq!(value, json!("http://localhost/"));
    }

    #[test]
    fn null_value_is_success() {
        let value = unwrap_w3c(StatusCode::OK, json!({ "value": null })).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn successful_script_result_with_error_key_passes_through() {
        let reply = json!({ "success": false, "error": "Invalid tab ID: 42" });
        let value = unwrap_w3c(StatusCode::OK, json!({ "value": reply.clone() })).unwrap();
        assert_eq!(value, reply);
    }

    #[test]
    fn maps_script_errors() {
        let err = unwrap_w3c(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "value": { "error": "javascript error", "message": "boom", "stacktrace": "" } }),
        )
        .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Script);
        assert_eq!(err.hint.as_deref(), Some("javascript error: boom"));
    }

    #[test]
    fn maps_missing_session() {
        let err = unwrap_w3c(
            StatusCode::NOT_FOUND,
            json!({ "value": { "error": "invalid session id", "message": "" } }),
        )
        .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Protocol);
        assert!(err.to_string().contains("invalid session id"));
    }
}
