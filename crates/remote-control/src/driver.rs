use async_trait::async_trait;
use serde_json::Value;

use crate::error::{TransportError, TransportErrorKind};

/// Browser automation primitives the harness needs from the remote driver.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Location of the page the control channel is attached to.
    async fn current_url(&self) -> Result<String, TransportError>;
    async fn navigate(&self, url: &str) -> Result<(), TransportError>;
    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, TransportError>;
    /// Runs `script` with a completion callback appended to `arguments`.
    async fn execute_async(&self, script: &str, args: Vec<Value>) -> Result<Value, TransportError>;
}

/// Driver used when no browser is attached; every call fails.
#[derive(Default)]
pub struct NoopDriver;

#[async_trait]
impl Driver for NoopDriver {
    async fn current_url(&self) -> Result<String, TransportError> {
        Err(unavailable("current_url"))
    }

    async fn navigate(&self, _url: &str) -> Result<(), TransportError> {
        Err(unavailable("navigate"))
    }

    async fn execute(&self, _script: &str, _args: Vec<Value>) -> Result<Value, TransportError> {
        Err(unavailable("execute"))
    }

    async fn execute_async(
        &self,
        _script: &str,
        _args: Vec<Value>,
    ) -> Result<Value, TransportError> {
        Err(unavailable("execute_async"))
    }
}

fn unavailable(operation: &str) -> TransportError {
    TransportError::new(TransportErrorKind::Unavailable)
        .with_hint(format!("no driver attached for {operation}"))
}
