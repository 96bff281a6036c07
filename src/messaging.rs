use std::sync::Arc;

use async_trait::async_trait;
use extensions_bridge::{BridgeError, ExtensionId, ExtensionMessenger};
use harness_remote_control::{commands, BridgeClient};
use serde_json::{json, Value};

/// Delivers extension messages through the relay's `sendToExtension`
/// command, which calls `runtime.sendMessage` from inside the extension.
pub struct RelayMessenger {
    client: Arc<BridgeClient>,
}

impl RelayMessenger {
    pub fn new(client: Arc<BridgeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtensionMessenger for RelayMessenger {
    async fn deliver(&self, target: &ExtensionId, payload: Value) -> Result<Value, BridgeError> {
        self.client
            .call(
                commands::SEND_TO_EXTENSION,
                json!({ "extensionId": target, "message": payload }),
            )
            .await
            .map_err(|err| BridgeError::Delivery(err.to_string()))
    }
}
