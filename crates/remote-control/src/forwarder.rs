//! Typed wrappers over the relay's tab and window commands.

use std::sync::Arc;

use harness_core_types::{BrowserEvent, EventCategory, TabId, TabInfo, WindowId, WindowInfo};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::BridgeClient;
use crate::error::ClientError;

pub mod commands {
    pub const GET_TABS: &str = "getTabs";
    pub const GET_TAB: &str = "getTab";
    pub const CREATE_TAB: &str = "createTab";
    pub const CLOSE_TAB: &str = "closeTab";
    pub const UPDATE_TAB: &str = "updateTab";
    pub const MOVE_TAB: &str = "moveTab";
    pub const GET_WINDOWS: &str = "getWindows";
    pub const CREATE_WINDOW: &str = "createWindow";
    pub const CLOSE_WINDOW: &str = "closeWindow";
    pub const UPDATE_WINDOW: &str = "updateWindow";
    pub const CAPTURE_VISIBLE_TAB: &str = "captureVisibleTab";
    pub const GET_EVENTS: &str = "getEvents";
    pub const SEND_TO_EXTENSION: &str = "sendToExtension";
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,
}

#[derive(Clone)]
pub struct CommandForwarder {
    client: Arc<BridgeClient>,
}

impl CommandForwarder {
    pub fn new(client: Arc<BridgeClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<BridgeClient> {
        &self.client
    }

    async fn request<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Value,
    ) -> Result<T, ClientError> {
        let data = self.client.call(command, args).await?;
        decode(command, data)
    }

    pub async fn tabs(&self) -> Result<Vec<TabInfo>, ClientError> {
        self.request(commands::GET_TABS, json!({})).await
    }

    /// `None` when the relay reports no such tab.
    pub async fn tab(&self, id: TabId) -> Result<Option<TabInfo>, ClientError> {
        self.request(commands::GET_TAB, json!({ "tabId": id })).await
    }

    pub async fn create_tab(&self, options: CreateTab) -> Result<TabInfo, ClientError> {
        self.request(commands::CREATE_TAB, to_args(commands::CREATE_TAB, &options)?)
            .await
    }

    pub async fn close_tab(&self, id: TabId) -> Result<(), ClientError> {
        self.client
            .call(commands::CLOSE_TAB, json!({ "tabId": id }))
            .await
            .map(|_| ())
    }

    pub async fn update_tab(&self, id: TabId, props: UpdateTab) -> Result<TabInfo, ClientError> {
        let props = to_args(commands::UPDATE_TAB, &props)?;
        self.request(commands::UPDATE_TAB, json!({ "tabId": id, "props": props }))
            .await
    }

    pub async fn move_tab(
        &self,
        id: TabId,
        index: i64,
        window: Option<WindowId>,
    ) -> Result<TabInfo, ClientError> {
        let mut args = json!({ "tabId": id, "index": index });
        if let Some(window) = window {
            args["windowId"] = json!(window);
        }
        self.request(commands::MOVE_TAB, args).await
    }

    pub async fn pin_tab(&self, id: TabId, pinned: bool) -> Result<TabInfo, ClientError> {
        self.update_tab(
            id,
            UpdateTab {
                pinned: Some(pinned),
                ..UpdateTab::default()
            },
        )
        .await
    }

    pub async fn mute_tab(&self, id: TabId, muted: bool) -> Result<TabInfo, ClientError> {
        self.update_tab(
            id,
            UpdateTab {
                muted: Some(muted),
                ..UpdateTab::default()
            },
        )
        .await
    }

    pub async fn windows(&self) -> Result<Vec<WindowInfo>, ClientError> {
        self.request(commands::GET_WINDOWS, json!({ "populate": false }))
            .await
    }

    pub async fn create_window(&self, options: CreateWindow) -> Result<WindowInfo, ClientError> {
        self.request(
            commands::CREATE_WINDOW,
            to_args(commands::CREATE_WINDOW, &options)?,
        )
        .await
    }

    pub async fn close_window(&self, id: WindowId) -> Result<(), ClientError> {
        self.client
            .call(commands::CLOSE_WINDOW, json!({ "windowId": id }))
            .await
            .map(|_| ())
    }

    pub async fn resize_window(
        &self,
        id: WindowId,
        width: u32,
        height: u32,
    ) -> Result<WindowInfo, ClientError> {
        self.request(
            commands::UPDATE_WINDOW,
            json!({ "windowId": id, "props": { "width": width, "height": height } }),
        )
        .await
    }

    /// PNG data URL of the visible tab in `window` (the current window when `None`).
    pub async fn capture_screenshot(&self, window: Option<WindowId>) -> Result<String, ClientError> {
        let args = match window {
            Some(window) => json!({ "windowId": window }),
            None => json!({}),
        };
        self.request(commands::CAPTURE_VISIBLE_TAB, args).await
    }

    /// Events buffered by the extension itself, optionally clearing its queue.
    pub async fn remote_events(
        &self,
        category: EventCategory,
        clear: bool,
    ) -> Result<Vec<BrowserEvent>, ClientError> {
        self.request(
            commands::GET_EVENTS,
            json!({ "category": category, "clear": clear }),
        )
        .await
    }
}

fn decode<T: DeserializeOwned>(command: &str, data: Value) -> Result<T, ClientError> {
    serde_json::from_value(data).map_err(|err| ClientError::Decode {
        command: command.to_string(),
        reason: err.to_string(),
    })
}

fn to_args<T: Serialize>(command: &str, value: &T) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|err| ClientError::Decode {
        command: command.to_string(),
        reason: err.to_string(),
    })
}
