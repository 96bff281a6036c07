use harness_core_types::{EventCategory, EventKind, TabId, WindowId};
use harness_remote_control::UpdateTab;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wait::WaitOptions;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub success: bool,
    pub data: Value,
}

impl RpcResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Optional timing overrides accepted by every wait method.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitParams {
    pub timeout_ms: Option<i64>,
    pub interval_ms: Option<i64>,
}

impl WaitParams {
    /// `None` when the caller gave no override, so the waiter's default applies.
    pub fn resolve(&self, defaults: WaitOptions) -> Option<WaitOptions> {
        if self.timeout_ms.is_none() && self.interval_ms.is_none() {
            return None;
        }
        Some(
            WaitOptions::clamped(
                self.timeout_ms.unwrap_or(defaults.timeout_ms as i64),
                self.interval_ms.unwrap_or(defaults.interval_ms as i64),
            )
            .with_min_interval(),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabParams {
    pub tab_id: TabId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTabParams {
    pub tab_id: TabId,
    #[serde(default)]
    pub props: UpdateTab,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTabParams {
    pub tab_id: TabId,
    pub index: i64,
    #[serde(default)]
    pub window_id: Option<WindowId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinTabParams {
    pub tab_id: TabId,
    #[serde(default = "default_true")]
    pub pinned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteTabParams {
    pub tab_id: TabId,
    #[serde(default = "default_true")]
    pub muted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowParams {
    pub window_id: WindowId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeWindowParams {
    pub window_id: WindowId,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotParams {
    #[serde(default)]
    pub window_id: Option<WindowId>,
}

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    pub category: EventCategory,
    #[serde(default)]
    pub clear: bool,
}

#[derive(Debug, Deserialize)]
pub struct WaitUrlParams {
    pub pattern: String,
    #[serde(flatten)]
    pub wait: WaitParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitLoadParams {
    pub tab_id: TabId,
    #[serde(flatten)]
    pub wait: WaitParams,
}

#[derive(Debug, Deserialize)]
pub struct WaitEventParams {
    pub category: EventCategory,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(flatten)]
    pub wait: WaitParams,
}

#[derive(Debug, Deserialize)]
pub struct WaitCountParams {
    pub count: usize,
    #[serde(flatten)]
    pub wait: WaitParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    pub extension_id: String,
    #[serde(default)]
    pub message: Value,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wait_params_fall_back_per_field() {
        let defaults = WaitOptions::new(10_000, 500);
        assert_eq!(WaitParams::default().resolve(defaults), None);

        let params: WaitUrlParams =
            serde_json::from_value(json!({ "pattern": "example", "timeoutMs": -1 })).unwrap();
        assert_eq!(params.wait.resolve(defaults), Some(WaitOptions::new(0, 500)));
    }

    #[test]
    fn zero_interval_is_raised_to_the_floor() {
        let defaults = WaitOptions::new(10_000, 500);
        let params: WaitCountParams =
            serde_json::from_value(json!({ "count": 2, "intervalMs": 0 })).unwrap();
        assert_eq!(params.wait.resolve(defaults), Some(WaitOptions::new(10_000, 10)));

        let params: WaitCountParams =
            serde_json::from_value(json!({ "count": 2, "intervalMs": -5 })).unwrap();
        assert_eq!(params.wait.resolve(defaults).unwrap().interval_ms, 10);
    }

    #[test]
    fn event_params_read_kind_from_type_key() {
        let params: WaitEventParams =
            serde_json::from_value(json!({ "category": "tab", "type": "removed" })).unwrap();
        assert_eq!(params.kind, EventKind::Removed);
        assert!(params.wait.timeout_ms.is_none());
    }
}
