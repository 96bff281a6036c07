//! Shared primitives for the harness crates: identifiers, browser snapshots
//! and the tab/window lifecycle event model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Browser-assigned tab identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

/// Browser-assigned window identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

/// WebExtension identifier (`name@example.org` or a generated id).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionId(pub String);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExtensionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Which lifecycle stream an event belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Tab,
    Window,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Tab => "tab",
            EventCategory::Window => "window",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tab" | "tabs" => Ok(EventCategory::Tab),
            "window" | "windows" => Ok(EventCategory::Window),
            other => Err(format!("unknown event category '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
    Removed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Removed => "removed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" | "oncreated" => Ok(EventKind::Created),
            "updated" | "onupdated" => Ok(EventKind::Updated),
            "removed" | "onremoved" => Ok(EventKind::Removed),
            other => Err(format!("unknown event kind '{other}'")),
        }
    }
}

/// A recorded tab or window lifecycle event.
///
/// `payload` carries the subject snapshot plus whatever metadata the browser
/// attached (`changeInfo`, `removeInfo`, ...). Events are never mutated after
/// they are recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrowserEvent {
    pub category: EventCategory,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: i64,
    #[serde(default)]
    pub payload: Value,
}

impl BrowserEvent {
    pub fn new(category: EventCategory, kind: EventKind, payload: Value) -> Self {
        Self {
            category,
            kind,
            timestamp: now_ms(),
            payload,
        }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn matches(&self, category: EventCategory, kind: EventKind) -> bool {
        self.category == category && self.kind == kind
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: i64,
    #[serde(default)]
    pub window_id: i64,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// `"loading"` or `"complete"`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    /// Audio state as `tabs.Tab` reports it.
    #[serde(default)]
    pub muted_info: MutedInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutedInfo {
    #[serde(default)]
    pub muted: bool,
    /// `"user"`, `"capture"` or `"extension"` when muted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TabInfo {
    pub fn is_muted(&self) -> bool {
        self.muted_info.muted
    }

    pub fn tab_id(&self) -> TabId {
        TabId(self.id)
    }

    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }

    pub fn url_contains(&self, pattern: &str) -> bool {
        self.url
            .as_deref()
            .map(|url| url.contains(pattern))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub id: i64,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "type")]
    pub window_type: Option<String>,
    #[serde(default)]
    pub left: Option<i64>,
    #[serde(default)]
    pub top: Option<i64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<TabInfo>>,
}

impl WindowInfo {
    pub fn window_id(&self) -> WindowId {
        WindowId(self.id)
    }
}

/// One row of the browser's installed-extension UUID table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionUuid {
    pub extension_id: String,
    pub uuid: String,
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// True when `location` is an `http://` or `https://` page able to host the relay.
pub fn is_content_url(location: &str) -> bool {
    Url::parse(location)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
