#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use harness_remote_control::{RemoteChannel, RemoteResponse, TransportError};
use serde_json::{json, Value};
use webext_harness::{
    BridgeClient, BrowserEvent, Driver, EventCategory, EventKind, Harness, HarnessConfig, TabInfo,
    WindowInfo,
};

pub const CONTENT_URL: &str = "http://localhost:8000/harness.html";
pub const HELPER_EXTENSION: &str = "helper@example.org";

/// In-memory browser plus relay. Tabs, windows and the extension's event
/// queue live here; the relay commands mutate them like the real extension
/// would.
pub struct FakeBrowser {
    url: Mutex<String>,
    tabs: Mutex<Vec<TabInfo>>,
    windows: Mutex<Vec<WindowInfo>>,
    remote_events: Mutex<Vec<BrowserEvent>>,
    tab_counts: Mutex<VecDeque<usize>>,
    failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicI64,
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            url: Mutex::new("about:blank".into()),
            tabs: Mutex::new(vec![TabInfo {
                id: 1,
                window_id: 1,
                url: Some(CONTENT_URL.into()),
                status: Some("complete".into()),
                active: true,
                ..TabInfo::default()
            }]),
            windows: Mutex::new(vec![WindowInfo {
                id: 1,
                focused: true,
                width: Some(1280),
                height: Some(800),
                ..WindowInfo::default()
            }]),
            remote_events: Mutex::new(Vec::new()),
            tab_counts: Mutex::new(VecDeque::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
        })
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_string();
    }

    /// The next `times` calls of `command` answer `success: false`.
    pub fn fail_next(&self, command: &str, times: usize) {
        self.failures
            .lock()
            .unwrap()
            .insert(command.to_string(), times);
    }

    /// Upcoming `getTabs` answers report these many tabs, one per call.
    pub fn script_tab_counts(&self, counts: &[usize]) {
        self.tab_counts.lock().unwrap().extend(counts.iter().copied());
    }

    pub fn calls(&self, command: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == command)
            .count()
    }

    pub fn complete_tab(&self, id: i64) {
        if let Some(tab) = self.tabs.lock().unwrap().iter_mut().find(|tab| tab.id == id) {
            tab.status = Some("complete".into());
        }
    }

    pub fn open_tab(&self, url: &str) -> TabInfo {
        let tab = TabInfo {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            window_id: 1,
            url: Some(url.to_string()),
            status: Some("loading".into()),
            ..TabInfo::default()
        };
        self.tabs.lock().unwrap().push(tab.clone());
        self.remote_events.lock().unwrap().push(BrowserEvent::new(
            EventCategory::Tab,
            EventKind::Created,
            json!({ "tab": tab }),
        ));
        tab
    }

    fn take_failure(&self, command: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(command) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }

    fn respond(&self, command: &str, args: &Value) -> RemoteResponse {
        match command {
            "ping" => RemoteResponse::ok(json!("pong")),
            "getTabs" => {
                if let Some(count) = self.tab_counts.lock().unwrap().pop_front() {
                    let tabs: Vec<TabInfo> = (0..count)
                        .map(|i| TabInfo {
                            id: i as i64 + 1,
                            ..TabInfo::default()
                        })
                        .collect();
                    return RemoteResponse::ok(json!(tabs));
                }
                RemoteResponse::ok(json!(*self.tabs.lock().unwrap()))
            }
            "getTab" => {
                let id = args["tabId"].as_i64().unwrap_or_default();
                let tabs = self.tabs.lock().unwrap();
                RemoteResponse::ok(json!(tabs.iter().find(|tab| tab.id == id)))
            }
            "createTab" => {
                let url = args["url"].as_str().unwrap_or("about:newtab");
                RemoteResponse::ok(json!(self.open_tab(url)))
            }
            "closeTab" => {
                let id = args["tabId"].as_i64().unwrap_or_default();
                let mut tabs = self.tabs.lock().unwrap();
                match tabs.iter().position(|tab| tab.id == id) {
                    Some(index) => {
                        tabs.remove(index);
                        RemoteResponse::ok(Value::Null)
                    }
                    None => RemoteResponse::failed(format!("Invalid tab ID: {id}")),
                }
            }
            "updateTab" => {
                let id = args["tabId"].as_i64().unwrap_or_default();
                let mut tabs = self.tabs.lock().unwrap();
                let Some(tab) = tabs.iter_mut().find(|tab| tab.id == id) else {
                    return RemoteResponse::failed(format!("Invalid tab ID: {id}"));
                };
                let props = &args["props"];
                if let Some(pinned) = props["pinned"].as_bool() {
                    tab.pinned = pinned;
                }
                if let Some(muted) = props["muted"].as_bool() {
                    tab.muted_info.muted = muted;
                }
                if let Some(url) = props["url"].as_str() {
                    tab.url = Some(url.to_string());
                }
                RemoteResponse::ok(json!(tab))
            }
            "getWindows" => RemoteResponse::ok(json!(*self.windows.lock().unwrap())),
            "updateWindow" => {
                let id = args["windowId"].as_i64().unwrap_or_default();
                let mut windows = self.windows.lock().unwrap();
                let Some(window) = windows.iter_mut().find(|window| window.id == id) else {
                    return RemoteResponse::failed(format!("Invalid window ID: {id}"));
                };
                window.width = args["props"]["width"].as_u64().map(|w| w as u32);
                window.height = args["props"]["height"].as_u64().map(|h| h as u32);
                RemoteResponse::ok(json!(window))
            }
            "captureVisibleTab" => RemoteResponse::ok(json!("data:image/png;base64,iVBORw0KGgo=")),
            "getEvents" => {
                let category: EventCategory =
                    serde_json::from_value(args["category"].clone()).unwrap_or(EventCategory::Tab);
                let clear = args["clear"].as_bool().unwrap_or(false);
                let mut queue = self.remote_events.lock().unwrap();
                let (matching, rest): (Vec<_>, Vec<_>) = queue
                    .drain(..)
                    .partition(|event| event.category == category);
                *queue = rest;
                if !clear {
                    queue.extend(matching.iter().cloned());
                }
                RemoteResponse::ok(json!(matching))
            }
            "sendToExtension" => {
                if args["extensionId"] == HELPER_EXTENSION {
                    RemoteResponse::ok(json!({ "echo": args["message"] }))
                } else {
                    RemoteResponse::failed(
                        "Could not establish connection. Receiving end does not exist.",
                    )
                }
            }
            other => RemoteResponse::failed(format!("unknown command {other}")),
        }
    }
}

#[async_trait]
impl Driver for FakeBrowser {
    async fn current_url(&self) -> Result<String, TransportError> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn navigate(&self, url: &str) -> Result<(), TransportError> {
        self.set_url(url);
        Ok(())
    }

    async fn execute(&self, _script: &str, _args: Vec<Value>) -> Result<Value, TransportError> {
        Ok(json!([
            { "extensionId": "tester@example.org", "uuid": "0b4f5d0e-8c1f-4b4e-9f3a-1d2c3b4a5f6e" },
            { "extensionId": HELPER_EXTENSION, "uuid": "7e9d2c1b-3a4f-4e5d-8c7b-6a5f4e3d2c1b" }
        ]))
    }

    async fn execute_async(
        &self,
        _script: &str,
        _args: Vec<Value>,
    ) -> Result<Value, TransportError> {
        Ok(Value::Null)
    }
}

#[async_trait]
impl RemoteChannel for FakeBrowser {
    async fn invoke(&self, command: &str, args: Value) -> Result<RemoteResponse, TransportError> {
        self.calls.lock().unwrap().push(command.to_string());
        if self.take_failure(command) {
            return Ok(RemoteResponse::failed(format!("{command} temporarily unavailable")));
        }
        Ok(self.respond(command, &args))
    }
}

/// Fast timings so timeouts in tests stay short.
pub fn test_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.content_url = CONTENT_URL.into();
    config.waits.count_settle_ms = 20;
    config
}

pub fn harness_with(browser: &Arc<FakeBrowser>, config: &HarnessConfig) -> Harness {
    let driver: Arc<dyn Driver> = browser.clone();
    let channel: Arc<dyn RemoteChannel> = browser.clone();
    let client = Arc::new(BridgeClient::new(driver, channel, config.content_url.clone()));
    Harness::from_client(client, config).expect("harness")
}

pub fn harness(browser: &Arc<FakeBrowser>) -> Harness {
    harness_with(browser, &test_config())
}
