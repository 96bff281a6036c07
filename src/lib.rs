//! webext-harness drives a WebExtension under test from the outside.
//!
//! A WebDriver session keeps a control tab on an ordinary web page where the
//! extension's content script runs a small relay. Commands travel as
//! `postMessage` requests to that relay and come back as
//! `{success, data, error}` responses. On top of the channel the crate offers
//! typed tab and window operations, a bounded log of lifecycle events,
//! polling waits, and messaging to other installed extensions.
//!
//! ```no_run
//! # async fn demo() -> webext_harness::HarnessResult<()> {
//! use webext_harness::{Harness, HarnessConfig};
//!
//! let harness = Harness::connect(&HarnessConfig::default()).await?;
//! let tab = harness.wait_for_tab_url("example.com", None).await?;
//! println!("{tab:?}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod feed;
pub mod harness;
pub mod messaging;
pub mod server;
pub mod wait;

pub use config::HarnessConfig;
pub use errors::{HarnessError, HarnessResult};
pub use harness::{EventTotals, Harness, HarnessStatus, UUID_TABLE_SCRIPT};
pub use messaging::RelayMessenger;
pub use server::RpcServer;
pub use wait::{wait_for, wait_for_settled_len, WaitDefaults, WaitOptions, MIN_POLL_INTERVAL_MS};

pub use extensions_bridge::{BridgeError, BridgePolicyFile, ExtensionId, ExtensionsBridge};
pub use harness_core_types::{
    BrowserEvent, EventCategory, EventKind, ExtensionUuid, MutedInfo, TabId, TabInfo, WindowId,
    WindowInfo,
};
pub use harness_event_ring::{EventLog, EventRing};
pub use harness_remote_control::{
    BridgeClient, ClientError, CommandForwarder, CreateTab, CreateWindow, Driver, Readiness,
    RemoteChannel, RemoteResponse, UpdateTab, WebDriverClient, WebDriverConfig,
};
