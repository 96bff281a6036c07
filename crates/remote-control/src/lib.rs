//! Remote control plumbing for the harness.
//!
//! A [`Driver`] (normally [`WebDriverClient`]) reaches the browser, a
//! [`RemoteChannel`] (normally [`RelayChannel`]) reaches the extension's
//! in-page relay, and [`BridgeClient`] tracks whether that relay is currently
//! reachable. [`CommandForwarder`] turns typed calls into relay commands.

pub mod channel;
pub mod client;
pub mod driver;
pub mod error;
pub mod forwarder;
pub mod readiness;
pub mod webdriver;

pub use channel::{NoopChannel, RelayChannel, RemoteChannel, RemoteResponse, RELAY_SCRIPT};
pub use client::{BridgeClient, PING_COMMAND};
pub use driver::{Driver, NoopDriver};
pub use error::{ClientError, TransportError, TransportErrorKind};
pub use forwarder::{commands, CommandForwarder, CreateTab, CreateWindow, UpdateTab};
pub use readiness::{Readiness, ReadinessSignal};
pub use webdriver::{WebDriverClient, WebDriverConfig};
