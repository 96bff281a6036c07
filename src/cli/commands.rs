use clap::Subcommand;

use super::browse::OpenArgs;
use super::events::EventsArgs;
use super::send::SendArgs;
use super::serve::ServeArgs;
use super::waits::{WaitCountArgs, WaitEventArgs, WaitLoadArgs, WaitUrlArgs};

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Check the relay and show readiness and buffered event counts
    Status,

    /// List open tabs
    Tabs,

    /// List browser windows
    Windows,

    /// Open a URL in a new tab
    Open(OpenArgs),

    /// Wait until some tab's URL contains a pattern
    WaitUrl(WaitUrlArgs),

    /// Wait until a tab finishes loading
    WaitLoad(WaitLoadArgs),

    /// Wait until exactly N tabs or windows are open
    WaitCount(WaitCountArgs),

    /// Wait for a tab or window lifecycle event
    WaitEvent(WaitEventArgs),

    /// Show recorded tab or window lifecycle events
    Events(EventsArgs),

    /// Send a JSON message to another extension
    Send(SendArgs),

    /// List installed extensions with their internal UUIDs
    Uuids,

    /// Return the control tab to the content page and re-initialize the relay
    Reset,

    /// Serve the harness over HTTP
    Serve(ServeArgs),

    /// Show build and configuration information
    Info,
}
