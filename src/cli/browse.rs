use anyhow::{bail, Result};
use clap::Args;
use serde_json::json;
use tracing::warn;
use webext_harness::{CreateTab, ExtensionUuid, TabInfo, WindowInfo};

use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone)]
pub struct OpenArgs {
    /// URL to open
    pub url: String,

    /// Wait until the new tab reports status "complete"
    #[arg(long)]
    pub wait: bool,

    /// Open without focusing the tab
    #[arg(long)]
    pub background: bool,
}

pub async fn cmd_status(ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    if let Err(err) = harness.ensure_ready().await {
        warn!(error = %err, "relay not ready");
    }
    let status = harness.status();
    emit(ctx.output(), &status, |status| {
        println!("Readiness:     {}", status.readiness.name());
        if let Some(location) = status.readiness.location() {
            println!("Location:      {}", location);
        }
        println!("Content page:  {}", status.content_url);
        println!(
            "Events:        {} tab / {} window",
            status.events.tabs, status.events.windows
        );
        println!(
            "Bridge:        {} ({} in flight)",
            if status.bridge_enabled {
                "enabled"
            } else {
                "disabled"
            },
            status.inflight_messages
        );
    })
}

pub async fn cmd_tabs(ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let tabs = harness.forwarder().tabs().await?;
    emit(ctx.output(), &tabs, |tabs| {
        if tabs.is_empty() {
            println!("No tabs");
        }
        for tab in tabs {
            print_tab(tab);
        }
    })
}

pub async fn cmd_windows(ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let windows = harness.forwarder().windows().await?;
    emit(ctx.output(), &windows, |windows| {
        for window in windows {
            print_window(window);
        }
    })
}

pub async fn cmd_open(args: OpenArgs, ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let tab = harness
        .forwarder()
        .create_tab(CreateTab {
            url: Some(args.url.clone()),
            active: Some(!args.background),
            ..CreateTab::default()
        })
        .await?;

    let tab = if args.wait {
        match harness.wait_for_tab_load(tab.tab_id(), None).await? {
            Some(loaded) => loaded,
            None => bail!("tab {} did not finish loading {}", tab.id, args.url),
        }
    } else {
        tab
    };

    emit(ctx.output(), &tab, print_tab)
}

pub async fn cmd_uuids(ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let table = harness.extension_uuids().await?;
    emit(ctx.output(), &table, |table: &Vec<ExtensionUuid>| {
        if table.is_empty() {
            println!("No temporary extensions listed");
        }
        for row in table {
            println!("{:<48} {}", row.extension_id, row.uuid);
        }
    })
}

pub async fn cmd_reset(ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    harness.reset().await?;
    let state = harness.client().state();
    emit(ctx.output(), &json!({ "readiness": state }), |_| {
        println!("Relay ready at {}", harness.client().content_url());
    })
}

pub(crate) fn print_tab(tab: &TabInfo) {
    let mut flags = Vec::new();
    if tab.active {
        flags.push("active");
    }
    if tab.pinned {
        flags.push("pinned");
    }
    if tab.is_muted() {
        flags.push("muted");
    }
    println!(
        "#{:<5} win {:<4} [{}] {}{}",
        tab.id,
        tab.window_id,
        tab.status.as_deref().unwrap_or("?"),
        tab.url.as_deref().unwrap_or(""),
        if flags.is_empty() {
            String::new()
        } else {
            format!("  ({})", flags.join(", "))
        }
    );
}

fn print_window(window: &WindowInfo) {
    println!(
        "#{:<5} {:<8} {}x{}{}",
        window.id,
        window.state.as_deref().unwrap_or("normal"),
        window.width.unwrap_or_default(),
        window.height.unwrap_or_default(),
        if window.focused { "  (focused)" } else { "" }
    );
}
