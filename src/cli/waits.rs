use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use webext_harness::{EventCategory, EventKind, TabId, WaitOptions};

use super::browse::print_tab;
use super::context::CliContext;
use super::output::emit;

/// Timing overrides shared by the wait commands.
#[derive(Args, Clone, Debug, Default)]
pub struct WaitTiming {
    /// Give up after this many milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Poll every this many milliseconds
    #[arg(long = "interval-ms")]
    pub interval_ms: Option<u64>,
}

impl WaitTiming {
    fn resolve(&self, defaults: WaitOptions) -> Option<WaitOptions> {
        if self.timeout_ms.is_none() && self.interval_ms.is_none() {
            return None;
        }
        Some(
            WaitOptions::new(
                self.timeout_ms.unwrap_or(defaults.timeout_ms),
                self.interval_ms.unwrap_or(defaults.interval_ms),
            )
            .with_min_interval(),
        )
    }
}

#[derive(Args, Clone)]
pub struct WaitUrlArgs {
    /// Substring the tab URL must contain
    pub pattern: String,

    #[command(flatten)]
    pub timing: WaitTiming,
}

#[derive(Args, Clone)]
pub struct WaitLoadArgs {
    /// Tab id to watch
    pub tab_id: i64,

    #[command(flatten)]
    pub timing: WaitTiming,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CountTarget {
    Tabs,
    Windows,
}

#[derive(Args, Clone)]
pub struct WaitCountArgs {
    /// What to count
    #[arg(value_enum)]
    pub target: CountTarget,

    /// Expected number
    pub count: usize,

    #[command(flatten)]
    pub timing: WaitTiming,
}

#[derive(Args, Clone)]
pub struct WaitEventArgs {
    /// Event category: tab or window
    pub category: EventCategory,

    /// Event type: created, updated or removed
    pub kind: EventKind,

    #[command(flatten)]
    pub timing: WaitTiming,
}

pub async fn cmd_wait_url(args: WaitUrlArgs, ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let options = args.timing.resolve(harness.waits().tab_url);
    let Some(tab) = harness.wait_for_tab_url(&args.pattern, options).await? else {
        bail!("no tab URL contained '{}' before the timeout", args.pattern);
    };
    emit(ctx.output(), &tab, print_tab)
}

pub async fn cmd_wait_load(args: WaitLoadArgs, ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let options = args.timing.resolve(harness.waits().tab_load);
    let Some(tab) = harness.wait_for_tab_load(TabId(args.tab_id), options).await? else {
        bail!("tab {} did not finish loading before the timeout", args.tab_id);
    };
    emit(ctx.output(), &tab, print_tab)
}

pub async fn cmd_wait_count(args: WaitCountArgs, ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let options = args.timing.resolve(harness.waits().count);
    let reached = match args.target {
        CountTarget::Tabs => harness
            .wait_for_tab_count(args.count, options)
            .await?
            .map(|tabs| tabs.len()),
        CountTarget::Windows => harness
            .wait_for_window_count(args.count, options)
            .await?
            .map(|windows| windows.len()),
    };
    let Some(count) = reached else {
        bail!(
            "{:?} count did not settle at {} before the timeout",
            args.target,
            args.count
        );
    };
    emit(ctx.output(), &count, |count| println!("{count} open"))
}

pub async fn cmd_wait_event(args: WaitEventArgs, ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    harness.ensure_ready().await?;
    let options = args.timing.resolve(harness.waits().event);
    let Some(event) = harness
        .wait_for_event(args.category, args.kind, options)
        .await
    else {
        bail!(
            "no {} {} event arrived before the timeout",
            args.category,
            args.kind
        );
    };
    emit(ctx.output(), &event, |event| {
        println!(
            "{} {} at {}: {}",
            event.category, event.kind, event.timestamp, event.payload
        );
    })
}
