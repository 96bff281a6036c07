use anyhow::Result;
use clap::Args;
use webext_harness::{BrowserEvent, EventCategory};

use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone)]
pub struct EventsArgs {
    /// Event category: tab or window
    pub category: EventCategory,

    /// Empty the buffer after reading it
    #[arg(long)]
    pub clear: bool,
}

pub async fn cmd_events(args: EventsArgs, ctx: &CliContext) -> Result<()> {
    let harness = ctx.harness().await?;
    let events = harness.fetch_events(args.category, args.clear).await;
    emit(ctx.output(), &events, |events: &Vec<BrowserEvent>| {
        if events.is_empty() {
            println!("No {} events recorded", args.category);
        }
        for event in events {
            println!(
                "{:>14}  {:<8} {}",
                event.timestamp, event.kind, event.payload
            );
        }
    })
}
