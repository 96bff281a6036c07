use super::browse::{cmd_open, cmd_reset, cmd_status, cmd_tabs, cmd_uuids, cmd_windows};
use super::env::CliArgs;
use super::events::cmd_events;
use super::info::cmd_info;
use super::send::cmd_send;
use super::serve::cmd_serve;
use super::waits::{cmd_wait_count, cmd_wait_event, cmd_wait_load, cmd_wait_url};
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Status => cmd_status(ctx).await,
        Commands::Tabs => cmd_tabs(ctx).await,
        Commands::Windows => cmd_windows(ctx).await,
        Commands::Open(args) => cmd_open(args, ctx).await,
        Commands::WaitUrl(args) => cmd_wait_url(args, ctx).await,
        Commands::WaitLoad(args) => cmd_wait_load(args, ctx).await,
        Commands::WaitCount(args) => cmd_wait_count(args, ctx).await,
        Commands::WaitEvent(args) => cmd_wait_event(args, ctx).await,
        Commands::Events(args) => cmd_events(args, ctx).await,
        Commands::Send(args) => cmd_send(args, ctx).await,
        Commands::Uuids => cmd_uuids(ctx).await,
        Commands::Reset => cmd_reset(ctx).await,
        Commands::Serve(args) => cmd_serve(args, ctx).await,
        Commands::Info => cmd_info(ctx),
    }
}
