use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use webext_harness::ExtensionId;

use super::context::CliContext;
use super::output::emit;

#[derive(Args, Clone)]
pub struct SendArgs {
    /// Target extension id, e.g. helper@example.org
    pub extension_id: String,

    /// Message body as JSON
    #[arg(default_value = "{}")]
    pub message: String,
}

pub async fn cmd_send(args: SendArgs, ctx: &CliContext) -> Result<()> {
    let message: Value =
        serde_json::from_str(&args.message).context("message must be valid JSON")?;
    let harness = ctx.harness().await?;
    let reply = harness
        .send_to_extension(&ExtensionId(args.extension_id), message)
        .await?;
    emit(ctx.output(), &reply, |reply| println!("{reply}"))
}
