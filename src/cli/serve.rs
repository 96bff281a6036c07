use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use webext_harness::RpcServer;

use super::context::CliContext;

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Address to listen on (defaults to the configured `listen`)
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Pull the extension's event buffer at this period in milliseconds
    #[arg(long = "feed-ms")]
    pub feed_ms: Option<u64>,

    /// Allow cross-origin requests
    #[arg(long)]
    pub cors: bool,
}

pub async fn cmd_serve(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let addr = match args.listen {
        Some(addr) => addr,
        None => ctx
            .config()
            .listen
            .parse()
            .with_context(|| format!("invalid listen address {}", ctx.config().listen))?,
    };

    let harness = ctx.harness().await?;
    if let Err(err) = harness.init().await {
        warn!(error = %err, "relay not ready yet; calls will retry initialization");
    }

    let shutdown = CancellationToken::new();
    let feed = args
        .feed_ms
        .or(ctx.config().remote_feed_ms)
        .map(|ms| harness.spawn_remote_feed(Duration::from_millis(ms), shutdown.clone()));

    let router = RpcServer::new(harness)
        .with_permissive_cors(args.cors)
        .build();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind RPC server on {}", addr))?;
    info!("RPC endpoint available at http://{}/rpc", addr);

    let signal = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
            signal.cancel();
        })
        .await
        .context("RPC server exited unexpectedly")?;

    shutdown.cancel();
    if let Some(feed) = feed {
        let _ = feed.await;
    }
    Ok(())
}
