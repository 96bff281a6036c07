use anyhow::Result;
use serde_json::json;

use super::context::CliContext;
use super::output::emit;

pub fn cmd_info(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let info = json!({
        "version": env!("CARGO_PKG_VERSION"),
        "buildDate": env!("BUILD_DATE"),
        "gitHash": env!("GIT_HASH"),
        "gitBranch": env!("GIT_BRANCH"),
        "configPath": ctx.config_path().display().to_string(),
        "webdriverUrl": config.webdriver.base_url,
        "browser": config.webdriver.browser_name,
        "contentUrl": config.content_url,
        "listen": config.listen,
        "eventCapacity": config.event_capacity,
        "remoteFeedMs": config.remote_feed_ms,
        "bridgePolicy": config.bridge_policy.as_ref().map(|path| path.display().to_string()),
    });

    emit(ctx.output(), &info, |_| {
        println!("webext-harness System Information");
        println!("=================================");
        println!(
            "Version:        {} ({} on {}, built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_HASH"),
            env!("GIT_BRANCH"),
            env!("BUILD_DATE")
        );
        println!("Config file:    {}", ctx.config_path().display());
        println!(
            "WebDriver:      {} ({})",
            config.webdriver.base_url, config.webdriver.browser_name
        );
        if let Some(session) = &config.webdriver.session_id {
            println!("Session:        {} (attached)", session);
        }
        println!("Content page:   {}", config.content_url);
        println!("RPC listen:     {}", config.listen);
        println!("Event capacity: {} per category", config.event_capacity);
        match config.remote_feed_ms {
            Some(ms) => println!("Remote feed:    every {} ms", ms),
            None => println!("Remote feed:    off (events pulled on demand)"),
        }
        match &config.bridge_policy {
            Some(path) => println!("Bridge policy:  {}", path.display()),
            None => println!("Bridge policy:  none (all extensions allowed)"),
        }
    })
}
