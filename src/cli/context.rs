use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use webext_harness::{Harness, HarnessConfig, WebDriverClient};

use super::output::OutputFormat;

struct Session {
    driver: Arc<WebDriverClient>,
    harness: Arc<Harness>,
}

pub struct CliContext {
    config: Arc<HarnessConfig>,
    config_path: PathBuf,
    output: OutputFormat,
    session: OnceCell<Session>,
}

impl CliContext {
    pub fn new(config: HarnessConfig, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
            session: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Connects to WebDriver on first use.
    pub async fn harness(&self) -> Result<Arc<Harness>> {
        self.session
            .get_or_try_init(|| async {
                let driver = Arc::new(
                    WebDriverClient::connect(&self.config.webdriver)
                        .await
                        .with_context(|| {
                            format!(
                                "failed to reach WebDriver at {}",
                                self.config.webdriver.base_url
                            )
                        })?,
                );
                let harness = Harness::from_driver(driver.clone(), &self.config)?;
                Ok::<_, anyhow::Error>(Session {
                    driver,
                    harness: Arc::new(harness),
                })
            })
            .await
            .map(|session| Arc::clone(&session.harness))
    }

    /// Ends the WebDriver session if this process created it. Sessions named
    /// in the configuration belong to someone else and stay open.
    pub async fn shutdown(&self) {
        let Some(session) = self.session.get() else {
            return;
        };
        if self.config.webdriver.session_id.is_some() {
            debug!("leaving attached WebDriver session open");
            return;
        }
        if let Err(err) = session.driver.close().await {
            warn!(error = %err, "failed to close WebDriver session");
        }
    }
}
