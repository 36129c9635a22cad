//! Chromium driver over the DevTools protocol

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Handler, Page};
use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use super::{BrowserDriver, Cookie};
use crate::config::BrowserLaunchConfig;
use crate::error::{Result, RtokenError};

const EXIT_WAIT: Duration = Duration::from_secs(5);

/// A launched Chromium process with one working tab.
pub struct ChromeDriver {
    browser: Browser,
    page: Option<Page>,
    handler_task: JoinHandle<()>,
    closed: Arc<AtomicBool>,
    quit: bool,
}

impl ChromeDriver {
    /// Launch a browser process according to `config`.
    pub async fn launch(config: &BrowserLaunchConfig) -> Result<Self> {
        let browser_config = build_browser_config(config)?;
        let (browser, handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RtokenError::Browser(format!("Failed to launch browser: {}", e)))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));
        info!("browser launched (headless: {})", config.headless);

        Ok(Self {
            browser,
            page: None,
            handler_task,
            closed,
            quit: false,
        })
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| RtokenError::Browser("No tab has been opened".to_string()))
    }

    async fn terminate(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            if let Err(e) = self.browser.close().await {
                warn!("graceful browser close failed: {}", e);
            }
        }

        match tokio::time::timeout(EXIT_WAIT, self.browser.wait()).await {
            Ok(Ok(status)) => debug!("browser exited with {:?}", status),
            Ok(Err(e)) => warn!("failed to wait for browser exit: {}", e),
            Err(_) => {
                warn!("browser did not exit within {:?}, killing it", EXIT_WAIT);
                if let Some(Err(e)) = self.browser.kill().await {
                    warn!("failed to kill browser: {}", e);
                }
            }
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn open_tab(&mut self, url: &str) -> Result<()> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| RtokenError::Browser(format!("Failed to open {}: {}", url, e)))?;
        self.page = Some(page);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page()?
            .url()
            .await
            .map_err(|e| RtokenError::Browser(format!("Failed to read page URL: {}", e)))?;
        Ok(url.unwrap_or_default())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let cookies = self
            .page()?
            .get_cookies()
            .await
            .map_err(|e| RtokenError::Browser(format!("Failed to read cookies: {}", e)))?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
            })
            .collect())
    }

    async fn is_alive(&self) -> bool {
        !self.quit && !self.closed.load(Ordering::SeqCst)
    }

    async fn quit(&mut self) -> Result<()> {
        if self.quit {
            return Ok(());
        }
        self.quit = true;
        self.page = None;
        self.terminate().await;
        self.handler_task.abort();
        info!("browser terminated");
        Ok(())
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

fn build_browser_config(config: &BrowserLaunchConfig) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder().arg("--start-maximized");
    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(executable) = &config.executable {
        builder = builder.chrome_executable(executable);
    }
    if let Some(dir) = &config.user_data_dir {
        builder = builder.user_data_dir(dir);
    }
    if let Some(user_agent) = &config.user_agent {
        builder = builder.arg(format!("--user-agent={}", user_agent));
    }
    builder
        .build()
        .map_err(|e| RtokenError::Browser(format!("Invalid browser configuration: {}", e)))
}

/// Drive the DevTools connection until it ends, then mark the browser closed.
fn spawn_handler_task(mut handler: Handler, closed: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("browser handler event error: {}", e);
            }
        }
        closed.store(true, Ordering::SeqCst);
        debug!("browser connection closed");
    })
}
