//! Configuration management for rtoken

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, RtokenError};

pub const DEFAULT_LOGIN_URL: &str = "https://authenticator.cursor.sh";
pub const DEFAULT_HOME_URL: &str = "https://www.cursor.com/";
pub const DEFAULT_SETTINGS_URL: &str = "https://www.cursor.com/settings";
pub const DEFAULT_COOKIE_NAME: &str = "WorkosCursorSessionToken";
pub const DEFAULT_STORE_FILE: &str = "token.txt";

/// Browser launch configuration
#[derive(Debug, Clone, Default)]
pub struct BrowserLaunchConfig {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub user_data_dir: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub silent: bool,
    pub format_json: bool,
    pub reveal: bool,
}

/// Configuration for one token capture run
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub login_url: String,
    pub home_url: String,
    pub settings_url_prefix: String,
    pub cookie_name: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub grace_period: Duration,
    /// Polls between two progress notices.
    pub progress_every: u32,
    pub store_path: PathBuf,
    pub browser: BrowserLaunchConfig,
    pub output: OutputConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            home_url: DEFAULT_HOME_URL.to_string(),
            settings_url_prefix: DEFAULT_SETTINGS_URL.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(1),
            grace_period: Duration::from_secs(3),
            progress_every: 30,
            store_path: default_store_path(),
            browser: BrowserLaunchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Reject settings the polling loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(RtokenError::Config(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout < self.poll_interval {
            return Err(RtokenError::Config(format!(
                "Timeout ({:?}) is shorter than the poll interval ({:?})",
                self.timeout, self.poll_interval
            )));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(RtokenError::Config("Cookie name must not be empty".to_string()));
        }
        if self.progress_every == 0 {
            return Err(RtokenError::Config(
                "Progress interval must be at least one poll".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of polls that fit in the timeout.
    pub fn max_polls(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let polls = self.timeout.as_millis() / interval;
        u32::try_from(polls).unwrap_or(u32::MAX)
    }

    /// Whether the poll numbered `polls` (counting from one) prints a progress line.
    pub fn progress_due(&self, polls: u32) -> bool {
        self.progress_every > 0 && polls > 0 && polls % self.progress_every == 0
    }

    /// Grace period in whole seconds, rounded up so a short pause never reads as zero.
    pub fn grace_seconds(&self) -> u64 {
        let millis = self.grace_period.as_millis().div_ceil(1000);
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Whether the page has landed somewhere only a logged-in user reaches.
    pub fn is_post_login_url(&self, current_url: &str) -> bool {
        current_url == self.home_url || current_url.starts_with(&self.settings_url_prefix)
    }
}

/// `token.txt` next to the running executable, or in the working directory
/// when the executable path cannot be resolved.
pub fn default_store_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_STORE_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE))
}
