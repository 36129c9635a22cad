//! Token acquisition loop
//!
//! Opens the login page, then polls the browser once per interval until the
//! session cookie shows up, the browser goes away, or the poll budget runs
//! out. The browser is terminated on every one of those paths.

use std::sync::atomic::{AtomicU32, Ordering};

use fluent_templates::fluent_bundle::FluentValue;
use log::{debug, info, warn};

use crate::browser::{BrowserDriver, Cookie};
use crate::config::CaptureConfig;
use crate::error::{Result, RtokenError};
use crate::i18n;
use crate::output::OutputWriter;
use crate::store::{SaveOutcome, TokenStore};
use crate::token::SessionToken;

#[cfg(test)]
mod tests;

/// How a capture run ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    Acquired {
        token: SessionToken,
        polls: u32,
        saved: SaveOutcome,
    },
    TimedOut {
        polls: u32,
    },
}

/// Result of a single look at the browser.
#[derive(Debug)]
pub enum PollOutcome {
    Found(SessionToken),
    Pending,
    /// The check failed but the browser is still up; try again next poll.
    Recoverable(RtokenError),
    /// The browser is gone; polling further is pointless.
    Fatal(RtokenError),
}

/// Drives one capture run against a [`BrowserDriver`].
pub struct TokenAcquirer {
    config: CaptureConfig,
    store: TokenStore,
    output: OutputWriter,
    progress_reports: AtomicU32,
}

impl TokenAcquirer {
    pub fn new(config: CaptureConfig, output: OutputWriter) -> Self {
        let store = TokenStore::new(config.store_path.clone());
        Self {
            config,
            store,
            output,
            progress_reports: AtomicU32::new(0),
        }
    }

    /// Run the capture and terminate the browser afterwards, whatever happened.
    pub async fn acquire<D>(&self, driver: &mut D) -> Result<Acquisition>
    where
        D: BrowserDriver + ?Sized,
    {
        let result = self.run(driver).await;
        if let Err(e) = driver.quit().await {
            warn!("failed to terminate browser: {}", e);
        }
        result
    }

    async fn run<D>(&self, driver: &mut D) -> Result<Acquisition>
    where
        D: BrowserDriver + ?Sized,
    {
        driver.open_tab(&self.config.login_url).await?;
        info!("opened login page {}", self.config.login_url);
        self.output.notice(&i18n::message("login-prompt"));
        self.output.notice(&i18n::message("login-prompt-followup"));

        let max_polls = self.config.max_polls();
        let mut polls = 0;
        while polls < max_polls {
            polls += 1;
            match self.poll_once(driver).await {
                PollOutcome::Found(token) => {
                    let saved = self.persist(&token)?;
                    self.output.notice(&i18n::message_with(
                        "closing-browser",
                        &[("seconds", FluentValue::from(self.config.grace_seconds()))],
                    ));
                    tokio::time::sleep(self.config.grace_period).await;
                    return Ok(Acquisition::Acquired {
                        token,
                        polls,
                        saved,
                    });
                }
                PollOutcome::Pending => {}
                PollOutcome::Recoverable(e) => {
                    warn!("poll {} failed: {}", polls, e);
                    self.output.notice(&i18n::message_with(
                        "poll-error",
                        &[("detail", FluentValue::from(e.to_string()))],
                    ));
                }
                PollOutcome::Fatal(e) => {
                    warn!("giving up after {} polls: {}", polls, e);
                    return Err(e);
                }
            }

            if self.config.progress_due(polls) {
                self.report_progress(polls);
            }
            if polls < max_polls {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        info!("no token after {} polls", polls);
        Ok(Acquisition::TimedOut { polls })
    }

    /// Check the browser once for the session cookie.
    pub async fn poll_once<D>(&self, driver: &D) -> PollOutcome
    where
        D: BrowserDriver + ?Sized,
    {
        if !driver.is_alive().await {
            return PollOutcome::Fatal(RtokenError::BrowserClosed);
        }
        match self.check_for_token(driver).await {
            Ok(Some(token)) => PollOutcome::Found(token),
            Ok(None) => PollOutcome::Pending,
            Err(e) => {
                if driver.is_alive().await {
                    PollOutcome::Recoverable(e)
                } else {
                    debug!("poll error on a closed browser: {}", e);
                    PollOutcome::Fatal(RtokenError::BrowserClosed)
                }
            }
        }
    }

    async fn check_for_token<D>(&self, driver: &D) -> Result<Option<SessionToken>>
    where
        D: BrowserDriver + ?Sized,
    {
        let cookies = driver.cookies().await?;
        if let Some(token) = find_session_cookie(&cookies, &self.config.cookie_name) {
            debug!("session cookie found in cookie list");
            return Ok(Some(token));
        }

        let current_url = driver.current_url().await?;
        if !self.config.is_post_login_url(&current_url) {
            return Ok(None);
        }

        debug!("post-login page reached: {}", current_url);
        let cookies = driver.cookie_map().await?;
        Ok(cookies
            .get(&self.config.cookie_name)
            .filter(|value| !value.is_empty())
            .map(|value| SessionToken::new(value.clone())))
    }

    fn persist(&self, token: &SessionToken) -> Result<SaveOutcome> {
        self.output.notice(&i18n::message_with(
            "token-captured",
            &[("token", FluentValue::from(token.masked()))],
        ));
        let saved = self.store.save(token).inspect_err(|e| {
            warn!("captured token {} could not be saved: {}", token.masked(), e);
        })?;

        let path = self.store.path().display().to_string();
        let key = match saved {
            SaveOutcome::Added { .. } => "token-added",
            SaveOutcome::AlreadyPresent { .. } => "token-already-stored",
        };
        self.output.notice(&i18n::message_with(
            key,
            &[
                ("path", FluentValue::from(path)),
                ("total", FluentValue::from(saved.total())),
            ],
        ));
        Ok(saved)
    }

    /// Progress lines printed so far in this run.
    pub fn progress_reports(&self) -> u32 {
        self.progress_reports.load(Ordering::Relaxed)
    }

    fn report_progress(&self, polls: u32) {
        let elapsed = self.config.poll_interval * polls;
        let reported = self.progress_reports.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "still waiting for login after {} polls (progress notice {})",
            polls, reported
        );
        self.output.notice(&i18n::message_with(
            "waiting-for-login",
            &[
                ("elapsed", FluentValue::from(elapsed.as_secs())),
                ("total", FluentValue::from(self.config.timeout.as_secs())),
            ],
        ));
    }
}

/// First cookie named `name` with a non-empty value.
pub fn find_session_cookie(cookies: &[Cookie], name: &str) -> Option<SessionToken> {
    cookies
        .iter()
        .find(|cookie| cookie.name == name && !cookie.value.is_empty())
        .map(|cookie| SessionToken::new(cookie.value.clone()))
}
