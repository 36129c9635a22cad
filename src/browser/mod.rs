//! Browser automation boundary
//!
//! The capture loop only talks to a browser through [`BrowserDriver`], so the
//! polling logic runs the same against a real Chromium instance and a
//! scripted fake.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

pub mod chrome;

pub use chrome::ChromeDriver;

/// Represents a browser cookie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Capabilities the capture loop needs from a browser session.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Open a new tab at `url` and make it the active tab.
    async fn open_tab(&mut self, url: &str) -> Result<()>;

    /// URL currently shown in the active tab.
    async fn current_url(&self) -> Result<String>;

    /// All cookies visible to the active tab.
    async fn cookies(&self) -> Result<Vec<Cookie>>;

    /// Cookies of the active tab keyed by name. Later duplicates win.
    async fn cookie_map(&self) -> Result<HashMap<String, String>> {
        let cookies = self.cookies().await?;
        Ok(cookies.into_iter().map(|c| (c.name, c.value)).collect())
    }

    /// Whether the browser process is still reachable.
    async fn is_alive(&self) -> bool;

    /// Terminate the browser. Calling it on a dead browser is not an error.
    async fn quit(&mut self) -> Result<()>;
}
