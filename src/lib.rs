//! rtoken - capture a session token from an interactive browser login
//!
//! This crate launches a Chromium browser at a login page, waits for the user
//! to sign in, reads the session cookie once it appears, and appends it to a
//! deduplicated token file.

pub mod acquire;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod exit_code;
pub mod i18n;
pub mod logging;
pub mod output;
pub mod store;
pub mod token;
pub mod utils;

pub use error::{Result, RtokenError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
