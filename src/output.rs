//! Output formatting and display utilities

use crate::config::OutputConfig;
use crate::error::Result;
use crate::token::mask;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;


const RULE_WIDTH: usize = 50;

/// Console writer for progress lines and command output
#[derive(Debug, Clone, Default)]
pub struct OutputWriter {
    config: OutputConfig,
}

impl OutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Write command output to stdout. Not affected by silent mode.
    pub fn write(&self, content: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    /// Write a human-readable progress line (unless silent)
    pub fn notice(&self, message: &str) {
        if !self.config.silent {
            println!("{}", message);
        }
    }

    /// Write a separator line (unless silent)
    pub fn rule(&self) {
        self.notice(&"=".repeat(RULE_WIDTH));
    }

    /// Write error message
    pub fn write_error(&self, message: &str) {
        if !self.config.silent {
            eprintln!("rtoken: error: {}", message);
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenListing<'a> {
    path: String,
    count: usize,
    tokens: Vec<&'a str>,
}

/// One token per line, masked unless `reveal` is set.
pub fn format_token_list(tokens: &[String], reveal: bool) -> String {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| format!("{:>3}  {}\n", index + 1, display_token(token, reveal)))
        .collect()
}

/// JSON document describing the store contents.
pub fn format_token_list_json(path: &Path, tokens: &[String], reveal: bool) -> Result<String> {
    let masked: Vec<String>;
    let listed: Vec<&str> = if reveal {
        tokens.iter().map(String::as_str).collect()
    } else {
        masked = tokens.iter().map(|t| mask(t)).collect();
        masked.iter().map(String::as_str).collect()
    };
    let listing = TokenListing {
        path: path.display().to_string(),
        count: tokens.len(),
        tokens: listed,
    };
    let mut json = serde_json::to_string_pretty(&listing)?;
    json.push('\n');
    Ok(json)
}

fn display_token(token: &str, reveal: bool) -> String {
    if reveal {
        token.to_string()
    } else {
        mask(token)
    }
}
