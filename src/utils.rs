//! Utility functions and helpers

use crate::error::{Result, RtokenError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;


/// URL validation and parsing utilities
pub struct UrlUtils;

impl UrlUtils {
    /// Validate and normalize a page URL
    pub fn validate_url(input: &str) -> Result<Url> {
        // Login flows are served over TLS, so default to https://
        let url_str = if input.contains("://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };

        let url = Url::parse(&url_str)
            .map_err(|e| RtokenError::InvalidUrl(format!("Invalid URL '{}': {}", input, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(RtokenError::InvalidUrl(format!(
                "Unsupported scheme '{}' in '{}'",
                scheme, input
            ))),
        }
    }
}

/// File system utilities
pub struct FileUtils;

impl FileUtils {
    /// Expand tilde (~) in file paths
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        let rest = match path.strip_prefix('~') {
            Some(rest) => rest,
            None => return Ok(PathBuf::from(path)),
        };
        let home_dir = dirs::home_dir()
            .ok_or_else(|| RtokenError::Config("Cannot determine home directory".to_string()))?;
        let rest = rest.trim_start_matches(['/', '\\']);
        if rest.is_empty() {
            Ok(home_dir)
        } else {
            Ok(home_dir.join(rest))
        }
    }

    /// Check if file exists and is readable
    pub fn check_file_readable(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(RtokenError::FileNotFound(format!(
                "File not found: {:?}",
                path
            )));
        }

        if !path.is_file() {
            return Err(RtokenError::Config(format!("Path is not a file: {:?}", path)));
        }

        std::fs::File::open(path).map_err(|e| {
            RtokenError::Config(format!("Cannot read file {:?}: {}", path, e))
        })?;

        Ok(())
    }
}

/// String utilities
pub struct StringUtils;

impl StringUtils {
    /// Parse durations (supports suffixes 'ms', 's', 'm', 'h'; bare numbers are seconds)
    pub fn parse_duration(input: &str) -> Result<Duration> {
        let input = input.trim();
        if let Ok(seconds) = input.parse::<u64>() {
            return Ok(Duration::from_secs(seconds));
        }

        let (number_part, unit_ms) = if let Some(stripped) = input.strip_suffix("ms") {
            (stripped, 1)
        } else if let Some(stripped) = input.strip_suffix('s') {
            (stripped, 1_000)
        } else if let Some(stripped) = input.strip_suffix('m') {
            (stripped, 60_000)
        } else if let Some(stripped) = input.strip_suffix('h') {
            (stripped, 3_600_000)
        } else {
            return Err(RtokenError::Config(format!(
                "Invalid duration format: '{}'. Use number with optional suffix (ms/s/m/h)",
                input
            )));
        };

        let number: u64 = number_part
            .parse()
            .map_err(|_| RtokenError::Config(format!("Invalid duration number: '{}'", number_part)))?;

        number
            .checked_mul(unit_ms)
            .map(Duration::from_millis)
            .ok_or_else(|| RtokenError::Config(format!("Duration too large: '{}'", input)))
    }
}
