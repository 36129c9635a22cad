//! Flat-file token store
//!
//! The store is a single UTF-8 line of comma-separated tokens. Entries are
//! unique and kept in insertion order; nothing is ever removed.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use tempfile::NamedTempFile;

use crate::error::{Result, RtokenError};
use crate::token::SessionToken;

const DELIMITER: char = ',';

/// Result of saving a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Added { total: usize },
    AlreadyPresent { total: usize },
}

impl SaveOutcome {
    pub fn total(&self) -> usize {
        match self {
            SaveOutcome::Added { total } | SaveOutcome::AlreadyPresent { total } => *total,
        }
    }
}

/// Token list persisted at a fixed path
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all stored tokens. A missing file is an empty store.
    pub fn load(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_tokens(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(RtokenError::Store(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Append `token` unless it is already stored, then rewrite the file.
    pub fn save(&self, token: &SessionToken) -> Result<SaveOutcome> {
        let mut tokens = self.load()?;
        if tokens.iter().any(|existing| existing == token.as_str()) {
            info!(
                "token {} already stored in {} ({} total)",
                token.masked(),
                self.path.display(),
                tokens.len()
            );
            return Ok(SaveOutcome::AlreadyPresent {
                total: tokens.len(),
            });
        }

        tokens.push(token.as_str().to_string());
        self.write_all(&tokens)?;
        info!(
            "token {} saved to {} ({} total)",
            token.masked(),
            self.path.display(),
            tokens.len()
        );
        Ok(SaveOutcome::Added {
            total: tokens.len(),
        })
    }

    /// Pick one stored token uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SessionToken> {
        let tokens = self.load()?;
        tokens
            .choose(rng)
            .map(|value| SessionToken::new(value.clone()))
            .ok_or_else(|| RtokenError::EmptyStore(self.path.display().to_string()))
    }

    fn write_all(&self, tokens: &[String]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.write_error(e))?;

        // Write beside the target and rename over it so readers never see a
        // half-written line.
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| self.write_error(e))?;
        temp.write_all(serialize_tokens(tokens).as_bytes())
            .map_err(|e| self.write_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        debug!("rewrote {} with {} tokens", self.path.display(), tokens.len());
        Ok(())
    }

    fn write_error(&self, err: std::io::Error) -> RtokenError {
        RtokenError::Store(format!("Failed to write {}: {}", self.path.display(), err))
    }
}

/// Split stored content into trimmed, non-empty entries.
pub fn parse_tokens(content: &str) -> Vec<String> {
    content
        .split(DELIMITER)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn serialize_tokens(tokens: &[String]) -> String {
    tokens.join(",")
}
