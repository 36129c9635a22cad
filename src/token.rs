//! Session token value type

use std::fmt;

const MASK_PREFIX_CHARS: usize = 5;
const BEARER_SEPARATORS: [&str; 2] = ["%3A%3A", "::"];

/// An opaque credential read from the session cookie.
///
/// `Debug` only shows a masked prefix so the value never ends up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First few characters followed by `...`.
    pub fn masked(&self) -> String {
        mask(&self.0)
    }

    /// The part of the value sent as a bearer credential.
    ///
    /// Cookie values look like `<user>%3A%3A<jwt>`, sometimes already
    /// decoded to `<user>::<jwt>`. The bearer is the segment between the
    /// first separator and the next one, if any.
    pub fn bearer_part(&self) -> &str {
        let mut value = self.0.as_str();
        for separator in BEARER_SEPARATORS {
            if let Some(segment) = value.split(separator).nth(1) {
                value = segment;
            }
        }
        value
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&self.masked()).finish()
    }
}

/// Mask any credential-like string for display.
pub fn mask(value: &str) -> String {
    let prefix: String = value.chars().take(MASK_PREFIX_CHARS).collect();
    format!("{}...", prefix)
}
