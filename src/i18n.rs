use crate::error::RtokenError;
use fluent_templates::fluent_bundle::FluentValue;
use fluent_templates::{static_loader, Loader};
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

static_loader! {
    static LOCALES = {
        locales: "locales",
        fallback_language: "en-US",
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

pub fn localize_error(err: &RtokenError) -> String {
    let langid = resolve_language();
    match err {
        RtokenError::Browser(detail) => message_with_detail(&langid, "error-browser", detail),
        RtokenError::BrowserClosed => LOCALES.lookup(&langid, "error-browser-closed"),
        RtokenError::InvalidUrl(detail) => {
            message_with_detail(&langid, "error-invalid-url", detail)
        }
        RtokenError::Io(detail) => message_with_detail(&langid, "error-io", &detail.to_string()),
        RtokenError::Json(detail) => {
            message_with_detail(&langid, "error-json", &detail.to_string())
        }
        RtokenError::Store(detail) => message_with_detail(&langid, "error-store", detail),
        RtokenError::EmptyStore(detail) => {
            message_with_detail(&langid, "error-empty-store", detail)
        }
        RtokenError::Config(detail) => message_with_detail(&langid, "error-config", detail),
        RtokenError::Timeout => LOCALES.lookup(&langid, "error-timeout"),
        RtokenError::FileNotFound(detail) => {
            message_with_detail(&langid, "error-file-not-found", detail)
        }
    }
}

/// Look up a console message without arguments.
pub fn message(key: &str) -> String {
    LOCALES.lookup(&resolve_language(), key)
}

/// Look up a console message with named arguments.
pub fn message_with(key: &str, args: &[(&str, FluentValue<'_>)]) -> String {
    let args: HashMap<&str, FluentValue<'_>> = args.iter().cloned().collect();
    LOCALES.lookup_with_args(&resolve_language(), key, &args)
}

fn message_with_detail(langid: &LanguageIdentifier, key: &str, detail: &str) -> String {
    let mut args = HashMap::new();
    args.insert("detail", FluentValue::from(detail));
    LOCALES.lookup_with_args(langid, key, &args)
}

fn resolve_language() -> LanguageIdentifier {
    for key in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        if let Ok(value) = std::env::var(key) {
            if let Some(lang) = normalize_lang(value) {
                if let Ok(langid) = lang.parse::<LanguageIdentifier>() {
                    return langid;
                }
            }
        }
    }
    "en-US".parse().expect("valid fallback language")
}

fn normalize_lang(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let value = value.split('.').next().unwrap_or(value);
    let value = value.replace('_', "-");
    Some(value)
}
