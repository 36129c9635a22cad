//! Command-line definition and config building

use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::{
    default_store_path, CaptureConfig, OutputConfig, DEFAULT_COOKIE_NAME, DEFAULT_HOME_URL,
    DEFAULT_LOGIN_URL, DEFAULT_SETTINGS_URL,
};
use crate::error::{Result, RtokenError};
use crate::utils::{FileUtils, StringUtils, UrlUtils};

/// Create the CLI application structure
pub fn create_app() -> Command {
    Command::new("rtoken")
        .version(crate::VERSION)
        .about("Capture a session token cookie from an interactive browser login")
        .arg(Arg::new("store")
            .long("store")
            .value_name("FILE")
            .env("RTOKEN_STORE")
            .global(true)
            .help("Token store file [default: token.txt next to the executable]"))
        .arg(Arg::new("silent")
            .short('s')
            .long("silent")
            .global(true)
            .help("Silent mode")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .global(true)
            .help("Verbose logging")
            .action(ArgAction::SetTrue))
        .args(capture_args())
        .subcommand(Command::new("capture")
            .about("Open the login page and wait for the session cookie (default)"))
        .subcommand(Command::new("list")
            .about("List stored tokens")
            .arg(Arg::new("json")
                .long("json")
                .help("Print the store as JSON")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("reveal")
                .long("reveal")
                .help("Print full token values instead of masked prefixes")
                .action(ArgAction::SetTrue)))
        .subcommand(Command::new("pick")
            .about("Print one stored token chosen at random")
            .arg(Arg::new("raw")
                .long("raw")
                .help("Print the stored entry as-is instead of its bearer part")
                .action(ArgAction::SetTrue)))
}

/// Capture options live on the root and reach every subcommand, so they may
/// appear before or after `capture`.
fn capture_args() -> Vec<Arg> {
    let args = vec![
        Arg::new("login-url")
            .long("login-url")
            .value_name("URL")
            .env("RTOKEN_LOGIN_URL")
            .help("Page to open for the interactive login")
            .default_value(DEFAULT_LOGIN_URL),
        Arg::new("home-url")
            .long("home-url")
            .value_name("URL")
            .env("RTOKEN_HOME_URL")
            .help("Landing page after login")
            .default_value(DEFAULT_HOME_URL),
        Arg::new("settings-url")
            .long("settings-url")
            .value_name("URL")
            .env("RTOKEN_SETTINGS_URL")
            .help("URL prefix of pages only reachable after login")
            .default_value(DEFAULT_SETTINGS_URL),
        Arg::new("cookie-name")
            .long("cookie-name")
            .value_name("NAME")
            .env("RTOKEN_COOKIE_NAME")
            .help("Cookie holding the session token")
            .default_value(DEFAULT_COOKIE_NAME),
        Arg::new("timeout")
            .long("timeout")
            .value_name("DURATION")
            .help("Maximum time to wait for the login")
            .default_value("300"),
        Arg::new("poll-interval")
            .long("poll-interval")
            .value_name("DURATION")
            .help("Delay between two checks of the browser")
            .default_value("1s"),
        Arg::new("grace-period")
            .long("grace-period")
            .value_name("DURATION")
            .help("Pause before closing the browser once the token is saved")
            .default_value("3s"),
        Arg::new("progress-every")
            .long("progress-every")
            .value_name("POLLS")
            .help("Print a progress line every N polls")
            .value_parser(clap::value_parser!(u32))
            .default_value("30"),
        Arg::new("headless")
            .long("headless")
            .help("Run the browser without a window")
            .action(ArgAction::SetTrue),
        Arg::new("browser-path")
            .long("browser-path")
            .value_name("FILE")
            .env("RTOKEN_BROWSER")
            .help("Chromium-based browser executable"),
        Arg::new("user-agent")
            .short('A')
            .long("user-agent")
            .value_name("STRING")
            .help("User-Agent the browser reports"),
        Arg::new("user-data-dir")
            .long("user-data-dir")
            .value_name("DIR")
            .help("Browser profile directory"),
    ];
    args.into_iter().map(|arg| arg.global(true)).collect()
}

const CAPTURE_ARG_IDS: &[&str] = &[
    "login-url",
    "home-url",
    "settings-url",
    "cookie-name",
    "timeout",
    "poll-interval",
    "grace-period",
    "progress-every",
    "headless",
    "browser-path",
    "user-agent",
    "user-data-dir",
];

/// Fail when a capture option was typed for a subcommand that never reads it.
/// Values coming from the environment are left alone.
pub fn reject_capture_flags(matches: &ArgMatches, subcommand: &str) -> Result<()> {
    for id in CAPTURE_ARG_IDS {
        if matches.value_source(id) == Some(ValueSource::CommandLine) {
            return Err(RtokenError::Config(format!(
                "--{} does not apply to `{}`",
                id, subcommand
            )));
        }
    }
    Ok(())
}

/// Resolve the token store path
pub fn store_path(matches: &ArgMatches) -> Result<PathBuf> {
    match matches.get_one::<String>("store") {
        Some(path) => FileUtils::expand_path(path),
        None => Ok(default_store_path()),
    }
}

pub fn output_config(matches: &ArgMatches) -> OutputConfig {
    OutputConfig {
        silent: matches.get_flag("silent"),
        format_json: flag(matches, "json"),
        reveal: flag(matches, "reveal"),
    }
}

/// Build capture configuration from command line arguments
pub fn build_capture_config(matches: &ArgMatches) -> Result<CaptureConfig> {
    let mut config = CaptureConfig::default();

    // Parse URLs
    if let Some(url) = matches.get_one::<String>("login-url") {
        config.login_url = UrlUtils::validate_url(url)?.to_string();
    }
    if let Some(url) = matches.get_one::<String>("home-url") {
        config.home_url = UrlUtils::validate_url(url)?.to_string();
    }
    if let Some(url) = matches.get_one::<String>("settings-url") {
        config.settings_url_prefix = UrlUtils::validate_url(url)?.to_string();
    }

    if let Some(name) = matches.get_one::<String>("cookie-name") {
        config.cookie_name = name.trim().to_string();
    }

    // Configure timing
    if let Some(timeout) = matches.get_one::<String>("timeout") {
        config.timeout = StringUtils::parse_duration(timeout)?;
    }
    if let Some(interval) = matches.get_one::<String>("poll-interval") {
        config.poll_interval = StringUtils::parse_duration(interval)?;
    }
    if let Some(grace) = matches.get_one::<String>("grace-period") {
        config.grace_period = StringUtils::parse_duration(grace)?;
    }
    if let Some(every) = matches.get_one::<u32>("progress-every") {
        config.progress_every = *every;
    }

    // Configure browser
    config.browser.headless = matches.get_flag("headless");
    if let Some(path) = matches.get_one::<String>("browser-path") {
        let path = FileUtils::expand_path(path)?;
        FileUtils::check_file_readable(&path)?;
        config.browser.executable = Some(path);
    }
    if let Some(user_agent) = matches.get_one::<String>("user-agent") {
        if user_agent.trim().is_empty() {
            return Err(RtokenError::Config("User-Agent must not be empty".to_string()));
        }
        config.browser.user_agent = Some(user_agent.clone());
    }
    if let Some(dir) = matches.get_one::<String>("user-data-dir") {
        config.browser.user_data_dir = Some(FileUtils::expand_path(dir)?);
    }

    config.store_path = store_path(matches)?;
    config.output = output_config(matches);
    config.validate()?;
    Ok(config)
}

/// Read a flag that only some subcommands define.
fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}
