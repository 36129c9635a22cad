//! Subcommand execution

use clap::ArgMatches;
use fluent_templates::fluent_bundle::FluentValue;
use log::debug;

use crate::acquire::{Acquisition, TokenAcquirer};
use crate::browser::ChromeDriver;
use crate::config::CaptureConfig;
use crate::error::{Result, RtokenError};
use crate::i18n;
use crate::output::{format_token_list, format_token_list_json, OutputWriter};
use crate::store::TokenStore;

use super::args::{build_capture_config, output_config, reject_capture_flags, store_path};

/// Run rtoken with parsed command line arguments
pub fn run_with_args(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", sub)) => list(sub),
        Some(("pick", sub)) => pick(sub),
        Some(("capture", sub)) => capture(build_capture_config(sub)?),
        _ => capture(build_capture_config(matches)?),
    }
}

fn capture(config: CaptureConfig) -> Result<()> {
    debug!("capture config: {:?}", config);
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| RtokenError::Config(format!("Failed to create async runtime: {}", e)))?;

    rt.block_on(async {
        let output = OutputWriter::new(config.output.clone());
        output.rule();
        output.notice(&i18n::message("capture-banner"));
        output.rule();
        output.notice(&i18n::message("browser-starting"));

        let result = match ChromeDriver::launch(&config.browser).await {
            Ok(mut driver) => {
                let acquirer = TokenAcquirer::new(config, output.clone());
                match acquirer.acquire(&mut driver).await {
                    Ok(Acquisition::Acquired { .. }) => Ok(()),
                    Ok(Acquisition::TimedOut { .. }) => Err(RtokenError::Timeout),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            output.notice(&i18n::message("no-token"));
        }
        output.rule();
        result
    })
}

fn list(matches: &ArgMatches) -> Result<()> {
    reject_capture_flags(matches, "list")?;
    let output = OutputWriter::new(output_config(matches));
    let store = TokenStore::new(store_path(matches)?);
    let tokens = store.load()?;
    let path = store.path().display().to_string();

    if output.config().format_json {
        let json = format_token_list_json(store.path(), &tokens, output.config().reveal)?;
        return output.write(&json);
    }

    if tokens.is_empty() {
        output.notice(&i18n::message_with(
            "store-empty",
            &[("path", FluentValue::from(path))],
        ));
        return Ok(());
    }

    output.write(&format_token_list(&tokens, output.config().reveal))?;
    output.notice(&i18n::message_with(
        "store-summary",
        &[
            ("total", FluentValue::from(tokens.len())),
            ("path", FluentValue::from(path)),
        ],
    ));
    Ok(())
}

fn pick(matches: &ArgMatches) -> Result<()> {
    reject_capture_flags(matches, "pick")?;
    let output = OutputWriter::new(output_config(matches));
    let store = TokenStore::new(store_path(matches)?);
    let token = store.pick(&mut rand::thread_rng())?;
    debug!("picked {}", token.masked());

    let value = if matches.get_flag("raw") {
        token.as_str()
    } else {
        token.bearer_part()
    };
    output.write(&format!("{}\n", value))
}
