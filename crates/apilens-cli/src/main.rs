use std::env;

use anyhow::Result;
use apilens_cli::{CliCommand, OutputMode, help_text, parse_arguments, render_report, version_text};
use apilens_core::{FetchConfig, analyze_source};
use log::debug;

/// Environment variable holding the log filter (e.g. `debug`, `apilens_core=debug`)
const LOG_ENV: &str = "APILENS_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(LOG_ENV, "warn")).init();

    let raw_args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_arguments(&raw_args)? {
        CliCommand::Run(options) => options,
        CliCommand::Help => {
            print!("{}", help_text());
            return Ok(());
        }
        CliCommand::Version => {
            println!("{}", version_text());
            return Ok(());
        }
    };

    let mut config = FetchConfig::default();
    if let Some(timeout) = options.timeout {
        config.timeout = timeout;
    }
    debug!("analyzing {} with {config:?}", options.source);

    let report = analyze_source(&options.source, &config).await?;

    match options.mode {
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputMode::Summary => print!("{}", render_report(&report)),
    }

    Ok(())
}
