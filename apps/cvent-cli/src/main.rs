//! `cvent` - query the Cvent registration API from the command line.
//!
//! ```bash
//! # credentials from a YAML file, overridden by CVENT__* variables
//! cvent --config cvent.yaml events --filter city=NYC
//!
//! CVENT__TOKEN=... cvent -vv attendee 4f1c...
//! ```

// CLI tools are expected to print to stdout
#![allow(clippy::print_stdout)]

mod filter;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cvent_sdk::{Metadata, RegistrationApi, Sdk, SdkConfig};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::filter::{collect_filters, parse_filter};

/// Cvent registration API client
#[derive(Parser, Debug)]
#[command(name = "cvent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch one attendee by id
    Attendee { id: String },
    /// List attendees
    Attendees {
        /// Query filter, repeatable (key=value)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, Value)>,
    },
    /// Fetch one event by id
    Event { id: String },
    /// List events
    Events {
        /// Query filter, repeatable (key=value)
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, Value)>,
    },
}

#[derive(Serialize)]
struct Listing<T> {
    data: Vec<T>,
    paging: Metadata,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref() {
        ensure_config_exists(path)?;
    }

    init_logging(cli.verbose, cli.json_logs);

    // defaults -> YAML (if provided) -> env (CVENT__*)
    let config = SdkConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    let sdk = Sdk::new();
    sdk.connect(config)
        .await
        .context("failed to open a Cvent session")?;
    let registration = sdk.registration_service()?;
    tracing::debug!(command = ?cli.command, "session ready");

    let output = match cli.command {
        Commands::Attendee { id } => to_pretty(&registration.get_attendee(&id).await?)?,
        Commands::Attendees { filters } => {
            let mut paging = Metadata::new();
            let data = registration
                .find_attendees(&collect_filters(filters), &mut paging)
                .await?;
            to_pretty(&Listing { data, paging })?
        }
        Commands::Event { id } => to_pretty(&registration.get_event(&id).await?)?,
        Commands::Events { filters } => {
            let mut paging = Metadata::new();
            let data = registration
                .find_events(&collect_filters(filters), &mut paging)
                .await?;
            to_pretty(&Listing { data, paging })?
        }
    };

    println!("{output}");
    Ok(())
}

fn ensure_config_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("config file does not exist: {}", path.display());
    }
    Ok(())
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to render output")
}
