//! `adfilter`: compile a JSON filter document to an LDAP search filter.

mod cli;
mod config;

use adgate_filter::{FilterOptions, parse_str_with};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ENV_LOG};
use config::Config;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        },
    }
}

fn init_logging(cli: &Cli) {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new(cli.log_directive()),
            EnvFilter::new,
        );

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn run(cli: &Cli) -> Result<String> {
    let options = load_options(cli)?;
    tracing::debug!(?options, "filter options");

    let (source, document) = read_document(cli)?;
    let filter = parse_str_with(&document, &options)
        .with_context(|| format!("Failed to compile filter from {source}"))?;

    if cli.json {
        let value = filter
            .to_json()
            .context("Failed to write filter back as JSON")?;
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(filter.render())
    }
}

fn load_options(cli: &Cli) -> Result<FilterOptions> {
    let configured = match &cli.config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            Config::load(path)?.filter
        },
        None => FilterOptions::new(),
    };
    Ok(cli.apply(configured))
}

fn read_document(cli: &Cli) -> Result<(String, String)> {
    match &cli.file {
        Some(path) if !cli.reads_stdin() => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((path.display().to_string(), text))
        },
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(("stdin".to_string(), text))
        },
    }
}
