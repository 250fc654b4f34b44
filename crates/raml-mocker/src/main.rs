//! raml-mocker CLI
//!
//! Generates the mock endpoint catalog for a directory of RAML files and
//! prints it as JSON (or as a Mountebank imposter) on stdout. Logs go to stderr.
//!
//! Usage:
//!   raml-mocker <directory_or_file> [OPTIONS]

use anyhow::Context;
use clap::{Parser, ValueEnum};
use raml_mocker::{generate_catalog, imposter, show_usage, DuplicatePolicy, GenerateOptions};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The endpoint catalog
    Json,
    /// A Mountebank-compatible imposter
    Imposter,
}

/// Mock response catalog generator for RAML specifications
#[derive(Parser, Debug)]
#[command(name = "raml-mocker")]
#[command(author, version, about = "Generate mock responses from RAML specifications")]
struct Args {
    /// Directory containing .raml files, or a single .raml file
    path: Option<PathBuf>,

    /// Additional specification file (repeatable)
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Options file (YAML or JSON); command-line inputs are added to it
    #[arg(short, long, env = "RAML_MOCKER_CONFIG")]
    config: Option<PathBuf>,

    /// Keep schema names in bodies instead of replacing them with their definition
    #[arg(long)]
    no_dereference: bool,

    /// How to treat endpoints declared more than once
    #[arg(short, long, value_parser = parse_policy)]
    duplicates: Option<DuplicatePolicy>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Port written into the imposter document
    #[arg(short, long, default_value = "4545", env = "RAML_MOCKER_PORT")]
    port: u16,

    /// Exit with a failure status when any specification fails to load
    #[arg(short, long)]
    strict: bool,
}

fn parse_policy(value: &str) -> Result<DuplicatePolicy, String> {
    value.parse()
}

fn build_options(args: &Args) -> anyhow::Result<GenerateOptions> {
    let mut options = match &args.config {
        Some(config) => GenerateOptions::from_file(config)
            .with_context(|| format!("loading options from {}", config.display()))?,
        None => GenerateOptions::new(),
    };

    if let Some(path) = &args.path {
        if path.is_file() {
            options.files.push(path.clone());
        } else {
            options.path = Some(path.clone());
        }
    }
    options.files.extend(args.files.iter().cloned());
    if args.no_dereference {
        options.parser_options.dereference_schemas = false;
    }
    if let Some(policy) = args.duplicates {
        options.duplicate_policy = policy;
    }
    Ok(options)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let options = build_options(&args)?;

    let report = match generate_catalog(&options).await {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            show_usage();
            std::process::exit(2);
        }
    };

    info!(
        "{} endpoint(s) from {} file(s), {} error(s), {} warning(s)",
        report.catalog.len(),
        report.files_checked,
        report.errors,
        report.warnings
    );

    let document = match args.output {
        OutputFormat::Json => serde_json::to_value(&report.catalog)?,
        OutputFormat::Imposter => imposter::to_imposter(&report.catalog, args.port),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&document).context("serializing output")?
    );

    if args.strict && report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
