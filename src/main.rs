use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use warlens::{AnalyzeOptions, analyze_with_timings};

/// CLI arguments for warlens execution.
#[derive(Parser, Debug)]
#[command(
    name = "warlens",
    about = "Fast, deterministic endpoint reports for WAR archives.",
    version
)]
struct Cli {
    #[arg(long, value_name = "PATH", help = "WAR archive to analyze.")]
    input: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        help = "Report destination; '-' or omitted for stdout."
    )]
    output: Option<PathBuf>,
    #[arg(long, help = "Pretty-print the JSON report.")]
    pretty: bool,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
    #[arg(long, value_name = "SECONDS", default_value_t = 300)]
    timeout_seconds: u64,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = AnalyzeOptions {
        timeout: Duration::from_secs(cli.timeout_seconds),
        cancel: None,
    };
    let (report, timings) = analyze_with_timings(&cli.input, &options)?;

    let mut writer = output_writer(cli.output.as_deref())?;
    if cli.pretty {
        serde_json::to_writer_pretty(&mut writer, &report)
    } else {
        serde_json::to_writer(&mut writer, &report)
    }
    .context("failed to serialize report")?;
    writer.write_all(b"\n").context("failed to write report")?;

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: walk_ms={} decode_ms={} endpoints_ms={} report_ms={} (classes={} endpoints={})",
            timings.walk_ms,
            timings.decode_ms,
            timings.endpoints_ms,
            timings.report_ms,
            timings.class_count,
            timings.endpoint_count
        );
    }

    Ok(())
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => {
            Ok(Box::new(File::create(path).with_context(|| {
                format!("failed to open {}", path.display())
            })?))
        }
        None => Ok(Box::new(io::stdout())),
    }
}
