//! pyweld - regenerate Python bindings for the venue crate
//!
//! Usage: pyweld [--config pyweld.toml] [--source DIR] [--output DIR]
//!               [--package NAME] [--emit-unknown] [--report FILE]
//!
//! Logs go to stderr (filter with `PYWELD_LOG`); stdout carries one line per
//! generated namespace.

use anyhow::{Context, Result};
use clap::Parser;
use pyweld::{BindingBuilder, GenerationReport, GeneratorConfig, CONFIG_FILE_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pyweld")]
#[command(about = "Generate PyO3 bindings from venue sources")]
struct Args {
    /// Configuration file (defaults to ./pyweld.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source root to scan
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Directory receiving the generated modules
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Python package name
    #[arg(short, long)]
    package: Option<String>,

    /// Also emit declarations without a namespace
    #[arg(long)]
    emit_unknown: bool,

    /// Write the run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("PYWELD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    tracing::debug!(?config, "resolved configuration");

    let report = BindingBuilder::new(config)
        .build()
        .context("binding generation failed")?;

    for namespace in &report.namespaces {
        println!("{}", namespace.summary_line());
    }
    log_summary(&report);

    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }

    Ok(())
}

/// Defaults, then the config file, then command-line flags
fn resolve_config(args: &Args) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None if Path::new(CONFIG_FILE_NAME).is_file() => GeneratorConfig::load(CONFIG_FILE_NAME)
            .with_context(|| format!("failed to load {}", CONFIG_FILE_NAME))?,
        None => GeneratorConfig::default(),
    };

    if let Some(source) = &args.source {
        config = config.source_root(source);
    }
    if let Some(output) = &args.output {
        config = config.output_dir(output);
    }
    if let Some(package) = &args.package {
        config = config.package(package);
    }
    if args.emit_unknown {
        config = config.emit_unknown(true);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn log_summary(report: &GenerationReport) {
    tracing::info!(
        files = report.files_scanned,
        namespaces = report.namespaces.len(),
        skipped = report.skipped.len(),
        collisions = report.collisions.len(),
        "wrote index {}",
        report.index_path.display()
    );
}

fn write_report(report: &GenerationReport, path: &Path) -> Result<()> {
    let json = report.to_json().context("failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "package = \"exchanges\"\nsource_root = \"from/file\"").unwrap();

        let args = Args::parse_from([
            "pyweld",
            "--config",
            file.path().to_str().unwrap(),
            "--source",
            "from/flag",
            "--emit-unknown",
        ]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.source_root, PathBuf::from("from/flag"));
        assert_eq!(config.package, "exchanges");
        assert!(config.emit_unknown);
    }

    #[test]
    fn test_invalid_package_flag() {
        let args = Args::parse_from(["pyweld", "--package", "bad-name", "--config", "/nonexistent.toml"]);
        assert!(resolve_config(&args).is_err());

        let file = NamedTempFile::new().unwrap();
        let args = Args::parse_from([
            "pyweld",
            "--config",
            file.path().to_str().unwrap(),
            "--package",
            "bad-name",
        ]);
        assert!(resolve_config(&args).is_err());
    }
}
