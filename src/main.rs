use anyhow::{Context, Result};
use clap::Parser;
use incident_report::{
    config::Config,
    export::write_parquet,
    load::load_csv_path,
    process::clean_with_summary,
    report::Report,
};
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "incident_report")]
#[command(about = "Clean a shooting-incident CSV export and print its descriptive report")]
struct Args {
    /// CSV export with a header row
    input: PathBuf,

    /// YAML file overriding source column names and report settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the cleaned table to this Parquet file
    #[arg(long)]
    parquet: Option<PathBuf>,

    /// Write the report as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_level = if args.verbose { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let config = match &args.config {
        Some(path) => Config::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    // ─── 3) load + clean ─────────────────────────────────────────────
    let raw = load_csv_path(&args.input, config.batch_size)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let (cleaned, summary) = clean_with_summary(&raw, &config).context("cleaning export")?;

    if let Some(path) = &args.parquet {
        write_parquet(&cleaned, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    // ─── 4) report ───────────────────────────────────────────────────
    let report = Report::build(&cleaned, &config)
        .context("building report")?
        .with_cleaning(summary);
    print!("{}", report.render_text());

    if let Some(path) = &args.json {
        fs::write(path, report.to_json()?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote json report");
    }

    Ok(())
}
