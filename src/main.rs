//! Command line front end: analyse one test run folder for RSSI gaps.
//!
//! Usage:
//!   anomaly-detector ./2022-12-03-01 "2022-12-03 10:00:00" "2022-12-03 18:00:00"
//!   anomaly-detector ./2022-12-03-01 "2022-12-03 10:00:00" "2022-12-03 18:00:00" --min-gap-seconds 600 --json

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Parser;
use env_logger::Builder;
use log::{LevelFilter, info};

use herald_anomaly_detection::common::TestFolder;
use herald_anomaly_detection::{AnalysisConfig, AnalysisError, AnomalyReport, Correlator, Detector, RssiGapDetection};

/// Detect gaps in RSSI reporting between devices in a test run
#[derive(Parser, Debug)]
#[command(name = "anomaly-detector")]
#[command(about = "Anomaly detection over Herald test run logs")]
struct Args {
    /// Test run folder holding one folder per device
    folder: PathBuf,

    /// Start of the analysis window (UTC)
    start: String,

    /// End of the analysis window (UTC)
    end: String,

    /// Longest silence between RSSI measurements that is not reported
    #[arg(long)]
    min_gap_seconds: Option<u64>,

    /// Config file (defaults to anomaly-detection.toml in the run folder)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn check_folder(path: &Path) -> Result<(), AnalysisError> {
    if !path.exists() {
        return Err(AnalysisError::FolderNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(AnalysisError::NotAFolder(path.to_path_buf()));
    }
    Ok(())
}

fn parse_bound(value: &str, format: &str) -> Result<DateTime<Utc>, AnalysisError> {
    NaiveDateTime::parse_from_str(value, format)
        .map(|t| t.and_utc())
        .map_err(|e| AnalysisError::InvalidTimestamp(format!("'{}' does not match '{}': {}", value, format, e)))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter(
            Some("herald_anomaly_detection"),
            if args.verbose { LevelFilter::Debug } else { LevelFilter::Info },
        )
        .filter(Some("anomaly_detector"), LevelFilter::Info)
        .init();

    check_folder(&args.folder)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| AnalysisConfig::config_path_for(&args.folder));
    let mut config = AnalysisConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    if let Some(seconds) = args.min_gap_seconds {
        config.minimum_gap_seconds = seconds;
    }

    let start = parse_bound(&args.start, &config.date_format).context("parsing start bound")?;
    let end = parse_bound(&args.end, &config.date_format).context("parsing end bound")?;

    info!(
        "Analysing {} from {} to {} (minimum gap {}s)",
        args.folder.display(),
        start,
        end,
        config.minimum_gap_seconds
    );

    let test_run = TestFolder::new(&args.folder);
    let correlator = Correlator::new(test_run.device_folders());
    let detector = RssiGapDetection::new(&correlator, config.minimum_gap_ms());
    let anomalies = detector
        .detect(&test_run, start, end)
        .with_context(|| format!("running {}", detector.name()))?;

    let report = AnomalyReport::new(&detector, start, end, &anomalies);
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
