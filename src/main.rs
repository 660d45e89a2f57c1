mod domain;
mod error;
mod goal;
mod golden;
mod les;
mod log_file;
mod regression;
mod report;
mod tdee;
mod trend;
mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tokio::sync::Mutex;

use crate::domain::Algorithm;
use crate::error::EstimateError;
use crate::log_file::load_log;
use crate::regression::{DEFAULT_LR, RegressionConfig};
use crate::report::{OutputFormat, render, render_insufficient};
use crate::tdee::calculate_tdee;
use crate::watcher::{WatcherConfig, watch_log};

/// Estimates TDEE and trend weight from a daily weight and calorie log.
#[derive(Parser, Debug)]
#[command(name = "tdee-trend")]
#[command(about = "TDEE and trend weight estimation from a daily weight and calorie log")]
#[command(version)]
struct Args {
    /// Path to the log file (`YYYY-MM-DD weight calories` per line, `gw <kg>` for a goal).
    /// Can also be set via TDEE_TREND_FILE environment variable.
    #[arg(value_name = "FILE", env = "TDEE_TREND_FILE")]
    file: PathBuf,

    /// Estimation algorithm: v1 (recursive least squares) or v2 (tuned smoothing).
    #[arg(
        short,
        long,
        value_enum,
        ignore_case = true,
        env = "TDEE_TREND_ALGORITHM",
        default_value_t = Algorithm::V2
    )]
    algorithm: Algorithm,

    /// Forgetting factor for V1, strictly between 0 and 1.
    #[arg(long, value_name = "RATE", default_value_t = DEFAULT_LR)]
    lr: f64,

    /// Output format.
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Re-run the estimate whenever the log file changes.
    #[arg(short, long)]
    watch: bool,
}

/// Settings shared by the first run and every watched re-run.
#[derive(Debug, Clone)]
struct RunOptions {
    algorithm: Algorithm,
    regression: RegressionConfig,
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let options = RunOptions {
        algorithm: args.algorithm,
        regression: RegressionConfig::new(args.lr).context("Invalid --lr")?,
        format: args.format,
    };

    print!("{}", run_once(&args.file, &options)?);

    if args.watch {
        let file_path = args
            .file
            .canonicalize()
            .with_context(|| format!("Failed to resolve path: {}", args.file.display()))?;

        let config = WatcherConfig::default();
        let retry_config = config.clone();
        let options = Arc::new(options);
        let rerun_path = Arc::new(file_path.clone());
        // Held for a whole rerun so that reports never interleave.
        let rerun_lock = Arc::new(Mutex::new(()));

        watch_log(&file_path, config, move || {
            let options = options.clone();
            let path = rerun_path.clone();
            let config = retry_config.clone();
            let lock = rerun_lock.clone();
            tokio::spawn(async move {
                let _guard = lock.lock().await;
                if let Some(report) = rerun_with_retry(path, options, &config).await {
                    println!();
                    println!("=== {} ===", Local::now().format("%Y-%m-%d %H:%M:%S"));
                    print!("{}", report);
                }
            });
        })
        .await
        .context("Log watcher stopped")?;
    }

    Ok(())
}

/// Loads the log, runs the estimator and renders the report.
fn run_once(path: &Path, options: &RunOptions) -> Result<String> {
    let data = load_log(path)
        .with_context(|| format!("Failed to load log from {}", path.display()))?;

    let series = match data.series() {
        Ok(series) => series,
        Err(EstimateError::InsufficientData { available, .. }) => {
            log::info!("only {} usable days in {}", available, path.display());
            return Ok(render_insufficient(available, options.format)?);
        }
        Err(e) => return Err(e).context("Log entries are not a valid series"),
    };

    if let Some((first, last)) = data.date_range() {
        log::info!("{} days logged from {} to {}", series.len(), first, last);
    }

    let result = calculate_tdee(
        &series,
        data.goal_weight,
        options.algorithm,
        options.regression,
    )
    .context("TDEE estimation failed")?;

    Ok(render(&data.entries, &result, options.format)?)
}

/// Re-runs the estimate after a change on the blocking pool, retrying
/// transient failures (the file may be caught half-written).
async fn rerun_with_retry(
    path: Arc<PathBuf>,
    options: Arc<RunOptions>,
    config: &WatcherConfig,
) -> Option<String> {
    let mut last_error = None;

    for attempt in 0..config.retry_attempts {
        let (path, options) = (path.clone(), options.clone());
        match tokio::task::spawn_blocking(move || run_once(&path, &options)).await {
            Ok(Ok(report)) => return Some(report),
            Ok(Err(e)) => {
                log::warn!("Re-estimation attempt {} failed: {:#}", attempt + 1, e);
                last_error = Some(e);
            }
            Err(e) => {
                log::error!("Re-estimation task panicked: {}", e);
                return None;
            }
        }
        tokio::time::sleep(config.retry_delay).await;
    }

    if let Some(e) = last_error {
        log::error!(
            "Failed to re-estimate after {} attempts: {:#}",
            config.retry_attempts,
            e
        );
    }
    None
}
