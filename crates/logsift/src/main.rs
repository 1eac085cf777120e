//! logsift - Kubernetes log ETL
//!
//! Reads newline-delimited JSON log records, normalizes them to a
//! canonical schema, filters and redacts them, and writes survivors to a
//! configurable sink with retry, DLQ, and an operational report.
//!
//! # Usage
//!
//! ```bash
//! # Normalize from stdin to stdout with defaults
//! kubectl logs my-pod | logsift
//!
//! # File to rotating segments, redacting PII fields
//! logsift --input logs.jsonl --output-type rotate --output out/app.jsonl \
//!     --redact-keys user_email,token
//!
//! # With a config file; flags still win
//! logsift --config logsift.yaml --filter-levels WARN,ERROR
//! ```

mod summary;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncRead;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use logsift_config::{parse_list, Config};
use logsift_pipeline::run_pipeline;
use logsift_report::Report;

/// Kubernetes log ETL: normalize, filter, redact, and ship JSONL logs
#[derive(Parser, Debug)]
#[command(name = "logsift")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a YAML or JSON config file (also honored from LOGSIFT_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input JSONL path ('-' for stdin)
    #[arg(long)]
    input: Option<String>,

    /// Output path or URL ('-' for stdout)
    #[arg(long)]
    output: Option<String>,

    /// Sink type: stdout|file|rotate|http
    #[arg(long)]
    output_type: Option<String>,

    /// Max bytes before rotation when using the rotate sink
    #[arg(long)]
    output_max_bytes: Option<i64>,

    /// Max rotated segments to keep (0 disables deletion)
    #[arg(long)]
    output_max_files: Option<i64>,

    /// Report output path ('-' for stdout)
    #[arg(long)]
    report: Option<String>,

    /// Comma-separated levels to emit (e.g. WARN,ERROR)
    #[arg(long)]
    filter_levels: Option<String>,

    /// Comma-separated services to emit (case-insensitive)
    #[arg(long)]
    filter_services: Option<String>,

    /// Comma-separated field keys to redact from extra fields
    #[arg(long)]
    redact_keys: Option<String>,

    /// Comma-separated transform chain (default filter_redact)
    #[arg(long)]
    transforms: Option<String>,

    /// Number of sink workers
    #[arg(long)]
    max_workers: Option<i64>,

    /// Bounded queue size between normalize and sink
    #[arg(long)]
    queue_size: Option<i64>,

    /// Max retries for sink writes
    #[arg(long)]
    sink_max_retries: Option<i64>,

    /// Base backoff in ms for sink retries
    #[arg(long)]
    sink_backoff_base_ms: Option<i64>,

    /// Max backoff in ms for sink retries
    #[arg(long)]
    sink_backoff_max_ms: Option<i64>,

    /// Jitter fraction (0.2 = 20%) for sink retries
    #[arg(long)]
    sink_backoff_jitter_pct: Option<f64>,

    /// Dead-letter JSONL path for records whose writes exhaust retries
    #[arg(long)]
    dlq: Option<String>,

    /// Batch size for sink writes (1 disables batching)
    #[arg(long)]
    batch_size: Option<i64>,

    /// Batch flush interval in milliseconds
    #[arg(long)]
    batch_flush_interval_ms: Option<i64>,

    /// Graceful shutdown timeout in seconds
    #[arg(long)]
    shutdown_timeout_seconds: Option<i64>,

    /// Log level: debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: json, text
    #[arg(long)]
    log_format: Option<String>,

    /// Write the Prometheus rendering of the final report here ('-' for stdout)
    #[arg(long)]
    prometheus: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = resolve_config(&cli)?;
    cfg.validate()?;

    init_logging(&cfg.log_level, &cfg.log_format)?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let input = open_input(&cfg.input).await?;
    let report = Arc::new(Report::new());

    run_pipeline(input, &cfg, Arc::clone(&report), cancel).await?;

    print!("{}", summary::render(&report.snapshot()));

    if let Some(path) = &cli.prometheus {
        write_prometheus(&report, path)?;
    }

    Ok(())
}

/// Layer the configuration: defaults < file < environment < flags.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut cfg = Config::default();

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("LOGSIFT_CONFIG").ok().filter(|v| !v.is_empty()).map(PathBuf::from));
    if let Some(path) = config_path {
        let file_cfg = Config::from_file(&path)
            .with_context(|| format!("load config {}", path.display()))?;
        cfg = cfg.merge(file_cfg);
    }

    cfg = cfg.apply_env();
    Ok(cfg.merge(flag_overrides(cli)))
}

/// Build the highest-precedence overlay from CLI flags.
fn flag_overrides(cli: &Cli) -> Config {
    let mut overlay = Config::empty();

    if let Some(v) = &cli.input {
        overlay.input = v.clone();
    }
    if let Some(v) = &cli.output {
        overlay.output = v.clone();
    }
    if let Some(v) = &cli.output_type {
        overlay.output_type = v.clone();
    }
    if let Some(v) = cli.output_max_bytes {
        overlay.output_max_bytes = v;
    }
    if let Some(v) = cli.output_max_files {
        overlay.output_max_files = v;
    }
    if let Some(v) = &cli.report {
        overlay.report = v.clone();
    }
    if let Some(v) = &cli.filter_levels {
        overlay.filter_levels = parse_list(v);
    }
    if let Some(v) = &cli.filter_services {
        overlay.filter_services = parse_list(v);
    }
    if let Some(v) = &cli.redact_keys {
        overlay.redact_keys = parse_list(v);
    }
    if let Some(v) = &cli.transforms {
        overlay.transforms = parse_list(v);
    }
    if let Some(v) = cli.max_workers {
        overlay.max_workers = v;
    }
    if let Some(v) = cli.queue_size {
        overlay.queue_size = v;
    }
    if let Some(v) = cli.sink_max_retries {
        overlay.sink_max_retries = v;
    }
    if let Some(v) = cli.sink_backoff_base_ms {
        overlay.sink_backoff_base_ms = v;
    }
    if let Some(v) = cli.sink_backoff_max_ms {
        overlay.sink_backoff_max_ms = v;
    }
    if let Some(v) = cli.sink_backoff_jitter_pct {
        overlay.sink_backoff_jitter_pct = v;
    }
    if let Some(v) = &cli.dlq {
        overlay.dlq = v.clone();
    }
    if let Some(v) = cli.batch_size {
        overlay.batch_size = v;
    }
    if let Some(v) = cli.batch_flush_interval_ms {
        overlay.batch_flush_interval_ms = v;
    }
    if let Some(v) = cli.shutdown_timeout_seconds {
        overlay.shutdown_timeout_seconds = v;
    }
    if let Some(v) = &cli.log_level {
        overlay.log_level = v.clone();
    }
    if let Some(v) = &cli.log_format {
        overlay.log_format = v.clone();
    }

    overlay
}

/// Initialize the tracing subscriber on stderr; stdout belongs to the
/// JSONL output and the summary.
fn init_logging(level: &str, format: &str) -> Result<()> {
    let level = if level.is_empty() { "info" } else { level };
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {e}"))?;

    if format.eq_ignore_ascii_case("text") {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    Ok(())
}

/// Cancel the token on SIGINT or SIGTERM.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown().await;
        info!("shutdown signal received");
        cancel.cancel();
    });
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Open the input stream: stdin when the path is empty or `-`.
async fn open_input(path: &str) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    if path.is_empty() || path == "-" {
        Ok(Box::new(tokio::io::stdin()))
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("open input {path}"))?;
        Ok(Box::new(file))
    }
}

/// Write the Prometheus text rendering to `path`, or stdout for `-`.
fn write_prometheus(report: &Report, path: &str) -> Result<()> {
    let text = report.prometheus();
    if path.is_empty() || path == "-" {
        print!("{text}");
    } else {
        std::fs::write(path, text).with_context(|| format!("write metrics {path}"))?;
    }
    Ok(())
}
