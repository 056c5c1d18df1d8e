//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and a
//! JSON file, for debugging long-running async batch loops.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let log_dir = PathBuf::from("log");
        if !log_dir.exists() {
            fs::create_dir_all(&log_dir).expect("Failed to create log directory");
        }

        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(EnvFilter::new(log_level.clone())),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(log_level)),
            );

        // Use try_init to avoid panic if a global subscriber already exists
        // (e.g. one installed by an embedding application or test harness).
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "🔧 STRUCTURED LOGGING: Initialized with file output"
        );

        // The guard must outlive the process for the non-blocking writer.
        std::mem::forget(guard);
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    resolve_environment(|key| std::env::var(key).ok())
}

/// Resolve the environment name through an injected variable lookup:
/// `INSS_BATCH_ENV` wins over `APP_ENV`, falling back to development.
fn resolve_environment(var: impl Fn(&str) -> Option<String>) -> String {
    var("INSS_BATCH_ENV")
        .or_else(|| var("APP_ENV"))
        .unwrap_or_else(|| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for batch lifecycle operations
pub fn log_batch_operation(
    operation: &str,
    batch_id: Uuid,
    label: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        batch_id = %batch_id,
        label = %label,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 BATCH_OPERATION"
    );
}

/// Log structured data for per-record outcomes
pub fn log_record_outcome(
    batch_id: Uuid,
    cursor: usize,
    outcome: &str,
    details: Option<&str>,
) {
    tracing::debug!(
        batch_id = %batch_id,
        cursor = cursor,
        outcome = %outcome,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🔧 RECORD_OUTCOME"
    );
}

/// Log structured data for registry operations
pub fn log_registry_operation(operation: &str, batch_id: Option<Uuid>, status: &str) {
    tracing::info!(
        operation = %operation,
        batch_id = batch_id.map(|id| id.to_string()),
        status = %status,
        timestamp = %Utc::now().to_rfc3339(),
        "📚 REGISTRY_OPERATION"
    );
}

/// Log structured data for result-sink operations
pub fn log_sink_operation(
    operation: &str,
    label: &str,
    status: &str,
    duration_ms: Option<u64>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        label = %label,
        status = %status,
        duration_ms = duration_ms,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "💾 SINK_OPERATION"
    );
}
