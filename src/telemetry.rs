use anyhow::Result;
use std::fs::OpenOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> Result<()> {
    let exporter_type = std::env::var("W8R_LOG_EXPORTER").unwrap_or_else(|_| "stdout".to_string());

    match exporter_type.as_str() {
        "file" => init_file()?,
        "stdout" => init_stdout()?,
        _ => {
            eprintln!(
                "Unknown W8R_LOG_EXPORTER: {}, falling back to stdout",
                exporter_type
            );
            init_stdout()?;
        }
    }

    Ok(())
}

fn init_stdout() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    Ok(())
}

fn init_file() -> Result<()> {
    let log_file_path = std::env::var("LOG_FILE").unwrap_or_else(|_| "w8r.log".to_string());

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    eprintln!("Logging to file: {}", log_file_path);

    Ok(())
}
