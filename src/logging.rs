//! Tracing subscriber setup for the binary

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::{LogConfig, LogFormat};

/// Builds the filter from `RUST_LOG`, falling back to this crate's targets
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "registry_feeds=debug"
    } else {
        "registry_feeds=info"
    }
}

/// Installs the global subscriber
///
/// Logs go to `config.file` through a non-blocking appender when set,
/// otherwise to stderr. The returned guard must be held until exit so
/// buffered lines are flushed.
pub fn init(config: &LogConfig, verbose: bool) -> io::Result<Option<WorkerGuard>> {
    let filter = env_filter(verbose);

    let Some(path) = &config.file else {
        install(io::stderr, config.format, true, filter);
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path {:?} has no file name", path),
        )
    })?;
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    install(writer, config.format, false, filter);

    tracing::info!(path = ?path, "Tracing initialized");
    Ok(Some(guard))
}

fn install<W>(writer: W, format: LogFormat, ansi: bool, filter: EnvFilter)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
