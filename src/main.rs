use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::error;

use registry_feeds::config::{FeedConfig, LogFormat, log_path};
use registry_feeds::feed::poller::Poller;

#[derive(Parser)]
#[command(name = "registry-feeds")]
#[command(version, about = "Polls the npm registry once for newly published releases")]
struct Cli {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Registry base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Package to watch instead of polling the activity feed (repeatable)
    #[arg(long = "package", value_name = "NAME")]
    packages: Vec<String>,

    /// Only report releases published after this RFC 3339 instant
    #[arg(long, conflicts_with = "since_secs")]
    cutoff: Option<DateTime<Utc>>,

    /// Only report releases published in the last N seconds
    #[arg(long)]
    since_secs: Option<i64>,

    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log to a file; without a value the default data directory is used
    #[arg(long, num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(FeedConfig, DateTime<Utc>, bool)> {
        let mut config = match &self.config {
            Some(path) => FeedConfig::load(path)?,
            None => FeedConfig::default(),
        };

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if !self.packages.is_empty() {
            config.packages = Some(self.packages);
        }
        if let Some(max_concurrency) = self.max_concurrency {
            config.max_concurrency = max_concurrency;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(log_file) = self.log_file {
            config.log.file = Some(log_file.unwrap_or_else(log_path));
        }
        if let Some(log_format) = self.log_format {
            config.log.format = log_format;
        }

        let cutoff = resolve_cutoff(self.cutoff, self.since_secs, Utc::now())?;

        Ok((config, cutoff, self.verbose))
    }
}

/// Picks the cutoff: an explicit instant, `now` minus a window, or the epoch
fn resolve_cutoff(
    cutoff: Option<DateTime<Utc>>,
    since_secs: Option<i64>,
    now: DateTime<Utc>,
) -> anyhow::Result<DateTime<Utc>> {
    match (cutoff, since_secs) {
        (Some(cutoff), _) => Ok(cutoff),
        (None, Some(secs)) => chrono::Duration::try_seconds(secs)
            .and_then(|window| now.checked_sub_signed(window))
            .context("--since-secs is out of range"),
        (None, None) => Ok(DateTime::<Utc>::UNIX_EPOCH),
    }
}

fn main() -> anyhow::Result<()> {
    let (config, cutoff, verbose) = Cli::parse().into_config()?;
    let _guard = registry_feeds::logging::init(&config.log, verbose)?;

    let poller = Poller::from_config(&config)?;

    let outcome = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(poller.poll(cutoff));

    for release in &outcome.releases {
        println!("{}", serde_json::to_string(release)?);
    }
    for err in &outcome.errors {
        error!("{}", err);
    }

    if outcome.releases.is_empty() {
        anyhow::bail!("no releases newer than {}", cutoff);
    }
    Ok(())
}
