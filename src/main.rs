use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use packrat::config::{Config, ConfigError, FeedConfig};
use packrat::pipeline::run_all;

/// Whole-request bound per fetch; a stalled feed delays the run by at most
/// this much instead of hanging it.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "packrat", version, about = "Incremental RSS archiver deduplicating by idClip")]
struct Args {
    /// Path to the feeds configuration file
    #[arg(long, value_name = "FILE", default_value = "feeds.toml")]
    config: PathBuf,

    /// Process only the named feed; repeat for several
    #[arg(long, value_name = "KEY")]
    feed: Vec<String>,
}

fn init_logging() {
    // Cron-friendly default: say what each feed did unless overridden
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Narrows the feed table to the `--feed` selection, keeping config order.
/// Unknown keys are a startup error; a typo silently archiving nothing
/// would look like success.
fn select_feeds(config: &Config, keys: &[String]) -> Result<Vec<FeedConfig>> {
    if keys.is_empty() {
        return Ok(config.feeds.clone());
    }

    for key in keys {
        if !config.feeds.iter().any(|f| &f.key == key) {
            let known: Vec<&str> = config.feeds.iter().map(|f| f.key.as_str()).collect();
            anyhow::bail!(
                "Unknown feed key '{}'. Known feeds: {}",
                key,
                known.join(", ")
            );
        }
    }

    Ok(config
        .feeds
        .iter()
        .filter(|f| keys.contains(&f.key))
        .cloned()
        .collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(ConfigError::NotFound(path)) => {
            eprintln!("Error: no config file found at {}", path.display());
            eprintln!();
            eprintln!("To get started, create it with your feeds:");
            eprintln!();
            eprintln!("  [[feeds]]");
            eprintln!("  key = \"vontobel\"");
            eprintln!("  url = \"https://feeds.example.com/Rss.aspx?crypt=...\"");
            eprintln!("  title = \"Vontobel RSS Feed\"");
            eprintln!();
            eprintln!("See feeds.example.toml for the full set of options.");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    let feeds = select_feeds(&config, &args.feed)?;

    std::fs::create_dir_all(&config.archive_dir).with_context(|| {
        format!(
            "Failed to create archive directory '{}'",
            config.archive_dir.display()
        )
    })?;
    std::fs::create_dir_all(&config.seen_dir).with_context(|| {
        format!(
            "Failed to create seen-id directory '{}'",
            config.seen_dir.display()
        )
    })?;

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("packrat/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let failed = run_all(&client, &config, &feeds).await;

    if failed > 0 {
        tracing::error!(failed, total = feeds.len(), "Run finished with failures");
        std::process::exit(1);
    }

    Ok(())
}
