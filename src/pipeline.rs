//! Per-feed pipeline and the sequential runner.
//!
//! This module owns the control flow the rest of the crate supplies pieces
//! for: load both stores, fetch, extract, merge, persist. It is also where
//! the silent-recovery policy lives. Store loads and fetch failures collapse
//! to empty values here, with a log line; store writes are the one thing
//! that is allowed to fail a feed.

use anyhow::{Context, Result};

use crate::config::{Config, FeedConfig};
use crate::feed::{extract_item, fetch_feed, parse_entries, RawEntry};
use crate::merge::merge;
use crate::storage::{load_archive, load_seen_ids, save_seen_ids, write_archive, Item};

/// What one feed's run accomplished, for the summary log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReport {
    /// Entries the fetch yielded, before extraction.
    pub fetched: usize,
    /// Entries dropped for lacking a resolvable identifier.
    pub skipped: usize,
    /// Items genuinely new this run.
    pub new: usize,
    /// Items in the written archive.
    pub total: usize,
}

/// Runs the whole pipeline for one feed.
///
/// Fetch and parse failures degrade to an empty entry list, so the run
/// still rewrites both stores from the existing state; an upstream outage
/// costs nothing but the run's new items. Only store writes return an
/// error, and [`run_all`] decides what a failed feed means for the rest.
pub async fn process_feed(
    client: &reqwest::Client,
    config: &Config,
    feed: &FeedConfig,
) -> Result<FeedReport> {
    let archive_path = config.archive_path(feed);
    let seen_path = config.seen_path(feed);

    let seen = load_seen_ids(&seen_path);
    let existing = load_archive(&archive_path);

    let entries = fetch_entries(client, feed).await;
    let fetched = entries.len();

    let mut items: Vec<Item> = Vec::with_capacity(entries.len());
    let mut skipped = 0usize;
    for entry in &entries {
        match extract_item(entry) {
            Some(item) => items.push(item),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(feed = %feed.key, skipped, "Entries without a resolvable id dropped");
    }

    let outcome = merge(&seen, &existing, items);

    write_archive(&archive_path, feed.title(), &feed.url, &outcome.items)
        .with_context(|| format!("Failed to write archive for feed '{}'", feed.key))?;
    save_seen_ids(&seen_path, &outcome.seen_ids)
        .with_context(|| format!("Failed to write seen-id file for feed '{}'", feed.key))?;

    Ok(FeedReport {
        fetched,
        skipped,
        new: outcome.new_count,
        total: outcome.items.len(),
    })
}

/// Fetches and parses one feed document, collapsing any failure to an
/// empty entry list. The next scheduled run is the retry policy.
async fn fetch_entries(client: &reqwest::Client, feed: &FeedConfig) -> Vec<RawEntry> {
    let bytes = match fetch_feed(client, &feed.url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(feed = %feed.key, error = %err, "Fetch failed, no new entries this run");
            return Vec::new();
        }
    };

    match parse_entries(&bytes) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(feed = %feed.key, error = %err, "Unparseable feed document, no new entries this run");
            Vec::new()
        }
    }
}

/// Processes every feed in order, one at a time.
///
/// A failed feed is logged and the loop moves on; its stores are at worst
/// one run behind and every other feed's files are untouched. Returns how
/// many feeds failed so the binary can exit non-zero for cron.
pub async fn run_all(client: &reqwest::Client, config: &Config, feeds: &[FeedConfig]) -> usize {
    let mut failed = 0usize;

    for feed in feeds {
        match process_feed(client, config, feed).await {
            Ok(report) => {
                tracing::info!(
                    feed = %feed.key,
                    fetched = report.fetched,
                    skipped = report.skipped,
                    new = report.new,
                    total = report.total,
                    "Feed processed"
                );
            }
            Err(err) => {
                failed += 1;
                tracing::error!(feed = %feed.key, error = %format!("{:#}", err), "Feed failed");
            }
        }
    }

    failed
}
