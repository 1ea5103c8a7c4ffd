//! packrat: an incremental RSS archiver.
//!
//! Fetches each configured feed, deduplicates entries by their vendor
//! `idClip` identifier, and maintains two files per feed: a growing RSS
//! archive of every item ever merged, and the set of every identifier ever
//! seen. Intended to run from cron; one invocation is one pass over the
//! feed table.

pub mod config;
pub mod feed;
pub mod merge;
pub mod pipeline;
pub mod storage;
pub mod util;
