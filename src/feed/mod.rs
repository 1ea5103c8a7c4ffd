//! Everything between the network and the merge: fetch the document, parse
//! it into loose entries, extract canonical items.
//!
//! - [`fetcher`] - one HTTP GET per feed, size-capped, no retries
//! - [`parser`] - syndication XML to [`RawEntry`] values, vendor element
//!   names kept verbatim
//! - [`extract`] - per-field fallback chains resolving each entry into an
//!   [`Item`](crate::storage::Item), or nothing when no identifier resolves

mod entry;
mod extract;
mod fetcher;
mod parser;

pub use entry::RawEntry;
pub use extract::extract_item;
pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_entries, ParseError};
