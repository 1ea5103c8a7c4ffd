//! The merge engine: the one piece of this tool with actual design in it.
//!
//! Pure function over values, no I/O. The pipeline loads the stores, calls
//! [`merge`], and persists the outcome; everything this module has to get
//! right is encoded in the tests at the bottom.

use std::collections::BTreeSet;
use std::collections::HashSet;

use crate::storage::Item;

/// Result of merging one fetch into one feed's persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The new archive, newest-first by merge time: this run's new items in
    /// fetch order, then the previous archive in its stored order.
    pub items: Vec<Item>,
    /// The previous seen set plus the ids of this run's new items.
    pub seen_ids: BTreeSet<String>,
    /// How many fetched items were genuinely new this run.
    pub new_count: usize,
}

/// Merges freshly fetched items into the existing archive and seen set.
///
/// A fetched item counts as new only when its id is in neither the seen set
/// nor the existing archive; the seen set is what keeps an item out after
/// the upstream feed rotates it away and back. New items go first in fetch
/// order (feeds lead with their newest), then the existing archive follows
/// unchanged, so the archive only ever grows and prior items keep their
/// relative order.
///
/// A single emitted-id guard spans both phases. For the existing archive it
/// absorbs a duplicate id that may already sit in a stored file; for the
/// fetch it keeps an id repeated within one document from entering the
/// archive twice. First occurrence wins in both cases.
///
/// The seen set grows only by the new items' ids. It stays a superset of
/// the archive's ids, never exactly that set: ids whose items were dropped
/// or hand-pruned from the archive remain seen forever.
///
/// An empty `fetched` (upstream failure, empty feed) merges to exactly the
/// existing archive and an unchanged seen set.
pub fn merge(seen: &BTreeSet<String>, existing: &[Item], fetched: Vec<Item>) -> MergeOutcome {
    let existing_ids: HashSet<&str> = existing.iter().map(|item| item.id.as_str()).collect();

    let mut emitted: HashSet<String> = HashSet::new();
    let mut items: Vec<Item> = Vec::with_capacity(fetched.len() + existing.len());
    let mut seen_ids = seen.clone();
    let mut new_count = 0usize;

    for item in fetched {
        // Extraction never produces these, but the engine is the last gate
        // in front of the stores
        if item.id.is_empty() {
            continue;
        }
        if seen.contains(&item.id) || existing_ids.contains(item.id.as_str()) {
            continue;
        }
        if !emitted.insert(item.id.clone()) {
            continue;
        }
        seen_ids.insert(item.id.clone());
        new_count += 1;
        items.push(item);
    }

    for item in existing {
        if emitted.insert(item.id.clone()) {
            items.push(item.clone());
        }
    }

    MergeOutcome {
        items,
        seen_ids,
        new_count,
    }
}
