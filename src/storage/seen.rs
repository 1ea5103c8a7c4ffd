//! Persisted set of item identifiers this feed has ever yielded.
//!
//! One JSON file per feed, holding a flat array of id strings. The file is
//! what keeps an item out of the archive after the upstream feed has rotated
//! it out of its window and back in again; nothing is ever pruned from it.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;

use super::write_atomic;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SeenError {
    #[error("Failed to access seen-id file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in seen-id file: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// Load / Save
// ============================================================================

/// Loads the seen-id set for one feed, collapsing every failure to empty.
///
/// A missing file is the normal first run. Unreadable bytes, invalid JSON,
/// a bare `null`, and null array elements (hand-seeded placeholder files
/// tend to contain `[null]`) all degrade to an empty set with a warning,
/// and the run proceeds as a first run for this feed.
pub fn load_seen_ids(path: &Path) -> BTreeSet<String> {
    match read_seen_ids(path) {
        Ok(ids) => ids,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Unreadable seen-id file, starting from an empty set"
            );
            BTreeSet::new()
        }
    }
}

/// Typed load behind [`load_seen_ids`]. Missing file is `Ok(empty)`; real
/// I/O and parse failures surface so the caller can decide the policy.
pub fn read_seen_ids(path: &Path) -> Result<BTreeSet<String>, SeenError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No seen-id file yet");
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(SeenError::Io(e)),
    };

    // `null` for the whole document or for single elements comes from
    // placeholder files seeded by hand; both mean "no ids yet"
    let ids: Option<Vec<Option<String>>> = serde_json::from_str(&content)?;
    Ok(ids
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|id| !id.trim().is_empty())
        .collect())
}

/// Writes the set as a sorted, pretty-printed JSON array with a trailing
/// newline. Sorted output (free with `BTreeSet` iteration) keeps the file
/// stable across runs so diffs only show genuinely new ids.
///
/// The write is atomic: temp file in the same directory, sync, rename.
pub fn save_seen_ids(path: &Path, ids: &BTreeSet<String>) -> Result<(), SeenError> {
    let mut json = serde_json::to_string_pretty(ids)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let loaded = load_seen_ids(&dir.path().join("seen_ids_test.json"));
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");

        let original = ids(&["BX9-441", "KM-002", "KM-010"]);
        save_seen_ids(&path, &original).unwrap();

        assert_eq!(load_seen_ids(&path), original);
    }

    #[test]
    fn test_output_is_sorted_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");

        save_seen_ids(&path, &ids(&["zeta", "alpha", "mid"])).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[\n  \"alpha\",\n  \"mid\",\n  \"zeta\"\n]\n");
    }

    #[test]
    fn test_empty_set_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");

        save_seen_ids(&path, &BTreeSet::new()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[]\n");
        assert!(load_seen_ids(&path).is_empty());
    }

    #[test]
    fn test_null_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");
        std::fs::write(&path, "null").unwrap();

        assert!(load_seen_ids(&path).is_empty());
    }

    #[test]
    fn test_null_placeholder_array_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");
        std::fs::write(&path, "[null]").unwrap();

        assert!(load_seen_ids(&path).is_empty());
    }

    #[test]
    fn test_null_elements_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");
        std::fs::write(&path, "[\"KM-001\", null, \"KM-002\"]").unwrap();

        assert_eq!(load_seen_ids(&path), ids(&["KM-001", "KM-002"]));
    }

    #[test]
    fn test_blank_ids_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");
        std::fs::write(&path, "[\"\", \"  \", \"KM-001\"]").unwrap();

        assert_eq!(load_seen_ids(&path), ids(&["KM-001"]));
    }

    #[test]
    fn test_corrupt_json_collapses_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(load_seen_ids(&path).is_empty());
    }

    #[test]
    fn test_corrupt_json_surfaces_in_typed_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = read_seen_ids(&path).unwrap_err();
        assert!(matches!(err, SeenError::Parse(_)));
    }

    #[test]
    fn test_wrong_shape_collapses_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");
        std::fs::write(&path, "{\"ids\": [\"KM-001\"]}").unwrap();

        assert!(load_seen_ids(&path).is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");

        save_seen_ids(&path, &ids(&["old-1", "old-2"])).unwrap();
        save_seen_ids(&path, &ids(&["new-1"])).unwrap();

        assert_eq!(load_seen_ids(&path), ids(&["new-1"]));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seen_ids_test.json");

        save_seen_ids(&path, &ids(&["KM-001"])).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["seen_ids_test.json"]);
    }
}
