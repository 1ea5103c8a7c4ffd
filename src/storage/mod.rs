//! On-disk state: the per-feed XML archive and the per-feed seen-id set.
//!
//! Both files are rewritten whole every run, never appended to, and both
//! writes go through [`write_atomic`] so a crash mid-run leaves the previous
//! file intact rather than a truncated one.

mod archive;
mod seen;
mod types;

pub use archive::{load_archive, read_archive, write_archive, ArchiveError};
pub use seen::{load_seen_ids, read_seen_ids, save_seen_ids, SeenError};
pub use types::Item;

use std::path::Path;

/// Writes `bytes` to `path` atomically: temp file in the same directory,
/// sync, rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Timestamp suffix so concurrent invocations cannot collide on the name
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;

    if let Err(e) = file.write_all(bytes) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    if let Err(e) = file.sync_all() {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    drop(file);

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}
