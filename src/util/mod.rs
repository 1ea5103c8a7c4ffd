//! Utility functions for common operations.
//!
//! Currently this is text processing: feed content arrives with HTML
//! character references and the occasional byte XML 1.0 refuses to carry,
//! and everything written to an archive goes through [`sanitize_text`]
//! first.

mod text;

pub use text::sanitize_text;
