//! Field extraction: one canonical [`Item`] out of one loose entry.
//!
//! Every field resolves through a small fallback chain. The chains and
//! their order are load-bearing: upstream systems disagree about where the
//! identifier and the publication date live, and the chains below are the
//! union of every spelling observed in production feeds.

use crate::feed::entry::RawEntry;
use crate::storage::Item;
use crate::util::sanitize_text;

/// Elements that may carry the identifier, in priority order. The vendor's
/// mixed-case spelling comes first, then the all-lowercase form some
/// upstreams emit, then the bare element names.
const ID_FIELDS: [&str; 4] = ["kmplusItem:idClip", "kmplusitem:idclip", "idClip", "idclip"];

/// Extracts the canonical item, or `None` when no identifier resolves.
///
/// An id-less entry cannot be deduplicated, so it never becomes an item;
/// the caller counts and moves on. Title and description go through
/// [`sanitize_text`]; the remaining fields are trimmed verbatim.
pub fn extract_item(entry: &RawEntry) -> Option<Item> {
    let id = extract_id(entry)?;
    Some(Item {
        id,
        title: sanitize_text(extract_title(entry)),
        link: extract_link(entry).trim().to_string(),
        author: extract_author(entry).trim().to_string(),
        description: sanitize_text(extract_description(entry)),
        published: extract_published(entry).trim().to_string(),
    })
}

/// Resolves the identifier.
///
/// The first non-empty element in [`ID_FIELDS`] wins the chain; an entry
/// with none of them falls back to scanning classification tags. Note the
/// asymmetry: an empty element falls through to the next candidate, but a
/// whitespace-only element wins the chain and then trims away to nothing.
/// That entry carried a broken identifier, and falling back would archive
/// the item under some other field's value, so it yields `None` instead.
fn extract_id(entry: &RawEntry) -> Option<String> {
    ID_FIELDS
        .iter()
        .find_map(|name| entry.field(name).filter(|value| !value.is_empty()))
        .or_else(|| id_from_tags(entry))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Tag fallback for feeds that smuggle the identifier into a category,
/// e.g. a term of `kmplusItem:idClip=XYZ-123`. The first term containing
/// `idclip` (any case) and a `=` wins; the value is everything after the
/// first `=`, even when that is nothing.
fn id_from_tags(entry: &RawEntry) -> Option<&str> {
    entry.tags().iter().find_map(|term| {
        if term.to_lowercase().contains("idclip") {
            term.split_once('=').map(|(_, value)| value)
        } else {
            None
        }
    })
}

fn extract_title(entry: &RawEntry) -> &str {
    non_empty(entry.field("title"))
        .or_else(|| non_empty(entry.nested_field("title_detail", "value")))
        .unwrap_or("")
}

fn extract_link(entry: &RawEntry) -> &str {
    non_empty(entry.field("link"))
        .or_else(|| non_empty(entry.first_link_href()))
        .unwrap_or("")
}

/// The vendor's source element names the originating outlet, which is the
/// closest thing these feeds have to an author.
fn extract_author(entry: &RawEntry) -> &str {
    non_empty(entry.field("kmplusItem:source"))
        .or_else(|| non_empty(entry.field("kmplusitem:source")))
        .unwrap_or("")
}

fn extract_description(entry: &RawEntry) -> &str {
    non_empty(entry.field("description"))
        .or_else(|| non_empty(entry.field("summary")))
        .unwrap_or("")
}

/// Publication dates are passed through as opaque strings; the chain ends
/// with a case-insensitive scan because `pubdate` casing is a free-for-all
/// in the wild.
fn extract_published(entry: &RawEntry) -> &str {
    non_empty(entry.field("pubDate"))
        .or_else(|| non_empty(entry.field("published")))
        .or_else(|| non_empty(entry.field("pubdate")))
        .or_else(|| non_empty(entry.field_ignore_case("pubdate")))
        .unwrap_or("")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(fields: &[(&str, &str)]) -> RawEntry {
        let mut entry = RawEntry::new();
        for (name, value) in fields {
            entry.set_text(name, *value);
        }
        entry
    }

    // ========================================================================
    // Identifier resolution
    // ========================================================================

    #[test]
    fn test_id_from_vendor_element() {
        let entry = entry_with(&[("kmplusItem:idClip", "KM-001")]);
        assert_eq!(extract_id(&entry), Some("KM-001".to_string()));
    }

    #[test]
    fn test_id_prefers_vendor_spelling() {
        let entry = entry_with(&[
            ("idClip", "bare"),
            ("kmplusItem:idClip", "vendor"),
            ("kmplusitem:idclip", "lowercase"),
        ]);
        assert_eq!(extract_id(&entry), Some("vendor".to_string()));
    }

    #[test]
    fn test_id_empty_element_falls_through() {
        let entry = entry_with(&[("kmplusItem:idClip", ""), ("idClip", "KM-002")]);
        assert_eq!(extract_id(&entry), Some("KM-002".to_string()));
    }

    #[test]
    fn test_id_is_trimmed() {
        let entry = entry_with(&[("idclip", "  KM-003  ")]);
        assert_eq!(extract_id(&entry), Some("KM-003".to_string()));
    }

    #[test]
    fn test_id_whitespace_only_wins_chain_then_yields_none() {
        // A blank element beats both later elements and the tag fallback,
        // and then trims to nothing
        let mut entry = entry_with(&[("kmplusItem:idClip", "   "), ("idClip", "KM-004")]);
        entry.push_tag("kmplusItem:idClip=TAG-004");

        assert_eq!(extract_id(&entry), None);
    }

    #[test]
    fn test_id_from_tag_fallback() {
        let mut entry = RawEntry::new();
        entry.push_tag("kmplusItem:idClip=XYZ-123");

        assert_eq!(extract_id(&entry), Some("XYZ-123".to_string()));
    }

    #[test]
    fn test_id_tag_fallback_is_case_insensitive() {
        let mut entry = RawEntry::new();
        entry.push_tag("IDCLIP=ABC-9");

        assert_eq!(extract_id(&entry), Some("ABC-9".to_string()));
    }

    #[test]
    fn test_id_tag_without_equals_is_skipped() {
        let mut entry = RawEntry::new();
        entry.push_tag("idclip marker");
        entry.push_tag("other=nope");
        entry.push_tag("idclip=KM-005");

        assert_eq!(extract_id(&entry), Some("KM-005".to_string()));
    }

    #[test]
    fn test_id_tag_value_split_at_first_equals() {
        let mut entry = RawEntry::new();
        entry.push_tag("idclip=KM=006");

        assert_eq!(extract_id(&entry), Some("KM=006".to_string()));
    }

    #[test]
    fn test_id_tag_with_empty_value_ends_the_search() {
        // The first matching term wins even with nothing after the `=`;
        // later tags are not consulted
        let mut entry = RawEntry::new();
        entry.push_tag("idclip=");
        entry.push_tag("idclip=KM-007");

        assert_eq!(extract_id(&entry), None);
    }

    #[test]
    fn test_no_id_anywhere() {
        let entry = entry_with(&[("title", "No id in sight"), ("link", "https://example.com")]);
        assert_eq!(extract_id(&entry), None);
    }

    // ========================================================================
    // Other fields
    // ========================================================================

    #[test]
    fn test_title_direct() {
        let entry = entry_with(&[("title", "Plain title")]);
        assert_eq!(extract_title(&entry), "Plain title");
    }

    #[test]
    fn test_title_falls_back_to_detail_value() {
        let mut entry = entry_with(&[("title", "")]);
        entry.set_nested("title_detail", "value", "Detail title");

        assert_eq!(extract_title(&entry), "Detail title");
    }

    #[test]
    fn test_link_falls_back_to_first_link_element() {
        let mut entry = RawEntry::new();
        entry.push_link("https://example.com/from-links");

        assert_eq!(extract_link(&entry), "https://example.com/from-links");

        let mut entry = entry_with(&[("link", "https://example.com/direct")]);
        entry.push_link("https://example.com/ignored");
        assert_eq!(extract_link(&entry), "https://example.com/direct");
    }

    #[test]
    fn test_author_from_vendor_source() {
        let entry = entry_with(&[("kmplusItem:source", "Handelsblatt")]);
        assert_eq!(extract_author(&entry), "Handelsblatt");

        let entry = entry_with(&[("kmplusitem:source", "lowercase wire")]);
        assert_eq!(extract_author(&entry), "lowercase wire");
    }

    #[test]
    fn test_description_falls_back_to_summary() {
        let entry = entry_with(&[("summary", "From the summary element")]);
        assert_eq!(extract_description(&entry), "From the summary element");

        let entry = entry_with(&[("description", "Direct"), ("summary", "ignored")]);
        assert_eq!(extract_description(&entry), "Direct");
    }

    #[test]
    fn test_published_chain() {
        let entry = entry_with(&[("pubDate", "Mon, 05 May 2025 09:00:00 GMT")]);
        assert_eq!(extract_published(&entry), "Mon, 05 May 2025 09:00:00 GMT");

        let entry = entry_with(&[("published", "2025-05-05T09:00:00Z")]);
        assert_eq!(extract_published(&entry), "2025-05-05T09:00:00Z");

        let entry = entry_with(&[("PUBDATE", "weird casing")]);
        assert_eq!(extract_published(&entry), "weird casing");
    }

    // ========================================================================
    // Whole-item extraction
    // ========================================================================

    #[test]
    fn test_extract_item_complete() {
        let mut entry = entry_with(&[
            ("kmplusItem:idClip", " KM-100 "),
            ("title", "Result &amp; outlook "),
            ("link", " https://example.com/article "),
            ("kmplusItem:source", " Reuters "),
            ("description", " Numbers are &#8217;up&#8217; "),
            ("pubDate", " Mon, 05 May 2025 09:00:00 GMT "),
        ]);
        entry.push_tag("markets");

        let item = extract_item(&entry).unwrap();
        assert_eq!(item.id, "KM-100");
        assert_eq!(item.title, "Result & outlook");
        assert_eq!(item.link, "https://example.com/article");
        assert_eq!(item.author, "Reuters");
        assert_eq!(item.description, "Numbers are \u{2019}up\u{2019}");
        assert_eq!(item.published, "Mon, 05 May 2025 09:00:00 GMT");
    }

    #[test]
    fn test_extract_item_without_id_is_none() {
        let entry = entry_with(&[("title", "Interesting but unidentifiable")]);
        assert!(extract_item(&entry).is_none());
    }

    #[test]
    fn test_extract_item_id_only() {
        let entry = entry_with(&[("idClip", "KM-200")]);
        let item = extract_item(&entry).unwrap();

        assert_eq!(item.id, "KM-200");
        assert_eq!(item.title, "");
        assert_eq!(item.link, "");
        assert_eq!(item.author, "");
        assert_eq!(item.description, "");
        assert_eq!(item.published, "");
    }
}
