//! The per-feed archive: an RSS 2.0 file that only ever grows.
//!
//! Reading is deliberately forgiving (an unreadable archive degrades to
//! empty and the run carries on); writing is deliberately strict and
//! deterministic, so two runs over the same item list produce identical
//! bytes and diffs show only real changes.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use super::{write_atomic, Item};
use crate::util::sanitize_text;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("XML parse error in archive: {0}")]
    XmlParse(String),

    #[error("Failed to access archive file: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Reading
// ============================================================================

/// Loads the archive for one feed, collapsing every failure to empty.
///
/// A missing file is the normal first run. A file that cannot be read or
/// parsed degrades to an empty archive with a warning; the merge then
/// rebuilds a fresh valid file from whatever the current fetch yields,
/// still guarded by the seen-id set.
pub fn load_archive(path: &Path) -> Vec<Item> {
    match read_archive(path) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "Unreadable archive, treating it as empty"
            );
            Vec::new()
        }
    }
}

/// Typed load behind [`load_archive`]. Missing file is `Ok(empty)`; real
/// I/O and parse failures surface so the caller can decide the policy.
pub fn read_archive(path: &Path) -> Result<Vec<Item>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No archive file yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(ArchiveError::Io(e).into()),
    };
    parse_archive_content(&content)
}

/// The item sub-elements the reader recognizes. Anything else inside an
/// `<item>` is ignored, which keeps hand-edited archives loadable.
#[derive(Clone, Copy)]
enum ItemField {
    Guid,
    Title,
    Link,
    Author,
    Description,
    PubDate,
}

impl ItemField {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"guid" => Some(Self::Guid),
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            b"author" => Some(Self::Author),
            b"description" => Some(Self::Description),
            b"pubDate" => Some(Self::PubDate),
            _ => None,
        }
    }

    fn slot(self, item: &mut Item) -> &mut String {
        match self {
            Self::Guid => &mut item.id,
            Self::Title => &mut item.title,
            Self::Link => &mut item.link,
            Self::Author => &mut item.author,
            Self::Description => &mut item.description,
            Self::PubDate => &mut item.published,
        }
    }
}

/// Parses archive XML into items, in document order (newest first).
///
/// Items whose `<guid>` is missing or trims to empty are dropped: an id-less
/// item can never be deduplicated and has no business in a store. Channel
/// metadata is skipped entirely; it is regenerated from config on write.
fn parse_archive_content(content: &str) -> Result<Vec<Item>> {
    // XXE posture matches the pinned quick-xml: <!ENTITY> declarations are
    // never parsed, so custom entity references fail to unescape and the
    // whole document lands in the unreadable-archive path.
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();

    let mut current_item: Option<Item> = None;
    let mut current_field: Option<ItemField> = None;
    let mut skipped = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"item" {
                    current_item = Some(Item::with_id(""));
                    current_field = None;
                } else if current_item.is_some() {
                    current_field = ItemField::from_tag(e.name().as_ref());
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(item), Some(field)) = (current_item.as_mut(), current_field) {
                    let text = e
                        .unescape()
                        .map_err(|e| ArchiveError::XmlParse(e.to_string()))?;
                    field.slot(item).push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(item), Some(field)) = (current_item.as_mut(), current_field) {
                    field
                        .slot(item)
                        .push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(mut item) = current_item.take() {
                        item.id = item.id.trim().to_string();
                        if item.id.is_empty() {
                            skipped += 1;
                        } else {
                            items.push(item);
                        }
                    }
                }
                current_field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ArchiveError::XmlParse(e.to_string()).into()),
            _ => {}
        }
        buf.clear();
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Dropped archived items without a usable guid");
    }

    Ok(items)
}

// ============================================================================
// Writing
// ============================================================================

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write <{}> start", name))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write <{}> text", name))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write <{}> end", name))?;
    Ok(())
}

/// Renders the archive as an RSS 2.0 document string.
///
/// The channel carries the feed's display title (doubling as description,
/// there is nothing better to say) and the fetch URL as its link. Each item
/// gets `<guid isPermaLink="false">`, `<title>` and `<link>` always, and
/// `<author>`/`<description>`/`<pubDate>` only when non-empty.
///
/// Title and description are sanitized again on the way out; the function
/// is idempotent for them, and a hand-edited archive read back in cannot
/// smuggle raw entities or stray control bytes through a rewrite.
///
/// No `lastBuildDate`: output depends only on the inputs, so an unchanged
/// feed rewrites to byte-identical bytes.
pub fn render_archive(title: &str, feed_url: &str, items: &[Item]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .context("Failed to write XML declaration")?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer
        .write_event(Event::Start(rss))
        .context("Failed to write rss element")?;
    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .context("Failed to write channel element")?;

    write_text_element(&mut writer, "title", title)?;
    write_text_element(&mut writer, "link", feed_url)?;
    write_text_element(&mut writer, "description", title)?;

    for item in items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .context("Failed to write item element")?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer
            .write_event(Event::Start(guid))
            .context("Failed to write guid element")?;
        writer
            .write_event(Event::Text(BytesText::new(&item.id)))
            .context("Failed to write guid text")?;
        writer
            .write_event(Event::End(BytesEnd::new("guid")))
            .context("Failed to write guid end")?;

        write_text_element(&mut writer, "title", &sanitize_text(&item.title))?;
        write_text_element(&mut writer, "link", &item.link)?;

        if !item.author.is_empty() {
            write_text_element(&mut writer, "author", &item.author)?;
        }
        let description = sanitize_text(&item.description);
        if !description.is_empty() {
            write_text_element(&mut writer, "description", &description)?;
        }
        if !item.published.is_empty() {
            write_text_element(&mut writer, "pubDate", &item.published)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .context("Failed to write item end")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .context("Failed to write channel end")?;
    writer
        .write_event(Event::End(BytesEnd::new("rss")))
        .context("Failed to write rss end")?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).context("Rendered archive contains invalid UTF-8")
}

/// Renders and writes the archive atomically: temp file in the destination
/// directory, sync, rename. A crash mid-write leaves the previous archive
/// untouched.
pub fn write_archive(path: &Path, title: &str, feed_url: &str, items: &[Item]) -> Result<()> {
    let content = render_archive(title, feed_url, items)?;
    write_atomic(path, content.as_bytes())
        .with_context(|| format!("Failed to write archive '{}'", path.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
