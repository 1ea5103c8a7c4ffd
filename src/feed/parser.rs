//! Syndication XML to loose entries.
//!
//! This is deliberately not a full RSS/Atom data model. Schema-aware feed
//! parsers normalize entries into their own types and drop the
//! vendor-namespaced elements (`kmplusItem:idClip` and friends) that carry
//! the one value this tool exists to read. So the parser stays at the XML
//! level: inside each `<item>` or `<entry>` it records every element's text
//! under the element name exactly as written, collects `<category>` terms
//! and `<link>` targets, and hands the pile to extraction.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::feed::entry::RawEntry;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(String),
}

/// Text and attributes of the element currently being read inside an item.
struct Capture {
    name: String,
    term: Option<String>,
    href: Option<String>,
    text: String,
}

/// Parses a feed document into one [`RawEntry`] per `<item>`/`<entry>`,
/// in document order.
///
/// Anything outside items (channel metadata, feed-level links) is skipped;
/// nothing in the pipeline reads it. A document that fails mid-way fails as
/// a whole, which the pipeline treats like an empty fetch.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<RawEntry>, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let decoder = reader.decoder();

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current: Option<RawEntry> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "item" || name == "entry" {
                    current = Some(RawEntry::new());
                    capture = None;
                } else if current.is_some() {
                    capture = Some(begin_capture(name, &e, decoder)?);
                }
            }
            Ok(Event::Empty(e)) => {
                // Self-closing elements carry data only via attributes,
                // which is how Atom links and categories arrive
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if let Some(entry) = current.as_mut() {
                    let done = begin_capture(name, &e, decoder)?;
                    commit_capture(entry, done);
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(c) = capture.as_mut() {
                    let text = e.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                    c.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(c) = capture.as_mut() {
                    c.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "item" || name == "entry" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                    capture = None;
                } else if let Some(entry) = current.as_mut() {
                    // Commit only the element we are actually inside; ends of
                    // wrapper elements whose children were captured fall out
                    if capture.as_ref().is_some_and(|c| c.name == name) {
                        if let Some(done) = capture.take() {
                            commit_capture(entry, done);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn begin_capture(
    name: String,
    e: &BytesStart<'_>,
    decoder: quick_xml::encoding::Decoder,
) -> Result<Capture, ParseError> {
    let mut term = None;
    let mut href = None;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"term" => {
                term = Some(
                    attr.decode_and_unescape_value(decoder)
                        .map_err(|e| ParseError::Xml(e.to_string()))?
                        .to_string(),
                );
            }
            b"href" => {
                href = Some(
                    attr.decode_and_unescape_value(decoder)
                        .map_err(|e| ParseError::Xml(e.to_string()))?
                        .to_string(),
                );
            }
            _ => {}
        }
    }

    Ok(Capture {
        name,
        term,
        href,
        text: String::new(),
    })
}

/// Files a finished element into the entry. Categories become tags
/// (attribute form wins over text form), links land in the links list as
/// well as the fields, and everything else is plain field text.
fn commit_capture(entry: &mut RawEntry, capture: Capture) {
    match capture.name.as_str() {
        "category" => {
            let term = capture.term.unwrap_or(capture.text);
            entry.push_tag(term);
        }
        "link" => {
            if let Some(href) = capture.href {
                entry.push_link(href);
            }
            if !capture.text.is_empty() {
                entry.push_link(capture.text.clone());
            }
            entry.set_text("link", capture.text);
        }
        _ => {
            entry.set_text(&capture.name, capture.text);
        }
    }
}
