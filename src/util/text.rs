use std::borrow::Cow;

use html_escape::decode_html_entities;

/// Returns true for code points XML 1.0 allows in text content.
///
/// Allowed: tab (0x09), LF (0x0A), CR (0x0D), `[0x20, 0xD7FF]`,
/// `[0xE000, 0xFFFD]`, `[0x10000, 0x10FFFF]`. Everything else (C0 controls,
/// the noncharacters 0xFFFE/0xFFFF) is rejected; surrogates cannot occur in
/// a `&str` to begin with.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{09}' | '\u{0A}' | '\u{0D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Removes code points that are not valid XML 1.0 text.
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
fn strip_invalid_xml_chars(s: &str) -> Cow<'_, str> {
    // Fast path: scan without allocating
    if s.chars().all(is_xml_char) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(s.chars().filter(|&c| is_xml_char(c)).collect())
}

/// Normalizes feed text for storage in the archive.
///
/// Decodes HTML/XML character references (`&amp;`, `&#8217;`, named entities
/// with or without trailing `;`), removes code points XML 1.0 forbids, and
/// trims surrounding whitespace.
///
/// Decode and filter repeat until the string stops changing. A single decode
/// pass leaves double-encoded input one step short (`&amp;amp;` decodes to
/// `&amp;`, not `&`), and the filter can splice a fresh reference together
/// (`&am\x01p;` becomes `&amp;`). Every round that changes the string also
/// shortens it, so the loop terminates. The fixed point makes this function
/// idempotent: text read back out of an archive can be run through again
/// without drifting.
pub fn sanitize_text(s: &str) -> String {
    let mut text: Cow<'_, str> = Cow::Borrowed(s);

    loop {
        let decoded = decode_html_entities(text.as_ref());
        let filtered = strip_invalid_xml_chars(decoded.as_ref());
        if filtered == text {
            break;
        }
        text = Cow::Owned(filtered.into_owned());
    }

    text.trim().to_string()
}
