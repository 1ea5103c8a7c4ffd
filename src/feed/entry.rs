use serde_json::{Map, Value};

/// One feed entry before extraction, kept loose on purpose.
///
/// The identifier this whole tool exists to dedup on arrives in
/// vendor-namespaced elements (`kmplusItem:idClip`), in bare elements, or
/// smuggled into category tags, depending on which system produced the
/// feed. Normalizing entries into a fixed schema at parse time would throw
/// exactly those elements away, so an entry keeps every element's text
/// under its name as written in the document, prefix included, and leaves
/// the interpretation to extraction.
///
/// Fields hold either plain text or a nested object (`title_detail.value`
/// style); classification tags and link targets are collected separately
/// in document order.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    fields: Map<String, Value>,
    tags: Vec<String>,
    links: Vec<String>,
}

impl RawEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the element with this exact name, if present and textual.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Text under a nested object field, e.g. `title_detail` / `value`.
    pub fn nested_field(&self, name: &str, key: &str) -> Option<&str> {
        self.fields.get(name)?.get(key)?.as_str()
    }

    /// Text of the first field whose name lowercases to `lower`, scanning
    /// fields in document order.
    pub fn field_ignore_case(&self, lower: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.to_lowercase() == lower)
            .and_then(|(_, value)| value.as_str())
    }

    /// Classification tag terms, in document order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Target of the entry's first link element.
    pub fn first_link_href(&self) -> Option<&str> {
        self.links.first().map(String::as_str)
    }

    /// Stores element text under the name as written. The first value for a
    /// name wins; feeds do not repeat the elements extraction cares about.
    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| Value::String(value.into()));
    }

    /// Stores a nested object field, e.g. `title_detail` with a `value` key.
    pub fn set_nested(&mut self, name: &str, key: &str, value: impl Into<String>) {
        let mut object = Map::new();
        object.insert(key.to_string(), Value::String(value.into()));
        self.fields.insert(name.to_string(), Value::Object(object));
    }

    pub fn push_tag(&mut self, term: impl Into<String>) {
        self.tags.push(term.into());
    }

    pub fn push_link(&mut self, href: impl Into<String>) {
        self.links.push(href.into());
    }

    /// True when the entry carries nothing at all, as parsed from `<item/>`.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.tags.is_empty() && self.links.is_empty()
    }
}
