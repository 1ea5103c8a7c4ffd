/// One archived feed item.
///
/// `id` is the dedup key (the vendor's idClip identifier) and is never empty
/// for an item that reaches a store; extraction and merging drop id-less
/// entries before they get here. Every other field may be an empty string,
/// which the writer treats as "absent" for the optional elements.
///
/// `published` is the feed's date string verbatim. Nothing in the pipeline
/// parses or reorders by date, so there is no reason to decode it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub link: String,
    pub author: String,
    pub description: String,
    pub published: String,
}

impl Item {
    /// Item with the given id and every other field empty. Mostly a test
    /// convenience, but the archive reader also builds items up from this.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            link: String::new(),
            author: String::new(),
            description: String::new(),
            published: String::new(),
        }
    }
}
