//! Item identity and content model.
//!
//! # Responsibility
//! - Define the opaque item identifier shared by graph, projection and sync.
//! - Represent item content as text segments interleaved with item links.
//!
//! # Invariants
//! - `ItemId` values are never reused after an item is destroyed.
//! - The root item always uses [`ROOT_ITEM_ID`].
//! - `Content` never stores empty text segments or two adjacent text segments.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Well-known id of the root item present in every fresh state.
pub const ROOT_ITEM_ID: &str = "0";

static LINK_MARKUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]\s]+)\]\]").expect("valid link markup regex"));

/// Opaque stable identifier of one item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Allocates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn root() -> Self {
        Self(ROOT_ITEM_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ITEM_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One piece of item content.
///
/// Serialized untagged so plain text stays a JSON string and links are
/// `{"link": "<id>"}` objects, matching the remote wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Text(String),
    Link { link: ItemId },
}

/// Ordered item content with embedded references to other items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(Vec<Segment>);

impl Content {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates content holding one text segment.
    pub fn text(value: impl Into<String>) -> Self {
        let mut content = Self::empty();
        content.push_text(value);
        content
    }

    /// Builds content from raw segments, normalizing empty and adjacent text.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut content = Self::empty();
        for segment in segments {
            match segment {
                Segment::Text(text) => content.push_text(text),
                Segment::Link { link } => content.push_link(link),
            }
        }
        content
    }

    /// Parses `[[item-id]]` markup into link segments.
    ///
    /// Text that does not match the markup is kept verbatim.
    pub fn parse_markup(value: &str) -> Self {
        let mut content = Self::empty();
        let mut cursor = 0;
        for captures in LINK_MARKUP_RE.captures_iter(value) {
            let (Some(whole), Some(target)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            content.push_text(&value[cursor..whole.start()]);
            content.push_link(ItemId::new(target.as_str()));
            cursor = whole.end();
        }
        content.push_text(&value[cursor..]);
        content
    }

    /// Renders content back into `[[item-id]]` markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Link { link } => {
                    out.push_str("[[");
                    out.push_str(link.as_str());
                    out.push_str("]]");
                }
            }
        }
        out
    }

    pub fn push_text(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.0.last_mut() {
            last.push_str(&value);
            return;
        }
        self.0.push(Segment::Text(value));
    }

    pub fn push_link(&mut self, target: ItemId) {
        self.0.push(Segment::Link { link: target });
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns linked item ids in content order (duplicates kept).
    pub fn references(&self) -> Vec<&ItemId> {
        self.0
            .iter()
            .filter_map(|segment| match segment {
                Segment::Link { link } => Some(link),
                Segment::Text(_) => None,
            })
            .collect()
    }

    pub fn links_to(&self, target: &ItemId) -> bool {
        self.references().into_iter().any(|link| link == target)
    }

    /// Renders plain text, resolving each link through `resolve`.
    ///
    /// Links that `resolve` cannot name fall back to the raw id.
    pub fn plain_text_with<F>(&self, mut resolve: F) -> String
    where
        F: FnMut(&ItemId) -> Option<String>,
    {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Link { link } => {
                    out.push_str(&resolve(link).unwrap_or_else(|| link.to_string()))
                }
            }
        }
        out
    }
}

/// One item record as held by the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub content: Content,
}

impl Item {
    /// Creates an item with empty content.
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            content: Content::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Content, ItemId, Segment};

    #[test]
    fn parse_markup_splits_text_and_links() {
        let content = Content::parse_markup("see [[abc]] and [[def]]!");
        assert_eq!(
            content.segments(),
            &[
                Segment::Text("see ".to_string()),
                Segment::Link {
                    link: ItemId::new("abc")
                },
                Segment::Text(" and ".to_string()),
                Segment::Link {
                    link: ItemId::new("def")
                },
                Segment::Text("!".to_string()),
            ]
        );
        assert_eq!(content.to_markup(), "see [[abc]] and [[def]]!");
    }

    #[test]
    fn push_text_merges_adjacent_segments_and_skips_empty() {
        let mut content = Content::text("a");
        content.push_text("");
        content.push_text("b");
        assert_eq!(content.segments(), &[Segment::Text("ab".to_string())]);
        assert!(Content::text("").is_empty());
    }

    #[test]
    fn plain_text_falls_back_to_id_for_unknown_links() {
        let content = Content::parse_markup("x [[known]] [[missing]]");
        let text = content.plain_text_with(|id| (id.as_str() == "known").then(|| "K".to_string()));
        assert_eq!(text, "x K missing");
    }

    #[test]
    fn content_serializes_as_string_or_link_object() {
        let content = Content::parse_markup("hi [[x1]]");
        let json = serde_json::to_string(&content).expect("content should serialize");
        assert_eq!(json, r#"["hi ",{"link":"x1"}]"#);
        let back: Content = serde_json::from_str(&json).expect("content should deserialize");
        assert_eq!(back, content);
    }

    #[test]
    fn generated_ids_are_distinct_from_root() {
        let id = ItemId::generate();
        assert!(!id.is_root());
        assert_ne!(id, ItemId::generate());
        assert!(ItemId::root().is_root());
    }
}
