//! The key namespace shared by writers and readers.
//!
//! ```text
//! <prefix>/index                     artifact id -> kind tag
//! <prefix>/item/<id>/items           dense element slots
//! <prefix>/item/<id>/data            linked-list node values
//! <prefix>/item/<id>/metadata        length, head/tail, node links
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-artifact subcategory under `<prefix>/item/<id>/`.
///
/// The derived ordering (`Items < Data < Metadata`) is the order in which a
/// save emits an artifact's edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subcategory {
    Items,
    Data,
    Metadata,
}

impl Subcategory {
    /// All subcategories in emission order.
    pub const ALL: [Subcategory; 3] = [Self::Items, Self::Data, Self::Metadata];

    /// The path segment used in category names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Data => "data",
            Self::Metadata => "metadata",
        }
    }

    /// Parse a path segment.
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "items" => Some(Self::Items),
            "data" => Some(Self::Data),
            "metadata" => Some(Self::Metadata),
            _ => None,
        }
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds and parses category names under a configurable root prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    /// The prefix used when none is configured.
    pub const DEFAULT_PREFIX: &'static str = "state";

    /// Create a key space rooted at `prefix` (trailing slashes are trimmed).
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// The root prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Category holding the artifact id registry.
    pub fn index_category(&self) -> String {
        format!("{}/index", self.prefix)
    }

    /// Category holding one artifact's entries of the given subcategory.
    pub fn item_category(&self, id: &str, sub: Subcategory) -> String {
        format!("{}/item/{id}/{}", self.prefix, sub.as_str())
    }

    /// Split an item category back into artifact id and subcategory.
    ///
    /// Returns `None` for the index category and anything outside the
    /// namespace. Ids may themselves contain `/`.
    pub fn parse_item_category(&self, category: &str) -> Option<(String, Subcategory)> {
        let rest = category
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix("/item/")?;
        let (id, segment) = rest.rsplit_once('/')?;
        if id.is_empty() {
            return None;
        }
        Some((id.to_string(), Subcategory::parse(segment)?))
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}
