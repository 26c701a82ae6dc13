//! Comma-separated tag lists.
//!
//! Customers and products carry free-text tag fields such as
//! `"Western, South_Indian"` (regions) or `"Men, Women"` (genders).
//! [`TagList`] is the parsed view of such a field: trimmed, non-empty
//! entries in their original order, without duplicates.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A parsed comma-separated tag field.
///
/// Serializes back to the canonical `"a, b, c"` form.
///
/// ```
/// use shopipy_core::TagList;
///
/// let regions = TagList::parse(" Western,South_Indian ,, Western");
/// assert_eq!(regions.as_slice(), ["Western", "South_Indian"]);
/// assert_eq!(regions.to_string(), "Western, South_Indian");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TagList(Vec<String>);

impl TagList {
    /// Parse a raw comma-separated field.
    ///
    /// Empty entries are dropped and repeated entries are kept once.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.to_owned());
            }
        }
        Self(tags)
    }

    /// Parse an optional field, treating `None` as the empty list.
    #[must_use]
    pub fn parse_optional(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    /// Returns `true` if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The tags in their original order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Iterate over the tags.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Case-sensitive exact membership.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }
}

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl From<String> for TagList {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for TagList {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<TagList> for String {
    fn from(tags: TagList) -> Self {
        tags.to_string()
    }
}

impl<'a> IntoIterator for &'a TagList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
