//! Common types used across refbook
//!
//! This module provides the item shapes accepted on the wire and the
//! compact language code used to key per-language stores.

use std::collections::BTreeMap;
use serde::{Deserialize, Deserializer, Serialize};

/// One entry of a single-language reference book
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Item id
    pub id: i64,
    /// Display name, `""` when missing or null
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl Item {
    /// Create an item
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// One entry of a multi-language reference book, keyed by language tag
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiLangItem {
    /// Item id
    pub id: i64,
    /// Language tag to name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: BTreeMap<String, String>,
}

impl MultiLangItem {
    /// Create an item with no translations
    pub fn new(id: i64) -> Self {
        Self { id, name: BTreeMap::new() }
    }

    /// Add a translation for `lang`
    pub fn with_name(mut self, lang: impl Into<String>, name: impl Into<String>) -> Self {
        self.name.insert(lang.into(), name.into());
        self
    }
}

// `null` names decode like absent ones.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Packed two-letter language tag
///
/// `LangCode::DEFAULT` (zero) stands for "no specific language".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangCode(u16);

impl LangCode {
    /// No specific language
    pub const DEFAULT: Self = Self(0);

    /// Pack a tag of exactly two bytes; anything else maps to `DEFAULT`
    pub const fn from_tag(tag: &str) -> Self {
        let bytes = tag.as_bytes();
        if bytes.len() != 2 {
            return Self::DEFAULT;
        }
        Self((bytes[0] as u16) << 8 | bytes[1] as u16)
    }

    /// Get the raw code value
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Whether this is [`LangCode::DEFAULT`]
    pub const fn is_default(&self) -> bool {
        self.0 == 0
    }

    /// Unpack back to the two-letter tag
    pub fn tag(&self) -> Option<String> {
        if self.is_default() {
            return None;
        }
        String::from_utf8(self.0.to_be_bytes().to_vec()).ok()
    }
}

impl From<&str> for LangCode {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl From<u16> for LangCode {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for LangCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag() {
            Some(tag) => f.write_str(&tag),
            None if self.is_default() => f.write_str("*"),
            None => write!(f, "{:04X}", self.0),
        }
    }
}
