//! Single-language reference book.
//!
//! A [`Book`] maps integer ids to names. Next to the lookup map it keeps the
//! items in insertion order (the serialization source) and an aligned list of
//! uppercased names (the search source). The serialized snapshot and content
//! hash are only rebuilt by [`Book::optimize`]; reads never recompute them.

use std::collections::HashMap;
use std::ops::ControlFlow;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use tracing::{debug, trace};
use xxhash_rust::xxh64::Xxh64;

use refbook_core::{not_found_name, Error, Item, Result};

use crate::logging;
use crate::record::{self, Record};

/// Cached output shape: `{"items": [...], "hash": "<decimal>"}`
#[derive(Serialize)]
struct Snapshot<'a> {
    items: &'a [Item],
    hash: String,
}

/// Snapshot read back by [`Book::parse`]; the hash is recomputed, not trusted.
#[derive(Deserialize)]
struct SnapshotInput {
    items: Vec<Item>,
}

#[derive(Debug, Default)]
struct BookState {
    /// id -> position in `items`/`upper`
    positions: HashMap<i64, usize>,
    items: Vec<Item>,
    upper: Vec<String>,
    stale: bool,
    hash: u64,
    compiled: Bytes,
}

impl BookState {
    fn from_items(items: Vec<Item>) -> Self {
        let mut state = Self {
            positions: HashMap::with_capacity(items.len()),
            items: Vec::with_capacity(items.len()),
            upper: Vec::with_capacity(items.len()),
            ..Self::default()
        };
        for item in items {
            state.set(item.id, item.name);
        }
        state
    }

    /// Returns whether anything changed.
    fn set(&mut self, id: i64, name: String) -> bool {
        match self.positions.get(&id) {
            Some(&pos) => {
                if self.items[pos].name == name {
                    return false;
                }
                self.upper[pos] = name.to_uppercase();
                self.items[pos].name = name;
            }
            None => {
                self.positions.insert(id, self.items.len());
                self.upper.push(name.to_uppercase());
                self.items.push(Item { id, name });
            }
        }
        self.stale = true;
        self.hash = 0;
        true
    }

    fn name(&self, id: i64) -> Option<&str> {
        self.positions.get(&id).map(|&pos| self.items[pos].name.as_str())
    }

    fn optimize(&mut self) -> Result<()> {
        let hash = content_hash(&self.items);
        let compiled = serde_json::to_vec(&Snapshot {
            items: &self.items,
            hash: hash.to_string(),
        })
        .map_err(|e| Error::serialization(e.to_string()))?;

        self.hash = hash;
        self.compiled = Bytes::from(compiled);
        self.stale = false;
        Ok(())
    }
}

/// Stable xxHash64 over the `(id, name)` sequence.
pub fn content_hash(items: &[Item]) -> u64 {
    let mut hasher = Xxh64::new(0);
    for item in items {
        hasher.update(&item.id.to_le_bytes());
        // length prefix keeps ("ab", "c") and ("a", "bc") apart
        hasher.update(&(item.name.len() as u64).to_le_bytes());
        hasher.update(item.name.as_bytes());
    }
    hasher.digest()
}

/// In-memory reference book in a single language
#[derive(Debug, Default)]
pub struct Book {
    state: RwLock<BookState>,
}

impl Book {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book holding `items` with a fresh cache
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        let mut state = BookState::from_items(items);
        state.optimize()?;
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Returns true if an item with `id` exists
    pub fn is_exist(&self, id: i64) -> bool {
        self.state.read().positions.contains_key(&id)
    }

    /// Name stored for `id`, if any
    pub fn get(&self, id: i64) -> Option<String> {
        self.state.read().name(id).map(str::to_string)
    }

    /// Name stored for `id`, or the not-found name
    pub fn name(&self, id: i64) -> String {
        self.get(id).unwrap_or_else(not_found_name)
    }

    /// Insert or update an item
    ///
    /// Setting the name an item already has is a no-op and leaves the cache
    /// fresh. Returns whether the book changed.
    pub fn set(&self, id: i64, name: impl Into<String>) -> bool {
        let name = name.into();
        let mut state = self.state.write();
        if state.name(id) == Some(name.as_str()) {
            return false;
        }
        trace!(id, name = %name, "set");
        state.set(id, name)
    }

    /// Recompute the content hash and the serialized snapshot
    ///
    /// On failure the book stays stale and the previous cache is kept.
    pub fn optimize(&self) -> Result<()> {
        let mut state = self.state.write();
        let items = state.items.len();
        logging::instrument("optimize", items, || state.optimize())
    }

    /// Last serialized snapshot; empty until the first `optimize`
    pub fn json(&self) -> Bytes {
        self.state.read().compiled.clone()
    }

    /// Last computed content hash; 0 if stale since the last `optimize`
    pub fn hash(&self) -> u64 {
        self.state.read().hash
    }

    /// Whether content changed since the last `optimize`
    pub fn is_stale(&self) -> bool {
        self.state.read().stale
    }

    /// Items count
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// Whether the book has no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the items in insertion order
    pub fn items(&self) -> Vec<Item> {
        self.state.read().items.clone()
    }

    /// Walk all items in insertion order until `visit` breaks
    ///
    /// The read lock is held for the whole walk; `visit` must not write to
    /// this book.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(i64, &str) -> ControlFlow<()>,
    {
        let state = self.state.read();
        for item in &state.items {
            if visit(item.id, &item.name).is_break() {
                break;
            }
        }
    }

    /// Collect into `out` the ids whose name contains `query`, ignoring case
    ///
    /// `out` is cleared first. An empty query matches nothing.
    pub fn contains(&self, query: &str, out: &mut Vec<i64>) {
        out.clear();
        if query.is_empty() {
            return;
        }

        let needle = query.to_uppercase();
        let state = self.state.read();
        out.extend(
            state
                .upper
                .iter()
                .zip(&state.items)
                .filter(|(upper, _)| upper.contains(needle.as_str()))
                .map(|(_, item)| item.id),
        );
    }

    /// Replace the whole content from JSON and refresh the cache
    ///
    /// Accepts `[{"id": 1, "name": "A"}, ...]` or a snapshot produced by
    /// [`Book::json`]. Input is decoded before the book is touched, so a
    /// decode error leaves the previous content in place.
    pub fn parse(&self, src: &[u8]) -> Result<()> {
        let items = decode_items(src)?;
        let count = items.len();
        let fresh = BookState::from_items(items);

        let mut state = self.state.write();
        *state = fresh;
        debug!(items = count, unique = state.items.len(), "book replaced");
        logging::instrument("optimize", count, || state.optimize())
    }

    /// Fill from typed records, reading `id_field` and `name_field` of each
    ///
    /// Every record is read before the first write, so a missing attribute or
    /// an unusable field leaves the book unchanged.
    pub fn load_records<R: Record>(&self, records: &[R], id_field: &str, name_field: &str) -> Result<()> {
        let rows = record::read_rows(records, id_field, name_field, |field| field.to_text(name_field))?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write();
        for (id, name) in rows {
            state.set(id, name);
        }
        debug!(records = records.len(), items = state.items.len(), "loaded records");
        state.optimize()
    }

    /// Fill from a JSON array of record objects
    pub fn load_value(&self, value: &serde_json::Value, id_field: &str, name_field: &str) -> Result<()> {
        self.load_records(record::as_records(value)?, id_field, name_field)
    }
}

fn decode_items(src: &[u8]) -> Result<Vec<Item>> {
    let first = src.iter().find(|b| !b.is_ascii_whitespace());
    if first == Some(&b'{') {
        let snapshot: SnapshotInput = serde_json::from_slice(src)?;
        return Ok(snapshot.items);
    }
    Ok(serde_json::from_slice(src)?)
}

impl Serialize for Book {
    /// Emits the cached snapshot as-is, `null` if never optimized.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::Error as _;

        let json = self.json();
        if json.is_empty() {
            return serializer.serialize_unit();
        }
        let text = String::from_utf8(json.to_vec()).map_err(S::Error::custom)?;
        let raw = RawValue::from_string(text).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}
