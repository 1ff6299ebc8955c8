//! Multi-language reference book.
//!
//! A [`FlexBook`] keeps one [`Book`] per language. Index 0 always holds the
//! default language. Languages are only ever appended; a store, once created,
//! lives as long as the `FlexBook`.
//!
//! Lock order is `FlexBook` first, then each `Book`.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use refbook_core::{default_lang, not_found_name, Error, Item, LangCode, MultiLangItem, Result};

use crate::book::Book;
use crate::logging;
use crate::record::{self, Field, Record};

/// Construction options for [`FlexBook`]
#[derive(Debug, Clone, Default)]
pub struct FlexBookOptions {
    default_lang: Option<String>,
}

impl FlexBookOptions {
    /// Options with the global default language
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `tag` instead of the global default language
    ///
    /// An empty tag keeps the global default.
    pub fn with_default_lang(mut self, tag: impl Into<String>) -> Self {
        self.default_lang = Some(tag.into());
        self
    }
}

#[derive(Debug)]
struct Shelves {
    languages: Vec<LangCode>,
    books: Vec<Arc<Book>>,
}

impl Shelves {
    fn index_of(&self, lang: LangCode) -> Option<usize> {
        self.languages.iter().position(|&lc| lc == lang)
    }

    /// Unknown or empty tags resolve to the default store.
    fn resolve(&self, tag: &str) -> usize {
        let lang = LangCode::from_tag(tag);
        if lang.is_default() {
            return 0;
        }
        self.index_of(lang).unwrap_or(0)
    }
}

/// Name column of a record, before it is routed to a book
enum Names {
    Single(String),
    Multi(BTreeMap<String, String>),
}

/// In-memory reference book with optional translations
#[derive(Debug)]
pub struct FlexBook {
    default_lang: LangCode,
    shelves: RwLock<Shelves>,
}

impl FlexBook {
    /// Create a book for the global default language
    pub fn new() -> Self {
        Self::with_options(FlexBookOptions::default())
    }

    /// Create a book with explicit options
    pub fn with_options(options: FlexBookOptions) -> Self {
        let default_lang = match options.default_lang.as_deref() {
            Some(tag) if !tag.is_empty() => LangCode::from_tag(tag),
            _ => default_lang(),
        };
        Self {
            default_lang,
            shelves: RwLock::new(Shelves {
                languages: vec![default_lang],
                books: vec![Arc::new(Book::new())],
            }),
        }
    }

    /// Language of the default book
    pub fn default_lang(&self) -> LangCode {
        self.default_lang
    }

    /// Known languages, default first
    pub fn languages(&self) -> Vec<LangCode> {
        self.shelves.read().languages.clone()
    }

    /// Whether more than one language book exists
    pub fn is_multi_lang(&self) -> bool {
        self.shelves.read().books.len() > 1
    }

    /// Book for `tag`, or the default book if the language is unknown
    pub fn book(&self, tag: &str) -> Arc<Book> {
        let shelves = self.shelves.read();
        Arc::clone(&shelves.books[shelves.resolve(tag)])
    }

    /// Name of `id` in `lang`, falling back to the default language
    pub fn name(&self, lang: LangCode, id: i64) -> String {
        let shelves = self.shelves.read();
        if shelves.books.len() == 1 {
            return shelves.books[0].name(id);
        }

        let Some(idx) = shelves.index_of(lang) else {
            return not_found_name();
        };
        if let Some(name) = shelves.books[idx].get(id) {
            return name;
        }
        if lang != self.default_lang {
            if let Some(name) = shelves.books[0].get(id) {
                return name;
            }
        }
        not_found_name()
    }

    /// Whether `id` is present in the default book
    pub fn is_exist(&self, id: i64) -> bool {
        self.shelves.read().books[0].is_exist(id)
    }

    /// Items count of the default book
    pub fn len(&self) -> usize {
        self.shelves.read().books[0].len()
    }

    /// Whether the default book is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached snapshot of the book for `tag`
    pub fn json(&self, tag: &str) -> Bytes {
        self.book(tag).json()
    }

    /// Cached hash of the book for `tag`
    pub fn hash(&self, tag: &str) -> u64 {
        self.book(tag).hash()
    }

    /// Case-insensitive search in the book for `tag`
    pub fn contains(&self, tag: &str, query: &str, out: &mut Vec<i64>) {
        self.book(tag).contains(query, out);
    }

    /// Refresh the cache of every language book
    pub fn optimize(&self) -> Result<()> {
        let shelves = self.shelves.read();
        for (lang, book) in shelves.languages.iter().zip(&shelves.books) {
            if book.is_stale() {
                debug!(lang = %lang, "optimizing");
                book.optimize()?;
            }
        }
        Ok(())
    }

    /// Add a single-language item
    ///
    /// Fails with [`Error::ModeConflict`] once translations have been added.
    pub fn add_item(&self, item: &Item) -> Result<()> {
        self.add_items(std::slice::from_ref(item))
    }

    /// Add single-language items
    ///
    /// Fails with [`Error::ModeConflict`] once translations have been added;
    /// nothing is written in that case.
    pub fn add_items(&self, items: &[Item]) -> Result<()> {
        let shelves = self.shelves.read();
        if shelves.books.len() > 1 {
            warn!(languages = shelves.books.len(), "single-language items added to a multi-language book");
            return Err(Error::ModeConflict { operation: "add_items" });
        }

        let book = &shelves.books[0];
        for item in items {
            book.set(item.id, item.name.as_str());
        }
        Ok(())
    }

    /// Add items with translations, see [`FlexBook::add_multi_lang_item`]
    pub fn add_multi_lang_items(&self, items: &[MultiLangItem]) {
        for item in items {
            self.add_multi_lang_item(item);
        }
    }

    /// Add an item with translations
    ///
    /// Tags that are not two characters long are ignored. Books for new
    /// languages are created as needed. Every known language then receives a
    /// value: the item's own translation, else its default-language name, else
    /// the not-found name.
    pub fn add_multi_lang_item(&self, item: &MultiLangItem) {
        let names: BTreeMap<LangCode, &str> = item
            .name
            .iter()
            .filter_map(|(tag, name)| {
                let lang = LangCode::from_tag(tag);
                if lang.is_default() {
                    warn!(id = item.id, tag = %tag, "ignoring invalid language tag");
                    return None;
                }
                Some((lang, name.as_str()))
            })
            .collect();

        let not_found = not_found_name();
        let fallback = names
            .get(&self.default_lang)
            .copied()
            .filter(|name| !name.is_empty())
            .unwrap_or(not_found.as_str());

        let mut shelves = self.shelves.write();
        for &lang in names.keys() {
            if shelves.index_of(lang).is_none() {
                debug!(lang = %lang, "adding language book");
                shelves.languages.push(lang);
                shelves.books.push(Arc::new(Book::new()));
            }
        }

        for (lang, book) in shelves.languages.iter().zip(&shelves.books) {
            let name = names.get(lang).copied().unwrap_or(fallback);
            book.set(item.id, name);
        }
    }

    /// Add items from JSON
    ///
    /// Accepts `[{"id": 1, "name": "Hello"}, ...]` or
    /// `[{"id": 1, "name": {"en": "Hello", "ru": "Привет"}}, ...]`. Arrays that
    /// mix both shapes are rejected. Elements without a name count toward
    /// neither shape; if no element has one, a multi-language book is left
    /// untouched. The whole input is decoded before anything is written; on
    /// success every book is optimized.
    pub fn parse(&self, src: &[u8]) -> Result<()> {
        if src.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }

        let value: Value = serde_json::from_slice(src)?;
        let Value::Array(elements) = value else {
            return Err(Error::shape_mismatch("src is not a JSON array"));
        };
        if elements.is_empty() {
            return Ok(());
        }

        let (mut multi, mut single) = (0usize, 0usize);
        for element in &elements {
            match element.get("name") {
                None => {}
                Some(Value::Object(_)) => multi += 1,
                Some(_) => single += 1,
            }
        }
        if multi > 0 && single > 0 {
            return Err(Error::HeterogeneousShape);
        }
        if multi == 0 && single == 0 && self.is_multi_lang() {
            debug!(elements = elements.len(), "no names to add");
            return Ok(());
        }

        let count = elements.len();
        logging::instrument("parse", count, || -> Result<()> {
            if multi > 0 {
                let items: Vec<MultiLangItem> = serde_json::from_value(Value::Array(elements))?;
                self.add_multi_lang_items(&items);
            } else {
                let items: Vec<Item> = serde_json::from_value(Value::Array(elements))?;
                self.add_items(&items)?;
            }
            self.optimize()
        })
    }

    /// Fill from typed records
    ///
    /// Text and null names go through [`FlexBook::add_items`]; byte or JSON
    /// object names are decoded as tag to name maps and go through
    /// [`FlexBook::add_multi_lang_item`]. An empty collection writes nothing.
    pub fn load_records<R: Record>(&self, records: &[R], id_field: &str, name_field: &str) -> Result<()> {
        let rows = record::read_rows(records, id_field, name_field, |field| match field {
            Field::Text(_) | Field::Json(Value::Null) => field.to_text(name_field).map(Names::Single),
            other => other.to_translations(name_field).map(Names::Multi),
        })?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut items = Vec::new();
        let mut translated = Vec::new();
        for (id, names) in rows {
            match names {
                Names::Single(name) => items.push(Item { id, name }),
                Names::Multi(name) => translated.push(MultiLangItem { id, name }),
            }
        }
        if !items.is_empty() && !translated.is_empty() {
            return Err(Error::HeterogeneousShape);
        }

        if translated.is_empty() {
            self.add_items(&items)?;
        } else {
            self.add_multi_lang_items(&translated);
        }
        self.optimize()
    }

    /// Fill from a JSON array of record objects
    pub fn load_value(&self, value: &Value, id_field: &str, name_field: &str) -> Result<()> {
        self.load_records(record::as_records(value)?, id_field, name_field)
    }
}

impl Default for FlexBook {
    fn default() -> Self {
        Self::new()
    }
}
