//! refbook-store
//!
//! In-memory reference books: small id to name lookup tables with a cached
//! JSON snapshot, a content hash and case-insensitive search.
//!
//! | Type       | Description |
//! |------------|-------------|
//! | [`Book`]     | One language, one id to name map |
//! | [`FlexBook`] | One [`Book`] per language with fallback to the default |
//!
//! # Example
//!
//! ```rust
//! use refbook_store::{FlexBook, FlexBookOptions};
//! use refbook_core::LangCode;
//!
//! let book = FlexBook::with_options(FlexBookOptions::new().with_default_lang("en"));
//! book.parse(r#"[{"id": 1, "name": {"en": "Open", "ru": "Открыт"}}]"#.as_bytes())?;
//!
//! assert_eq!(book.name(LangCode::from_tag("ru"), 1), "Открыт");
//! assert!(!book.json("ru").is_empty());
//! # Ok::<(), refbook_core::Error>(())
//! ```

pub mod book;
pub mod flexbook;
pub mod logging;
pub mod record;

// Re-export main types
pub use book::{content_hash, Book};
pub use flexbook::{FlexBook, FlexBookOptions};
pub use record::{Field, Record};

pub use refbook_core::{Error, Item, LangCode, MultiLangItem, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
