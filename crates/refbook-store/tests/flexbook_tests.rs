//! Integration tests for the multi-language book
//!
//! These tests cover:
//! - Fallback from a language book to the default language
//! - Backfilling of every known language on multi-language writes
//! - Shape detection in `parse` and record ingestion
//! - Mode conflicts between single- and multi-language writes
//! - Case-insensitive search per language

use std::sync::Arc;
use std::thread;

use serde_json::json;

use refbook_core::{not_found_name, Error, Item, LangCode, MultiLangItem};
use refbook_store::{FlexBook, FlexBookOptions};

fn lc(tag: &str) -> LangCode {
    LangCode::from_tag(tag)
}

/// Helper to create a book whose default language is `tag`
fn make_book(tag: &str) -> FlexBook {
    FlexBook::with_options(FlexBookOptions::new().with_default_lang(tag))
}

mod fallback_tests {
    use super::*;

    #[test]
    fn test_missing_default_translation() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("ru", "Привет"));

        assert_eq!(book.name(lc("en"), 1), not_found_name());
        assert_eq!(book.name(lc("ru"), 1), "Привет");
    }

    #[test]
    fn test_default_value_backfills_other_languages() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("ru", "Привет"));
        book.add_multi_lang_item(&MultiLangItem::new(2).with_name("en", "World"));

        assert_eq!(book.name(lc("ru"), 2), "World");
        assert_eq!(book.name(lc("en"), 2), "World");
    }

    #[test]
    fn test_late_language_falls_back_to_default() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("en", "Hello").with_name("ru", "Привет"));
        book.add_multi_lang_item(&MultiLangItem::new(2).with_name("en", "Bye").with_name("de", "Tschüss"));

        // the de book was created after id 1 and never received it
        assert!(!book.book("de").is_exist(1));
        assert_eq!(book.name(lc("de"), 1), "Hello");
        assert_eq!(book.name(lc("ru"), 2), "Bye");
    }

    #[test]
    fn test_default_write_overwrites_other_languages() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("ru", "Привет"));
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("en", "Hello"));

        // the second write has no ru value, so ru receives the default one
        assert_eq!(book.name(lc("ru"), 1), "Hello");
        assert_eq!(book.name(lc("en"), 1), "Hello");
    }

    #[test]
    fn test_backfilled_sentinel_is_permanent() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("en", "One").with_name("ru", "Один"));
        book.add_multi_lang_item(&MultiLangItem::new(5).with_name("de", "Fünf"));

        // a later default-language write does not repair the ru placeholder
        book.book("en").set(5, "Five");
        assert_eq!(book.name(lc("en"), 5), "Five");
        assert_eq!(book.name(lc("ru"), 5), not_found_name());
        assert_eq!(book.name(lc("de"), 5), "Fünf");
    }

    #[test]
    fn test_empty_default_value_uses_sentinel() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("en", "").with_name("ru", "Один"));
        book.add_multi_lang_item(&MultiLangItem::new(2).with_name("en", ""));

        assert_eq!(book.book("ru").get(2).as_deref(), Some(not_found_name().as_str()));
        assert_eq!(book.name(lc("en"), 2), "");
    }

    #[test]
    fn test_languages_grow_in_order() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("ru", "a").with_name("de", "b"));
        book.add_multi_lang_item(&MultiLangItem::new(2).with_name("ru", "c").with_name("el", "d"));
        assert_eq!(book.languages(), vec![lc("en"), lc("de"), lc("ru"), lc("el")]);
    }
}

mod parse_tests {
    use super::*;

    #[test]
    fn test_single_language_array() {
        let book = make_book("en");
        book.parse(br#"[{"id":1,"name":"A"},{"id":2,"name":"B"},{"id":6}]"#).unwrap();
        assert_eq!(book.len(), 3);
        assert_eq!(book.name(lc("en"), 6), "");
        assert!(!book.is_multi_lang());
        assert_ne!(book.hash("en"), 0);
    }

    #[test]
    fn test_multi_language_array() {
        let book = make_book("en");
        book.parse(
            r#"[{"id":1,"name":{"en":"Hello","ru":"Привет"}},{"id":2,"name":{"en":"World","ru":"Мир"}}]"#
                .as_bytes(),
        )
        .unwrap();

        assert!(book.is_multi_lang());
        assert_eq!(book.name(lc("ru"), 2), "Мир");
        assert!(!book.book("ru").is_stale());
        assert_ne!(book.hash("ru"), book.hash("en"));
    }

    #[test]
    fn test_mixed_shapes_rejected() {
        let book = make_book("en");
        book.parse(br#"[{"id": 9, "name": "Nine"}]"#).unwrap();
        let before = book.hash("en");

        let err = book
            .parse(br#"[{"id":1,"name":"Hello"},{"id":2,"name":{"en":"World","ru":"Mir"}}]"#)
            .unwrap_err();
        assert!(matches!(err, Error::HeterogeneousShape));
        assert_eq!(book.len(), 1);
        assert!(!book.is_exist(1));
        assert_eq!(book.hash("en"), before);
        assert!(!book.is_multi_lang());
    }

    #[test]
    fn test_single_items_after_translations() {
        let book = make_book("en");
        book.parse(br#"[{"id":1,"name":{"en":"Hello","ru":"Privet"}}]"#).unwrap();
        let err = book.parse(br#"[{"id":2,"name":"Two"}]"#).unwrap_err();
        assert!(err.is_programming_error());
        assert!(!book.is_exist(2));
    }

    #[test]
    fn test_nameless_elements_in_multi_language_book() {
        let book = make_book("en");
        book.parse(r#"[{"id":1,"name":{"en":"Hi","ru":"Привет"}}]"#.as_bytes()).unwrap();
        let before = book.hash("ru");

        book.parse(br#"[{"id": 5}, {"id": 6}]"#).unwrap();
        assert!(!book.is_exist(5));
        assert_eq!(book.len(), 1);
        assert_eq!(book.hash("ru"), before);
    }

    #[test]
    fn test_decode_error() {
        let book = make_book("en");
        assert!(matches!(book.parse(b"[{"), Err(Error::Decode(_))));
        assert!(matches!(book.parse(br#"[{"id":"x","name":"A"}]"#), Err(Error::Decode(_))));
        assert!(book.is_empty());
    }

    #[test]
    fn test_cache_json_per_language() {
        let book = make_book("en");
        book.parse(r#"[{"id":1,"name":{"en":"Hello","ru":"Привет"}}]"#.as_bytes()).unwrap();

        let ru: serde_json::Value = serde_json::from_slice(&book.json("ru")).unwrap();
        assert_eq!(ru["items"], json!([{"id": 1, "name": "Привет"}]));
        // unknown language serves the default book
        assert_eq!(book.json("fr"), book.json("en"));
    }
}

mod record_tests {
    use super::*;

    #[test]
    fn test_text_names_are_single_language() {
        let book = make_book("en");
        let rows = json!([{"ID": 1, "Name": "A"}, {"ID": 2, "Name": "B"}]);
        book.load_value(&rows, "ID", "Name").unwrap();
        assert_eq!(book.len(), 2);
        assert!(!book.is_multi_lang());
    }

    #[test]
    fn test_object_names_are_translations() {
        let book = make_book("en");
        let rows = json!([
            {"ID": 1, "Name": {"en": "hey", "ru": "хай"}},
            {"ID": 2, "Name": {"en": "hi", "ru": "привет"}},
            {"ID": 3, "Name": {"ru": "привет"}},
        ]);
        book.load_value(&rows, "ID", "Name").unwrap();

        assert_eq!(book.name(lc("ru"), 3), "привет");
        assert_eq!(book.name(lc("en"), 3), not_found_name());
        assert_eq!(book.name(lc("en"), 1), "hey");
    }

    #[test]
    fn test_byte_names_are_translations() {
        struct Row {
            id: i64,
            name: Vec<u8>,
        }

        impl refbook_store::Record for Row {
            fn field(&self, name: &str) -> Option<refbook_store::Field<'_>> {
                match name {
                    "id" => Some(refbook_store::Field::Int(self.id)),
                    "name" => Some(refbook_store::Field::Bytes(&self.name)),
                    _ => None,
                }
            }
        }

        let rows = vec![
            Row { id: 1, name: br#"{"en":"Open","el":"Anoikto"}"#.to_vec() },
            Row { id: 2, name: br#"{"en":"Closed"}"#.to_vec() },
        ];
        let book = make_book("en");
        book.load_records(&rows, "id", "name").unwrap();
        assert_eq!(book.name(lc("el"), 2), "Closed");

        let bad = vec![Row { id: 3, name: b"{".to_vec() }];
        assert!(book.load_records(&bad, "id", "name").unwrap_err().is_input_error());
    }

    #[test]
    fn test_mixed_name_kinds_rejected() {
        let book = make_book("en");
        let rows = json!([{"ID": 1, "Name": "A"}, {"ID": 2, "Name": {"en": "B"}}]);
        assert!(matches!(book.load_value(&rows, "ID", "Name"), Err(Error::HeterogeneousShape)));
        assert!(book.is_empty());
    }

    #[test]
    fn test_missing_attribute() {
        let book = make_book("en");
        let rows = json!([{"ID": 1, "Title": "A"}]);
        let err = book.load_value(&rows, "ID", "Name").unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { .. }));
    }

    #[test]
    fn test_empty_collection_on_multi_language_book() {
        let book = make_book("en");
        book.add_multi_lang_item(&MultiLangItem::new(1).with_name("en", "Hi").with_name("ru", "Привет"));

        book.load_value(&json!([]), "ID", "Name").unwrap();
        book.load_value(&serde_json::Value::Null, "ID", "Name").unwrap();
        let empty: Vec<serde_json::Value> = Vec::new();
        book.load_records(&empty, "ID", "Name").unwrap();

        assert_eq!(book.len(), 1);
        assert_eq!(book.name(lc("ru"), 1), "Привет");
        // an empty load leaves the cache as it was
        assert!(book.book("ru").is_stale());
    }

    #[test]
    fn test_null_names_read_as_empty_text() {
        let book = make_book("en");
        let rows = json!([{"ID": 1, "Name": null}, {"ID": 2, "Name": "B"}]);
        book.load_value(&rows, "ID", "Name").unwrap();

        assert!(book.is_exist(1));
        assert_eq!(book.name(lc("en"), 1), "");
        assert!(!book.is_multi_lang());
    }

    #[test]
    fn test_not_a_collection() {
        let book = make_book("en");
        let err = book.load_value(&json!("rows"), "ID", "Name").unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}

mod mode_tests {
    use super::*;

    #[test]
    fn test_new_uses_global_default() {
        let book = FlexBook::new();
        assert_eq!(book.default_lang(), refbook_core::default_lang());
        assert_eq!(book.languages(), vec![refbook_core::default_lang()]);

        book.add_item(&Item::new(1, "One")).unwrap();
        assert_eq!(book.name(book.default_lang(), 1), "One");
        assert!(!book.is_multi_lang());
    }

    #[test]
    fn test_add_items_then_translations() {
        let book = make_book("en");
        book.add_items(&[Item::new(1, "One"), Item::new(2, "Two")]).unwrap();
        book.add_multi_lang_item(&MultiLangItem::new(3).with_name("ru", "Три"));

        // existing default entries serve as fallback for the new language
        assert_eq!(book.name(lc("ru"), 1), "One");
        assert_eq!(book.name(lc("ru"), 3), "Три");
        assert!(matches!(
            book.add_item(&Item::new(4, "Four")),
            Err(Error::ModeConflict { .. })
        ));
    }
}

mod search_tests {
    use super::*;

    fn translated() -> FlexBook {
        let book = make_book("en");
        book.add_multi_lang_items(&[
            MultiLangItem::new(1).with_name("en", "Open").with_name("ru", "Открыт"),
            MultiLangItem::new(2).with_name("en", "Reopened").with_name("ru", "Переоткрыт"),
            MultiLangItem::new(3).with_name("en", "Closed"),
        ]);
        book.optimize().unwrap();
        book
    }

    #[test]
    fn test_contains_in_each_language() {
        let book = translated();

        let mut ids = Vec::new();
        book.contains("en", "OPEN", &mut ids);
        assert_eq!(ids, vec![1, 2]);

        ids.clear();
        book.contains("ru", "открыт", &mut ids);
        assert_eq!(ids, vec![1, 2]);

        ids.clear();
        book.contains("ru", "closed", &mut ids);
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_contains_unknown_language_searches_default() {
        let book = translated();
        let mut ids = Vec::new();
        book.contains("fr", "closed", &mut ids);
        assert_eq!(ids, vec![3]);
    }
}

mod concurrency_tests {
    use super::*;

    #[test]
    fn test_parallel_multi_lang_writers() {
        let book = Arc::new(make_book("en"));

        let writers: Vec<_> = ["ru", "de", "el", "fr"]
            .into_iter()
            .enumerate()
            .map(|(n, tag)| {
                let book = Arc::clone(&book);
                thread::spawn(move || {
                    for i in 0..50 {
                        let id = (n as i64) * 100 + i;
                        book.add_multi_lang_item(
                            &MultiLangItem::new(id).with_name("en", format!("en {id}")).with_name(tag, format!("{tag} {id}")),
                        );
                        let _ = book.name(LangCode::from_tag(tag), id);
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(book.languages().len(), 5);
        assert_eq!(book.len(), 200);
        assert_eq!(book.name(lc("de"), 149), "de 149");
        book.optimize().unwrap();
        for tag in ["en", "ru", "de", "el", "fr"] {
            assert!(!book.book(tag).is_stale());
        }
    }
}
