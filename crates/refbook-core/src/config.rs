//! Process-wide settings
//!
//! The default language is read by multi-language books created without an
//! explicit language. The not-found name is what lookups return for absent ids.

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::types::LangCode;

/// Language used when nothing else is configured
pub const INITIAL_DEFAULT_LANG: &str = "en";

/// Name returned for ids that are not in a book
pub const INITIAL_NOT_FOUND_NAME: &str = "?";

static DEFAULT_LANG: Lazy<RwLock<LangCode>> =
    Lazy::new(|| RwLock::new(LangCode::from_tag(INITIAL_DEFAULT_LANG)));

static NOT_FOUND_NAME: Lazy<RwLock<String>> =
    Lazy::new(|| RwLock::new(INITIAL_NOT_FOUND_NAME.to_string()));

/// Current global default language
pub fn default_lang() -> LangCode {
    *DEFAULT_LANG.read()
}

/// Replace the global default language
///
/// An invalid tag stores `LangCode::DEFAULT`.
pub fn set_default_lang(tag: &str) {
    *DEFAULT_LANG.write() = LangCode::from_tag(tag);
}

/// Current not-found name
pub fn not_found_name() -> String {
    NOT_FOUND_NAME.read().clone()
}

/// Replace the not-found name
pub fn set_not_found_name(name: impl Into<String>) {
    *NOT_FOUND_NAME.write() = name.into();
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both globals are touched by this test only, so it cannot race.
    #[test]
    fn test_globals_update_and_restore() {
        assert_eq!(default_lang(), LangCode::from_tag("en"));
        assert_eq!(not_found_name(), "?");

        set_default_lang("ru");
        assert_eq!(default_lang(), LangCode::from_tag("ru"));
        set_default_lang("russian");
        assert!(default_lang().is_default());
        set_default_lang(INITIAL_DEFAULT_LANG);

        set_not_found_name("<missing>");
        assert_eq!(not_found_name(), "<missing>");
        set_not_found_name(INITIAL_NOT_FOUND_NAME);
        assert_eq!(not_found_name(), "?");
    }
}
