//! refbook Core Library
//!
//! This crate provides the item types, language codes, process-wide
//! settings and error handling shared by all refbook components.

pub mod config;
pub mod error;
pub mod types;

pub use config::{default_lang, not_found_name, set_default_lang, set_not_found_name};
pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
