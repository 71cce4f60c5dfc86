//! Extracted records
//!
//! A record is one validated row of harvested data. Every record type is
//! serialized with serde, so its column order is its field declaration order,
//! and exposes a natural key used by the storage pipeline to drop duplicates.

mod search;

pub use search::SearchRecord;

use serde::Serialize;

/// A unit of extracted data that can flow through the storage pipeline
pub trait Record: Serialize + Send + Sync + 'static {
    /// The key identifying duplicates across a whole run
    fn natural_key(&self) -> &str;
}

/// Normalizes a text field: surrounding whitespace is trimmed and an empty
/// result is replaced with the `No <field>` placeholder.
///
/// # Examples
///
/// ```
/// use search_trawler::record::clean_text_field;
///
/// assert_eq!(clean_text_field("name", "  Acme VPN "), "Acme VPN");
/// assert_eq!(clean_text_field("name", ""), "No name");
/// ```
pub fn clean_text_field(field: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        format!("No {}", field)
    } else {
        trimmed.to_string()
    }
}
