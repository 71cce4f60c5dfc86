use crate::record::{clean_text_field, Record};
use serde::Serialize;

/// One business listed on a search results page
///
/// Columns are written in field order: `name,stars,rating,num_reviews`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRecord {
    name: String,
    stars: f64,
    rating: f64,
    num_reviews: u64,
}

impl SearchRecord {
    /// Builds a record, normalizing the text fields
    pub fn new(name: &str, stars: f64, rating: f64, num_reviews: u64) -> Self {
        Self {
            name: clean_text_field("name", name),
            stars,
            rating,
            num_reviews,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stars(&self) -> f64 {
        self.stars
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn num_reviews(&self) -> u64 {
        self.num_reviews
    }
}

impl Record for SearchRecord {
    fn natural_key(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_name() {
        let record = SearchRecord::new("  NordVPN ", 4.5, 4.3, 12000);
        assert_eq!(record.name(), "NordVPN");
        assert_eq!(record.natural_key(), "NordVPN");
        assert_eq!(record.num_reviews(), 12000);
    }

    #[test]
    fn test_empty_name_gets_placeholder() {
        let record = SearchRecord::new("", 0.0, 0.0, 0);
        assert_eq!(record.name(), "No name");
    }

    #[test]
    fn test_column_order_follows_fields() {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer
            .serialize(SearchRecord::new("Proton VPN", 4.0, 3.9, 800))
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(
            out,
            "name,stars,rating,num_reviews\nProton VPN,4.0,3.9,800\n"
        );
    }
}
