//! Record extraction from fetched pages
//!
//! Extraction is pluggable through the [`Extractor`] trait. The default
//! [`NextDataExtractor`] reads the JSON payload that Next.js sites embed in a
//! `<script id="__NEXT_DATA__">` tag and maps each listed business unit to a
//! [`SearchRecord`].

use crate::record::{Record, SearchRecord};
use crate::TrawlError;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while extracting records from one page
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page has no structured payload at all
    #[error("No JSON payload found on page")]
    MissingPayload,

    /// The payload exists but does not have the expected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// One entry of the payload could not be turned into a record
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Result of extracting one record
pub type RecordResult<R> = Result<R, ExtractError>;

/// Maps a fetched document to zero or more records
///
/// An `Err` means the page as a whole could not be read. Inside an `Ok`, each
/// entry is either a record or the reason that single entry was skipped, in
/// document order.
pub trait Extractor: Send + Sync + 'static {
    type Record: Record;

    fn extract(&self, body: &str) -> Result<Vec<RecordResult<Self::Record>>, ExtractError>;
}

/// Business unit entry as it appears in the search payload
#[derive(Debug, Deserialize)]
struct BusinessUnit {
    #[serde(rename = "displayName", default)]
    display_name: String,
    #[serde(default)]
    stars: f64,
    #[serde(rename = "trustScore", default)]
    trust_score: f64,
    #[serde(rename = "numberOfReviews", default)]
    number_of_reviews: u64,
}

/// Extracts search results from an embedded `__NEXT_DATA__` payload
#[derive(Debug)]
pub struct NextDataExtractor {
    script: Selector,
}

impl NextDataExtractor {
    const SCRIPT_SELECTOR: &'static str = "script#__NEXT_DATA__";

    pub fn new() -> Result<Self, TrawlError> {
        let script = Selector::parse(Self::SCRIPT_SELECTOR).map_err(|e| TrawlError::Selector {
            selector: Self::SCRIPT_SELECTOR.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { script })
    }

    fn payload(&self, body: &str) -> Result<Value, ExtractError> {
        let document = Html::parse_document(body);
        let script = document
            .select(&self.script)
            .next()
            .ok_or(ExtractError::MissingPayload)?;
        let json: String = script.text().collect();

        serde_json::from_str(&json).map_err(|e| ExtractError::MalformedPayload(e.to_string()))
    }
}

impl Extractor for NextDataExtractor {
    type Record = SearchRecord;

    fn extract(&self, body: &str) -> Result<Vec<RecordResult<SearchRecord>>, ExtractError> {
        let payload = self.payload(body)?;

        let units = payload
            .pointer("/props/pageProps/businessUnits")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ExtractError::MalformedPayload(
                    "props.pageProps.businessUnits is missing or not a list".to_string(),
                )
            })?;

        Ok(units
            .iter()
            .map(|unit| {
                BusinessUnit::deserialize(unit)
                    .map(|unit| {
                        SearchRecord::new(
                            &unit.display_name,
                            unit.stars,
                            unit.trust_score,
                            unit.number_of_reviews,
                        )
                    })
                    .map_err(|e| ExtractError::InvalidRecord(e.to_string()))
            })
            .collect())
    }
}
