//! Data models for scraped books and the countries API payload

use serde::{Deserialize, Serialize};
use url::Url;

/// A book listing scraped from the catalogue.
///
/// Field order is the column order of every CSV and JSON file written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub price: String,
    #[serde(default)]
    pub availability: Option<String>,
    pub product_page_url: String,
    pub star_rating: u8,
    pub category: String,
    #[serde(default)]
    pub publisher_country: Option<String>,
}

impl Book {
    /// Column names, in serialization order
    pub const FIELDS: [&'static str; 7] = [
        "title",
        "price",
        "availability",
        "product_page_url",
        "star_rating",
        "category",
        "publisher_country",
    ];
}

/// A category entry from the catalogue sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub url: Url,
}

/// One entry of the RestCountries `?fields=name` response
#[derive(Debug, Default, Deserialize)]
pub struct CountryRecord {
    #[serde(default)]
    pub name: Option<CountryName>,
}

/// Name block of a RestCountries entry
#[derive(Debug, Default, Deserialize)]
pub struct CountryName {
    #[serde(default)]
    pub common: Option<String>,
}

impl CountryRecord {
    /// The common name, if present and non-empty.
    pub fn common_name(self) -> Option<String> {
        self.name
            .and_then(|name| name.common)
            .filter(|common| !common.is_empty())
    }
}
