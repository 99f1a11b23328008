//! Traits and configuration for the catalogue crawl and its collaborators

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// Browser user agent sent with every catalogue request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Configuration for a catalogue scraper
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Home page of the catalogue, also used to resolve category links
    pub base_url: Url,
    /// CSS selectors for extracting data
    pub selectors: SiteSelectors,
    /// Pause after every successfully parsed product
    pub request_delay: std::time::Duration,
    /// Safety limit on listing pages followed per category
    pub max_pages: u32,
}

/// CSS selectors for the parts of the catalogue we read
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Category links in the sidebar navigation
    pub category_link: String,
    /// Container for a single product card on a listing page
    pub product_container: String,
    /// Product link within a product card
    pub product_link: String,
    /// "next" pagination link
    pub pagination_next: String,
    /// Product page heading
    pub title: String,
    /// Product page price
    pub price: String,
    /// Product page stock status
    pub availability: String,
    /// Product page rating element, whose class list carries the rating word
    pub star_rating: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            category_link: "ul.nav.nav-list > li > ul > li > a".to_string(),
            product_container: "article.product_pod".to_string(),
            product_link: "h3 a".to_string(),
            pagination_next: "li.next a".to_string(),
            title: "h1".to_string(),
            price: "p.price_color".to_string(),
            availability: "p.instock.availability".to_string(),
            star_rating: "p.star-rating".to_string(),
        }
    }
}

/// Source of raw page bodies
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body.
    ///
    /// # Errors
    /// * `ScrapeError::Status` if the server answers with a non-success status
    /// * `ScrapeError::Request` if the request cannot be completed
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// Source of country names used to enrich books
#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<String>>;
}
