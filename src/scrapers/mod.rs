//! Site-specific scrapers and their side stores

pub mod backup;
pub mod catalog;

pub use backup::HtmlBackup;
pub use catalog::CatalogScraper;
