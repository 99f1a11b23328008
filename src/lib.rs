//! Book catalogue scraper, country enrichment and REST API.
//!
//! Stage 1 ([`book_scout::BookScout::run_scrape`]) crawls books.toscrape.com,
//! stage 2 ([`book_scout::BookScout::run_enrich`]) assigns publisher countries,
//! and [`api::serve`] exposes the result over HTTP.

pub mod api;
pub mod book_scout;
pub mod config;
pub mod database;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod models;
pub mod scrapers;
pub mod traits;
