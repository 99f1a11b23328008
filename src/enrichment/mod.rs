//! # Publisher country enrichment
//!
//! Stage two of the pipeline gives every scraped book a publisher country.
//! The catalogue has no such data, so a country is picked at random from the
//! list published by the RestCountries API.
//!
//! ## Caching
//!
//! The country list barely changes, so it is cached in a JSON file. The
//! file's modification time is the cache's creation time: a cache younger
//! than the TTL (24 hours by default) is served as-is, anything older is
//! refreshed from the API and overwritten. Age is measured on every call.
//!
//! ## Randomness
//!
//! [`assign_random_countries`] takes the random source as a parameter.
//! Production code passes `rand::thread_rng()`, tests pass a seeded `StdRng`.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{error, info, warn};

use crate::error::{Result, ScrapeError};
use crate::export::{read_json, write_pretty_json};
use crate::models::{Book, CountryRecord};
use crate::traits::{CountrySource, USER_AGENT};

/// Characters of an error body kept in the log
const ERROR_BODY_PREVIEW: usize = 500;

/// Client for the RestCountries `all` endpoint
pub struct RestCountriesClient {
    client: Client,
    url: String,
}

impl RestCountriesClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CountrySource for RestCountriesClient {
    async fn fetch_countries(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("fields", "name")])
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            error!(%status, body = %preview, "countries API request failed");

            return Err(ScrapeError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let records: Vec<CountryRecord> = response.json().await?;
        let countries = country_names(records);

        info!("Fetched {} countries from RestCountries API", countries.len());
        Ok(countries)
    }
}

/// Common names of `records`, skipping entries without one.
pub fn country_names(records: Vec<CountryRecord>) -> Vec<String> {
    records
        .into_iter()
        .filter_map(CountryRecord::common_name)
        .collect()
}

/// File cache in front of a [`CountrySource`]
#[derive(Debug, Clone)]
pub struct CountryCache {
    path: PathBuf,
    ttl: TimeDelta,
}

impl CountryCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    /// The cached list if the file exists and is younger than the TTL.
    pub fn read_fresh(&self) -> Result<Option<Vec<String>>> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let written_at = DateTime::<Utc>::from(metadata.modified()?);
        let age = Utc::now().signed_duration_since(written_at);

        if age < self.ttl {
            info!(written_at = %written_at.to_rfc3339(), "[CACHE] Using cached countries");
            return Ok(Some(read_json(&self.path)?));
        }

        info!("[CACHE] Cache expired, refreshing...");
        Ok(None)
    }

    /// Serve from the cache when fresh, otherwise fetch from `source` and rewrite the cache.
    pub async fn fetch_cached(&self, source: &dyn CountrySource) -> Result<Vec<String>> {
        if let Some(countries) = self.read_fresh()? {
            return Ok(countries);
        }

        let countries = source.fetch_countries().await?;

        write_pretty_json(&self.path, &countries)?;
        info!("[CACHE] Saved {} countries to cache file", countries.len());

        Ok(countries)
    }
}

/// Give every book a uniformly random country; no-op when `countries` is empty.
pub fn assign_random_countries<R: Rng + ?Sized>(books: &mut [Book], countries: &[String], rng: &mut R) {
    if countries.is_empty() {
        warn!("No countries available.");
        return;
    }

    for book in books {
        book.publisher_country = countries.choose(rng).cloned();
    }
}
