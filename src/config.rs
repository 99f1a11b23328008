//! Environment driven settings
//!
//! Every value has a default so the binary runs with no configuration at all.
//! A `.env` file in the working directory is loaded by `main` before
//! [`Settings::from_env`] is called.
//!
//! | Variable                          | Default                                 |
//! |-----------------------------------|-----------------------------------------|
//! | `BOOK_SCOUT_BASE_URL`             | `https://books.toscrape.com/`           |
//! | `BOOK_SCOUT_HTML_BACKUP_DIR`      | `html_backup`                           |
//! | `BOOK_SCOUT_BOOKS_JSON`           | `books.json`                            |
//! | `BOOK_SCOUT_BOOKS_CSV`            | `books.csv`                             |
//! | `BOOK_SCOUT_ENRICHED_JSON`        | `books_with_country.json`               |
//! | `BOOK_SCOUT_ENRICHED_CSV`         | `books_with_country.csv`                |
//! | `BOOK_SCOUT_REQUEST_DELAY_MS`     | `100`                                   |
//! | `BOOK_SCOUT_MAX_PAGES`            | `1000`                                  |
//! | `BOOK_SCOUT_COUNTRIES_URL`        | `https://restcountries.com/v3.1/all`    |
//! | `BOOK_SCOUT_COUNTRIES_CACHE`      | `countries_cache.json`                  |
//! | `BOOK_SCOUT_COUNTRIES_CACHE_TTL_SECS` | `86400`                             |
//! | `BOOK_SCOUT_API_KEY`              | `hlink`                                 |
//! | `BOOK_SCOUT_LISTEN_ADDR`          | `127.0.0.1:8000`                        |
//! | `BOOK_SCOUT_STORE_FILE`           | `data/books_with_country.json`          |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_BASE_URL: &str = "https://books.toscrape.com/";
pub const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Debug, Clone)]
pub struct Settings {
    pub scrape: ScrapeSettings,
    pub enrich: EnrichSettings,
    pub api: ApiSettings,
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub base_url: String,
    pub html_backup_dir: PathBuf,
    pub output_json: PathBuf,
    pub output_csv: PathBuf,
    /// Pause after every successfully parsed product
    pub request_delay: Duration,
    pub max_pages: u32,
}

#[derive(Debug, Clone)]
pub struct EnrichSettings {
    pub input_json: PathBuf,
    pub output_json: PathBuf,
    pub output_csv: PathBuf,
    pub countries_url: String,
    pub cache_file: PathBuf,
    pub cache_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub api_key: String,
    pub listen_addr: String,
    pub store_file: PathBuf,
}

impl Settings {
    /// Reads settings from `BOOK_SCOUT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let output_json = env_path("BOOK_SCOUT_BOOKS_JSON", "books.json");

        let scrape = ScrapeSettings {
            base_url: env_or("BOOK_SCOUT_BASE_URL", DEFAULT_BASE_URL),
            html_backup_dir: env_path("BOOK_SCOUT_HTML_BACKUP_DIR", "html_backup"),
            output_json: output_json.clone(),
            output_csv: env_path("BOOK_SCOUT_BOOKS_CSV", "books.csv"),
            request_delay: Duration::from_millis(env_parse("BOOK_SCOUT_REQUEST_DELAY_MS", 100)?),
            max_pages: env_parse("BOOK_SCOUT_MAX_PAGES", 1000)?,
        };

        let enrich = EnrichSettings {
            input_json: output_json,
            output_json: env_path("BOOK_SCOUT_ENRICHED_JSON", "books_with_country.json"),
            output_csv: env_path("BOOK_SCOUT_ENRICHED_CSV", "books_with_country.csv"),
            countries_url: env_or("BOOK_SCOUT_COUNTRIES_URL", DEFAULT_COUNTRIES_URL),
            cache_file: env_path("BOOK_SCOUT_COUNTRIES_CACHE", "countries_cache.json"),
            cache_ttl: Duration::from_secs(env_parse(
                "BOOK_SCOUT_COUNTRIES_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL.as_secs(),
            )?),
        };

        let api = ApiSettings {
            api_key: env_or("BOOK_SCOUT_API_KEY", "hlink"),
            listen_addr: env_or("BOOK_SCOUT_LISTEN_ADDR", "127.0.0.1:8000"),
            store_file: env_path("BOOK_SCOUT_STORE_FILE", "data/books_with_country.json"),
        };

        Ok(Self {
            scrape,
            enrich,
            api,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env_or(key, default))
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
