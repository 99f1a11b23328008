use anyhow::{Context, Result};
use rand::Rng;
use tracing::info;
use url::Url;

use crate::config::{EnrichSettings, ScrapeSettings, Settings};
use crate::enrichment::{CountryCache, RestCountriesClient, assign_random_countries};
use crate::export;
use crate::fetcher::HttpFetcher;
use crate::models::Book;
use crate::scrapers::{CatalogScraper, HtmlBackup};
use crate::traits::{CountrySource, PageFetcher, ScraperConfig, SiteSelectors};

/// Drives the two scrape stages against the live sites
#[derive(Clone)]
pub struct BookScout {
    settings: Settings,
}

impl BookScout {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Stage 1: crawl the catalogue and write `books.csv` / `books.json`.
    pub async fn run_scrape(&self) -> Result<Vec<Book>> {
        let fetcher = HttpFetcher::new().context("failed to build HTTP client")?;
        let scraper = catalog_scraper(fetcher, &self.settings.scrape)?;

        scrape_to_files(&scraper, &self.settings.scrape).await
    }

    /// Stage 2: give every stage-1 book a country and write the `_with_country` files.
    pub async fn run_enrich(&self) -> Result<Vec<Book>> {
        let client = RestCountriesClient::new(&self.settings.enrich.countries_url)
            .context("failed to build countries client")?;

        enrich_files(&self.settings.enrich, &client, &mut rand::thread_rng()).await
    }
}

pub fn catalog_scraper<F: PageFetcher>(fetcher: F, settings: &ScrapeSettings) -> Result<CatalogScraper<F>> {
    let base_url = Url::parse(&settings.base_url)
        .with_context(|| format!("invalid base URL {:?}", settings.base_url))?;

    let config = ScraperConfig {
        base_url,
        selectors: SiteSelectors::default(),
        request_delay: settings.request_delay,
        max_pages: settings.max_pages,
    };

    Ok(CatalogScraper::new(
        fetcher,
        config,
        HtmlBackup::new(&settings.html_backup_dir),
    )?)
}

pub async fn scrape_to_files<F: PageFetcher>(
    scraper: &CatalogScraper<F>,
    settings: &ScrapeSettings,
) -> Result<Vec<Book>> {
    let books = scraper.scrape_all().await.context("catalogue scrape failed")?;

    info!("TOTAL books scraped: {}", books.len());

    export::save_csv(&books, &settings.output_csv)?;
    export::save_json(&books, &settings.output_json)?;

    Ok(books)
}

pub async fn enrich_files<R: Rng + ?Sized>(
    settings: &EnrichSettings,
    source: &dyn CountrySource,
    rng: &mut R,
) -> Result<Vec<Book>> {
    let mut books = export::load_json(&settings.input_json)
        .with_context(|| format!("failed to read {}", settings.input_json.display()))?;

    let cache = CountryCache::new(&settings.cache_file, settings.cache_ttl);
    let countries = cache
        .fetch_cached(source)
        .await
        .context("failed to load country list")?;

    assign_random_countries(&mut books, &countries, rng);

    export::save_csv(&books, &settings.output_csv)?;
    export::save_json(&books, &settings.output_json)?;

    Ok(books)
}
