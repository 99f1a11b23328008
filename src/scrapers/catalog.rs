//! books.toscrape.com catalogue crawler
//!
//! Walks the sidebar categories, follows each category's "next" links and
//! parses every product page into a [`Book`]. Requests are issued one at a
//! time; a failed product is logged and skipped, a failed listing page
//! aborts the crawl.

use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::models::{Book, Category};
use crate::scrapers::backup::HtmlBackup;
use crate::traits::{PageFetcher, ScraperConfig, SiteSelectors};

/// Stock text fragments removed before the remaining count is kept
const AVAILABILITY_NOISE: [&str; 4] = ["In stock", "available", "(", ")"];

/// Compiled form of [`SiteSelectors`]
struct Selectors {
    category_link: Selector,
    product_container: Selector,
    product_link: Selector,
    pagination_next: Selector,
    title: Selector,
    price: Selector,
    availability: Selector,
    star_rating: Selector,
}

impl Selectors {
    fn compile(selectors: &SiteSelectors) -> Result<Self> {
        Ok(Self {
            category_link: compile(&selectors.category_link)?,
            product_container: compile(&selectors.product_container)?,
            product_link: compile(&selectors.product_link)?,
            pagination_next: compile(&selectors.pagination_next)?,
            title: compile(&selectors.title)?,
            price: compile(&selectors.price)?,
            availability: compile(&selectors.availability)?,
            star_rating: compile(&selectors.star_rating)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid selector {selector:?}: {e:?}")))
}

/// Catalogue scraper generic over where pages come from
pub struct CatalogScraper<F> {
    fetcher: F,
    config: ScraperConfig,
    selectors: Selectors,
    backup: HtmlBackup,
}

impl<F: PageFetcher> CatalogScraper<F> {
    /// # Errors
    /// Returns `ScrapeError::Parse` if any configured selector is invalid.
    pub fn new(fetcher: F, config: ScraperConfig, backup: HtmlBackup) -> Result<Self> {
        let selectors = Selectors::compile(&config.selectors)?;

        Ok(Self {
            fetcher,
            config,
            selectors,
            backup,
        })
    }

    /// Read the category navigation on the home page, in site order.
    pub async fn discover_categories(&self) -> Result<Vec<Category>> {
        let html = self.fetcher.fetch_text(&self.config.base_url).await?;
        let document = Html::parse_document(&html);

        let mut categories = Vec::new();
        for link in document.select(&self.selectors.category_link) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            categories.push(Category {
                name: element_text(link),
                url: self.config.base_url.join(href)?,
            });
        }

        Ok(categories)
    }

    /// Product URLs on one listing page, resolved against that page's URL.
    pub fn list_product_urls<'a>(
        &'a self,
        document: &'a Html,
        page_url: &'a Url,
    ) -> impl Iterator<Item = Url> + 'a {
        document
            .select(&self.selectors.product_container)
            .filter_map(move |card| card.select(&self.selectors.product_link).next())
            .filter_map(|link| link.value().attr("href"))
            .filter_map(move |href| match page_url.join(href) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(%page_url, href, error = %e, "skipping unresolvable product link");
                    None
                }
            })
    }

    /// The "next" pagination link, or `None` on the last page.
    pub fn next_page_url(&self, document: &Html, page_url: &Url) -> Option<Url> {
        let href = document
            .select(&self.selectors.pagination_next)
            .next()?
            .value()
            .attr("href")?;

        match page_url.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(%page_url, href, error = %e, "unresolvable next page link, ending category");
                None
            }
        }
    }

    /// Fetch a product page, back it up, and parse it.
    pub async fn parse_product(&self, url: &Url, category: &str) -> Result<Book> {
        let html = self.fetcher.fetch_text(url).await?;

        self.backup.save(url, &html).await?;

        let document = Html::parse_document(&html);
        self.extract_book(&document, url, category)
    }

    /// Build a [`Book`] from an already-parsed product page.
    ///
    /// # Errors
    /// Returns `ScrapeError::Parse` when the heading or price is missing.
    pub fn extract_book(&self, document: &Html, url: &Url, category: &str) -> Result<Book> {
        let title = document
            .select(&self.selectors.title)
            .next()
            .map(element_text)
            .filter(|title| !title.is_empty())
            .ok_or_else(|| ScrapeError::Parse(format!("no title on {url}")))?;

        let price = document
            .select(&self.selectors.price)
            .next()
            .map(element_text)
            .ok_or_else(|| ScrapeError::Parse(format!("no price on {url}")))?;

        let availability = document
            .select(&self.selectors.availability)
            .next()
            .and_then(|el| clean_availability(&element_text(el)));

        let star_rating = star_rating_to_int(document.select(&self.selectors.star_rating).next());

        Ok(Book {
            title,
            price,
            availability,
            product_page_url: url.to_string(),
            star_rating,
            category: category.to_string(),
            publisher_country: None,
        })
    }

    /// Crawl every page of one category.
    ///
    /// Listing page failures are returned; product failures are logged and skipped.
    pub async fn scrape_category(&self, category: &Category) -> Result<Vec<Book>> {
        let mut books = Vec::new();
        let mut current_url = category.url.clone();
        let mut page_num = 1;

        loop {
            if page_num > self.config.max_pages {
                info!(
                    "Reached maximum page limit ({}) for category {}",
                    self.config.max_pages, category.name
                );
                break;
            }

            info!("[{}] Page {}: {}", category.name, page_num, current_url);

            let html = self.fetcher.fetch_text(&current_url).await?;

            // Document is !Send; keep it out of the awaits below
            let (product_urls, next_page_url) = {
                let document = Html::parse_document(&html);
                let product_urls: Vec<Url> =
                    self.list_product_urls(&document, &current_url).collect();

                (product_urls, self.next_page_url(&document, &current_url))
            };

            for url in product_urls {
                match self.parse_product(&url, &category.name).await {
                    Ok(book) => {
                        info!("    + {}", book.title);
                        books.push(book);
                        tokio::time::sleep(self.config.request_delay).await;
                    }
                    Err(e) => warn!(%url, error = %e, "failed to parse product"),
                }
            }

            match next_page_url {
                Some(next_url) if next_url == current_url => {
                    info!(
                        "Next page URL is the same as current URL, stopping pagination for {}",
                        category.name
                    );
                    break;
                }
                Some(next_url) => {
                    current_url = next_url;
                    page_num += 1;
                }
                None => break,
            }
        }

        Ok(books)
    }

    /// Crawl every category and return all books in category, page, product order.
    pub async fn scrape_all(&self) -> Result<Vec<Book>> {
        let categories = self.discover_categories().await?;

        info!("Found {} categories:", categories.len());
        for category in &categories {
            info!(" - {}", category.name);
        }

        let mut all_books = Vec::new();
        for category in &categories {
            info!(category = %category.name, "scraping category");

            let books = self.scrape_category(category).await?;
            info!("  -> {} books from {}", books.len(), category.name);

            all_books.extend(books);
        }

        info!(total = all_books.len(), "scrape finished");
        Ok(all_books)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Strip the stock boilerplate, leaving e.g. `"22"` from `"In stock (22 available)"`.
pub fn clean_availability(text: &str) -> Option<String> {
    let mut cleaned = text.to_string();
    for noise in AVAILABILITY_NOISE {
        cleaned = cleaned.replace(noise, "");
    }

    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// `<p class="star-rating Three">` -> 3; no element or no rating word -> 0.
pub fn star_rating_to_int(element: Option<ElementRef<'_>>) -> u8 {
    let Some(element) = element else {
        return 0;
    };

    element
        .value()
        .classes()
        .find_map(|class| match class {
            "One" => Some(1),
            "Two" => Some(2),
            "Three" => Some(3),
            "Four" => Some(4),
            "Five" => Some(5),
            _ => None,
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;

    const BASE: &str = "https://books.toscrape.com/";
    const TRAVEL: &str = "https://books.toscrape.com/catalogue/category/books/travel_2/index.html";
    const TRAVEL_2: &str = "https://books.toscrape.com/catalogue/category/books/travel_2/page-2.html";
    const MYSTERY: &str = "https://books.toscrape.com/catalogue/category/books/mystery_3/index.html";
    const HIMALAYAS: &str = "https://books.toscrape.com/catalogue/its-only-the-himalayas_981/index.html";
    const FULL_MOON: &str = "https://books.toscrape.com/catalogue/full-moon-over-noahs-ark_811/index.html";
    const SHARP_OBJECTS: &str = "https://books.toscrape.com/catalogue/sharp-objects_997/index.html";

    const HOME_PAGE: &str = r#"
        <html><body><div class="side_categories">
        <ul class="nav nav-list">
          <li><a href="catalogue/category/books_1/index.html">Books</a>
            <ul>
              <li><a href="catalogue/category/books/travel_2/index.html">
                    Travel
                  </a></li>
              <li><a href="catalogue/category/books/mystery_3/index.html">Mystery</a></li>
            </ul>
          </li>
        </ul>
        </div></body></html>
    "#;

    const TRAVEL_PAGE_1: &str = r#"
        <html><body><ol class="row">
          <li><article class="product_pod">
            <h3><a href="../../../its-only-the-himalayas_981/index.html">It's Only the Himalayas</a></h3>
          </article></li>
          <li><article class="product_pod">
            <h3><a href="../../../gone-missing_1/index.html">Gone Missing</a></h3>
          </article></li>
        </ol>
        <ul class="pager"><li class="current">Page 1 of 2</li><li class="next"><a href="page-2.html">next</a></li></ul>
        </body></html>
    "#;

    const TRAVEL_PAGE_2: &str = r#"
        <html><body><ol class="row">
          <li><article class="product_pod">
            <h3><a href="../../../full-moon-over-noahs-ark_811/index.html">Full Moon over Noah's Ark</a></h3>
          </article></li>
        </ol>
        <ul class="pager"><li class="previous"><a href="index.html">previous</a></li></ul>
        </body></html>
    "#;

    const MYSTERY_PAGE: &str = r#"
        <html><body><ol class="row">
          <li><article class="product_pod">
            <h3><a href="../../../sharp-objects_997/index.html">Sharp Objects</a></h3>
          </article></li>
        </ol></body></html>
    "#;

    fn product_page(title: &str, price: &str, availability: Option<&str>, rating: &str) -> String {
        let availability = availability
            .map(|text| {
                format!(
                    r#"<p class="instock availability"><i class="icon-ok"></i>
                        {text}
                    </p>"#
                )
            })
            .unwrap_or_default();

        format!(
            r#"<html><body><div class="product_main">
                <h1>{title}</h1>
                <p class="price_color">{price}</p>
                {availability}
                <p class="star-rating {rating}"><i class="icon-star"></i></p>
            </div></body></html>"#
        )
    }

    /// Serves canned pages; unknown URLs answer 404
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch_text(&self, url: &Url) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| ScrapeError::Status {
                    url: url.to_string(),
                    status: StatusCode::NOT_FOUND,
                })
        }
    }

    fn catalogue_site() -> FakeFetcher {
        FakeFetcher::default()
            .with_page(BASE, HOME_PAGE)
            .with_page(TRAVEL, TRAVEL_PAGE_1)
            .with_page(TRAVEL_2, TRAVEL_PAGE_2)
            .with_page(MYSTERY, MYSTERY_PAGE)
            .with_page(
                HIMALAYAS,
                product_page("It's Only the Himalayas", "£45.17", Some("In stock (19 available)"), "Two"),
            )
            .with_page(
                FULL_MOON,
                product_page("Full Moon over Noah’s Ark", "£49.43", Some("In stock (15 available)"), "Four"),
            )
            .with_page(
                SHARP_OBJECTS,
                product_page("Sharp Objects", "£47.82", Some("In stock (20 available)"), "Four"),
            )
    }

    fn scraper_for(fetcher: FakeFetcher, backup_dir: &std::path::Path) -> CatalogScraper<FakeFetcher> {
        scraper_with(fetcher, backup_dir, Duration::ZERO, 50)
    }

    fn scraper_with(
        fetcher: FakeFetcher,
        backup_dir: &std::path::Path,
        request_delay: Duration,
        max_pages: u32,
    ) -> CatalogScraper<FakeFetcher> {
        let config = ScraperConfig {
            base_url: Url::parse(BASE).unwrap(),
            selectors: SiteSelectors::default(),
            request_delay,
            max_pages,
        };

        CatalogScraper::new(fetcher, config, HtmlBackup::new(backup_dir)).unwrap()
    }

    fn travel() -> Category {
        Category {
            name: "Travel".to_string(),
            url: Url::parse(TRAVEL).unwrap(),
        }
    }

    fn first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
        document.select(&Selector::parse(selector).unwrap()).next()
    }

    #[test]
    fn test_star_rating_to_int_recognized_words() {
        for (word, expected) in [("One", 1), ("Two", 2), ("Three", 3), ("Four", 4), ("Five", 5)] {
            let html = Html::parse_fragment(&format!(r#"<p class="star-rating {word}"></p>"#));
            assert_eq!(star_rating_to_int(first(&html, "p")), expected, "rating {word}");
        }
    }

    #[test]
    fn test_star_rating_to_int_unknown_or_missing() {
        let html = Html::parse_fragment(r#"<p class="star-rating Zero"></p>"#);
        assert_eq!(star_rating_to_int(first(&html, "p")), 0);
        assert_eq!(star_rating_to_int(None), 0);
    }

    #[test]
    fn test_clean_availability() {
        assert_eq!(clean_availability("In stock (22 available)"), Some("22".to_string()));
        assert_eq!(clean_availability("In stock ( available)"), None);
        assert_eq!(clean_availability(""), None);
        assert_eq!(clean_availability("Out of stock"), Some("Out of stock".to_string()));
    }

    #[test]
    fn test_list_product_urls_resolves_against_page_url() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = scraper_for(FakeFetcher::default(), tmp.path());
        let document = Html::parse_document(TRAVEL_PAGE_1);
        let page_url = Url::parse(TRAVEL).unwrap();

        let urls: Vec<String> = scraper
            .list_product_urls(&document, &page_url)
            .map(String::from)
            .collect();

        assert_eq!(
            urls,
            vec![
                HIMALAYAS.to_string(),
                "https://books.toscrape.com/catalogue/gone-missing_1/index.html".to_string(),
            ]
        );
    }

    #[test]
    fn test_next_page_url() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = scraper_for(FakeFetcher::default(), tmp.path());
        let page_url = Url::parse(TRAVEL).unwrap();

        let next = scraper.next_page_url(&Html::parse_document(TRAVEL_PAGE_1), &page_url);
        assert_eq!(next.map(String::from), Some(TRAVEL_2.to_string()));

        let last = scraper.next_page_url(&Html::parse_document(TRAVEL_PAGE_2), &page_url);
        assert!(last.is_none());
    }

    #[test]
    fn test_next_page_url_unresolvable_ends_category() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = scraper_for(FakeFetcher::default(), tmp.path());
        let page = r#"<ul class="pager"><li class="next"><a href="http://[broken">next</a></li></ul>"#;

        let next = scraper.next_page_url(&Html::parse_document(page), &Url::parse(TRAVEL).unwrap());

        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_discover_categories_in_site_order() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = scraper_for(catalogue_site(), tmp.path());

        let categories = scraper.discover_categories().await.unwrap();

        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Travel", "Mystery"]);
        assert_eq!(categories[0].url.as_str(), TRAVEL);
        assert_eq!(categories[1].url.as_str(), MYSTERY);
    }

    #[tokio::test]
    async fn test_parse_product_backs_up_html() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = scraper_for(catalogue_site(), tmp.path());

        let book = scraper
            .parse_product(&Url::parse(HIMALAYAS).unwrap(), "Travel")
            .await
            .unwrap();

        assert_eq!(
            book,
            Book {
                title: "It's Only the Himalayas".to_string(),
                price: "£45.17".to_string(),
                availability: Some("19".to_string()),
                product_page_url: HIMALAYAS.to_string(),
                star_rating: 2,
                category: "Travel".to_string(),
                publisher_country: None,
            }
        );

        let backup = tmp
            .path()
            .join("catalogue_its-only-the-himalayas_981_index.html.html");
        let saved = std::fs::read_to_string(backup).unwrap();
        assert!(saved.contains("It's Only the Himalayas"));
    }

    #[tokio::test]
    async fn test_parse_product_without_availability_or_rating() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default()
            .with_page(SHARP_OBJECTS, product_page("Sharp Objects", "£47.82", None, "Zero"));
        let scraper = scraper_for(fetcher, tmp.path());

        let book = scraper
            .parse_product(&Url::parse(SHARP_OBJECTS).unwrap(), "Mystery")
            .await
            .unwrap();

        assert_eq!(book.availability, None);
        assert_eq!(book.star_rating, 0);
    }

    #[tokio::test]
    async fn test_parse_product_propagates_http_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = scraper_for(FakeFetcher::default(), tmp.path());

        let err = scraper
            .parse_product(&Url::parse(HIMALAYAS).unwrap(), "Travel")
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Status { status, .. } if status == StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_scrape_all_skips_failed_products_and_keeps_order() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = scraper_for(catalogue_site(), tmp.path());

        let books = scraper.scrape_all().await.unwrap();

        let summary: Vec<(&str, &str)> = books
            .iter()
            .map(|b| (b.category.as_str(), b.product_page_url.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Travel", HIMALAYAS),
                ("Travel", FULL_MOON),
                ("Mystery", SHARP_OBJECTS),
            ]
        );
        assert!(books.iter().all(|b| b.publisher_country.is_none()));
    }

    #[tokio::test]
    async fn test_scrape_all_fails_when_a_listing_page_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = FakeFetcher::default().with_page(BASE, HOME_PAGE);
        let scraper = scraper_for(fetcher, tmp.path());

        assert!(scraper.scrape_all().await.is_err());
    }

    #[tokio::test]
    async fn test_scrape_category_stops_on_self_link() {
        let tmp = tempfile::tempdir().unwrap();
        let looping = r#"<html><body><ul class="pager"><li class="next"><a href="index.html">next</a></li></ul></body></html>"#;
        let fetcher = FakeFetcher::default().with_page(TRAVEL, looping);
        let scraper = scraper_for(fetcher, tmp.path());
        let category = Category {
            name: "Travel".to_string(),
            url: Url::parse(TRAVEL).unwrap(),
        };

        let books = scraper.scrape_category(&category).await.unwrap();

        assert!(books.is_empty());
        assert_eq!(scraper.fetcher.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scrape_category_respects_max_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let endless = |next: &str| {
            format!(r#"<html><body><ul class="pager"><li class="next"><a href="{next}">next</a></li></ul></body></html>"#)
        };
        let fetcher = FakeFetcher::default()
            .with_page(TRAVEL, endless("page-2.html"))
            .with_page(TRAVEL_2, endless("page-3.html"))
            .with_page(
                "https://books.toscrape.com/catalogue/category/books/travel_2/page-3.html",
                endless("page-4.html"),
            );
        let scraper = scraper_with(fetcher, tmp.path(), Duration::ZERO, 2);

        let books = scraper.scrape_category(&travel()).await.unwrap();

        assert!(books.is_empty());
        assert_eq!(
            *scraper.fetcher.requested.lock().unwrap(),
            vec![TRAVEL.to_string(), TRAVEL_2.to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrape_category_pauses_after_each_parsed_product() {
        let tmp = tempfile::tempdir().unwrap();
        let delay = Duration::from_millis(100);
        // gone-missing answers 404, the other two products parse
        let scraper = scraper_with(catalogue_site(), tmp.path(), delay, 50);

        let start = tokio::time::Instant::now();
        let books = scraper.scrape_category(&travel()).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(books.len(), 2);
        assert!(elapsed >= delay * 2, "slept {elapsed:?}");
        assert!(elapsed < delay * 3, "failed product paused too: {elapsed:?}");
    }
}
