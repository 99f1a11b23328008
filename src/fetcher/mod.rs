//! Production [`PageFetcher`] over HTTP

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::traits::{PageFetcher, USER_AGENT};

/// HTTP page fetcher backed by a shared `reqwest` client
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "GET");

        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.text().await?)
    }
}
