//! Error types shared by the scrape and enrichment stages

use reqwest::StatusCode;

/// Errors that can occur while fetching, parsing or persisting books.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: StatusCode },

    /// The request could not be sent or its body could not be read.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// A link could not be resolved to an absolute URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// An expected element was missing from a page.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
