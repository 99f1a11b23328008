//! Raw HTML backup of every fetched product page

use std::path::PathBuf;

use url::Url;

use crate::error::Result;

/// Writes product pages to a flat directory, one file per URL path
#[derive(Debug, Clone)]
pub struct HtmlBackup {
    dir: PathBuf,
}

impl HtmlBackup {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save `html` under the name derived from `url`, overwriting any earlier copy.
    ///
    /// The directory is created on first use.
    pub async fn save(&self, url: &Url, html: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(backup_file_name(url));
        tokio::fs::write(&path, html).await?;

        Ok(path)
    }
}

/// File name for a page backup: the URL path with `/` turned into `_`.
///
/// `https://books.toscrape.com/catalogue/a_1/index.html` becomes
/// `catalogue_a_1_index.html.html`; an empty path becomes `index.html`.
pub fn backup_file_name(url: &Url) -> String {
    let path = url.path().trim_matches('/').replace('/', "_");
    let stem = if path.is_empty() { "index" } else { &path };

    format!("{stem}.html")
}
