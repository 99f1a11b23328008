use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use book_scout::api;
use book_scout::book_scout::BookScout;
use book_scout::config::Settings;

#[derive(Parser)]
#[command(name = "book-scout", about = "Scrape, enrich and serve books.toscrape.com")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl every category and write books.csv / books.json
    Scrape,
    /// Assign publisher countries to the scraped books
    Enrich,
    /// Serve the enriched books over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Command::Scrape => {
            info!(base_url = %settings.scrape.base_url, "Starting catalogue scrape");
            BookScout::new(settings).run_scrape().await?;
        }
        Command::Enrich => {
            info!("Starting country enrichment");
            BookScout::new(settings).run_enrich().await?;
        }
        Command::Serve => api::serve(&settings.api).await?,
    }

    Ok(())
}
