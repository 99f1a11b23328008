//! Book store behind the REST API
//!
//! The store keeps every book in memory and rewrites its [`BookStorage`]
//! after each mutation. A single async mutex is held for the whole
//! check → mutate → persist sequence, so writers inside one process never
//! interleave. Other processes writing the same file are not guarded against.

use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::export::{read_json, write_pretty_json};
use crate::models::Book;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Book with title '{0}' already exists.")]
    Conflict(String),

    #[error("Book with title '{0}' not found.")]
    NotFound(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage format error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<crate::error::ScrapeError> for StoreError {
    fn from(err: crate::error::ScrapeError) -> Self {
        use crate::error::ScrapeError;

        match err {
            ScrapeError::Io(e) => Self::Io(e),
            ScrapeError::Json(e) => Self::Json(e),
            other => Self::Io(std::io::Error::other(other.to_string())),
        }
    }
}

/// Where the store's books live between runs
pub trait BookStorage: Send + Sync {
    fn load(&self) -> Result<Vec<Book>, StoreError>;

    fn save(&self, books: &[Book]) -> Result<(), StoreError>;
}

/// Whole-file JSON storage, rewritten on every save
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BookStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Book>, StoreError> {
        match read_json::<Vec<Book>>(&self.path) {
            Ok(books) => {
                info!("Loaded {} books from {}", books.len(), self.path.display());
                Ok(books)
            }
            Err(crate::error::ScrapeError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                warn!("{} not found. Starting with empty list.", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, books: &[Book]) -> Result<(), StoreError> {
        write_pretty_json(&self.path, books)?;
        info!("Saved {} books to {}", books.len(), self.path.display());
        Ok(())
    }
}

pub struct BookStore {
    books: Mutex<Vec<Book>>,
    storage: Box<dyn BookStorage>,
}

impl BookStore {
    /// Load the initial book list from `storage`.
    pub fn open(storage: impl BookStorage + 'static) -> Result<Self, StoreError> {
        let books = storage.load()?;

        Ok(Self {
            books: Mutex::new(books),
            storage: Box::new(storage),
        })
    }

    /// All books, or those whose country matches `country` ignoring case.
    pub async fn list(&self, country: Option<&str>) -> Vec<Book> {
        let books = self.books.lock().await;

        match country {
            None => books.clone(),
            Some(country) => {
                let wanted = country.to_lowercase();
                books
                    .iter()
                    .filter(|book| {
                        book.publisher_country
                            .as_deref()
                            .is_some_and(|c| c.to_lowercase() == wanted)
                    })
                    .cloned()
                    .collect()
            }
        }
    }

    /// Add `book` unless its title is taken, then persist.
    ///
    /// If persisting fails the book is taken out again.
    pub async fn create(&self, book: Book) -> Result<Book, StoreError> {
        let mut books = self.books.lock().await;

        if books.iter().any(|b| b.title == book.title) {
            return Err(StoreError::Conflict(book.title));
        }

        books.push(book.clone());
        if let Err(e) = self.storage.save(&books) {
            books.pop();
            return Err(e);
        }

        Ok(book)
    }

    /// Remove the book titled exactly `title`, then persist.
    ///
    /// If persisting fails the book is put back where it was.
    pub async fn delete(&self, title: &str) -> Result<Book, StoreError> {
        let mut books = self.books.lock().await;

        let index = books
            .iter()
            .position(|b| b.title == title)
            .ok_or_else(|| StoreError::NotFound(title.to_string()))?;

        let removed = books.remove(index);
        if let Err(e) = self.storage.save(&books) {
            books.insert(index, removed);
            return Err(e);
        }

        Ok(removed)
    }
}
