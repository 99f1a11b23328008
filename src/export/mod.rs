//! CSV and JSON files shared by both scrape stages
//!
//! All writers truncate and rewrite the whole file. JSON is pretty-printed
//! with four-space indentation and keeps non-ASCII text as-is; CSV starts
//! with a UTF-8 byte order mark so spreadsheet tools pick the right encoding.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::info;

use crate::error::Result;
use crate::models::Book;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize `value` as indented JSON, replacing `path`.
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);

    let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;

    writer.flush()?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn save_json(books: &[Book], path: &Path) -> Result<()> {
    write_pretty_json(path, books)?;
    info!("Saved JSON: {}", path.display());
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Vec<Book>> {
    read_json(path)
}

/// Write `books` with a header row, even when there are no books.
pub fn save_csv(books: &[Book], path: &Path) -> Result<()> {
    let mut file = create(path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    writer.write_record(Book::FIELDS)?;
    for book in books {
        writer.serialize(book)?;
    }
    writer.flush()?;

    info!("Saved CSV: {}", path.display());
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    Ok(File::create(path)?)
}
