//! Library export and import.
//!
//! Exports are self-describing JSON documents:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "exportedAt": "2026-10-16T09:30:00.000000000Z",
//!   "books": [{ "id": 1, "title": "...", "cover": "...", "totalPages": 300, ... }],
//!   "statistics": { "totalBooks": 1, ... }
//! }
//! ```
//!
//! Imports are checked record by record before anything is written; the first
//! bad record rejects the whole document and leaves the library untouched.

use crate::db::{
    Book, BookRecord, BookStatus, Database, MAX_PAGES, NewBook, Statistics, now_timestamp,
    parse_timestamp,
};
use crate::error::{AppError, BookViolation, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Format version written to exports.
pub const EXPORT_VERSION: &str = "1.0";

/// MIME type handed to share targets.
pub const EXPORT_MIME: &str = "application/json";

/// Snapshot of the whole library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Format version.
    pub version: String,
    /// When the snapshot was taken.
    pub exported_at: DateTime<Utc>,
    /// Every book.
    pub books: Vec<Book>,
    /// Statistics at export time.
    pub statistics: Statistics,
}

/// Import document that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedImport {
    /// Declared format version.
    pub version: String,
    /// Books to restore, in document order.
    pub records: Vec<BookRecord>,
}

/// Result of a completed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Declared format version of the imported document.
    pub version: String,
    /// Number of books now in the library.
    pub imported: usize,
}

/// Build an export document from the current library.
pub fn build_document(db: &Database) -> Result<ExportDocument> {
    Ok(ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported_at: now_timestamp(),
        books: db.get_books()?,
        statistics: db.get_statistics()?,
    })
}

/// File name for an export taken at `at`.
pub fn export_file_name(at: &DateTime<Local>) -> String {
    format!("Reading-Tracker_{}.json", at.format("%d-%m-%Y_%H-%M-%S"))
}

/// Write `doc` to a new, uniquely named file in `dir`. Returns the file path.
pub fn write_export(doc: &ExportDocument, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let base = export_file_name(&doc.exported_at.with_timezone(&Local));
    let stem = base.trim_end_matches(".json").to_string();

    let mut attempt = 1;
    loop {
        let path = if attempt == 1 {
            dir.join(&base)
        } else {
            dir.join(format!("{}_{}.json", stem, attempt))
        };

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                fill_or_remove(&path, file, |writer| {
                    serde_json::to_writer_pretty(writer, doc).map_err(io::Error::from)
                })?;

                tracing::info!(
                    path = %path.display(),
                    books = doc.books.len(),
                    "Exported library"
                );
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Write into a freshly created `file` at `path`, deleting it if writing fails.
pub(crate) fn fill_or_remove<F>(path: &Path, file: File, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut writer = BufWriter::new(file);
    let written = write(&mut writer).and_then(|()| writer.flush());

    if let Err(e) = written {
        drop(writer);
        if let Err(remove_err) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %remove_err, "Could not remove partial export");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Parse and check an import document without touching the library.
pub fn validate_document(json: &str) -> Result<ValidatedImport> {
    let data: Value =
        serde_json::from_str(json).map_err(|e| AppError::MalformedDocument(e.to_string()))?;

    let Some(object) = data.as_object() else {
        return Err(AppError::InvalidFormat(
            "Expected a JSON object at the top level".to_string(),
        ));
    };

    let version = match object.get("version") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(AppError::InvalidFormat(
                "Missing 'version' field; not a reading tracker export".to_string(),
            ));
        }
    };

    let Some(books) = object.get("books").and_then(Value::as_array) else {
        return Err(AppError::InvalidFormat(
            "Missing 'books' array; not a reading tracker export".to_string(),
        ));
    };

    let records = books
        .iter()
        .enumerate()
        .map(|(index, value)| {
            validate_record(value).map_err(|violation| AppError::InvalidBookRecord { index, violation })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ValidatedImport { version, records })
}

/// Check a single book entry.
pub fn validate_record(value: &Value) -> std::result::Result<BookRecord, BookViolation> {
    let book = value.as_object().ok_or(BookViolation::NotAnObject)?;

    let title = book
        .get("title")
        .and_then(Value::as_str)
        .ok_or(BookViolation::TitleNotString)?;
    if title.trim().is_empty() {
        return Err(BookViolation::TitleEmpty);
    }

    let cover = book
        .get("cover")
        .and_then(Value::as_str)
        .ok_or(BookViolation::CoverNotString)?;

    let pdf_path = match book.get("pdfPath") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(BookViolation::PdfPathNotString),
    };

    let total_pages = book
        .get("totalPages")
        .and_then(whole_number)
        .filter(|n| *n > 0)
        .ok_or(BookViolation::TotalPagesInvalid)?;
    if total_pages > MAX_PAGES {
        return Err(BookViolation::TotalPagesTooLarge(total_pages));
    }

    let pages_read = book
        .get("pagesRead")
        .and_then(whole_number)
        .ok_or(BookViolation::PagesReadNotInteger)?;
    if pages_read < 0 || pages_read > total_pages {
        return Err(BookViolation::PagesReadOutOfRange {
            pages_read,
            total_pages,
        });
    }

    let status = book
        .get("status")
        .and_then(Value::as_str)
        .and_then(BookStatus::parse)
        .ok_or(BookViolation::StatusInvalid)?;

    Ok(BookRecord {
        fields: NewBook {
            title: title.to_string(),
            cover: cover.to_string(),
            pdf_path,
            total_pages,
            pages_read,
            status: Some(status),
        },
        created_at: timestamp_field(book, "createdAt")?,
        updated_at: timestamp_field(book, "updatedAt")?,
    })
}

/// Integer value, also accepting floats without a fractional part.
fn whole_number(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn timestamp_field(
    book: &Map<String, Value>,
    field: &'static str,
) -> std::result::Result<DateTime<Utc>, BookViolation> {
    let raw = book
        .get(field)
        .and_then(Value::as_str)
        .ok_or(BookViolation::TimestampMissing(field))?;
    parse_timestamp(raw).ok_or(BookViolation::TimestampInvalid(field))
}

/// Validate `json` and, only if every record passes, replace the library with it.
pub fn import_document(db: &Database, json: &str) -> Result<ImportSummary> {
    let validated = match validate_document(json) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected import document");
            return Err(e);
        }
    };

    let ids = db.replace_all(&validated.records)?;

    tracing::info!(
        version = %validated.version,
        imported = ids.len(),
        "Imported library"
    );

    Ok(ImportSummary {
        version: validated.version,
        imported: ids.len(),
    })
}
