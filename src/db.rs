mod schema;

pub use schema::Database;

use crate::error::{AppError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest page count a book may have. Keeps library-wide sums within `i64`.
pub const MAX_PAGES: i64 = i32::MAX as i64;

/// Reading status of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookStatus {
    /// Not started.
    ToRead,
    /// Some pages read.
    Reading,
    /// Every page read.
    Completed,
}

impl BookStatus {
    /// All statuses, in shelf order.
    pub const ALL: [BookStatus; 3] = [BookStatus::Reading, BookStatus::ToRead, BookStatus::Completed];

    /// Stored and serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::ToRead => "to-read",
            BookStatus::Reading => "reading",
            BookStatus::Completed => "completed",
        }
    }

    /// Parse a stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "to-read" => Some(BookStatus::ToRead),
            "reading" => Some(BookStatus::Reading),
            "completed" => Some(BookStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            AppError::InvalidBookData(format!(
                "Unknown status '{}' (expected to-read, reading or completed)",
                s
            ))
        })
    }
}

impl ToSql for BookStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BookStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Self::parse(s).ok_or_else(|| FromSqlError::Other(format!("unknown status '{}'", s).into()))
    }
}

/// Stored book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Book ID, assigned on insert.
    pub id: i64,
    /// Book title.
    pub title: String,
    /// Cover image URI or path (may be empty).
    pub cover: String,
    /// Attached document path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
    /// Total pages (always > 0).
    pub total_pages: i64,
    /// Pages read (0..=total_pages).
    pub pages_read: i64,
    /// Reading status.
    pub status: BookStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when adding a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    /// Book title.
    pub title: String,
    /// Cover image URI or path.
    #[serde(default)]
    pub cover: String,
    /// Attached document path.
    #[serde(default)]
    pub pdf_path: Option<String>,
    /// Total pages.
    pub total_pages: i64,
    /// Pages already read.
    #[serde(default)]
    pub pages_read: i64,
    /// Reading status; follows from the pages read when absent.
    #[serde(default)]
    pub status: Option<BookStatus>,
}

impl NewBook {
    /// New unread book.
    pub fn new(title: impl Into<String>, total_pages: i64) -> Self {
        Self {
            title: title.into(),
            cover: String::new(),
            pdf_path: None,
            total_pages,
            pages_read: 0,
            status: None,
        }
    }

    /// Status to store: the given one, otherwise derived from the pages read.
    pub fn effective_status(&self) -> BookStatus {
        self.status
            .unwrap_or_else(|| crate::progress::derive_status(self.pages_read, self.total_pages))
    }

    /// Check the add-time constraints.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidBookData("Title must not be empty".to_string()));
        }
        check_total_pages(self.total_pages)?;
        if self.pages_read < 0 || self.pages_read > self.total_pages {
            return Err(AppError::InvalidBookData(format!(
                "Pages read must be between 0 and {} (got {})",
                self.total_pages, self.pages_read
            )));
        }
        Ok(())
    }
}

fn check_total_pages(total_pages: i64) -> Result<()> {
    if total_pages <= 0 {
        return Err(AppError::InvalidBookData(format!(
            "Total pages must be greater than 0 (got {})",
            total_pages
        )));
    }
    if total_pages > MAX_PAGES {
        return Err(AppError::InvalidBookData(format!(
            "Total pages must be at most {} (got {})",
            MAX_PAGES, total_pages
        )));
    }
    Ok(())
}

/// A book with its original timestamps, as restored from an export document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    /// Stored fields.
    pub fields: NewBook,
    /// Original creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Original update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Editable book fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    /// Book title.
    pub title: String,
    /// Total pages.
    pub total_pages: i64,
    /// Reading status.
    pub status: BookStatus,
    /// Cover image URI or path.
    #[serde(default)]
    pub cover: String,
    /// Attached document path.
    #[serde(default)]
    pub pdf_path: Option<String>,
}

impl BookDetails {
    /// Current editable fields of a book.
    pub fn of(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            total_pages: book.total_pages,
            status: book.status,
            cover: book.cover.clone(),
            pdf_path: book.pdf_path.clone(),
        }
    }

    /// Check the edit-time constraints that do not depend on stored progress.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidBookData("Title must not be empty".to_string()));
        }
        check_total_pages(self.total_pages)
    }
}

/// Aggregate library statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Number of books.
    pub total_books: i64,
    /// Books with status completed.
    pub completed_books: i64,
    /// Books with status reading.
    pub currently_reading: i64,
    /// Sum of pages read.
    pub total_pages_read: i64,
    /// Sum of total pages.
    pub total_pages_goal: i64,
}

/// Timestamp helper.
pub fn now_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Fixed-width RFC 3339 form used in the database, so text order matches time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
