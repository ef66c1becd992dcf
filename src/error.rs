use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Book fields rejected at add or edit time.
    #[error("Invalid book data: {0}")]
    InvalidBookData(String),

    /// Pages read not a whole number within `0..=total_pages`.
    #[error("Invalid page count: {0}")]
    InvalidPageCount(String),

    /// No book with this id.
    #[error("Book not found: {0}")]
    NotFound(i64),

    /// Edit would shrink the book below the pages already read.
    #[error(
        "Setting total pages to {total_pages} would discard {pages_read} pages of reading progress; confirm to reset progress"
    )]
    ConfirmationRequired {
        /// Pages read before the edit.
        pages_read: i64,
        /// Requested total pages.
        total_pages: i64,
    },

    /// Import document is not valid JSON.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Import document lacks the expected top-level shape.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// One record of an import document failed validation.
    #[error("Invalid book record at index {index}: {violation}")]
    InvalidBookRecord {
        /// Position of the record in the `books` array.
        index: usize,
        /// Constraint that failed.
        violation: BookViolation,
    },

    /// Underlying database fault.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Constraint violated by an imported book record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookViolation {
    /// Record is not a JSON object.
    #[error("record is not an object")]
    NotAnObject,
    /// `title` missing or not a string.
    #[error("title must be a string")]
    TitleNotString,
    /// `title` blank.
    #[error("title must not be empty")]
    TitleEmpty,
    /// `cover` missing or not a string.
    #[error("cover must be a string")]
    CoverNotString,
    /// `pdfPath` present but not a string.
    #[error("pdfPath must be a string when present")]
    PdfPathNotString,
    /// `totalPages` missing, not an integer, or not positive.
    #[error("totalPages must be an integer greater than 0")]
    TotalPagesInvalid,
    /// `totalPages` above the supported maximum.
    #[error("totalPages {0} exceeds the maximum of {max}", max = crate::db::MAX_PAGES)]
    TotalPagesTooLarge(i64),
    /// `pagesRead` missing or not an integer.
    #[error("pagesRead must be an integer")]
    PagesReadNotInteger,
    /// `pagesRead` outside `0..=totalPages`.
    #[error("pagesRead {pages_read} is outside 0..={total_pages}")]
    PagesReadOutOfRange {
        /// Pages read in the record.
        pages_read: i64,
        /// Total pages in the record.
        total_pages: i64,
    },
    /// `status` not one of the known values.
    #[error("status must be one of to-read, reading, completed")]
    StatusInvalid,
    /// Timestamp missing or not a string.
    #[error("{0} must be a string")]
    TimestampMissing(&'static str),
    /// Timestamp string not RFC 3339.
    #[error("{0} is not an RFC 3339 timestamp")]
    TimestampInvalid(&'static str),
}

impl AppError {
    /// Pages read outside `0..=total_pages`.
    pub fn page_out_of_range(pages_read: i64, total_pages: i64) -> Self {
        AppError::InvalidPageCount(format!(
            "{} pages read, book has {} pages",
            pages_read, total_pages
        ))
    }

    /// Wrap a database error with context.
    pub fn storage(context: &str, e: rusqlite::Error) -> Self {
        AppError::StorageFailure(format!("{}: {}", context, e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConfirmationRequired { .. } => StatusCode::CONFLICT,
            AppError::InvalidBookData(_)
            | AppError::InvalidPageCount(_)
            | AppError::MalformedDocument(_)
            | AppError::InvalidFormat(_)
            | AppError::InvalidBookRecord { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        (status, self.to_string()).into_response()
    }
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
