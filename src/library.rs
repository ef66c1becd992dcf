//! Reading library service.
//!
//! [`Library`] is the entry point used by the CLI and the HTTP API. It owns a
//! [`Database`] handle and layers the progress rules and the import/export
//! codec on top of the raw store operations. Every read reflects the latest
//! completed write; callers re-fetch after mutating.

use crate::db::{Book, BookDetails, BookStatus, Database, NewBook, Statistics};
use crate::error::{AppError, Result};
use crate::progress;
use crate::sample;
use crate::transfer::{self, ExportDocument, ImportSummary};
use std::path::{Path, PathBuf};

/// Book collection with progress tracking and export/import.
#[derive(Clone)]
pub struct Library {
    db: Database,
    export_dir: PathBuf,
}

impl Library {
    /// Create a library over `db`, writing exports to `export_dir`.
    pub fn new(db: Database, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            export_dir: export_dir.into(),
        }
    }

    /// Underlying store.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Directory exports are written to.
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Add a book. Title and cover are trimmed and a missing status follows from
    /// the pages read. Returns the stored book.
    pub fn add_book(&self, mut book: NewBook) -> Result<Book> {
        book.title = book.title.trim().to_string();
        book.cover = book.cover.trim().to_string();
        book.pdf_path = book
            .pdf_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        book.status = Some(book.effective_status());

        let id = self.db.add_book(&book)?;
        self.book(id)
    }

    /// All books, or only those with `status`, most recently updated first.
    pub fn books(&self, status: Option<BookStatus>) -> Result<Vec<Book>> {
        match status {
            Some(status) => self.db.get_books_by_status(status),
            None => self.db.get_books(),
        }
    }

    /// Book by ID.
    pub fn book(&self, id: i64) -> Result<Book> {
        self.db.get_book(id)?.ok_or(AppError::NotFound(id))
    }

    /// Set pages read; the status follows from the new progress.
    pub fn record_progress(&self, id: i64, pages_read: i64) -> Result<Book> {
        let book = self.book(id)?;
        progress::validate_pages_read(pages_read, book.total_pages)?;

        let status = progress::derive_status(pages_read, book.total_pages);
        self.db.update_progress(id, pages_read, Some(status))?;

        if status != book.status {
            tracing::info!(book_id = id, from = %book.status, to = %status, "Status changed");
        }
        self.book(id)
    }

    /// Like [`record_progress`](Self::record_progress), parsing raw user input.
    pub fn record_progress_input(&self, id: i64, input: &str) -> Result<Book> {
        let book = self.book(id)?;
        let pages_read = progress::parse_pages_read(input, book.total_pages)?;
        self.record_progress(id, pages_read)
    }

    /// Edit a book's details.
    ///
    /// Shrinking below the pages already read needs `confirmed`, and then
    /// resets progress. The stored status follows the resulting progress.
    pub fn edit_book(&self, id: i64, details: &BookDetails, confirmed: bool) -> Result<Book> {
        let current = self.book(id)?;

        let plan = match progress::plan_edit(&current, details, confirmed) {
            Ok(plan) => plan,
            Err(e @ AppError::ConfirmationRequired { .. }) => {
                tracing::warn!(book_id = id, error = %e, "Edit needs confirmation");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        if plan.pages_read != current.pages_read {
            self.db
                .update_details_with_progress(id, &plan.details, plan.pages_read)?;
        } else {
            self.db.update_details(id, &plan.details)?;
        }

        if plan.resets_progress {
            tracing::info!(book_id = id, discarded = current.pages_read, "Reset reading progress");
        }
        self.book(id)
    }

    /// Delete a book. Deleting an unknown ID is not an error.
    pub fn remove_book(&self, id: i64) -> Result<bool> {
        self.db.delete_book(id)
    }

    /// Aggregate statistics.
    pub fn statistics(&self) -> Result<Statistics> {
        self.db.get_statistics()
    }

    /// Delete every book.
    pub fn reset(&self) -> Result<usize> {
        self.db.reset_all()
    }

    /// Drop and recreate the books table.
    pub fn reset_schema(&self) -> Result<()> {
        self.db.reset_schema()
    }

    /// Snapshot of the whole library.
    pub fn export_document(&self) -> Result<ExportDocument> {
        transfer::build_document(&self.db)
    }

    /// Export to the configured directory. Returns the written file.
    pub fn export(&self) -> Result<PathBuf> {
        self.export_to(&self.export_dir)
    }

    /// Export to `dir`. Returns the written file.
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        let doc = self.export_document()?;
        transfer::write_export(&doc, dir)
    }

    /// Replace the library with the contents of an export document.
    pub fn import(&self, json: &str) -> Result<ImportSummary> {
        transfer::import_document(&self.db, json)
    }

    /// Replace the library with the contents of an export file.
    pub fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        let json = std::fs::read_to_string(path)?;
        self.import(&json)
    }

    /// Add the built-in sample books. Returns the new books.
    pub fn seed_samples(&self) -> Result<Vec<Book>> {
        sample::sample_books()
            .into_iter()
            .map(|book| self.add_book(book))
            .collect()
    }
}
