use crate::db::*;
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

const BOOK_COLUMNS: &str =
    "id, title, cover, pdfPath, totalPages, pagesRead, status, createdAt, updatedAt";

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| AppError::storage("Failed to open database", e))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::storage("Failed to open database", e))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        Self::create_tables(&conn)
    }

    fn create_tables(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                cover TEXT NOT NULL,
                totalPages INTEGER NOT NULL,
                pagesRead INTEGER DEFAULT 0,
                status TEXT DEFAULT 'to-read',
                createdAt TEXT NOT NULL,
                updatedAt TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_books_updated ON books(updatedAt);
            "#,
        )
        .map_err(|e| AppError::storage("Failed to initialize schema", e))?;

        // Databases created before attachments existed lack pdfPath
        if !Self::has_column(conn, "books", "pdfPath")? {
            conn.execute("ALTER TABLE books ADD COLUMN pdfPath TEXT", [])
                .map_err(|e| AppError::storage("Failed to add pdfPath column", e))?;
            tracing::info!("Migrated books table: added pdfPath column");
        }

        Ok(())
    }

    fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", table))
            .map_err(|e| AppError::storage("Failed to prepare query", e))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| AppError::storage("Failed to read table info", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::storage("Failed to collect table info", e))?;

        Ok(names.iter().any(|n| n == column))
    }

    /// Drop and recreate the books table.
    pub fn reset_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch("DROP TABLE IF EXISTS books;")
            .map_err(|e| AppError::storage("Failed to drop books table", e))?;
        Self::create_tables(&conn)?;
        tracing::info!("Recreated books table");
        Ok(())
    }

    // ========== BOOK OPERATIONS ==========

    /// Add a book, stamping both timestamps with the current time. Returns the new ID.
    pub fn add_book(&self, book: &NewBook) -> Result<i64> {
        book.validate()?;
        let now = now_timestamp();

        let conn = self.conn.lock();
        let id = Self::insert_book(&conn, book, &now, &now)
            .map_err(|e| AppError::storage("Failed to add book", e))?;

        tracing::info!(book_id = id, title = %book.title, "Added book");
        Ok(id)
    }

    fn insert_book(
        conn: &Connection,
        book: &NewBook,
        created_at: &DateTime<Utc>,
        updated_at: &DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO books (title, cover, pdfPath, totalPages, pagesRead, status, createdAt, updatedAt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                book.title,
                book.cover,
                book.pdf_path,
                book.total_pages,
                book.pages_read,
                book.effective_status(),
                format_timestamp(created_at),
                format_timestamp(updated_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get book by ID.
    pub fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLUMNS),
            params![id],
            Self::row_to_book,
        )
        .optional()
        .map_err(|e| AppError::storage("Failed to get book", e))
    }

    /// Get all books, most recently updated first.
    pub fn get_books(&self) -> Result<Vec<Book>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM books ORDER BY updatedAt DESC, id DESC",
                BOOK_COLUMNS
            ))
            .map_err(|e| AppError::storage("Failed to prepare query", e))?;

        let books = stmt
            .query_map([], Self::row_to_book)
            .map_err(|e| AppError::storage("Failed to get books", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::storage("Failed to collect books", e))?;

        tracing::debug!(count = books.len(), "Loaded books");
        Ok(books)
    }

    /// Get books with the given status, most recently updated first.
    pub fn get_books_by_status(&self, status: BookStatus) -> Result<Vec<Book>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM books WHERE status = ?1 ORDER BY updatedAt DESC, id DESC",
                BOOK_COLUMNS
            ))
            .map_err(|e| AppError::storage("Failed to prepare query", e))?;

        let books = stmt
            .query_map(params![status], Self::row_to_book)
            .map_err(|e| AppError::storage("Failed to get books", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::storage("Failed to collect books", e))?;

        Ok(books)
    }

    /// Helper to convert a row to Book.
    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            cover: row.get(2)?,
            pdf_path: row.get(3)?,
            total_pages: row.get(4)?,
            pages_read: row.get(5)?,
            status: row.get(6)?,
            created_at: Self::get_timestamp(row, 7)?,
            updated_at: Self::get_timestamp(row, 8)?,
        })
    }

    fn get_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        parse_timestamp(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("invalid timestamp '{}'", raw).into(),
            )
        })
    }

    /// Update pages read (and status, if given).
    ///
    /// Pages read must stay within `0..=totalPages`; the status is stored as given.
    pub fn update_progress(&self, id: i64, pages_read: i64, status: Option<BookStatus>) -> Result<()> {
        let conn = self.conn.lock();
        let now = format_timestamp(&now_timestamp());

        let rows = conn
            .execute(
                "UPDATE books SET pagesRead = ?1, status = COALESCE(?2, status), updatedAt = ?3
                 WHERE id = ?4 AND ?1 BETWEEN 0 AND totalPages",
                params![pages_read, status, now, id],
            )
            .map_err(|e| AppError::storage("Failed to update progress", e))?;

        if rows == 0 {
            return Err(Self::progress_rejection(&conn, id, pages_read)?);
        }

        tracing::info!(book_id = id, pages_read, status = ?status, "Updated progress");
        Ok(())
    }

    /// Explain why a guarded update touched no row.
    fn progress_rejection(conn: &Connection, id: i64, pages_read: i64) -> Result<AppError> {
        let total: Option<i64> = conn
            .query_row(
                "SELECT totalPages FROM books WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::storage("Failed to get book", e))?;

        Ok(match total {
            None => AppError::NotFound(id),
            Some(total_pages) => AppError::page_out_of_range(pages_read, total_pages),
        })
    }

    /// Overwrite the editable fields.
    ///
    /// Fails instead of clamping when the new total is below the pages already read.
    pub fn update_details(&self, id: i64, details: &BookDetails) -> Result<()> {
        details.validate()?;
        let conn = self.conn.lock();
        let now = format_timestamp(&now_timestamp());

        let rows = conn
            .execute(
                "UPDATE books SET title = ?1, totalPages = ?2, status = ?3, cover = ?4, pdfPath = ?5, updatedAt = ?6
                 WHERE id = ?7 AND pagesRead <= ?2",
                params![
                    details.title,
                    details.total_pages,
                    details.status,
                    details.cover,
                    details.pdf_path,
                    now,
                    id,
                ],
            )
            .map_err(|e| AppError::storage("Failed to update book", e))?;

        if rows == 0 {
            let pages_read: Option<i64> = conn
                .query_row(
                    "SELECT pagesRead FROM books WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| AppError::storage("Failed to get book", e))?;

            return Err(match pages_read {
                None => AppError::NotFound(id),
                Some(pages_read) => AppError::page_out_of_range(pages_read, details.total_pages),
            });
        }

        tracing::info!(book_id = id, title = %details.title, "Updated book details");
        Ok(())
    }

    /// Overwrite the editable fields and set pages read in a single statement.
    pub fn update_details_with_progress(
        &self,
        id: i64,
        details: &BookDetails,
        pages_read: i64,
    ) -> Result<()> {
        details.validate()?;
        if pages_read < 0 || pages_read > details.total_pages {
            return Err(AppError::page_out_of_range(pages_read, details.total_pages));
        }

        let conn = self.conn.lock();
        let now = format_timestamp(&now_timestamp());

        let rows = conn
            .execute(
                "UPDATE books SET title = ?1, totalPages = ?2, status = ?3, cover = ?4, pdfPath = ?5,
                        pagesRead = ?6, updatedAt = ?7
                 WHERE id = ?8",
                params![
                    details.title,
                    details.total_pages,
                    details.status,
                    details.cover,
                    details.pdf_path,
                    pages_read,
                    now,
                    id,
                ],
            )
            .map_err(|e| AppError::storage("Failed to update book", e))?;

        if rows == 0 {
            return Err(AppError::NotFound(id));
        }

        tracing::info!(book_id = id, pages_read, "Updated book details and progress");
        Ok(())
    }

    /// Delete a single book by ID. Returns whether a row was removed.
    pub fn delete_book(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM books WHERE id = ?1", params![id])
            .map_err(|e| AppError::storage("Failed to delete book", e))?;

        if rows > 0 {
            tracing::info!(book_id = id, "Deleted book");
        }
        Ok(rows > 0)
    }

    /// Aggregate statistics over all books.
    pub fn get_statistics(&self) -> Result<Statistics> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'reading' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(pagesRead), 0),
                COALESCE(SUM(totalPages), 0)
             FROM books",
            [],
            |row| {
                Ok(Statistics {
                    total_books: row.get(0)?,
                    completed_books: row.get(1)?,
                    currently_reading: row.get(2)?,
                    total_pages_read: row.get(3)?,
                    total_pages_goal: row.get(4)?,
                })
            },
        )
        .map_err(|e| AppError::storage("Failed to get statistics", e))
    }

    /// Delete every book. Returns the number removed.
    pub fn reset_all(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM books", [])
            .map_err(|e| AppError::storage("Failed to reset books", e))?;

        tracing::info!(deleted = rows, "Reset library");
        Ok(rows)
    }

    /// Replace every book with the given records in one transaction.
    ///
    /// Records keep their timestamps and get fresh IDs. On error nothing changes.
    pub fn replace_all(&self, records: &[BookRecord]) -> Result<Vec<i64>> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| AppError::storage("Failed to begin transaction", e))?;

        let deleted = tx
            .execute("DELETE FROM books", [])
            .map_err(|e| AppError::storage("Failed to clear books", e))?;

        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = Self::insert_book(&tx, &record.fields, &record.created_at, &record.updated_at)
                .map_err(|e| AppError::storage("Failed to insert imported book", e))?;
            ids.push(id);
        }

        tx.commit()
            .map_err(|e| AppError::storage("Failed to commit import", e))?;

        tracing::info!(deleted, inserted = ids.len(), "Replaced library contents");
        Ok(ids)
    }
}
