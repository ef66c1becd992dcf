//! HTTP request handlers.

use crate::db::{Book, BookDetails, BookStatus, NewBook, Statistics};
use crate::error::Result;
use crate::progress;
use crate::server::AppState;
use crate::transfer::{self, ExportDocument, ImportSummary};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

/// Book with its progress percentage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    #[serde(flatten)]
    book: Book,
    progress_percent: f64,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        let progress_percent = progress::progress_percent(book.pages_read, book.total_pages);
        Self {
            book,
            progress_percent,
        }
    }
}

// ============================================================================
// BOOKS
// ============================================================================

/// Book list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<BookStatus>,
}

/// List books, most recently updated first.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<BookResponse>>> {
    let books = state.library.books(params.status)?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// Add a book.
pub async fn create_book(
    State(state): State<AppState>,
    Json(req): Json<NewBook>,
) -> Result<(StatusCode, Json<BookResponse>)> {
    let book = state.library.add_book(req)?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Get a single book.
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BookResponse>> {
    Ok(Json(state.library.book(id)?.into()))
}

/// Book edit request.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    #[serde(flatten)]
    details: BookDetails,
    /// Accept losing progress when shrinking below the pages read.
    #[serde(default)]
    confirm: bool,
}

/// Edit a book's details.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<EditRequest>,
) -> Result<Json<BookResponse>> {
    let book = state.library.edit_book(id, &req.details, req.confirm)?;
    Ok(Json(book.into()))
}

/// Delete a book. Unknown IDs are not an error.
pub async fn delete_book(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode> {
    state.library.remove_book(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Progress update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pages_read: i64,
}

/// Record pages read.
pub async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<BookResponse>> {
    let book = state.library.record_progress(id, req.pages_read)?;
    Ok(Json(book.into()))
}

// ============================================================================
// LIBRARY
// ============================================================================

/// Reading statistics.
pub async fn stats(State(state): State<AppState>) -> Result<Json<Statistics>> {
    Ok(Json(state.library.statistics()?))
}

/// Reset response.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    deleted: usize,
}

/// Delete every book.
pub async fn reset(State(state): State<AppState>) -> Result<Json<ResetResponse>> {
    let deleted = state.library.reset()?;
    Ok(Json(ResetResponse { deleted }))
}

/// Download the export document.
pub async fn export_download(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let doc: ExportDocument = state.library.export_document()?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        transfer::export_file_name(&doc.exported_at.with_timezone(&chrono::Local))
    );

    Ok((
        [
            (header::CONTENT_TYPE, transfer::EXPORT_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Json(doc),
    ))
}

/// Export file response.
#[derive(Debug, Serialize)]
pub struct ExportFileResponse {
    path: String,
    mime: &'static str,
}

/// Write an export file to the configured directory.
pub async fn export_file(State(state): State<AppState>) -> Result<Json<ExportFileResponse>> {
    let path = state.library.export()?;
    Ok(Json(ExportFileResponse {
        path: path.to_string_lossy().to_string(),
        mime: transfer::EXPORT_MIME,
    }))
}

/// Replace the library with the posted export document.
pub async fn import(State(state): State<AppState>, body: String) -> Result<Json<ImportSummary>> {
    Ok(Json(state.library.import(&body)?))
}
