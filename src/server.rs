//! HTTP server and routes.

mod handlers;

use crate::library::Library;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Book library.
    pub library: Library,
}

impl AppState {
    /// Create application state.
    pub fn new(library: Library) -> Self {
        Self { library }
    }
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let book_routes = Router::new()
        .route("/", get(handlers::list_books).post(handlers::create_book))
        .route(
            "/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .route("/{id}/progress", put(handlers::update_progress));

    let api_routes = Router::new()
        .nest("/books", book_routes)
        .route("/stats", get(handlers::stats))
        .route("/reset", post(handlers::reset))
        .route(
            "/export",
            get(handlers::export_download).post(handlers::export_file),
        )
        .route("/import", post(handlers::import));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
