//! reading-tracker: a personal reading tracker.
//!
//! Catalog books, record how many pages you have read, and keep an eye on
//! aggregate statistics. The whole library can be exported to a JSON
//! document and restored from one.
//!
//! # Features
//!
//! - SQLite-backed book store
//! - Reading status derived from page progress
//! - Safe edits that never leave more pages read than the book has
//! - Validate-then-apply JSON import, applied in a single transaction
//! - Page count detection for attached PDFs
//! - CLI and JSON HTTP API

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Library service.
pub mod library;
/// PDF page counts.
pub mod pdf;
/// Progress and status rules.
pub mod progress;
/// Sample data.
pub mod sample;
/// HTTP server.
pub mod server;
/// Export and import.
pub mod transfer;


pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, Result};
pub use library::Library;
pub use server::AppState;
