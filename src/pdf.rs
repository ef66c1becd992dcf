//! Page counts for attached PDF documents.

use crate::error::{AppError, Result};
use lopdf::Document;
use std::path::Path;

/// Page information for a PDF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfInfo {
    /// Number of pages.
    pub page_count: u32,
    /// File size in bytes.
    pub file_size: u64,
    /// Whether `page_count` was guessed from the file size.
    pub estimated: bool,
}

/// Exact page count from the PDF page tree.
pub fn page_count(path: &Path) -> Result<u32> {
    let doc = Document::load(path).map_err(|e| AppError::Pdf(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Rough page count from file size, for PDFs that cannot be parsed.
pub fn estimate_page_count(file_size: u64) -> u32 {
    let (min, bytes_per_page) = match file_size {
        0..50_000 => (1, 15_000.0),
        50_000..200_000 => (3, 20_000.0),
        200_000..500_000 => (10, 25_000.0),
        500_000..1_000_000 => (25, 30_000.0),
        1_000_000..5_000_000 => (50, 35_000.0),
        _ => (200, 40_000.0),
    };

    ((file_size as f64 / bytes_per_page).round() as u32).max(min)
}

/// Page information for `path`, falling back to an estimate if parsing fails.
pub fn inspect(path: &Path) -> Result<PdfInfo> {
    let file_size = std::fs::metadata(path)?.len();

    match page_count(path) {
        Ok(pages) if pages > 0 => Ok(PdfInfo {
            page_count: pages,
            file_size,
            estimated: false,
        }),
        Ok(_) | Err(_) => {
            let page_count = estimate_page_count(file_size);
            tracing::warn!(
                path = %path.display(),
                file_size,
                page_count,
                "Could not read PDF page tree, estimating page count"
            );
            Ok(PdfInfo {
                page_count,
                file_size,
                estimated: true,
            })
        }
    }
}
