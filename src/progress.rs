//! Reading progress rules.
//!
//! A book's status follows from how many of its pages have been read:
//!
//! | pages read              | status      |
//! |-------------------------|-------------|
//! | `0`                     | `to-read`   |
//! | `1..total_pages`        | `reading`   |
//! | `total_pages`           | `completed` |
//!
//! Shrinking a book below the pages already read is only allowed with an
//! explicit confirmation, and then resets the progress to zero.

use crate::db::{Book, BookDetails, BookStatus};
use crate::error::{AppError, Result};

/// Status implied by `pages_read` out of `total_pages`.
///
/// Callers are expected to have checked `0 <= pages_read <= total_pages`.
pub fn derive_status(pages_read: i64, total_pages: i64) -> BookStatus {
    if pages_read <= 0 {
        BookStatus::ToRead
    } else if pages_read >= total_pages {
        BookStatus::Completed
    } else {
        BookStatus::Reading
    }
}

/// Reject pages read outside `0..=total_pages`.
pub fn validate_pages_read(pages_read: i64, total_pages: i64) -> Result<()> {
    if pages_read < 0 || pages_read > total_pages {
        return Err(AppError::page_out_of_range(pages_read, total_pages));
    }
    Ok(())
}

/// Parse user input for pages read; anything but a whole number is rejected.
pub fn parse_pages_read(input: &str, total_pages: i64) -> Result<i64> {
    let pages_read = input.trim().parse::<i64>().map_err(|_| {
        AppError::InvalidPageCount(format!("'{}' is not a whole number of pages", input.trim()))
    })?;
    validate_pages_read(pages_read, total_pages)?;
    Ok(pages_read)
}

/// Progress as a percentage, 0 for an empty book.
pub fn progress_percent(pages_read: i64, total_pages: i64) -> f64 {
    if total_pages > 0 {
        pages_read as f64 / total_pages as f64 * 100.0
    } else {
        0.0
    }
}

/// Outcome of planning a details edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    /// Fields to write, with status re-derived from `pages_read`.
    pub details: BookDetails,
    /// Pages read after the edit.
    pub pages_read: i64,
    /// Whether the edit discards existing progress.
    pub resets_progress: bool,
}

/// Plan an edit of `current` to `requested`.
///
/// If the new total is below the pages already read the edit fails with
/// [`AppError::ConfirmationRequired`] unless `confirmed`, in which case
/// progress is reset to zero. The stored status always follows the
/// resulting progress; the requested status is ignored.
pub fn plan_edit(current: &Book, requested: &BookDetails, confirmed: bool) -> Result<EditPlan> {
    requested.validate()?;

    let shrinks_below_progress = requested.total_pages < current.pages_read;
    if shrinks_below_progress && !confirmed {
        return Err(AppError::ConfirmationRequired {
            pages_read: current.pages_read,
            total_pages: requested.total_pages,
        });
    }

    let pages_read = if shrinks_below_progress { 0 } else { current.pages_read };

    let mut details = requested.clone();
    details.title = details.title.trim().to_string();
    details.status = derive_status(pages_read, details.total_pages);

    Ok(EditPlan {
        details,
        pages_read,
        resets_progress: shrinks_below_progress,
    })
}
