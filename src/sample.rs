//! Sample books for trying out an empty library.

use crate::db::{BookStatus, NewBook};

/// The built-in sample books.
pub fn sample_books() -> Vec<NewBook> {
    [
        (
            "The Sealed Nectar",
            "https://images-na.ssl-images-amazon.com/images/S/compressed.photo.goodreads.com/books/1348990566i/5470.jpg",
            521,
            334,
            BookStatus::Reading,
        ),
        (
            "The Hundred-page Machine Learning Book",
            "https://images-na.ssl-images-amazon.com/images/S/compressed.photo.goodreads.com/books/1546752372i/43014615.jpg",
            152,
            40,
            BookStatus::Reading,
        ),
        (
            "The C Programming Language",
            "https://images-na.ssl-images-amazon.com/images/S/compressed.photo.goodreads.com/books/1391032531i/515601.jpg",
            312,
            0,
            BookStatus::ToRead,
        ),
        (
            "Designing Data-Intensive Applications",
            "https://images-na.ssl-images-amazon.com/images/S/compressed.photo.goodreads.com/books/1457728494i/23463279.jpg",
            658,
            658,
            BookStatus::Completed,
        ),
    ]
    .into_iter()
    .map(|(title, cover, total_pages, pages_read, status)| NewBook {
        title: title.to_string(),
        cover: cover.to_string(),
        pdf_path: None,
        total_pages,
        pages_read,
        status: Some(status),
    })
    .collect()
}
