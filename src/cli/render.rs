//! Plain-text formatting for library and catalog listings.

use crate::core::book::{Book, BookStatus, MAX_RATING};
use crate::core::catalog::Recommendation;
use crate::core::views::{progress_fraction, progress_percent};

const BAR_WIDTH: usize = 20;

/// Five-star strip, filled up to `stars`.
pub fn stars(stars: u8) -> String {
    (0..MAX_RATING)
        .map(|i| if i < stars { '★' } else { '☆' })
        .collect()
}

/// `[#######.............]`
pub fn progress_bar(book: &Book) -> String {
    let filled = (progress_fraction(book) * BAR_WIDTH as f32).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

/// One book, with the details its tab shows.
pub fn book_line(book: &Book) -> String {
    let mut line = format!(
        "{}  {} by {} ({})",
        book.id(),
        display_title(&book.title),
        book.author,
        book.genre
    );
    match book.status() {
        BookStatus::Saved => {}
        BookStatus::Reading => line.push_str(&format!(
            "\n    {} {}%  {} / {} pages",
            progress_bar(book),
            progress_percent(book),
            book.current_page(),
            book.total_pages()
        )),
        BookStatus::Finished => {
            line.push_str(&format!("\n    {}", stars(book.rating.stars())));
            if !book.review.is_empty() {
                line.push_str(&format!("  \"{}\"", book.review));
            }
        }
    }
    line
}

/// A finished book as listed under "My Reviews".
pub fn review_line(book: &Book) -> String {
    let review = if book.review.trim().is_empty() {
        "No written review, just rated.".to_string()
    } else {
        format!("\"{}\"", book.review)
    };
    format!(
        "{} by {}\n    {}  {}",
        display_title(&book.title),
        book.author,
        stars(book.rating.stars()),
        review
    )
}

pub fn recommendation_line(rec: &Recommendation) -> String {
    format!("{} by {} ({})  ★ {:.1}", rec.title, rec.author, rec.genre, rec.rating)
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() { "(untitled)" } else { title }
}
