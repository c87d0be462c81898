//! # Books
//!
//! A `Book` is one entry in a user's personal library.
//!
//! ```text
//! Book
//! ├── id: String            // uuid v4, fixed at creation
//! ├── title / author / image_url / genre
//! ├── rating: Rating        // 0..=5 stars
//! ├── review: String
//! └── shelf: Shelf
//!     ├── Saved { total_pages }
//!     ├── Reading(Progress { current_page, total_pages })
//!     └── Finished { total_pages }
//! ```
//!
//! Reading progress only exists on the `Reading` shelf, so a saved book
//! can't carry a stray page count and a finished book is always at its
//! last page. Stores persist the flat `BookRecord` form instead.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Genre given to books added without one.
pub const DEFAULT_GENRE: &str = "General";

/// Highest star rating a book can receive.
pub const MAX_RATING: u8 = 5;

// ============================================================================
// Status
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookStatus {
    #[default]
    Saved,
    Reading,
    Finished,
}

impl BookStatus {
    /// All statuses, in library tab order.
    pub const ALL: [BookStatus; 3] = [BookStatus::Reading, BookStatus::Saved, BookStatus::Finished];

    pub fn label(&self) -> &'static str {
        match self {
            BookStatus::Saved => "Saved",
            BookStatus::Reading => "Reading",
            BookStatus::Finished => "Finished",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// A page past the end of the book was requested.
    PageOutOfRange { page: u32, total_pages: u32 },
    /// Progress can only be recorded while a book is being read.
    NotReading(BookStatus),
    RatingOutOfRange(u8),
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::PageOutOfRange { page, total_pages } => {
                write!(f, "page {page} is past the end of the book ({total_pages} pages)")
            }
            BookError::NotReading(status) => {
                write!(f, "book is {status}, start reading it before updating progress")
            }
            BookError::RatingOutOfRange(rating) => {
                write!(f, "rating {rating} is out of range (0-{MAX_RATING})")
            }
        }
    }
}

impl std::error::Error for BookError {}

// ============================================================================
// Value types
// ============================================================================

/// Star rating, 0 (unrated) to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Rating(u8);

impl Rating {
    pub fn new(stars: u8) -> Result<Self, BookError> {
        if stars > MAX_RATING {
            return Err(BookError::RatingOutOfRange(stars));
        }
        Ok(Rating(stars))
    }

    pub fn stars(&self) -> u8 {
        self.0
    }
}

/// Reading position within a book. `current_page <= total_pages` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    current_page: u32,
    total_pages: u32,
}

impl Progress {
    pub fn new(current_page: u32, total_pages: u32) -> Result<Self, BookError> {
        if current_page > total_pages {
            return Err(BookError::PageOutOfRange {
                page: current_page,
                total_pages,
            });
        }
        Ok(Progress {
            current_page,
            total_pages,
        })
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }
}

/// Which library tab a book sits on, along with the state that only makes
/// sense there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shelf {
    Saved { total_pages: u32 },
    Reading(Progress),
    Finished { total_pages: u32 },
}

impl Shelf {
    pub fn status(&self) -> BookStatus {
        match self {
            Shelf::Saved { .. } => BookStatus::Saved,
            Shelf::Reading(_) => BookStatus::Reading,
            Shelf::Finished { .. } => BookStatus::Finished,
        }
    }

    pub fn total_pages(&self) -> u32 {
        match self {
            Shelf::Saved { total_pages } | Shelf::Finished { total_pages } => *total_pages,
            Shelf::Reading(progress) => progress.total_pages(),
        }
    }

    pub fn current_page(&self) -> u32 {
        match self {
            Shelf::Saved { .. } => 0,
            Shelf::Reading(progress) => progress.current_page(),
            Shelf::Finished { total_pages } => *total_pages,
        }
    }
}

// ============================================================================
// Book
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: String,
    pub title: String,
    pub author: String,
    pub image_url: String,
    pub genre: String,
    pub rating: Rating,
    pub review: String,
    shelf: Shelf,
}

impl Book {
    /// Creates a saved book with a fresh id.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Book {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            author: author.into(),
            image_url: String::new(),
            genre: DEFAULT_GENRE.to_string(),
            rating: Rating::default(),
            review: String::new(),
            shelf: Shelf::Saved { total_pages: 0 },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the genre. Blank input keeps the current genre.
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        let genre = genre.into();
        if !genre.trim().is_empty() {
            self.genre = genre;
        }
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    /// Sets the page count. A reading book whose position would fall past
    /// the new end is moved back to the last page.
    pub fn with_total_pages(mut self, total_pages: u32) -> Self {
        self.shelf = match self.shelf {
            Shelf::Saved { .. } => Shelf::Saved { total_pages },
            Shelf::Finished { .. } => Shelf::Finished { total_pages },
            Shelf::Reading(progress) => Shelf::Reading(Progress {
                current_page: progress.current_page.min(total_pages),
                total_pages,
            }),
        };
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shelf(&self) -> Shelf {
        self.shelf
    }

    pub fn status(&self) -> BookStatus {
        self.shelf.status()
    }

    pub fn total_pages(&self) -> u32 {
        self.shelf.total_pages()
    }

    pub fn current_page(&self) -> u32 {
        self.shelf.current_page()
    }

    /// True when both values describe the same library entry, regardless of
    /// any edits made since.
    pub fn same_entry(&self, other: &Book) -> bool {
        self.id == other.id
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    /// Moves the book onto the Reading shelf at page 0.
    ///
    /// `default_pages` fills in the page count when it is still unknown.
    /// A book that is already being read keeps its position.
    pub fn start_reading(&mut self, default_pages: u32) {
        if let Shelf::Reading(_) = self.shelf {
            return;
        }
        let total_pages = match self.shelf.total_pages() {
            0 => default_pages,
            n => n,
        };
        self.shelf = Shelf::Reading(Progress {
            current_page: 0,
            total_pages,
        });
    }

    /// Marks the book finished. The position jumps to the last page.
    pub fn finish(&mut self) {
        self.shelf = Shelf::Finished {
            total_pages: self.shelf.total_pages(),
        };
    }

    /// Puts the book back on the Saved shelf, dropping any progress.
    pub fn move_to_saved(&mut self) {
        self.shelf = Shelf::Saved {
            total_pages: self.shelf.total_pages(),
        };
    }

    /// Records the current page of a book being read.
    pub fn set_progress(&mut self, page: u32) -> Result<(), BookError> {
        match self.shelf {
            Shelf::Reading(progress) => {
                self.shelf = Shelf::Reading(Progress::new(page, progress.total_pages)?);
                Ok(())
            }
            other => Err(BookError::NotReading(other.status())),
        }
    }

    pub fn rate(&mut self, stars: u8, review: impl Into<String>) -> Result<(), BookError> {
        self.rating = Rating::new(stars)?;
        self.review = review.into();
        Ok(())
    }
}

// ============================================================================
// Persisted form
// ============================================================================

/// Flat document shape written to and read from a store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub image_url: String,
    pub total_pages: u32,
    pub current_page: u32,
    pub rating: u8,
    pub review: String,
    pub status: BookStatus,
    pub genre: String,
}

impl Default for BookRecord {
    fn default() -> Self {
        BookRecord {
            id: String::new(),
            title: String::new(),
            author: String::new(),
            image_url: String::new(),
            total_pages: 0,
            current_page: 0,
            rating: 0,
            review: String::new(),
            status: BookStatus::Saved,
            genre: DEFAULT_GENRE.to_string(),
        }
    }
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        BookRecord {
            id: book.id.clone(),
            title: book.title.clone(),
            author: book.author.clone(),
            image_url: book.image_url.clone(),
            total_pages: book.total_pages(),
            current_page: book.current_page(),
            rating: book.rating.stars(),
            review: book.review.clone(),
            status: book.status(),
            genre: book.genre.clone(),
        }
    }
}

impl TryFrom<BookRecord> for Book {
    type Error = BookError;

    fn try_from(record: BookRecord) -> Result<Self, Self::Error> {
        let shelf = match record.status {
            BookStatus::Saved => Shelf::Saved {
                total_pages: record.total_pages,
            },
            BookStatus::Reading => {
                Shelf::Reading(Progress::new(record.current_page, record.total_pages)?)
            }
            BookStatus::Finished => Shelf::Finished {
                total_pages: record.total_pages,
            },
        };
        Ok(Book {
            id: record.id,
            title: record.title,
            author: record.author,
            image_url: record.image_url,
            genre: record.genre,
            rating: Rating::new(record.rating)?,
            review: record.review,
            shelf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_defaults() {
        let book = Book::new("Dune", "Frank Herbert");
        assert_eq!(book.status(), BookStatus::Saved);
        assert_eq!(book.genre, "General");
        assert_eq!(book.current_page(), 0);
        assert_eq!(book.total_pages(), 0);
        assert_eq!(book.rating.stars(), 0);
        assert!(uuid::Uuid::parse_str(book.id()).is_ok());
    }

    #[test]
    fn test_new_books_get_distinct_ids() {
        let a = Book::new("A", "x");
        let b = Book::new("A", "x");
        assert_ne!(a.id(), b.id());
        assert!(!a.same_entry(&b));
    }

    #[test]
    fn test_blank_genre_keeps_default() {
        let book = Book::new("Dune", "Frank Herbert").with_genre("   ");
        assert_eq!(book.genre, "General");
    }

    #[test]
    fn test_start_reading_fills_unknown_page_count() {
        let mut book = Book::new("Dune", "Frank Herbert").with_id("b1");
        book.start_reading(300);
        assert_eq!(book.status(), BookStatus::Reading);
        assert_eq!(book.total_pages(), 300);
        assert_eq!(book.current_page(), 0);
    }

    #[test]
    fn test_start_reading_keeps_known_page_count() {
        let mut book = Book::new("Dune", "Frank Herbert").with_total_pages(412);
        book.start_reading(300);
        assert_eq!(book.total_pages(), 412);
    }

    #[test]
    fn test_start_reading_twice_keeps_position() {
        let mut book = Book::new("Dune", "Frank Herbert").with_total_pages(400);
        book.start_reading(300);
        book.set_progress(120).unwrap();
        book.start_reading(300);
        assert_eq!(book.current_page(), 120);
    }

    #[test]
    fn test_finish_jumps_to_last_page() {
        let mut book = Book::new("Dune", "Frank Herbert").with_total_pages(400);
        book.start_reading(300);
        book.set_progress(145).unwrap();
        book.finish();
        assert_eq!(book.status(), BookStatus::Finished);
        assert_eq!(book.current_page(), 400);
    }

    #[test]
    fn test_move_to_saved_drops_progress() {
        let mut book = Book::new("Dune", "Frank Herbert").with_total_pages(400);
        book.start_reading(300);
        book.set_progress(50).unwrap();
        book.move_to_saved();
        assert_eq!(book.status(), BookStatus::Saved);
        assert_eq!(book.current_page(), 0);
        assert_eq!(book.total_pages(), 400);
    }

    #[test]
    fn test_set_progress_past_end_is_rejected() {
        let mut book = Book::new("Dune", "Frank Herbert").with_total_pages(100);
        book.start_reading(300);
        let err = book.set_progress(101).unwrap_err();
        assert_eq!(
            err,
            BookError::PageOutOfRange {
                page: 101,
                total_pages: 100
            }
        );
        assert_eq!(book.current_page(), 0);
    }

    #[test]
    fn test_set_progress_requires_reading() {
        let mut book = Book::new("Dune", "Frank Herbert").with_total_pages(100);
        let err = book.set_progress(10).unwrap_err();
        assert_eq!(err, BookError::NotReading(BookStatus::Saved));
    }

    #[test]
    fn test_shrinking_page_count_pulls_position_back() {
        let mut book = Book::new("Dune", "Frank Herbert").with_total_pages(400);
        book.start_reading(300);
        book.set_progress(350).unwrap();
        let book = book.with_total_pages(200);
        assert_eq!(book.current_page(), 200);
    }

    #[test]
    fn test_rate_validates_stars() {
        let mut book = Book::new("Dune", "Frank Herbert");
        assert_eq!(book.rate(6, "too many"), Err(BookError::RatingOutOfRange(6)));
        book.rate(5, "Dark, gripping and unforgettable.").unwrap();
        assert_eq!(book.rating.stars(), 5);
        assert_eq!(book.review, "Dark, gripping and unforgettable.");
    }

    #[test]
    fn test_record_uses_flat_camel_case_keys() {
        let mut book = Book::new("Dune", "Frank Herbert")
            .with_id("b1")
            .with_genre("Sci-Fi")
            .with_total_pages(400);
        book.start_reading(300);
        book.set_progress(145).unwrap();

        let json = serde_json::to_value(BookRecord::from(&book)).unwrap();
        assert_eq!(json["id"], "b1");
        assert_eq!(json["status"], "READING");
        assert_eq!(json["currentPage"], 145);
        assert_eq!(json["totalPages"], 400);
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["genre"], "Sci-Fi");
    }

    #[test]
    fn test_record_missing_fields_take_defaults() {
        let record: BookRecord = serde_json::from_str(r#"{"id":"b1","title":"Dune"}"#).unwrap();
        let book = Book::try_from(record).unwrap();
        assert_eq!(book.id(), "b1");
        assert_eq!(book.status(), BookStatus::Saved);
        assert_eq!(book.genre, "General");
    }

    #[test]
    fn test_record_with_impossible_progress_is_rejected() {
        let record = BookRecord {
            id: "b1".into(),
            status: BookStatus::Reading,
            current_page: 500,
            total_pages: 400,
            ..Default::default()
        };
        assert!(matches!(
            Book::try_from(record),
            Err(BookError::PageOutOfRange { page: 500, .. })
        ));
    }

    #[test]
    fn test_finished_record_ignores_stored_page() {
        let record = BookRecord {
            id: "b1".into(),
            status: BookStatus::Finished,
            current_page: 12,
            total_pages: 400,
            ..Default::default()
        };
        let book = Book::try_from(record).unwrap();
        assert_eq!(book.current_page(), 400);
    }

    #[test]
    fn test_status_labels_in_tab_order() {
        let labels: Vec<_> = BookStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels, vec!["Reading", "Saved", "Finished"]);
    }
}
