//! # Library Views
//!
//! Pure helpers that slice the current snapshot for display: one list per
//! tab, genre sections for the Saved tab, and progress numbers for the
//! reading cards.

use crate::core::book::{Book, BookStatus};

/// Books sharing one genre, as shown in a Saved-tab section.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreSection {
    pub genre: String,
    pub books: Vec<Book>,
}

/// Books with the given status, in snapshot order.
pub fn by_status(books: &[Book], status: BookStatus) -> Vec<Book> {
    books
        .iter()
        .filter(|book| book.status() == status)
        .cloned()
        .collect()
}

/// Groups books by their raw genre string, sections ordered by first
/// appearance. "Fiction" and "fiction" end up in separate sections.
pub fn group_by_genre(books: &[Book]) -> Vec<GenreSection> {
    let mut sections: Vec<GenreSection> = Vec::new();
    for book in books {
        match sections.iter_mut().find(|s| s.genre == book.genre) {
            Some(section) => section.books.push(book.clone()),
            None => sections.push(GenreSection {
                genre: book.genre.clone(),
                books: vec![book.clone()],
            }),
        }
    }
    sections
}

/// Fraction of the book read, in `[0, 1]`. Books without a page count read as 0.
pub fn progress_fraction(book: &Book) -> f32 {
    let total = book.total_pages();
    if total == 0 {
        return 0.0;
    }
    (book.current_page() as f32 / total as f32).clamp(0.0, 1.0)
}

/// Whole-number percentage for the progress label (truncated, like the bar text).
pub fn progress_percent(book: &Book) -> u8 {
    let total = book.total_pages() as u64;
    if total == 0 {
        return 0;
    }
    (book.current_page() as u64 * 100 / total).min(100) as u8
}

/// Pulls a user-entered page number into `[0, total_pages]`.
pub fn clamp_page(page: i64, total_pages: u32) -> u32 {
    page.clamp(0, total_pages as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, status: BookStatus, genre: &str) -> Book {
        let mut book = Book::new(id, "Author").with_id(id).with_genre(genre);
        match status {
            BookStatus::Saved => {}
            BookStatus::Reading => book.start_reading(300),
            BookStatus::Finished => book.finish(),
        }
        book
    }

    fn reading(current: u32, total: u32) -> Book {
        let mut book = Book::new("t", "a").with_total_pages(total);
        book.start_reading(total);
        book.set_progress(current).unwrap();
        book
    }

    fn mixed() -> Vec<Book> {
        vec![
            book("r1", BookStatus::Reading, "Romance"),
            book("s1", BookStatus::Saved, "Romance"),
            book("f1", BookStatus::Finished, "Mystery"),
            book("s2", BookStatus::Saved, "Self-Help"),
            book("r2", BookStatus::Reading, "Mystery"),
            book("s3", BookStatus::Saved, "Romance"),
        ]
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.id()).collect()
    }

    #[test]
    fn test_by_status_keeps_snapshot_order() {
        let books = mixed();
        assert_eq!(ids(&by_status(&books, BookStatus::Saved)), vec!["s1", "s2", "s3"]);
        assert_eq!(ids(&by_status(&books, BookStatus::Reading)), vec!["r1", "r2"]);
        assert_eq!(ids(&by_status(&books, BookStatus::Finished)), vec!["f1"]);
    }

    #[test]
    fn test_by_status_partitions_books() {
        let books = mixed();
        let mut seen: Vec<String> = BookStatus::ALL
            .iter()
            .flat_map(|s| by_status(&books, *s))
            .map(|b| b.id().to_string())
            .collect();
        seen.sort();
        let mut all: Vec<String> = books.iter().map(|b| b.id().to_string()).collect();
        all.sort();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_by_status_empty_input() {
        assert!(by_status(&[], BookStatus::Saved).is_empty());
    }

    #[test]
    fn test_group_by_genre_first_appearance_order() {
        let saved = by_status(&mixed(), BookStatus::Saved);
        let sections = group_by_genre(&saved);
        let genres: Vec<_> = sections.iter().map(|s| s.genre.as_str()).collect();
        assert_eq!(genres, vec!["Romance", "Self-Help"]);
        assert_eq!(ids(&sections[0].books), vec!["s1", "s3"]);
        assert_eq!(ids(&sections[1].books), vec!["s2"]);
    }

    #[test]
    fn test_group_by_genre_is_case_sensitive() {
        let books = vec![
            book("a", BookStatus::Saved, "Fiction"),
            book("b", BookStatus::Saved, "fiction"),
        ];
        assert_eq!(group_by_genre(&books).len(), 2);
    }

    #[test]
    fn test_progress_fraction_zero_pages() {
        let book = Book::new("t", "a");
        assert_eq!(progress_fraction(&book), 0.0);
        assert_eq!(progress_percent(&book), 0);
    }

    #[test]
    fn test_progress_fraction_in_unit_range() {
        for total in [1u32, 7, 100, 401] {
            for current in 0..=total {
                let f = progress_fraction(&reading(current, total));
                assert!((0.0..=1.0).contains(&f), "{current}/{total} gave {f}");
            }
        }
    }

    #[test]
    fn test_progress_values() {
        let book = reading(145, 400);
        assert!((progress_fraction(&book) - 0.3625).abs() < 1e-6);
        assert_eq!(progress_percent(&book), 36);

        let mut done = reading(145, 400);
        done.finish();
        assert_eq!(progress_fraction(&done), 1.0);
        assert_eq!(progress_percent(&done), 100);
    }

    #[test]
    fn test_clamp_page_bounds() {
        for total in [0u32, 1, 50, 400] {
            for page in [-1000i64, -1, 0, 1, 49, 50, 399, 400, 401, i64::MAX] {
                let clamped = clamp_page(page, total);
                assert!(clamped <= total);
                if page >= 0 && page <= total as i64 {
                    assert_eq!(clamped as i64, page);
                }
            }
        }
    }

    #[test]
    fn test_clamp_page_edges() {
        assert_eq!(clamp_page(-5, 400), 0);
        assert_eq!(clamp_page(450, 400), 400);
        assert_eq!(clamp_page(12, 0), 0);
    }
}
