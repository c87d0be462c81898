//! # Curated Recommendations
//!
//! The fixed list of titles shown on the home screen, plus the category
//! strip and the search box behind it. Picking a recommendation produces a
//! saved `Book` ready for the library.

use crate::core::book::Book;

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub title: &'static str,
    pub author: &'static str,
    pub genre: &'static str,
    /// Average reader rating, 0.0 to 5.0.
    pub rating: f32,
    /// Cover image reference.
    pub cover: &'static str,
}

impl Recommendation {
    /// A fresh saved book for this title. Empty genres fall back to `default_genre`.
    pub fn to_book(&self, default_genre: &str) -> Book {
        Book::new(self.title, self.author)
            .with_genre(default_genre)
            .with_genre(self.genre)
            .with_image_url(self.cover)
    }
}

const CURATED: &[Recommendation] = &[
    Recommendation {
        title: "Comeback",
        author: "Author Name",
        genre: "Self-Help",
        rating: 4.2,
        cover: "covers/come.png",
    },
    Recommendation {
        title: "King of Envy",
        author: "Ana Huang",
        genre: "Romance",
        rating: 4.8,
        cover: "covers/envy.png",
    },
    Recommendation {
        title: "The Striker",
        author: "Ana Huang",
        genre: "Romance",
        rating: 4.2,
        cover: "covers/the.png",
    },
    Recommendation {
        title: "King of Wrath",
        author: "Ana Huang",
        genre: "Romance",
        rating: 4.9,
        cover: "covers/wrath.png",
    },
    Recommendation {
        title: "Heart Still Beats",
        author: "Author Name",
        genre: "Mystery",
        rating: 4.7,
        cover: "covers/heart.png",
    },
];

/// Category strip on the home screen.
pub fn categories() -> &'static [&'static str] {
    &["Fiction", "Self-Help", "Mystery", "Fantasy"]
}

/// Popular genres suggested under the search box.
pub fn popular_genres() -> &'static [&'static str] {
    &["Romance", "Fantasy", "Mystery", "Self-Help", "Thriller", "Sci-Fi"]
}

pub fn trending() -> &'static [Recommendation] {
    CURATED
}

/// "Recommended for you" shows the curated list back to front.
pub fn recommended() -> Vec<&'static Recommendation> {
    CURATED.iter().rev().collect()
}

/// Curated titles whose title, author or genre contains `query`, ignoring case.
/// A blank query matches nothing.
pub fn search(query: &str) -> Vec<&'static Recommendation> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    CURATED
        .iter()
        .filter(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.author.to_lowercase().contains(&needle)
                || r.genre.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Exact (case-insensitive) title lookup.
pub fn find_title(title: &str) -> Option<&'static Recommendation> {
    let title = title.trim();
    CURATED.iter().find(|r| r.title.eq_ignore_ascii_case(title))
}
