//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::core::auth::UserId;
use crate::core::book::Book;
use crate::core::controller::LibraryState;
use crate::storage::MemoryStore;

pub const TEST_USER: &str = "test-user";

/// An empty memory store plus the user its tests act as.
pub fn signed_in_store() -> (Arc<MemoryStore>, UserId) {
    (Arc::new(MemoryStore::new()), UserId::new(TEST_USER))
}

/// A saved book with a fixed id.
pub fn book(id: &str, title: &str) -> Book {
    Book::new(title, "Test Author").with_id(id)
}

/// Waits (up to a second) for a loaded state whose books satisfy `pred`.
pub async fn wait_for_books<F>(rx: &mut watch::Receiver<LibraryState>, pred: F) -> Vec<Book>
where
    F: Fn(&[Book]) -> bool,
{
    let state = tokio::time::timeout(
        Duration::from_secs(1),
        rx.wait_for(|s| s.loaded && pred(&s.books)),
    )
    .await
    .expect("timed out waiting for library snapshot")
    .expect("library state channel closed");
    state.books.clone()
}
