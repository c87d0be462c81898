use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::core::auth::UserId;
use crate::core::book::Book;

/// A complete copy of one user's library, in store order.
pub type Snapshot = Vec<Book>;

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No signed-in user to scope the operation to.
    Unauthenticated,
    /// The backend rejected or failed a write or delete. Carries its message verbatim.
    Write(String),
    /// The live subscription could not be established or broke.
    Observation(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unauthenticated => write!(f, "unauthenticated: user not logged in"),
            StoreError::Write(msg) => write!(f, "store write error: {msg}"),
            StoreError::Observation(msg) => write!(f, "store observation error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Per-user persistence of library books.
///
/// Every call takes the user explicitly; a store never looks up who is
/// signed in on its own.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Returns the name of the backend.
    fn name(&self) -> &str;

    /// Pushes a full snapshot of the user's books on subscription and after
    /// every change, until `sender`'s receiver is dropped or the feed ends.
    ///
    /// With no user, sends a single empty snapshot and returns.
    async fn observe_all(
        &self,
        user: Option<&UserId>,
        sender: Sender<Snapshot>,
    ) -> Result<(), StoreError>;

    /// Stores `book` under its id, replacing any existing record.
    async fn add(&self, user: Option<&UserId>, book: &Book) -> Result<(), StoreError>;

    /// Full-record replace keyed by id. Same semantics as `add`.
    async fn update(&self, user: Option<&UserId>, book: &Book) -> Result<(), StoreError>;

    async fn delete(&self, user: Option<&UserId>, book_id: &str) -> Result<(), StoreError>;

    /// Removes the user's whole library. Live subscribers see an empty snapshot.
    async fn clear(&self, user: Option<&UserId>) -> Result<(), StoreError>;
}
