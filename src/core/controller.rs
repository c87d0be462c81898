//! # Library Controller
//!
//! Owns the observable list of the signed-in user's books and the handful
//! of operations the UI may perform on it.
//!
//! ```text
//!   UI ──add/update/delete──▶ LibraryController ──▶ LibraryStore
//!    ▲                                                   │
//!    │                                          snapshots (mpsc)
//!    │                                                   ▼
//!    └──── watch::Receiver<LibraryState> ◀── subscription task
//! ```
//!
//! Mutations never touch the local list. The store's next snapshot is the
//! only thing that changes what the UI sees, so the list always mirrors
//! what was actually persisted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::core::auth::UserId;
use crate::core::book::{Book, BookError};
use crate::core::views::clamp_page;
use crate::storage::{LibraryStore, Snapshot, StoreError};

/// Snapshots buffered between the store and the controller.
const SNAPSHOT_BUFFER: usize = 16;

/// Longest a mutation waits for the store to echo its write back.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum LibraryError {
    Store(StoreError),
    Book(BookError),
    /// No book with this id in the current snapshot.
    NotFound(String),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Store(e) => write!(f, "{e}"),
            LibraryError::Book(e) => write!(f, "{e}"),
            LibraryError::NotFound(id) => write!(f, "no book with id {id} in your library"),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<StoreError> for LibraryError {
    fn from(e: StoreError) -> Self {
        LibraryError::Store(e)
    }
}

impl From<BookError> for LibraryError {
    fn from(e: BookError) -> Self {
        LibraryError::Book(e)
    }
}

/// What the UI renders from.
#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    pub books: Vec<Book>,
    /// False until the first snapshot of the current subscription arrives.
    pub loaded: bool,
    generation: u64,
}

pub struct LibraryController {
    store: Arc<dyn LibraryStore>,
    user: Option<UserId>,
    state: Arc<watch::Sender<LibraryState>>,
    subscription: JoinHandle<()>,
    default_total_pages: u32,
}

impl LibraryController {
    /// Starts observing `user`'s library right away. Must be called inside a
    /// tokio runtime.
    pub fn new(store: Arc<dyn LibraryStore>, user: Option<UserId>, default_total_pages: u32) -> Self {
        let state = Arc::new(watch::channel(LibraryState::default()).0);
        let subscription = subscribe(store.clone(), user.clone(), state.clone(), 0);
        Self {
            store,
            user,
            state,
            subscription,
            default_total_pages,
        }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Current books, in store order.
    pub fn books(&self) -> Vec<Book> {
        self.state.borrow().books.clone()
    }

    pub fn find(&self, id: &str) -> Option<Book> {
        self.state.borrow().books.iter().find(|b| b.id() == id).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<LibraryState> {
        self.state.subscribe()
    }

    /// Waits for the first snapshot of the current subscription and returns it.
    pub async fn loaded(&self) -> Vec<Book> {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| s.loaded).await {
            Ok(state) => state.books.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Drops the current subscription and observes `user`'s library instead.
    pub fn switch_user(&mut self, user: Option<UserId>) {
        self.subscription.abort();
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.books.clear();
            state.loaded = false;
            generation = state.generation;
        });
        info!(
            "Switching library to {}",
            user.as_ref().map_or("no user", UserId::as_str)
        );
        self.subscription = subscribe(self.store.clone(), user.clone(), self.state.clone(), generation);
        self.user = user;
    }

    // ── Store operations ────────────────────────────────────────────────────
    //
    // A successful mutation returns once the published list has picked up
    // the write (or moved past it), so the caller's next read sees it.

    pub async fn add_book(&self, book: &Book) -> Result<(), LibraryError> {
        let before = self.find(book.id());
        let result = self.store.add(self.user.as_ref(), book).await;
        report("add", book.id(), result)?;
        self.settle_on(book, before).await;
        Ok(())
    }

    pub async fn update_book(&self, book: &Book) -> Result<(), LibraryError> {
        let before = self.find(book.id());
        let result = self.store.update(self.user.as_ref(), book).await;
        report("update", book.id(), result)?;
        self.settle_on(book, before).await;
        Ok(())
    }

    pub async fn delete_book(&self, id: &str) -> Result<(), LibraryError> {
        let before = self.find(id);
        let result = self.store.delete(self.user.as_ref(), id).await;
        report("delete", id, result)?;
        self.settle(|books| {
            let now = books.iter().find(|b| b.id() == id);
            now.is_none() || now != before.as_ref()
        })
        .await;
        Ok(())
    }

    /// Removes every book of the current user.
    pub async fn clear(&self) -> Result<(), LibraryError> {
        let result = self.store.clear(self.user.as_ref()).await;
        report("clear", "library", result)?;
        self.settle(|books| books.is_empty()).await;
        Ok(())
    }

    /// Waits for the published copy of `book` to show the write, or to
    /// move on from `before` if another writer got there first.
    async fn settle_on(&self, book: &Book, before: Option<Book>) {
        self.settle(|books| {
            let now = books.iter().find(|b| b.id() == book.id());
            now == Some(book) || now != before.as_ref()
        })
        .await;
    }

    /// Waits until `caught_up` holds for the published list, the user
    /// switches, or `SETTLE_TIMEOUT` passes.
    async fn settle<F>(&self, caught_up: F)
    where
        F: Fn(&[Book]) -> bool,
    {
        let generation = self.state.borrow().generation;
        let mut rx = self.state.subscribe();
        let wait = rx.wait_for(|s| s.generation != generation || (s.loaded && caught_up(&s.books)));
        let settled = tokio::time::timeout(SETTLE_TIMEOUT, wait).await.is_ok();
        if !settled {
            debug!("Library snapshot did not catch up within {:?}", SETTLE_TIMEOUT);
        }
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    /// Moves a book to Reading, assuming the configured page count if unknown.
    pub async fn start_reading(&self, id: &str) -> Result<Book, LibraryError> {
        let pages = self.default_total_pages;
        self.edit(id, |book| {
            book.start_reading(pages);
            Ok(())
        })
        .await
    }

    /// Records a user-entered page, pulled into the book's page range first.
    pub async fn update_progress(&self, id: &str, page: i64) -> Result<Book, LibraryError> {
        self.edit(id, |book| book.set_progress(clamp_page(page, book.total_pages())))
            .await
    }

    pub async fn finish(&self, id: &str) -> Result<Book, LibraryError> {
        self.edit(id, |book| {
            book.finish();
            Ok(())
        })
        .await
    }

    pub async fn move_to_saved(&self, id: &str) -> Result<Book, LibraryError> {
        self.edit(id, |book| {
            book.move_to_saved();
            Ok(())
        })
        .await
    }

    pub async fn review(&self, id: &str, stars: u8, text: &str) -> Result<Book, LibraryError> {
        self.edit(id, |book| book.rate(stars, text)).await
    }

    /// Applies `change` to the current copy of a book and writes the result back.
    async fn edit<F>(&self, id: &str, change: F) -> Result<Book, LibraryError>
    where
        F: FnOnce(&mut Book) -> Result<(), BookError>,
    {
        let mut book = self
            .find(id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        change(&mut book)?;
        self.update_book(&book).await?;
        Ok(book)
    }
}

impl Drop for LibraryController {
    fn drop(&mut self) {
        self.subscription.abort();
    }
}

fn report(op: &str, id: &str, result: Result<(), StoreError>) -> Result<(), LibraryError> {
    match result {
        Ok(()) => {
            debug!("Book {} {} succeeded", id, op);
            Ok(())
        }
        Err(e) => {
            warn!("Failed to {} book {}: {}", op, id, e);
            Err(e.into())
        }
    }
}

/// Publishes `books` unless a newer subscription has taken over.
fn publish(state: &watch::Sender<LibraryState>, generation: u64, books: Vec<Book>) {
    state.send_if_modified(|current| {
        if current.generation != generation {
            return false;
        }
        current.books = books;
        current.loaded = true;
        true
    });
}

/// Spawns the task that relays store snapshots into `state`. When the store's
/// feed ends or fails, the published list falls back to empty.
fn subscribe(
    store: Arc<dyn LibraryStore>,
    user: Option<UserId>,
    state: Arc<watch::Sender<LibraryState>>,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (tx, mut rx) = mpsc::channel::<Snapshot>(SNAPSHOT_BUFFER);
        let relay = async {
            while let Some(books) = rx.recv().await {
                debug!("Library snapshot with {} books", books.len());
                publish(&state, generation, books);
            }
        };
        let (result, ()) = tokio::join!(store.observe_all(user.as_ref(), tx), relay);
        match result {
            Ok(()) => debug!("Library subscription on {} ended", store.name()),
            Err(e) => warn!("Library subscription on {} failed: {}", store.name(), e),
        }
        publish(&state, generation, Vec::new());
    })
}
