//! In-process library store.
//!
//! Snapshots are delivered synchronously on write, which makes it the store
//! of choice for tests. Failures can be switched on to exercise error paths.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::mpsc::Sender;

use crate::core::auth::UserId;
use crate::core::book::Book;
use crate::storage::feed::{self, Feeds};
use crate::storage::{LibraryStore, Snapshot, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    feeds: Feeds,
    write_failure: Mutex<Option<String>>,
    observe_failure: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a user's whole collection.
    pub fn seed(&self, user: &UserId, books: Vec<Book>) {
        let _ = self.feeds.modify(user, || Ok(Vec::new()), |current| {
            *current = books;
            Ok(())
        });
    }

    /// The user's books as currently stored.
    pub fn snapshot(&self, user: &UserId) -> Snapshot {
        self.feeds.current(user).unwrap_or_default()
    }

    /// Makes every following write or delete fail with `message` (`None` clears it).
    pub fn fail_writes(&self, message: Option<&str>) {
        *self.write_failure.lock().unwrap_or_else(PoisonError::into_inner) =
            message.map(str::to_string);
    }

    /// Makes every following subscription fail with `message` (`None` clears it).
    pub fn fail_observation(&self, message: Option<&str>) {
        *self.observe_failure.lock().unwrap_or_else(PoisonError::into_inner) =
            message.map(str::to_string);
    }

    /// Ends all live subscriptions for a user, as a backend does when access is revoked.
    /// The stored books are discarded with the channel.
    pub fn close_feed(&self, user: &UserId) {
        self.feeds.close(user);
    }

    fn check_write(&self) -> Result<(), StoreError> {
        match &*self.write_failure.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(msg) => Err(StoreError::Write(msg.clone())),
            None => Ok(()),
        }
    }

    fn put(&self, user: Option<&UserId>, book: &Book) -> Result<(), StoreError> {
        let user = user.ok_or(StoreError::Unauthenticated)?;
        self.check_write()?;
        self.feeds.modify(user, || Ok(Vec::new()), |books| {
            feed::upsert(books, book);
            Ok(())
        })?;
        debug!("Stored book {} for {}", book.id(), user);
        Ok(())
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn observe_all(
        &self,
        user: Option<&UserId>,
        sender: Sender<Snapshot>,
    ) -> Result<(), StoreError> {
        let Some(user) = user else {
            let _ = sender.send(Vec::new()).await;
            return Ok(());
        };
        let failure = self
            .observe_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(msg) = failure {
            warn!("Refusing subscription for {}: {}", user, msg);
            return Err(StoreError::Observation(msg));
        }
        let rx = self.feeds.subscribe(user, || Ok(Vec::new()))?;
        feed::forward(rx, sender).await
    }

    async fn add(&self, user: Option<&UserId>, book: &Book) -> Result<(), StoreError> {
        self.put(user, book)
    }

    async fn update(&self, user: Option<&UserId>, book: &Book) -> Result<(), StoreError> {
        self.put(user, book)
    }

    async fn delete(&self, user: Option<&UserId>, book_id: &str) -> Result<(), StoreError> {
        let user = user.ok_or(StoreError::Unauthenticated)?;
        self.check_write()?;
        self.feeds.modify(user, || Ok(Vec::new()), |books| {
            feed::remove(books, book_id);
            Ok(())
        })?;
        debug!("Deleted book {} for {}", book_id, user);
        Ok(())
    }

    async fn clear(&self, user: Option<&UserId>) -> Result<(), StoreError> {
        let user = user.ok_or(StoreError::Unauthenticated)?;
        self.check_write()?;
        self.feeds.modify(user, || Ok(Vec::new()), |books| {
            books.clear();
            Ok(())
        })?;
        debug!("Cleared library of {}", user);
        Ok(())
    }
}
