//! Live per-user snapshot channels shared by the store backends.
//!
//! Each user with an active collection gets one `watch` channel holding the
//! latest snapshot. Writers edit a copy and publish it; subscribers forward
//! every published value into their `mpsc` sender.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, PoisonError};

use log::debug;
use tokio::sync::{mpsc, watch};

use crate::core::auth::UserId;
use crate::core::book::Book;
use crate::storage::store::{Snapshot, StoreError};

#[derive(Default)]
pub(crate) struct Feeds {
    channels: Mutex<HashMap<UserId, watch::Sender<Snapshot>>>,
}

impl Feeds {
    /// Subscribes to a user's channel, creating it from `load` on first use.
    pub(crate) fn subscribe<F>(
        &self,
        user: &UserId,
        load: F,
    ) -> Result<watch::Receiver<Snapshot>, StoreError>
    where
        F: FnOnce() -> Result<Snapshot, StoreError>,
    {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let channel = match channels.entry(user.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(watch::channel(load()?).0),
        };
        Ok(channel.subscribe())
    }

    /// Applies `edit` to a copy of the user's current snapshot and publishes
    /// the result. Nothing is published if `edit` fails or changes nothing.
    pub(crate) fn modify<L, E>(&self, user: &UserId, load: L, edit: E) -> Result<(), StoreError>
    where
        L: FnOnce() -> Result<Snapshot, StoreError>,
        E: FnOnce(&mut Snapshot) -> Result<(), StoreError>,
    {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let channel = match channels.entry(user.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(watch::channel(load()?).0),
        };
        let mut next = channel.borrow().clone();
        edit(&mut next)?;
        channel.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        Ok(())
    }

    /// Latest snapshot for a user, if their channel exists.
    pub(crate) fn current(&self, user: &UserId) -> Option<Snapshot> {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.get(user).map(|c| c.borrow().clone())
    }

    /// Drops a user's channel, ending every subscription on it.
    pub(crate) fn close(&self, user: &UserId) {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.remove(user);
    }
}

/// Forwards snapshots from `feed` into `sender` until either side goes away.
pub(crate) async fn forward(
    mut feed: watch::Receiver<Snapshot>,
    sender: mpsc::Sender<Snapshot>,
) -> Result<(), StoreError> {
    loop {
        let snapshot = feed.borrow_and_update().clone();
        if sender.send(snapshot).await.is_err() {
            debug!("Snapshot receiver dropped, ending subscription");
            return Ok(());
        }
        tokio::select! {
            changed = feed.changed() => {
                if changed.is_err() {
                    debug!("Snapshot feed closed, ending subscription");
                    return Ok(());
                }
            }
            _ = sender.closed() => {
                debug!("Snapshot receiver dropped, ending subscription");
                return Ok(());
            }
        }
    }
}

/// Replaces the book with the same id in place, or appends it.
pub(crate) fn upsert(books: &mut Snapshot, book: &Book) {
    match books.iter_mut().find(|b| b.same_entry(book)) {
        Some(slot) => *slot = book.clone(),
        None => books.push(book.clone()),
    }
}

pub(crate) fn remove(books: &mut Snapshot, book_id: &str) {
    books.retain(|b| b.id() != book_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1")
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let a = Book::new("A", "x").with_id("a");
        let b = Book::new("B", "x").with_id("b");
        let mut books = vec![a.clone(), b.clone()];
        let mut a2 = a.clone();
        a2.title = "A, revised".into();
        upsert(&mut books, &a2);
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "A, revised");
        assert_eq!(books[1].id(), "b");
    }

    #[test]
    fn test_upsert_appends_new_ids() {
        let mut books = vec![Book::new("A", "x").with_id("a")];
        upsert(&mut books, &Book::new("B", "x").with_id("b"));
        assert_eq!(books.len(), 2);
        assert_eq!(books[1].id(), "b");
    }

    #[test]
    fn test_failed_edit_publishes_nothing() {
        let feeds = Feeds::default();
        let rx = feeds.subscribe(&user(), || Ok(Vec::new())).unwrap();
        let result = feeds.modify(
            &user(),
            || Ok(Vec::new()),
            |books| {
                books.push(Book::new("A", "x"));
                Err(StoreError::Write("disk full".into()))
            },
        );
        assert_eq!(result, Err(StoreError::Write("disk full".into())));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(feeds.current(&user()), Some(Vec::new()));
    }

    #[test]
    fn test_unchanged_edit_does_not_notify() {
        let feeds = Feeds::default();
        let book = Book::new("A", "x").with_id("a");
        feeds
            .modify(&user(), || Ok(Vec::new()), |books| {
                upsert(books, &book);
                Ok(())
            })
            .unwrap();
        let rx = feeds.subscribe(&user(), || Ok(Vec::new())).unwrap();
        feeds
            .modify(&user(), || Ok(Vec::new()), |books| {
                upsert(books, &book);
                Ok(())
            })
            .unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_forward_ends_when_feed_closes() {
        let feeds = Feeds::default();
        let rx = feeds.subscribe(&user(), || Ok(Vec::new())).unwrap();
        let (tx, mut snapshots) = mpsc::channel(8);
        let task = tokio::spawn(forward(rx, tx));

        assert_eq!(snapshots.recv().await, Some(Vec::new()));
        feeds.close(&user());
        assert_eq!(task.await.unwrap(), Ok(()));
        assert_eq!(snapshots.recv().await, None);
    }

    #[tokio::test]
    async fn test_forward_ends_when_receiver_dropped() {
        let feeds = Feeds::default();
        let rx = feeds.subscribe(&user(), || Ok(Vec::new())).unwrap();
        let (tx, snapshots) = mpsc::channel(8);
        let task = tokio::spawn(forward(rx, tx));
        drop(snapshots);
        assert_eq!(task.await.unwrap(), Ok(()));
    }
}
