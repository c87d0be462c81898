//! # JSON File Store
//!
//! Keeps each user's library as one JSON document under `<data_dir>/library/`:
//!
//! ```text
//! library/
//! ├── 3f0c...e1.json   // [ { "id": ..., "title": ..., "status": "READING", ... }, ... ]
//! └── 9a7b...42.json
//! ```
//!
//! Documents hold `BookRecord`s in insertion order. File names are the
//! hex-encoded user id. All writes use atomic rename (write `.tmp`, then
//! `rename()`) for crash safety. Live updates are pushed to subscribers in
//! this process only.
//!
//! Records that don't form a valid `Book` are left out of snapshots but are
//! never dropped from disk: every write merges the new books back into the
//! stored record list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

use crate::core::auth::UserId;
use crate::core::book::{Book, BookRecord};
use crate::storage::feed::{self, Feeds};
use crate::storage::files;
use crate::storage::{LibraryStore, Snapshot, StoreError};

pub struct JsonFileStore {
    dir: PathBuf,
    feeds: Feeds,
}

impl JsonFileStore {
    /// Opens (creating if needed) the library directory under `data_dir`.
    pub fn open(data_dir: &Path) -> io::Result<Self> {
        let dir = data_dir.join("library");
        fs::create_dir_all(&dir)?;
        info!("Library store at {}", dir.display());
        Ok(Self {
            dir,
            feeds: Feeds::default(),
        })
    }

    fn user_path(&self, user: &UserId) -> PathBuf {
        let name: String = user.as_str().bytes().map(|b| format!("{b:02x}")).collect();
        self.dir.join(format!("{name}.json"))
    }

    fn read_records(&self, user: &UserId) -> io::Result<Vec<BookRecord>> {
        files::read_json_or_default(&self.user_path(user))
    }

    /// Reads a user's document. Records that can't become a `Book` are skipped.
    fn load(&self, user: &UserId) -> io::Result<Snapshot> {
        let books = self
            .read_records(user)?
            .into_iter()
            .filter_map(|record| {
                let id = record.id.clone();
                match Book::try_from(record) {
                    Ok(book) => Some(book),
                    Err(e) => {
                        warn!("Skipping stored book {} of {}: {}", id, user, e);
                        None
                    }
                }
            })
            .collect();
        Ok(books)
    }

    /// Writes `books` over the user's document, keeping unreadable records
    /// unless `deleted` names them.
    fn save(&self, user: &UserId, books: &[Book], deleted: Option<&str>) -> io::Result<()> {
        let stored = self.read_records(user)?;
        files::atomic_write_json(&self.user_path(user), &merge(stored, books, deleted))
    }

    fn write_with<E>(
        &self,
        user: Option<&UserId>,
        deleted: Option<&str>,
        edit: E,
    ) -> Result<(), StoreError>
    where
        E: FnOnce(&mut Snapshot),
    {
        let user = user.ok_or(StoreError::Unauthenticated)?;
        self.feeds.modify(
            user,
            || self.load(user).map_err(|e| StoreError::Write(e.to_string())),
            |books| {
                edit(books);
                self.save(user, books, deleted)
                    .map_err(|e| StoreError::Write(e.to_string()))
            },
        )
    }
}

/// Lays `books` over the stored records in stored order. Readable records
/// missing from `books` were removed; unreadable ones are carried over as-is.
/// New books go at the end.
fn merge(stored: Vec<BookRecord>, books: &[Book], deleted: Option<&str>) -> Vec<BookRecord> {
    let mut pending: Vec<&Book> = books.iter().collect();
    let mut merged = Vec::with_capacity(stored.len().max(books.len()));
    for record in stored {
        if let Some(pos) = pending.iter().position(|b| b.id() == record.id) {
            merged.push(BookRecord::from(pending.remove(pos)));
        } else if deleted != Some(record.id.as_str()) && Book::try_from(record.clone()).is_err() {
            merged.push(record);
        }
    }
    merged.extend(pending.into_iter().map(BookRecord::from));
    merged
}

#[async_trait]
impl LibraryStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
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
        let rx = self.feeds.subscribe(user, || {
            self.load(user)
                .map_err(|e| StoreError::Observation(e.to_string()))
        })?;
        debug!("Subscribed to library of {}", user);
        feed::forward(rx, sender).await
    }

    async fn add(&self, user: Option<&UserId>, book: &Book) -> Result<(), StoreError> {
        self.write_with(user, None, |books| feed::upsert(books, book))
    }

    async fn update(&self, user: Option<&UserId>, book: &Book) -> Result<(), StoreError> {
        self.write_with(user, None, |books| feed::upsert(books, book))
    }

    async fn delete(&self, user: Option<&UserId>, book_id: &str) -> Result<(), StoreError> {
        self.write_with(user, Some(book_id), |books| feed::remove(books, book_id))
    }

    async fn clear(&self, user: Option<&UserId>) -> Result<(), StoreError> {
        let user = user.ok_or(StoreError::Unauthenticated)?;
        let path = self.user_path(user);
        self.feeds.modify(user, || Ok(Vec::new()), |books| {
            books.clear();
            files::remove_if_exists(&path).map_err(|e| StoreError::Write(e.to_string()))
        })?;
        info!("Removed library document of {}", user);
        Ok(())
    }
}
