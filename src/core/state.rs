//! # Application State
//!
//! Everything a front end needs, wired together in one place. No
//! presentation types live here.
//!
//! ```text
//! App
//! ├── config: ResolvedConfig           // data dir, default page count, genre
//! ├── auth: Arc<dyn AuthService>       // who is signed in
//! └── library: LibraryController       // observable books of that user
//! ```
//!
//! Signing in or out goes through `App` so the library always follows the
//! current account.

use std::fmt;
use std::io;
use std::sync::Arc;

use log::info;

use crate::core::auth::{AuthError, AuthService, LocalAuth, Registration, UserId};
use crate::core::config::ResolvedConfig;
use crate::core::controller::{LibraryController, LibraryError};
use crate::storage::{JsonFileStore, LibraryStore};

/// Failure of an operation that spans the account and its library.
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Library(LibraryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "{e}"),
            AppError::Library(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<LibraryError> for AppError {
    fn from(e: LibraryError) -> Self {
        AppError::Library(e)
    }
}

pub struct App {
    pub config: ResolvedConfig,
    pub auth: Arc<dyn AuthService>,
    pub library: LibraryController,
}

impl App {
    pub fn new(
        config: ResolvedConfig,
        store: Arc<dyn LibraryStore>,
        auth: Arc<dyn AuthService>,
    ) -> Self {
        let library =
            LibraryController::new(store, auth.current_user(), config.default_total_pages);
        Self {
            config,
            auth,
            library,
        }
    }

    /// File-backed accounts and library under `config.data_dir`.
    pub fn open(config: ResolvedConfig) -> io::Result<Self> {
        let store = Arc::new(JsonFileStore::open(&config.data_dir)?);
        let auth = Arc::new(LocalAuth::open(&config.data_dir)?);
        info!("Opened data directory {}", config.data_dir.display());
        Ok(Self::new(config, store, auth))
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let user = self.auth.sign_in(email, password).await?;
        self.library.switch_user(Some(user.clone()));
        Ok(user)
    }

    pub async fn register(&mut self, registration: Registration) -> Result<UserId, AuthError> {
        let user = self.auth.register(registration).await?;
        self.library.switch_user(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        self.auth.sign_out().await?;
        self.library.switch_user(None);
        Ok(())
    }

    /// Deletes the signed-in account and its whole library, then signs out.
    /// The library goes first so a failure leaves the account usable.
    pub async fn delete_account(&mut self) -> Result<UserId, AppError> {
        if self.auth.current_user().is_none() {
            return Err(AuthError::NotSignedIn.into());
        }
        self.library.clear().await?;
        let user = self.auth.delete_account().await?;
        self.library.switch_user(None);
        Ok(user)
    }
}
