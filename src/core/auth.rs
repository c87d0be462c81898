//! # Accounts
//!
//! Who is signed in, and how they got there. The library store only ever
//! sees the resulting `UserId`.
//!
//! `LocalAuth` keeps accounts under the data directory:
//!
//! ```text
//! <data_dir>/
//! ├── users.json     // registered accounts (bcrypt password hashes)
//! └── session.json   // the signed-in user, if any
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::storage::files;

/// bcrypt work factor for stored passwords.
const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;

// ============================================================================
// Identity
// ============================================================================

/// Opaque account identifier. Scopes every library read and write.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    pub dob: String,
    pub favorite_genre: String,
}

/// What a new user fills in on sign-up.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub dob: String,
    pub favorite_genre: String,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    EmptyCredentials,
    InvalidCredentials,
    AlreadyRegistered(String),
    NotSignedIn,
    Hash(String),
    Io(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::EmptyCredentials => write!(f, "Email and password cannot be empty"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::AlreadyRegistered(email) => {
                write!(f, "Registration failed: {email} is already registered")
            }
            AuthError::NotSignedIn => write!(f, "User not logged in"),
            AuthError::Hash(msg) => write!(f, "password hashing failed: {msg}"),
            AuthError::Io(msg) => write!(f, "account storage error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::Io(e.to_string())
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<UserId>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError>;

    /// Creates an account and signs it in.
    async fn register(&self, registration: Registration) -> Result<UserId, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Profile of the signed-in user.
    async fn profile(&self) -> Result<UserProfile, AuthError>;

    /// Removes the signed-in user's account and signs them out. Their
    /// library is not touched here.
    async fn delete_account(&self) -> Result<UserId, AuthError>;
}

// ============================================================================
// Local accounts
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone)]
struct Account {
    profile: UserProfile,
    password_hash: String,
    registered_at: i64,
}

#[derive(Serialize, Deserialize, Default, Debug)]
struct AccountIndex {
    accounts: Vec<Account>,
}

#[derive(Serialize, Deserialize, Debug)]
struct Session {
    user_id: UserId,
    signed_in_at: i64,
}

/// File-backed accounts for a single device.
pub struct LocalAuth {
    dir: PathBuf,
    current: Mutex<Option<UserId>>,
}

impl LocalAuth {
    /// Opens the account files in `data_dir`, restoring any saved session.
    pub fn open(data_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        let dir = data_dir.to_path_buf();
        let session_path = dir.join("session.json");
        let current = if session_path.exists() {
            match fs::read_to_string(&session_path)
                .and_then(|json| serde_json::from_str::<Session>(&json).map_err(io::Error::other))
            {
                Ok(session) => {
                    debug!("Restored session for {}", session.user_id);
                    Some(session.user_id)
                }
                Err(e) => {
                    warn!("Ignoring unreadable session file: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Ok(Self {
            dir,
            current: Mutex::new(current),
        })
    }

    fn load_index(&self) -> io::Result<AccountIndex> {
        files::read_json_or_default(&self.dir.join("users.json"))
    }

    fn save_index(&self, index: &AccountIndex) -> io::Result<()> {
        files::atomic_write_json(&self.dir.join("users.json"), index)
    }

    fn set_current(&self, user: Option<UserId>) -> io::Result<()> {
        let path = self.dir.join("session.json");
        match &user {
            Some(user_id) => files::atomic_write_json(
                &path,
                &Session {
                    user_id: user_id.clone(),
                    signed_in_at: Utc::now().timestamp(),
                },
            )?,
            None => files::remove_if_exists(&path)?,
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = user;
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_matches(account: &Account, password: &str) -> bool {
    bcrypt::verify(password, &account.password_hash).unwrap_or_else(|e| {
        warn!("Unreadable password hash for {}: {}", account.profile.user_id, e);
        false
    })
}

#[async_trait]
impl AuthService for LocalAuth {
    fn current_user(&self) -> Option<UserId> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::EmptyCredentials);
        }
        let email = normalize_email(email);
        let index = self.load_index()?;
        let account = index
            .accounts
            .iter()
            .find(|a| a.profile.email == email)
            .filter(|a| password_matches(a, password))
            .ok_or(AuthError::InvalidCredentials)?;
        let user_id = account.profile.user_id.clone();
        self.set_current(Some(user_id.clone()))?;
        info!("Signed in {}", user_id);
        Ok(user_id)
    }

    async fn register(&self, registration: Registration) -> Result<UserId, AuthError> {
        if registration.email.trim().is_empty() || registration.password.is_empty() {
            return Err(AuthError::EmptyCredentials);
        }
        let email = normalize_email(&registration.email);
        let mut index = self.load_index()?;
        if index.accounts.iter().any(|a| a.profile.email == email) {
            return Err(AuthError::AlreadyRegistered(email));
        }

        let password_hash = bcrypt::hash(&registration.password, PASSWORD_COST)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        let user_id = UserId::new(uuid::Uuid::new_v4().to_string());
        index.accounts.push(Account {
            profile: UserProfile {
                user_id: user_id.clone(),
                email,
                dob: registration.dob,
                favorite_genre: registration.favorite_genre,
            },
            password_hash,
            registered_at: Utc::now().timestamp(),
        });
        self.save_index(&index)?;
        self.set_current(Some(user_id.clone()))?;
        info!("Registered {}", user_id);
        Ok(user_id)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None)?;
        info!("Signed out");
        Ok(())
    }

    async fn profile(&self) -> Result<UserProfile, AuthError> {
        let user_id = self.current_user().ok_or(AuthError::NotSignedIn)?;
        self.load_index()?
            .accounts
            .into_iter()
            .find(|a| a.profile.user_id == user_id)
            .map(|a| a.profile)
            .ok_or(AuthError::NotSignedIn)
    }

    async fn delete_account(&self) -> Result<UserId, AuthError> {
        let user_id = self.current_user().ok_or(AuthError::NotSignedIn)?;
        let mut index = self.load_index()?;
        index.accounts.retain(|a| a.profile.user_id != user_id);
        self.save_index(&index)?;
        self.set_current(None)?;
        info!("Deleted account {}", user_id);
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: password.to_string(),
            dob: "2001-04-09".to_string(),
            favorite_genre: "Romance".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        let user = auth.register(registration("ana@example.com", "pw")).await.unwrap();
        assert_eq!(auth.current_user(), Some(user.clone()));

        let profile = auth.profile().await.unwrap();
        assert_eq!(profile.user_id, user);
        assert_eq!(profile.favorite_genre, "Romance");
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        auth.register(registration("ana@example.com", "hunter2")).await.unwrap();
        let users = fs::read_to_string(dir.path().join("users.json")).unwrap();
        assert!(!users.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        assert_eq!(
            auth.register(registration("  ", "pw")).await,
            Err(AuthError::EmptyCredentials)
        );
        assert_eq!(auth.sign_in("a@b.c", "").await, Err(AuthError::EmptyCredentials));
        assert_eq!(
            AuthError::EmptyCredentials.to_string(),
            "Email and password cannot be empty"
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        auth.register(registration("ana@example.com", "pw")).await.unwrap();
        let again = auth.register(registration(" ANA@example.com", "pw2")).await;
        assert!(matches!(again, Err(AuthError::AlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        let user = auth.register(registration("ana@example.com", "pw")).await.unwrap();
        auth.sign_out().await.unwrap();

        assert_eq!(
            auth.sign_in("ana@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.sign_in("nobody@example.com", "pw").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(auth.current_user(), None);
        assert_eq!(auth.sign_in("Ana@Example.com", "pw").await, Ok(user));
    }

    #[tokio::test]
    async fn test_password_hash_is_bcrypt() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        auth.register(registration("ana@example.com", "hunter2")).await.unwrap();
        let index = auth.load_index().unwrap();
        let hash = &index.accounts[0].password_hash;
        assert!(hash.starts_with("$2"));
        assert!(bcrypt::verify("hunter2", hash).unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_hash_rejects_sign_in() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        auth.register(registration("ana@example.com", "pw")).await.unwrap();
        auth.sign_out().await.unwrap();

        let mut index = auth.load_index().unwrap();
        index.accounts[0].password_hash = "not-a-hash".to_string();
        auth.save_index(&index).unwrap();
        assert_eq!(
            auth.sign_in("ana@example.com", "pw").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_delete_account_removes_account_and_session() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        let keep = auth.register(registration("bo@example.com", "pw")).await.unwrap();
        let gone = auth.register(registration("ana@example.com", "pw")).await.unwrap();

        assert_eq!(auth.delete_account().await, Ok(gone));
        assert_eq!(auth.current_user(), None);
        assert!(!dir.path().join("session.json").exists());
        assert_eq!(
            auth.sign_in("ana@example.com", "pw").await,
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(auth.sign_in("bo@example.com", "pw").await, Ok(keep));
    }

    #[tokio::test]
    async fn test_delete_account_requires_sign_in() {
        let dir = tempfile::tempdir().unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        assert_eq!(auth.delete_account().await, Err(AuthError::NotSignedIn));
    }

    #[tokio::test]
    async fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let user = {
            let auth = LocalAuth::open(dir.path()).unwrap();
            auth.register(registration("ana@example.com", "pw")).await.unwrap()
        };
        let auth = LocalAuth::open(dir.path()).unwrap();
        assert_eq!(auth.current_user(), Some(user));

        auth.sign_out().await.unwrap();
        let auth = LocalAuth::open(dir.path()).unwrap();
        assert_eq!(auth.current_user(), None);
        assert_eq!(auth.profile().await, Err(AuthError::NotSignedIn));
    }
}
