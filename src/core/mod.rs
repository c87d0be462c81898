//! # Core Application Logic
//!
//! This module contains NextRead's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │          CORE           │
//!                    │     (this module)       │
//!                    │                         │
//!                    │  • Book (data model)    │
//!                    │  • LibraryController    │
//!                    │  • views (tabs, genres) │
//!                    │                         │
//!                    │  Storage behind traits  │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    CLI     │      │   Mobile   │      │    API     │
//!     │  Adapter   │      │  (future)  │      │  (future)  │
//!     │   (clap)   │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`book`]: `Book`, its shelves and the persisted `BookRecord`
//! - [`controller`]: `LibraryController`, the observable library of one user
//! - [`views`]: per-tab filtering, genre sections, progress numbers
//! - [`auth`]: accounts and the signed-in user
//! - [`catalog`]: curated recommendations and search
//! - [`config`]: settings resolution
//! - [`state`]: `App`, everything wired together

pub mod auth;
pub mod book;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod state;
pub mod views;
