//! # CLI Adapter
//!
//! The command-line front end. Parses arguments with clap, turns each
//! subcommand into calls on `App`, and prints the outcome.
//!
//! This is the only module that knows about clap or writes to the terminal.
//! Like any front end, it changes the library only through
//! `LibraryController` and reads it back from the published snapshot.

pub mod render;

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::debug;

use crate::core::auth::Registration;
use crate::core::book::{Book, BookStatus};
use crate::core::catalog;
use crate::core::config::ResolvedConfig;
use crate::core::controller::LibraryError;
use crate::core::state::App;
use crate::core::views::{by_status, group_by_genre};

pub type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "nextread", about = "Book recommendations and a personal reading library")]
pub struct Args {
    /// Directory holding the library, accounts and log file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    Saved,
    Reading,
    Finished,
}

impl From<StatusArg> for BookStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Saved => BookStatus::Saved,
            StatusArg::Reading => BookStatus::Reading,
            StatusArg::Finished => BookStatus::Finished,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in
    Register {
        email: String,
        password: String,
        /// Date of birth
        #[arg(long, default_value = "")]
        dob: String,
        #[arg(long, default_value = "")]
        favorite_genre: String,
    },
    /// Sign in to an existing account
    Login { email: String, password: String },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Delete the signed-in account and its library
    DeleteAccount,
    /// Trending and recommended titles
    Recommend,
    /// Search curated titles by title, author or genre
    Search { query: String },
    /// Save a curated title to your library
    Save { title: String },
    /// Add a book of your own
    Add {
        title: String,
        author: String,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long, default_value_t = 0)]
        pages: u32,
        /// Cover image URL
        #[arg(long, default_value = "")]
        image: String,
    },
    /// List your library, one section per tab
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Saved books grouped by genre
    Shelf,
    /// Start reading a book
    Start { id: String },
    /// Record the page you are on
    Progress {
        id: String,
        #[arg(allow_hyphen_values = true)]
        page: i64,
    },
    /// Mark a book finished
    Finish { id: String },
    /// Move a book back to Saved
    Saved { id: String },
    /// Rate (0-5) and review a book
    Review { id: String, rating: u8, text: String },
    /// Remove a book from your library
    Remove { id: String },
    /// Ratings and reviews of your finished books
    Reviews,
}

impl Command {
    /// Subcommand name for logging. Arguments stay out of the log since some carry passwords.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register { .. } => "register",
            Command::Login { .. } => "login",
            Command::Logout => "logout",
            Command::Whoami => "whoami",
            Command::DeleteAccount => "delete-account",
            Command::Recommend => "recommend",
            Command::Search { .. } => "search",
            Command::Save { .. } => "save",
            Command::Add { .. } => "add",
            Command::List { .. } => "list",
            Command::Shelf => "shelf",
            Command::Start { .. } => "start",
            Command::Progress { .. } => "progress",
            Command::Finish { .. } => "finish",
            Command::Saved { .. } => "saved",
            Command::Review { .. } => "review",
            Command::Remove { .. } => "remove",
            Command::Reviews => "reviews",
        }
    }
}

/// Opens the data directory and runs one command against it, printing to stdout.
pub async fn run(command: Command, config: ResolvedConfig) -> CliResult {
    let mut app = App::open(config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&mut app, command, &mut out).await
}

pub async fn execute<W: Write>(app: &mut App, command: Command, out: &mut W) -> CliResult {
    debug!("Executing {} command", command.name());
    match command {
        Command::Register {
            email,
            password,
            dob,
            favorite_genre,
        } => {
            app.register(Registration {
                email,
                password,
                dob,
                favorite_genre,
            })
            .await?;
            writeln!(out, "Registration successful")?;
        }
        Command::Login { email, password } => {
            app.sign_in(&email, &password).await?;
            writeln!(out, "Login successful")?;
        }
        Command::Logout => {
            app.sign_out().await?;
            writeln!(out, "Logged out successfully")?;
        }
        Command::Whoami => {
            let profile = app.auth.profile().await?;
            writeln!(out, "{}", profile.email)?;
            if !profile.favorite_genre.is_empty() {
                writeln!(out, "Favorite genre: {}", profile.favorite_genre)?;
            }
        }
        Command::DeleteAccount => {
            app.delete_account().await?;
            writeln!(out, "Account Deleted")?;
        }
        Command::Recommend => {
            writeln!(out, "Categories: {}", catalog::categories().join(", "))?;
            writeln!(out, "\nTrending in NextRead")?;
            for rec in catalog::trending() {
                writeln!(out, "  {}", render::recommendation_line(rec))?;
            }
            writeln!(out, "\nRecommended For You")?;
            for rec in catalog::recommended() {
                writeln!(out, "  {}", render::recommendation_line(rec))?;
            }
        }
        Command::Search { query } => {
            let results = catalog::search(&query);
            if results.is_empty() {
                writeln!(out, "No matches. Popular searches: {}", catalog::popular_genres().join(", "))?;
            }
            for rec in results {
                writeln!(out, "{}", render::recommendation_line(rec))?;
            }
        }
        Command::Save { title } => {
            let rec = catalog::find_title(&title)
                .ok_or_else(|| format!("\"{title}\" is not in the recommendations"))?;
            app.library
                .add_book(&rec.to_book(&app.config.default_genre))
                .await?;
            writeln!(out, "{} added to Saved", rec.title)?;
        }
        Command::Add {
            title,
            author,
            genre,
            pages,
            image,
        } => {
            if title.trim().is_empty() || author.trim().is_empty() {
                return Err("title and author cannot be blank".into());
            }
            let book = Book::new(title.trim(), author.trim())
                .with_genre(app.config.default_genre.as_str())
                .with_genre(genre.unwrap_or_default())
                .with_total_pages(pages)
                .with_image_url(image);
            app.library.add_book(&book).await?;
            writeln!(out, "Book added successfully ({})", book.id())?;
        }
        Command::List { status } => {
            let books = app.library.loaded().await;
            let statuses = match status {
                Some(s) => vec![BookStatus::from(s)],
                None => BookStatus::ALL.to_vec(),
            };
            for status in statuses {
                let tab = by_status(&books, status);
                writeln!(out, "{} ({})", status, tab.len())?;
                for book in &tab {
                    writeln!(out, "  {}", render::book_line(book))?;
                }
            }
        }
        Command::Shelf => {
            let books = app.library.loaded().await;
            let saved = by_status(&books, BookStatus::Saved);
            if saved.is_empty() {
                writeln!(out, "Nothing saved yet")?;
            }
            for section in group_by_genre(&saved) {
                writeln!(out, "{}", section.genre)?;
                for book in &section.books {
                    writeln!(out, "  {}", render::book_line(book))?;
                }
            }
        }
        Command::Start { id } => {
            app.library.loaded().await;
            let book = app.library.start_reading(&id).await?;
            writeln!(out, "Started {} ({} pages)", book.title, book.total_pages())?;
        }
        Command::Progress { id, page } => {
            app.library.loaded().await;
            let book = app.library.update_progress(&id, page).await?;
            writeln!(out, "{}", render::book_line(&book))?;
        }
        Command::Finish { id } => {
            app.library.loaded().await;
            let book = app.library.finish(&id).await?;
            writeln!(out, "Finished {}", book.title)?;
        }
        Command::Saved { id } => {
            app.library.loaded().await;
            let book = app.library.move_to_saved(&id).await?;
            writeln!(out, "{} moved to Saved", book.title)?;
        }
        Command::Review { id, rating, text } => {
            app.library.loaded().await;
            app.library.review(&id, rating, &text).await?;
            writeln!(out, "Book updated successfully")?;
        }
        Command::Remove { id } => {
            app.library.loaded().await;
            if app.library.find(&id).is_none() {
                return Err(LibraryError::NotFound(id).into());
            }
            app.library.delete_book(&id).await?;
            writeln!(out, "Book deleted successfully")?;
        }
        Command::Reviews => {
            let books = app.library.loaded().await;
            let finished = by_status(&books, BookStatus::Finished);
            if finished.is_empty() {
                writeln!(out, "No reviews written by user")?;
            }
            for book in &finished {
                writeln!(out, "{}", render::review_line(book))?;
            }
        }
    }
    Ok(())
}
