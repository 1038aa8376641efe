use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use simplelog::{Config, WriteLogger};

use pagemark::library::{resolve_config_path, resolve_log_path, resolve_preferences_path};
use pagemark::panic_handler::initialize_panic_handler;
use pagemark::settings::{Settings, load_settings_from_path};
use pagemark::{BookmarkStore, DocumentsDir, FilePreferences};

#[derive(Parser)]
#[command(
    name = "pagemark",
    about = "Per-page bookmarks for PDF documents",
    version,
    author
)]
struct Cli {
    /// Config file (defaults to <config dir>/pagemark/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Documents directory stripped from locations when building keys
    #[arg(long, global = true)]
    documents_dir: Option<PathBuf>,

    /// Bookmark store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a page is bookmarked (exit code 1 if not)
    Has {
        /// Document path or file:// URL
        location: String,

        /// Zero-based page index
        page: usize,
    },

    /// Bookmark a page
    Add { location: String, page: usize },

    /// Remove a page bookmark
    Remove { location: String, page: usize },

    /// Flip the bookmark on a page and print the new state
    Toggle { location: String, page: usize },

    /// Print all bookmarked pages of a document
    List { location: String },

    /// Print the storage key a location maps to
    Key { location: String },

    /// Move bookmarks stored under the legacy full-location key
    Migrate { location: String },
}

fn init_logging(settings: &Settings) -> Result<()> {
    let log_path = resolve_log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {log_path:?}"))?;
    WriteLogger::init(settings.log_level_filter(), Config::default(), file)
        .context("Failed to initialize logger")?;
    Ok(())
}

fn main() -> Result<()> {
    initialize_panic_handler();
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => resolve_config_path()?,
    };
    let mut settings = load_settings_from_path(&config_path);
    if cli.documents_dir.is_some() {
        settings.documents_dir = cli.documents_dir;
    }
    if cli.store.is_some() {
        settings.preferences_file = cli.store;
    }

    if let Err(e) = init_logging(&settings) {
        eprintln!("Warning: logging disabled: {e:#}");
    }
    info!("Starting pagemark");

    let preferences_path = resolve_preferences_path(&settings)?;
    let preferences = FilePreferences::open_or_empty(&preferences_path);
    let documents_dir = DocumentsDir::resolve(settings.documents_dir.as_deref());
    let mut store = BookmarkStore::new(preferences, documents_dir);

    match cli.command {
        Commands::Has { location, page } => {
            let bookmarked = store.has_bookmark(&location, page);
            println!("{bookmarked}");
            if !bookmarked {
                std::process::exit(1);
            }
        }
        Commands::Add { location, page } => {
            store.add_bookmark(&location, page);
        }
        Commands::Remove { location, page } => {
            store.remove_bookmark(&location, page);
        }
        Commands::Toggle { location, page } => {
            let bookmarked = store.toggle_bookmark(&location, page);
            println!("{}", if bookmarked { "added" } else { "removed" });
        }
        Commands::List { location } => match store.bookmarks(&location) {
            Some(pages) => {
                for page in pages {
                    println!("{page}");
                }
            }
            None => warn!("No bookmarks recorded for {location}"),
        },
        Commands::Key { location } => {
            println!("{}", store.document_key(&location));
        }
        Commands::Migrate { location } => {
            if store.ensure_migrated(&location) {
                println!("migrated to {}", store.document_key(&location));
            } else {
                println!("nothing to migrate");
            }
        }
    }

    info!("Shutting down pagemark");
    Ok(())
}
