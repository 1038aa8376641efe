pub mod bookmark;
pub mod document_key;
pub mod library;
pub mod panic_handler;
pub mod preferences;
pub mod reader;
pub mod settings;

pub use bookmark::{BookmarkProvider, BookmarkStore};
pub use document_key::DocumentsDir;
pub use preferences::{FilePreferences, MemoryPreferences, Preferences, PreferencesError};
pub use reader::ReaderSession;
