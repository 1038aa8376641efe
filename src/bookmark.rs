use crate::document_key::DocumentsDir;
use crate::preferences::Preferences;
use log::{debug, info, warn};
use serde_json::Value;

/// What the reader screen needs from a bookmark backend.
pub trait BookmarkProvider {
    fn has_bookmark(&mut self, location: &str, page: usize) -> bool;

    fn add_bookmark(&mut self, location: &str, page: usize);

    fn remove_bookmark(&mut self, location: &str, page: usize);

    /// Sorted pages, or `None` if the document has never been bookmarked.
    fn bookmarks(&mut self, location: &str) -> Option<Vec<usize>>;

    /// Flips the bookmark on `page` and returns the new state.
    fn toggle_bookmark(&mut self, location: &str, page: usize) -> bool {
        if self.has_bookmark(location, page) {
            self.remove_bookmark(location, page);
            false
        } else {
            self.add_bookmark(location, page);
            true
        }
    }
}

/// Per-document page bookmarks kept in a [`Preferences`] store, one entry per
/// document key.
///
/// Every operation first moves an entry stored under the raw location (the
/// older key scheme) over to the normalized key.
#[derive(Debug)]
pub struct BookmarkStore<P: Preferences> {
    preferences: P,
    documents_dir: DocumentsDir,
}

impl<P: Preferences> BookmarkStore<P> {
    pub fn new(preferences: P, documents_dir: DocumentsDir) -> Self {
        Self {
            preferences,
            documents_dir,
        }
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    pub fn into_preferences(self) -> P {
        self.preferences
    }

    pub fn document_key(&self, location: &str) -> String {
        self.documents_dir.normalize(location)
    }

    /// Moves a legacy entry to the normalized key. Returns `true` if one was moved.
    pub fn ensure_migrated(&mut self, location: &str) -> bool {
        let key = self.document_key(location);
        if key == location {
            return false;
        }
        let Some(legacy) = self.preferences.get(location) else {
            return false;
        };
        if decode_pages(&legacy).is_none() {
            warn!("Leaving malformed legacy bookmark entry for {location} in place");
            return false;
        }

        if self.preferences.contains(&key) {
            warn!("Legacy bookmarks for {location} replace existing entry {key}");
        }
        self.preferences.remove(location);
        self.preferences.set(&key, legacy);
        info!("Migrated bookmarks from {location} to {key}");
        true
    }

    pub fn has_bookmark(&mut self, location: &str, page: usize) -> bool {
        self.ensure_migrated(location);
        let key = self.document_key(location);
        self.read_pages(&key)
            .is_some_and(|pages| pages.binary_search(&page).is_ok())
    }

    pub fn add_bookmark(&mut self, location: &str, page: usize) {
        self.ensure_migrated(location);
        let key = self.document_key(location);
        let mut pages = self.read_pages(&key).unwrap_or_default();

        match pages.binary_search(&page) {
            Ok(_) => debug!("Page {page} of {key} already bookmarked"),
            Err(pos) => {
                pages.insert(pos, page);
                self.write_pages(&key, &pages);
                debug!("Bookmarked page {page} of {key}");
            }
        }
    }

    pub fn remove_bookmark(&mut self, location: &str, page: usize) {
        self.ensure_migrated(location);
        let key = self.document_key(location);
        let Some(mut pages) = self.read_pages(&key) else {
            return;
        };

        if let Ok(pos) = pages.binary_search(&page) {
            pages.remove(pos);
            self.write_pages(&key, &pages);
            debug!("Removed bookmark on page {page} of {key}");
        }
    }

    pub fn bookmarks(&mut self, location: &str) -> Option<Vec<usize>> {
        self.ensure_migrated(location);
        let key = self.document_key(location);
        self.read_pages(&key)
    }

    pub fn toggle_bookmark(&mut self, location: &str, page: usize) -> bool {
        BookmarkProvider::toggle_bookmark(self, location, page)
    }

    fn read_pages(&self, key: &str) -> Option<Vec<usize>> {
        let value = self.preferences.get(key)?;
        let pages = decode_pages(&value);
        if pages.is_none() {
            warn!("Ignoring malformed bookmark entry for {key}: {value}");
        }
        pages
    }

    fn write_pages(&mut self, key: &str, pages: &[usize]) {
        self.preferences.set(key, Value::from(pages.to_vec()));
    }
}

impl<P: Preferences> BookmarkProvider for BookmarkStore<P> {
    fn has_bookmark(&mut self, location: &str, page: usize) -> bool {
        BookmarkStore::has_bookmark(self, location, page)
    }

    fn add_bookmark(&mut self, location: &str, page: usize) {
        BookmarkStore::add_bookmark(self, location, page)
    }

    fn remove_bookmark(&mut self, location: &str, page: usize) {
        BookmarkStore::remove_bookmark(self, location, page)
    }

    fn bookmarks(&mut self, location: &str) -> Option<Vec<usize>> {
        BookmarkStore::bookmarks(self, location)
    }
}

/// Accepts only an array of non-negative integers. The result is sorted and
/// deduplicated, since older builds appended without either.
fn decode_pages(value: &Value) -> Option<Vec<usize>> {
    let mut pages = value
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|n| usize::try_from(n).ok()))
        .collect::<Option<Vec<usize>>>()?;
    pages.sort_unstable();
    pages.dedup();
    Some(pages)
}
