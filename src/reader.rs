use crate::bookmark::BookmarkProvider;
use log::debug;

/// The bookmark side of an open document: which page is shown, whether it is
/// bookmarked, and jumping between bookmarked pages.
pub struct ReaderSession<'a, B: BookmarkProvider> {
    provider: &'a mut B,
    location: String,
    page_count: usize,
    current_page: usize,
}

impl<'a, B: BookmarkProvider> ReaderSession<'a, B> {
    pub fn new(provider: &'a mut B, location: impl Into<String>, page_count: usize) -> Self {
        Self {
            provider,
            location: location.into(),
            page_count,
            current_page: 0,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Returns `false` and stays put if `page` is past the end of the document.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= self.page_count {
            debug!(
                "Ignoring jump to page {page}, document has {} pages",
                self.page_count
            );
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn is_current_page_bookmarked(&mut self) -> bool {
        self.provider.has_bookmark(&self.location, self.current_page)
    }

    /// Returns the new state. Does nothing for a document without pages.
    pub fn toggle_current_page(&mut self) -> bool {
        if self.current_page >= self.page_count {
            debug!("Not toggling bookmark, {} has no pages", self.location);
            return false;
        }
        self.provider.toggle_bookmark(&self.location, self.current_page)
    }

    pub fn bookmarked_pages(&mut self) -> Vec<usize> {
        self.provider.bookmarks(&self.location).unwrap_or_default()
    }

    /// Moves to the first bookmarked page after the current one.
    pub fn next_bookmark(&mut self) -> Option<usize> {
        let current = self.current_page;
        let target = self
            .bookmarked_pages()
            .into_iter()
            .find(|&page| page > current && page < self.page_count)?;
        self.current_page = target;
        Some(target)
    }

    /// Moves to the last bookmarked page before the current one.
    pub fn previous_bookmark(&mut self) -> Option<usize> {
        let current = self.current_page;
        let target = self
            .bookmarked_pages()
            .into_iter()
            .rev()
            .find(|&page| page < current && page < self.page_count)?;
        self.current_page = target;
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::BookmarkStore;
    use crate::document_key::DocumentsDir;
    use crate::preferences::MemoryPreferences;

    fn store() -> BookmarkStore<MemoryPreferences> {
        BookmarkStore::new(MemoryPreferences::new(), DocumentsDir::new("/docs"))
    }

    #[test]
    fn test_toggle_current_page() {
        let mut store = store();
        let mut session = ReaderSession::new(&mut store, "/docs/book.pdf", 20);

        assert!(session.go_to_page(4));
        assert!(!session.is_current_page_bookmarked());
        assert!(session.toggle_current_page());
        assert!(session.is_current_page_bookmarked());
        assert!(!session.toggle_current_page());
        assert!(!session.is_current_page_bookmarked());
    }

    #[test]
    fn test_go_to_page_out_of_range() {
        let mut store = store();
        let mut session = ReaderSession::new(&mut store, "/docs/book.pdf", 3);

        assert!(session.go_to_page(2));
        assert!(!session.go_to_page(3));
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn test_toggle_on_empty_document_is_noop() {
        let mut store = store();
        let mut session = ReaderSession::new(&mut store, "/docs/empty.pdf", 0);

        assert!(!session.toggle_current_page());
        assert!(!session.is_current_page_bookmarked());
        drop(session);
        assert_eq!(store.bookmarks("empty.pdf"), None);
    }

    #[test]
    fn test_bookmarked_pages_empty_when_absent() {
        let mut store = store();
        let mut session = ReaderSession::new(&mut store, "/docs/book.pdf", 3);
        assert!(session.bookmarked_pages().is_empty());
    }

    #[test]
    fn test_jump_between_bookmarks() {
        let mut store = store();
        store.add_bookmark("book.pdf", 2);
        store.add_bookmark("book.pdf", 7);
        store.add_bookmark("book.pdf", 11);

        let mut session = ReaderSession::new(&mut store, "/docs/book.pdf", 10);
        assert_eq!(session.bookmarked_pages(), vec![2, 7, 11]);

        assert_eq!(session.next_bookmark(), Some(2));
        assert_eq!(session.next_bookmark(), Some(7));
        // Page 11 is past the end of this document
        assert_eq!(session.next_bookmark(), None);
        assert_eq!(session.current_page(), 7);

        assert_eq!(session.previous_bookmark(), Some(2));
        assert_eq!(session.previous_bookmark(), None);
        assert_eq!(session.current_page(), 2);
    }
}
