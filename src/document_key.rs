use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const FILE_URL_SCHEME: &str = "file://";

/// The per-user documents directory that document keys are made relative to.
///
/// Sandboxed installs move this directory around between upgrades, so keys
/// that include it would stop matching; stripping it keeps keys stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentsDir {
    prefix: Option<String>,
}

impl DocumentsDir {
    /// Wraps `path` without resolving symlinks.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        let trimmed = raw.trim_end_matches('/');
        Self {
            prefix: Some(format!("{trimmed}/")),
        }
    }

    /// No documents directory: every location is its own key.
    pub fn none() -> Self {
        Self { prefix: None }
    }

    /// Uses `override_dir` if given, otherwise the platform documents directory.
    /// Symlinks are resolved when the directory exists.
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        let dir = override_dir.map(Path::to_path_buf).or_else(dirs::document_dir);
        match dir {
            Some(dir) => {
                let resolved = resolve_symlinks(&dir);
                debug!("Documents directory: {resolved:?}");
                Self::new(resolved)
            }
            None => {
                warn!("Could not determine documents directory, keys will not be normalized");
                Self::none()
            }
        }
    }

    /// `<dir>/`, or `None` when no directory is known.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Strips a leading `<dir>/` from `location`, either as a plain path or as
    /// the path of a `file://` URL. Anything else is returned unchanged.
    pub fn normalize(&self, location: &str) -> String {
        let Some(prefix) = &self.prefix else {
            return location.to_string();
        };

        if let Some(relative) = location.strip_prefix(prefix.as_str()) {
            return relative.to_string();
        }

        location
            .strip_prefix(FILE_URL_SCHEME)
            .and_then(|path| path.strip_prefix(prefix.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| location.to_string())
    }
}

fn resolve_symlinks(dir: &Path) -> PathBuf {
    fs::canonicalize(dir).unwrap_or_else(|e| {
        debug!("Could not resolve {dir:?} ({e}), using it as-is");
        dir.to_path_buf()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOCS: &str = "/var/mobile/Containers/Data/Application/ABC/Documents";

    #[test]
    fn test_strips_plain_path_prefix() {
        let docs = DocumentsDir::new(DOCS);
        assert_eq!(docs.normalize(&format!("{DOCS}/book.pdf")), "book.pdf");
        assert_eq!(
            docs.normalize(&format!("{DOCS}/shelf/book.pdf")),
            "shelf/book.pdf"
        );
    }

    #[test]
    fn test_strips_file_url_prefix() {
        let docs = DocumentsDir::new(DOCS);
        assert_eq!(docs.normalize(&format!("file://{DOCS}/book.pdf")), "book.pdf");
    }

    #[test]
    fn test_trailing_slash_on_dir_is_ignored() {
        let docs = DocumentsDir::new(format!("{DOCS}/"));
        assert_eq!(docs.prefix(), Some(format!("{DOCS}/").as_str()));
        assert_eq!(docs.normalize(&format!("{DOCS}/book.pdf")), "book.pdf");
    }

    #[test]
    fn test_unrelated_location_unchanged() {
        let docs = DocumentsDir::new(DOCS);
        assert_eq!(docs.normalize("book.pdf"), "book.pdf");
        assert_eq!(
            docs.normalize("file:///tmp/book.pdf"),
            "file:///tmp/book.pdf"
        );
        assert_eq!(
            docs.normalize("https://example.com/book.pdf"),
            "https://example.com/book.pdf"
        );
    }

    #[test]
    fn test_only_leading_prefix_stripped() {
        let docs = DocumentsDir::new("/docs");
        assert_eq!(docs.normalize("/other/docs/book.pdf"), "/other/docs/book.pdf");
        // Sibling directory sharing the name as a prefix
        assert_eq!(docs.normalize("/docs2/book.pdf"), "/docs2/book.pdf");
    }

    #[test]
    fn test_none_is_identity() {
        let docs = DocumentsDir::none();
        assert_eq!(docs.normalize("file:///a/b.pdf"), "file:///a/b.pdf");
    }

    #[test]
    fn test_resolve_override() {
        let tmp = TempDir::new().unwrap();
        let docs = DocumentsDir::resolve(Some(tmp.path()));
        let canonical = fs::canonicalize(tmp.path()).unwrap();
        let location = format!("{}/book.pdf", canonical.display());
        assert_eq!(docs.normalize(&location), "book.pdf");
    }

    #[test]
    fn test_resolve_missing_override_kept_as_is() {
        let docs = DocumentsDir::resolve(Some(Path::new("/definitely/not/here")));
        assert_eq!(docs.prefix(), Some("/definitely/not/here/"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlink() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        fs::create_dir_all(&real).unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let docs = DocumentsDir::resolve(Some(&link));
        let canonical = fs::canonicalize(&real).unwrap();
        assert_eq!(
            docs.normalize(&format!("{}/book.pdf", canonical.display())),
            "book.pdf"
        );
    }
}
