//! Map request sub-paths to files under the local root.
//!
//! # Design Decisions
//! - A miss is `None`, never an error: misses drive chain fallthrough
//! - Paths are percent-decoded, then canonicalized and checked against the root
//! - A directory resolves to its index file when one is configured

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// A file that exists under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub len: u64,
}

/// Resolves URL sub-paths inside one root directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
    index_file: Option<String>,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>, index_file: Option<String>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self { root, index_file }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `sub_path` (already stripped of the shadow prefix) to a file.
    pub async fn resolve(&self, sub_path: &str) -> Option<ResolvedFile> {
        let decoded = percent_decode_str(sub_path).decode_utf8().ok()?;

        let candidate = match decoded.as_ref() {
            "" | "/" | "." => self.root.clone(),
            relative => self.root.join(relative.trim_start_matches('/')),
        };

        let mut path = self.contain(&candidate).await?;
        let mut meta = tokio::fs::metadata(&path).await.ok()?;

        if meta.is_dir() {
            if let Some(index) = &self.index_file {
                path = self.contain(&path.join(index)).await?;
                meta = tokio::fs::metadata(&path).await.ok()?;
            }
        }

        if meta.is_dir() {
            return None;
        }

        Some(ResolvedFile {
            path,
            len: meta.len(),
        })
    }

    /// Canonicalize `path` and keep it only if it stays inside the root.
    async fn contain(&self, path: &Path) -> Option<PathBuf> {
        let canonical = tokio::fs::canonicalize(path).await.ok()?;
        canonical.starts_with(&self.root).then_some(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), b"console.log(1);").unwrap();
        fs::write(dir.path().join("index.html"), b"<html></html>").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("index.html"), b"docs").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("with space.txt"), b"spaced").unwrap();
        dir
    }

    fn resolver(dir: &tempfile::TempDir) -> FileResolver {
        FileResolver::new(dir.path(), Some("index.html".into()))
    }

    #[tokio::test]
    async fn resolves_plain_file() {
        let dir = site();
        let file = resolver(&dir).resolve("app.js").await.unwrap();
        assert!(file.path.ends_with("app.js"));
        assert_eq!(file.len, 15);
    }

    #[tokio::test]
    async fn root_aliases_resolve_to_index() {
        let dir = site();
        let resolver = resolver(&dir);
        for sub_path in ["", "/", "."] {
            let file = resolver.resolve(sub_path).await.unwrap();
            assert!(file.path.ends_with("index.html"), "{sub_path:?}");
        }
    }

    #[tokio::test]
    async fn directory_uses_index_file() {
        let dir = site();
        let file = resolver(&dir).resolve("docs/").await.unwrap();
        assert!(file.path.ends_with("docs/index.html"));
    }

    #[tokio::test]
    async fn directory_without_index_is_not_found() {
        let dir = site();
        assert_eq!(resolver(&dir).resolve("empty").await, None);

        let no_index = FileResolver::new(dir.path(), None);
        assert_eq!(no_index.resolve("docs").await, None);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = site();
        assert_eq!(resolver(&dir).resolve("nope.css").await, None);
    }

    #[tokio::test]
    async fn traversal_outside_root_is_not_found() {
        let outer = tempfile::tempdir().unwrap();
        fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let root = outer.path().join("site");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("ok.txt"), b"ok").unwrap();

        let resolver = FileResolver::new(&root, None);
        assert_eq!(resolver.resolve("../secret.txt").await, None);
        assert_eq!(resolver.resolve("%2e%2e/secret.txt").await, None);
        assert!(resolver.resolve("sub/../ok.txt").await.is_none());
        assert!(resolver.resolve("./ok.txt").await.is_some());
    }

    #[tokio::test]
    async fn percent_encoded_names_resolve() {
        let dir = site();
        let file = resolver(&dir).resolve("with%20space.txt").await.unwrap();
        assert!(file.path.ends_with("with space.txt"));
    }
}
