/// Existence resolver for internal references: a read-only view of the
/// local document tree.
use std::path::{Path, PathBuf};

use regex::Regex;

/// Directory targets are served by this file, both for existence of the
/// directory itself and for fragment lookup inside it.
const DIRECTORY_INDEX: &str = "index.html";

/// Read-only lookups against the resolved document set. All three
/// predicates are pure: no observable side effects beyond read access.
pub trait DocumentTree {
    /// Whether the path resolves to a file or a directory in the tree.
    fn exists(&self, path: &Path) -> bool;

    /// Whether the target document contains an element with this identifier.
    /// Only meaningful when `exists` holds; directory targets are looked up
    /// through their index file.
    fn fragment_exists(&self, path: &Path, fragment: &str) -> bool;

    /// Whether the path resolves to a directory.
    fn is_directory(&self, path: &Path) -> bool;
}

/// Disk-backed document tree rooted at the scan directory.
pub struct DiskTree {
    /// Matches `id`/`name` attribute values in the target document.
    id_pattern: Regex,
    /// Scan root; all lookups are joined onto it.
    root: PathBuf,
}

impl DiskTree {
    /// Create a tree rooted at `root`.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded attribute regex is invalid (compile-time
    /// invariant).
    pub fn new(root: &Path) -> Self {
        Self {
            id_pattern: Regex::new(r#"(?i)\b(?:id|name)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
                .expect("valid regex"),
            root: root.to_path_buf(),
        }
    }

    /// The document file that serves a target: the file itself, or the
    /// directory's index file.
    fn served_file(&self, path: &Path) -> PathBuf {
        let full = self.root.join(path);
        if full.is_dir() {
            full.join(DIRECTORY_INDEX)
        } else {
            full
        }
    }
}

impl DocumentTree for DiskTree {
    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }

    fn fragment_exists(&self, path: &Path, fragment: &str) -> bool {
        let Ok(content) = std::fs::read_to_string(self.served_file(path)) else {
            return false;
        };

        self.id_pattern.captures_iter(&content).any(|cap| {
            cap.get(1)
                .or_else(|| cap.get(2))
                .is_some_and(|m| m.as_str() == fragment)
        })
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.root.join(path).is_dir()
    }
}
