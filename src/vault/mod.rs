//! Vault file resolution
//!
//! Embeds and links name files the way note-taking vaults do: relative to the
//! note, relative to the vault root, or by bare file name anywhere in the
//! vault. The [`Vault`] indexes a folder once and answers those lookups
//! without touching the filesystem again.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Folders skipped while indexing (editor state, version control).
const IGNORED_DIRS: &[&str] = &[".git", ".obsidian", ".trash", "node_modules"];

// ─────────────────────────────────────────────────────────────────────────────
// File Handle
// ─────────────────────────────────────────────────────────────────────────────

/// A resolved file inside the vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercased extension without the dot, empty when there is none.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Resolves link text to files and files to loadable resource paths.
pub trait FileResolver {
    fn resolve_link(&self, raw_ref: &str, source_path: &Path) -> Option<FileHandle>;
    fn resource_path(&self, file: &FileHandle) -> String;
}

// ─────────────────────────────────────────────────────────────────────────────
// Vault
// ─────────────────────────────────────────────────────────────────────────────

/// An indexed folder of notes and attachments.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    files: HashSet<PathBuf>,
}

impl Vault {
    /// Index every file below `root`.
    ///
    /// Unreadable entries are skipped with a warning.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::VaultNotFound(root.to_path_buf()));
        }
        let root = root.canonicalize()?;

        let mut files = HashSet::new();
        let walker = WalkDir::new(&root).follow_links(false).into_iter();
        for entry in walker.filter_entry(|e| !is_ignored_dir(e.file_name().to_str())) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    files.insert(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable vault entry: {}", e),
            }
        }

        debug!("Indexed {} files in vault {}", files.len(), root.display());
        Ok(Self { root, files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn lookup(&self, candidate: &Path) -> Option<FileHandle> {
        let normalized = normalize(candidate);
        self.files
            .contains(&normalized)
            .then(|| FileHandle::new(normalized))
    }

    fn lookup_by_name(&self, name: &str) -> Option<FileHandle> {
        self.files
            .iter()
            .filter(|path| {
                path.file_name()
                    .is_some_and(|file| file.to_string_lossy() == name)
            })
            // Prefer the shallowest match, then the lexically first, so lookups are stable
            .min_by(|a, b| {
                a.components()
                    .count()
                    .cmp(&b.components().count())
                    .then_with(|| a.cmp(b))
            })
            .map(|path| FileHandle::new(path.clone()))
    }
}

impl FileResolver for Vault {
    fn resolve_link(&self, raw_ref: &str, source_path: &Path) -> Option<FileHandle> {
        let link = link_path(raw_ref);
        if link.is_empty() {
            return None;
        }

        let mut names = vec![link.clone()];
        if Path::new(&link).extension().is_none() {
            names.push(format!("{}.md", link));
        }

        let source_dir = source_path.parent().unwrap_or(&self.root);
        let source_dir = if source_dir.is_absolute() {
            source_dir.to_path_buf()
        } else {
            self.root.join(source_dir)
        };

        for name in &names {
            let relative = Path::new(name.trim_start_matches('/'));
            if let Some(file) = self
                .lookup(&source_dir.join(relative))
                .or_else(|| self.lookup(&self.root.join(relative)))
            {
                return Some(file);
            }
        }

        names.iter().find_map(|name| {
            let base = Path::new(name).file_name()?.to_string_lossy().into_owned();
            self.lookup_by_name(&base)
        })
    }

    fn resource_path(&self, file: &FileHandle) -> String {
        file_url(file.path())
    }
}

fn is_ignored_dir(name: Option<&str>) -> bool {
    name.is_some_and(|name| IGNORED_DIRS.contains(&name))
}

/// Link text with any `#heading` / `#^block` suffix removed and `%20` decoded.
fn link_path(raw_ref: &str) -> String {
    let without_suffix = raw_ref.split('#').next().unwrap_or_default();
    without_suffix.trim().replace("%20", " ")
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `file://` URL for an absolute path.
pub fn file_url(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    let display = display.replace(' ', "%20");
    if display.starts_with('/') {
        format!("file://{}", display)
    } else {
        format!("file:///{}", display)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vault_with(files: &[&str]) -> (TempDir, Vault) {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "x").unwrap();
        }
        let vault = Vault::open(dir.path()).unwrap();
        (dir, vault)
    }

    #[test]
    fn test_open_missing_folder_fails() {
        let result = Vault::open("/definitely/not/a/vault");
        assert!(matches!(result, Err(Error::VaultNotFound(_))));
    }

    #[test]
    fn test_index_skips_ignored_folders() {
        let (_dir, vault) = vault_with(&["a.md", ".obsidian/workspace.json", "img/b.png"]);
        assert_eq!(vault.len(), 2);
    }

    #[test]
    fn test_resolve_relative_to_note() {
        let (_dir, vault) = vault_with(&["notes/pics/cat.png", "notes/day.md"]);
        let source = vault.root().join("notes/day.md");
        let file = vault.resolve_link("pics/cat.png", &source).unwrap();
        assert_eq!(file.extension(), "png");
        assert!(file.path().ends_with("notes/pics/cat.png"));
    }

    #[test]
    fn test_resolve_by_basename_and_implicit_md() {
        let (_dir, vault) = vault_with(&["deep/down/Photo.JPG", "other/Plan.md", "day.md"]);
        let source = vault.root().join("day.md");

        let photo = vault.resolve_link("Photo.JPG", &source).unwrap();
        assert_eq!(photo.extension(), "jpg");

        let plan = vault.resolve_link("Plan#Goals", &source).unwrap();
        assert!(plan.path().ends_with("other/Plan.md"));
    }

    #[test]
    fn test_resolve_missing_file() {
        let (_dir, vault) = vault_with(&["day.md"]);
        let source = vault.root().join("day.md");
        assert!(vault.resolve_link("nope.png", &source).is_none());
        assert!(vault.resolve_link("", &source).is_none());
    }

    #[test]
    fn test_resource_path_is_file_url() {
        let (_dir, vault) = vault_with(&["my pics/a.png"]);
        let source = vault.root().join("day.md");
        let file = vault.resolve_link("my%20pics/a.png", &source).unwrap();
        let url = vault.resource_path(&file);
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("my%20pics/a.png"));
    }
}
