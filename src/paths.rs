// Path normalization utilities
// Handles the store's relative-path conventions and lookup-key folding

use std::env;
use std::path::{Component, Path, PathBuf};

/// Strip a leading `./` or `.\` from a stored path string
pub fn clean(path: &str) -> &str {
    path.strip_prefix("./")
        .or_else(|| path.strip_prefix(".\\"))
        .unwrap_or(path)
}

/// Derive the store lookup key for a path: cleaned and lowercased.
/// Key folding is case-insensitive on every platform; on case-sensitive
/// filesystems this means two files differing only in case share one entry.
pub fn key(path: &str) -> String {
    clean(path).to_lowercase()
}

/// Resolve a path against the current directory and normalize it lexically
/// (drops `.` components, resolves `..` where possible). Does not touch the
/// filesystem, so the path need not exist.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    normalize(&joined)
}

/// Lexically normalize a path without requiring it to exist
pub fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }

    let mut result = PathBuf::new();
    for component in components {
        result.push(component);
    }

    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Express `path` relative to `base` as a string for storage.
/// Both sides are absolutized first; when `path` does not live under
/// `base`, the absolute path is returned instead.
pub fn relative_to(base: &Path, path: &Path) -> String {
    let base = absolutize(base);
    let path = absolutize(path);

    if base == path {
        return String::new();
    }

    match path.strip_prefix(&base) {
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
