// File enumeration module
// Expands roots (files, folders or wildcard masks) into candidate files

use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;
use log::warn;

use crate::paths;

/// Yields the candidate files for a run: each root may be a file, a folder,
/// or a `folder/mask` pattern; exclude masks filter by file name.
pub struct FileWalker {
    recurse: bool,
    excludes: Option<GlobSet>,
}

impl FileWalker {
    pub fn new(recurse: bool, excludes: &[String]) -> Self {
        Self {
            recurse,
            excludes: build_globset(excludes),
        }
    }

    /// Enumerate the files under one root, sorted, as absolute paths.
    /// Unreadable directories are reported and skipped, never fatal.
    pub fn walk(&self, root: &str) -> Vec<PathBuf> {
        let root_path = Path::new(root);

        // A root that is not a folder names a file or a wildcard mask; the
        // final component becomes the mask and its folder becomes the root
        let (dir, mask) = if root_path.is_dir() {
            (root_path.to_path_buf(), None)
        } else {
            let mask = root_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dir = match root_path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (dir, compile_mask(&mask))
        };

        if !dir.is_dir() {
            warn!("folder not found: {}", dir.display());
            return Vec::new();
        }

        let max_depth = if self.recurse { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry_result in WalkDir::new(&dir)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false)
            .max_depth(max_depth)
        {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("error walking {}: {}", dir.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(mask) = &mask {
                if !mask.is_match(Path::new(&name)) {
                    continue;
                }
            }
            if let Some(excludes) = &self.excludes {
                if excludes.is_match(Path::new(&name)) {
                    continue;
                }
            }

            files.push(paths::absolutize(&entry.path()));
        }

        files
    }
}

fn compile_mask(mask: &str) -> Option<GlobMatcher> {
    match build_glob(mask) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(err) => {
            warn!("invalid file mask '{}': {}", mask, err);
            None
        }
    }
}

fn build_glob(mask: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(&escape_mask(mask))
        .case_insensitive(true)
        .literal_separator(false)
        .build()
}

/// The only wildcards a mask supports are `*` and `?`; any other glob
/// metacharacter in a name must match itself
fn escape_mask(mask: &str) -> String {
    let mut escaped = String::with_capacity(mask.len());
    for c in mask.chars() {
        match c {
            '[' => escaped.push_str("[[]"),
            ']' => escaped.push_str("[]]"),
            '{' => escaped.push_str("[{]"),
            '}' => escaped.push_str("[}]"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn build_globset(masks: &[String]) -> Option<GlobSet> {
    if masks.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for mask in masks {
        match build_glob(mask) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!("invalid exclude mask '{}': {}", mask, err),
        }
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(err) => {
            warn!("failed to compile exclude masks: {}", err);
            None
        }
    }
}
