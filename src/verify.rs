// Verification engine
// Compares current file digests against the stored records

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use log::warn;

use crate::cli::Config;
use crate::digest::Algorithm;
use crate::paths;
use crate::router::StoreRouter;
use crate::stream::StreamingHasher;
use crate::walker::FileWalker;

/// Outcome counts of a verify run. A mismatch is a normal verification
/// result, not an error; `failed` counts files that could not be hashed.
#[derive(Debug, Default, Clone)]
pub struct VerifyStats {
    pub checked: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub new_files: usize,
    pub failed: usize,
}

/// Engine for verify mode. Never mutates the store.
pub struct VerifyEngine {
    hasher: StreamingHasher,
}

impl VerifyEngine {
    pub fn new() -> Self {
        Self {
            hasher: StreamingHasher::new(),
        }
    }

    pub fn run(&self, config: &Config, router: &mut StoreRouter, interrupt: &AtomicBool) -> VerifyStats {
        let mut stats = VerifyStats::default();
        let store_name = router.store_file_name();
        let walker = FileWalker::new(config.recurse, &config.excludes);
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        'roots: for root in &config.paths {
            for file in walker.walk(root) {
                if interrupt.load(Ordering::Relaxed) {
                    break 'roots;
                }

                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if name.to_lowercase() == store_name && root.to_lowercase() != store_name {
                    continue;
                }

                stats.checked += 1;
                let display = paths::relative_to(&cwd, &file);

                let record = match router.record_for(&file) {
                    Some(record) => record,
                    None => {
                        stats.new_files += 1;
                        println!("{}", format!("(new)  {}", display).dimmed());
                        continue;
                    }
                };

                if !config.quiet {
                    print!("{}", format!("  ...  {}\r", name).dimmed());
                    let _ = io::stdout().flush();
                }

                // Hash with the algorithm the record was made with when it is
                // one we know, falling back to the configured algorithm
                let algorithm = Algorithm::parse(&record.algorithm).unwrap_or(config.algorithm);
                match self.hasher.hash_file(&file, algorithm) {
                    Err(err) => {
                        stats.failed += 1;
                        println!("{}", format!("ERROR  {}", display).magenta());
                        warn!("failed to hash {}: {}", file.display(), err);
                    }
                    Ok(digest) if digest == record.digest => {
                        stats.matches += 1;
                        println!("{}", format!("  OK!  {}", display).green());
                    }
                    Ok(_) => {
                        stats.mismatches += 1;
                        println!("{}", format!("FAIL!  {}", display).red());
                    }
                }
            }
        }

        if !config.quiet && stats.checked == 0 {
            println!("No matching files found.");
        }
        stats
    }
}

impl Default for VerifyEngine {
    fn default() -> Self {
        Self::new()
    }
}
