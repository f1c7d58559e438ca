// Compute/update engine
// Hashes every candidate file and merges the digests into the routed store

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use log::debug;

use crate::cli::Config;
use crate::router::StoreRouter;
use crate::stream::StreamingHasher;
use crate::walker::FileWalker;

/// Statistics collected during a compute/update run
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    pub processed: usize,
    pub failed: usize,
}

/// Engine for the compute and update modes
pub struct ScanEngine {
    hasher: StreamingHasher,
}

impl ScanEngine {
    pub fn new() -> Self {
        Self {
            hasher: StreamingHasher::new(),
        }
    }

    /// Process every file the configuration selects. Per-file failures are
    /// reported and counted but never abort the run; the interrupt flag is
    /// observed between files.
    pub fn run(&self, config: &Config, router: &mut StoreRouter, interrupt: &AtomicBool) -> ScanStats {
        let mut stats = ScanStats::default();
        let store_name = router.store_file_name();
        let walker = FileWalker::new(config.recurse, &config.excludes);

        'roots: for root in &config.paths {
            for file in walker.walk(root) {
                if interrupt.load(Ordering::Relaxed) {
                    break 'roots;
                }

                let name = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                // Never hash the store file itself unless it was the explicit target
                if name.to_lowercase() == store_name && root.to_lowercase() != store_name {
                    continue;
                }

                if config.only_new && router.record_for(&file).is_some() {
                    debug!("[-n] skipping {}", file.display());
                    continue;
                }
                if config.only_existing && router.record_for(&file).is_none() {
                    debug!("[-r] skipping {}", file.display());
                    continue;
                }

                stats.processed += 1;
                if !config.quiet {
                    print!("  ...  {}\r", name);
                    let _ = io::stdout().flush();
                }

                match self.hasher.hash_file(&file, config.algorithm) {
                    Ok(digest) => {
                        let record = router.update(&file, config.algorithm, digest);
                        if config.echo_records {
                            println!("{}", record.format().blue());
                        }
                    }
                    Err(err) => {
                        stats.failed += 1;
                        println!("{}", format!("Hashing failed: {} ({})", file.display(), err).red());
                    }
                }
            }
        }

        if !config.quiet && stats.processed == 0 {
            println!("No matching files found.");
        }
        stats
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}
