// Command line interface module
// Argument surface and resolved run configuration

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::digest::Algorithm;
use crate::paths;

/// Default store file name, used by update and verify when `-f` is absent
pub const DEFAULT_STORE_FILE: &str = "hashkeep.chk";

#[derive(Debug, Parser)]
#[command(
    name = "hashkeep",
    version,
    about = "Calculates or verifies checksum hashes for one or more files"
)]
pub struct Cli {
    /// Files, folders or wildcard masks to process
    pub paths: Vec<String>,

    /// Compute hashes of all input files (default mode)
    #[arg(short = 'c', long, group = "mode")]
    pub compute: bool,

    /// Update hashes in the store file, same as -c -f hashkeep.chk
    #[arg(short = 'u', long, group = "mode")]
    pub update: bool,

    /// Verify hashes of files already in the store file
    #[arg(short = 'v', long, group = "mode")]
    pub verify: bool,

    /// Compute the hash for stdin data; input files are ignored
    #[arg(short = 'i', long, group = "mode")]
    pub stdin: bool,

    /// Use the SHA1 hash function, 160 bits (default)
    #[arg(long, group = "algo")]
    pub sha1: bool,

    /// Use the SHA256 hash function, 256 bits
    #[arg(long, group = "algo")]
    pub sha256: bool,

    /// Use the MD5 hash function, 128 bits
    #[arg(long, group = "algo")]
    pub md5: bool,

    /// Exclude files matching the given file mask (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "MASK")]
    pub excludes: Vec<String>,

    /// Process subfolders
    #[arg(short = 's', long = "subs")]
    pub subs: bool,

    /// Process only new files (files without a stored record)
    #[arg(short = 'n', long)]
    pub new: bool,

    /// Process only files already in the store
    #[arg(short = 'r', long)]
    pub refresh: bool,

    /// Store file name; compute mode outputs to console when absent
    #[arg(short = 'f', long = "file", value_name = "STORE")]
    pub file: Option<String>,

    /// Keep a store file in the same folder as the source file(s)
    #[arg(short = 'l', long)]
    pub local: bool,

    /// Remove records for files that no longer exist from the store
    #[arg(short = 'p', long)]
    pub purge: bool,

    /// Set the hidden attribute on the store file (Windows only)
    #[arg(long)]
    pub hide: bool,

    /// Store absolute instead of relative paths
    #[arg(short = 'a', long)]
    pub absolute: bool,

    /// Quiet mode, suppresses console chatter
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Run mode selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compute,
    Update,
    Verify,
    Stdin,
}

/// Fully resolved run configuration
#[derive(Debug)]
pub struct Config {
    pub mode: Mode,
    pub algorithm: Algorithm,
    pub paths: Vec<String>,
    pub excludes: Vec<String>,
    pub recurse: bool,
    pub only_new: bool,
    pub only_existing: bool,
    /// Absolute location of the configured store file
    pub store_file: PathBuf,
    /// Compute mode without `-f`: nothing is loaded or persisted
    pub console_only: bool,
    /// A store name given with a folder component pins one global store
    pub single_store: bool,
    pub local: bool,
    pub purge: bool,
    pub hide: bool,
    pub absolute_paths: bool,
    /// Suppress banner and progress output; implied by redirected stdout
    pub quiet: bool,
    /// Echo computed record lines to stdout
    pub echo_records: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        let mode = if cli.update {
            Mode::Update
        } else if cli.verify {
            Mode::Verify
        } else if cli.stdin {
            Mode::Stdin
        } else {
            Mode::Compute
        };

        let algorithm = if cli.sha256 {
            Algorithm::Sha256
        } else if cli.md5 {
            Algorithm::Md5
        } else {
            Algorithm::Sha1
        };

        let console_only = mode == Mode::Compute && cli.file.is_none();
        let store_name = cli.file.unwrap_or_else(|| DEFAULT_STORE_FILE.to_string());
        let single_store = console_only || store_name.contains(['/', '\\', ':']);
        let store_file = paths::absolutize(Path::new(&store_name));

        let paths = if cli.paths.is_empty() {
            vec![".".to_string()]
        } else {
            cli.paths
        };

        let terminal = std::io::stdout().is_terminal();

        Self {
            mode,
            algorithm,
            paths,
            excludes: cli.excludes,
            recurse: cli.subs,
            only_new: cli.new,
            only_existing: cli.refresh,
            store_file,
            console_only,
            single_store,
            local: cli.local,
            purge: cli.purge,
            hide: cli.hide,
            absolute_paths: cli.absolute,
            quiet: cli.quiet || !terminal,
            echo_records: !cli.quiet || !terminal,
        }
    }
}
