// Store record module
// Parses and formats single lines of the checksum store

use chrono::{Local, NaiveDateTime, Timelike};

use crate::digest::{bytes_to_hex, hex_to_bytes};
use crate::paths;

/// Timestamp format written to store lines: sortable, second precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One line of the checksum store.
///
/// A line that fails to parse still becomes a record: `raw` holds the
/// original text verbatim and the record round-trips unchanged on save.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecksumRecord {
    pub algorithm: String,
    pub digest: Vec<u8>,
    pub timestamp: NaiveDateTime,
    pub path: String,
    /// The unparsed source line, present only for malformed records
    pub raw: Option<String>,
    /// True when the record was produced or refreshed during this run
    pub updated: bool,
}

impl ChecksumRecord {
    /// Create a fresh record stamped with the current time
    pub fn new(path: &str, algorithm: &str, digest: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            digest,
            timestamp: now_seconds(),
            path: path.to_string(),
            raw: None,
            updated: false,
        }
    }

    /// Wrap an unparseable line; the text is preserved byte-for-byte
    pub fn malformed(line: &str) -> Self {
        Self {
            algorithm: String::new(),
            digest: Vec::new(),
            timestamp: now_seconds(),
            path: String::new(),
            raw: Some(line.to_string()),
            updated: false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.raw.is_some()
    }

    /// Store lookup key: cleaned, case-folded path. Malformed records have
    /// no path key; the store files them under a synthetic key instead.
    pub fn key(&self) -> Option<String> {
        if self.is_malformed() {
            None
        } else {
            Some(paths::key(&self.path))
        }
    }

    /// Parse one store line. The grammar is
    /// `[algorithm:]hexdigest  [timestamp]  path` where the runs of
    /// whitespace separate the fields and the path keeps embedded spaces.
    /// Anything that does not match is preserved as a malformed record.
    pub fn parse(line: &str) -> Self {
        match Self::parse_fields(line) {
            Some(record) => record,
            None => Self::malformed(line),
        }
    }

    fn parse_fields(line: &str) -> Option<Self> {
        let first_ws = line.find(char::is_whitespace)?;
        let (head, rest) = line.split_at(first_ws);

        let (algorithm, hex) = match head.split_once(':') {
            Some((algo, hex)) => {
                if algo.is_empty() || !algo.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return None;
                }
                (algo, hex)
            }
            None => ("", head),
        };

        let digest = hex_to_bytes(hex)?;
        if digest.is_empty() {
            return None;
        }

        let after_ws = rest.trim_start();
        let ws_len = rest.len() - after_ws.len();

        // Optional timestamp token, recognized only when another run of
        // whitespace follows it (otherwise it is the start of the path)
        if is_timestamp(after_ws) {
            let candidate = &after_ws[..TIMESTAMP_LEN];
            let tail = &after_ws[TIMESTAMP_LEN..];
            if tail.starts_with(char::is_whitespace) {
                let timestamp = NaiveDateTime::parse_from_str(candidate, TIMESTAMP_FORMAT)
                    .unwrap_or_else(|_| now_seconds());
                return Some(Self {
                    algorithm: algorithm.to_string(),
                    digest,
                    timestamp,
                    path: tail.trim_start().to_string(),
                    raw: None,
                    updated: false,
                });
            }
        }

        // No timestamp: the digest and the path must still be separated by
        // at least two whitespace characters
        if ws_len < 2 {
            return None;
        }

        Some(Self {
            algorithm: algorithm.to_string(),
            digest,
            timestamp: now_seconds(),
            path: after_ws.to_string(),
            raw: None,
            updated: false,
        })
    }

    /// Serialize the record to its store line form. Malformed records
    /// reproduce their original text unchanged.
    pub fn format(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }

        let prefix = if self.algorithm.is_empty() {
            String::new()
        } else {
            format!("{}:", self.algorithm)
        };

        format!(
            "{}{}  {}  {}",
            prefix,
            bytes_to_hex(&self.digest),
            self.timestamp.format(TIMESTAMP_FORMAT),
            paths::clean(&self.path)
        )
    }
}

const TIMESTAMP_LEN: usize = 19; // YYYY-MM-DDTHH:MM:SS

/// Check whether the text starts with a timestamp-shaped token
fn is_timestamp(text: &str) -> bool {
    let raw = text.as_bytes();
    if raw.len() < TIMESTAMP_LEN {
        return false;
    }
    raw[..TIMESTAMP_LEN].iter().enumerate().all(|(i, &b)| match i {
        4 | 7 => b == b'-',
        10 => b == b'T',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    })
}

/// Current local time truncated to whole seconds, matching what the
/// store's line format can represent
fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
