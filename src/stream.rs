// Streaming hash module
// Overlaps disk reads with digest computation via a double-buffered pipeline

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::digest::{Algorithm, Hasher};
use crate::error::HashkeepError;

/// Number of concurrent read slots per buffer
pub const DEFAULT_SLOT_COUNT: usize = 4;

/// Bytes per slot
pub const DEFAULT_SLOT_SIZE: usize = 1 << 20;

/// Computes file digests while the next chunk of the file is being read.
///
/// Two buffers are each divided into `slot_count` slots. Slot `i` of round
/// `r` owns the fixed file region `((r * slot_count) + i) * slot_size`, so
/// the slots of one round are disjoint and ordered. Each iteration reads
/// the next round's slots concurrently into the back buffer while the front
/// buffer, filled by the previous round, is fed to the digest in slot order
/// on the calling thread. Feeding slots in index order within rounds in
/// issue order reproduces the file's byte stream exactly; the digest state
/// is never touched from more than one thread.
pub struct StreamingHasher {
    slot_count: usize,
    slot_size: usize,
}

impl StreamingHasher {
    pub fn new() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            slot_size: DEFAULT_SLOT_SIZE,
        }
    }

    /// Override the pipeline geometry; mostly useful to force multi-round
    /// behavior over small inputs in tests
    pub fn with_geometry(slot_count: usize, slot_size: usize) -> Self {
        Self {
            slot_count: slot_count.max(1),
            slot_size: slot_size.max(1),
        }
    }

    /// Hash the full byte stream of a file. Any read error aborts the
    /// computation; no partial digest is ever returned.
    pub fn hash_file(&self, path: &Path, algorithm: Algorithm) -> Result<Vec<u8>, HashkeepError> {
        let q = self.slot_count;
        let s = self.slot_size;

        let mut hasher = algorithm.hasher();

        // One handle per slot so the reads of a round can run concurrently
        let mut slots: Vec<Option<File>> = Vec::with_capacity(q);
        for _ in 0..q {
            let file = File::open(path)
                .map_err(|e| HashkeepError::from_io_error(e, "reading", Some(path.to_path_buf())))?;
            slots.push(Some(file));
        }

        let mut front = vec![0u8; q * s];
        let mut back = vec![0u8; q * s];

        let mut front_filled = read_round(&mut slots, &mut front, 0, s)
            .map_err(|e| HashkeepError::from_io_error(e, "reading", Some(path.to_path_buf())))?;

        let mut round: u64 = 1;
        loop {
            if slots.iter().all(|slot| slot.is_none()) {
                // Every slot is exhausted; drain the last round and finish
                feed(hasher.as_mut(), &front, &front_filled, s);
                break;
            }

            // Read the next round while hashing the previous one
            let (read_result, ()) = rayon::join(
                || read_round(&mut slots, &mut back, round, s),
                || feed(hasher.as_mut(), &front, &front_filled, s),
            );
            front_filled = read_result
                .map_err(|e| HashkeepError::from_io_error(e, "reading", Some(path.to_path_buf())))?;

            std::mem::swap(&mut front, &mut back);
            round += 1;
        }

        Ok(hasher.finalize())
    }
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash standard input with a plain sequential read loop
pub fn hash_stdin(algorithm: Algorithm) -> Result<Vec<u8>, HashkeepError> {
    let mut hasher = algorithm.hasher();
    let mut stdin = io::stdin().lock();
    let mut buffer = vec![0u8; DEFAULT_SLOT_SIZE];

    loop {
        let n = stdin
            .read(&mut buffer)
            .map_err(|e| HashkeepError::from_io_error(e, "reading from stdin", None))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

/// Feed one round's bytes to the digest, slot by slot in index order
fn feed(hasher: &mut dyn Hasher, buf: &[u8], filled: &[usize], slot_size: usize) {
    for (slot, &n) in filled.iter().enumerate() {
        if n > 0 {
            let start = slot * slot_size;
            hasher.update(&buf[start..start + n]);
        }
    }
}

/// Issue the reads for one round concurrently, one task per live slot, and
/// wait for all of them. A slot that comes back short has hit the end of
/// the stream and is retired.
fn read_round(
    slots: &mut [Option<File>],
    buf: &mut [u8],
    round: u64,
    slot_size: usize,
) -> io::Result<Vec<usize>> {
    let q = slots.len();
    let mut results: Vec<io::Result<usize>> = Vec::with_capacity(q);
    results.resize_with(q, || Ok(0));

    rayon::scope(|scope| {
        for (slot, ((file, chunk), result)) in slots
            .iter_mut()
            .zip(buf.chunks_mut(slot_size))
            .zip(results.iter_mut())
            .enumerate()
        {
            if let Some(file) = file.as_mut() {
                let offset = (round * q as u64 + slot as u64) * slot_size as u64;
                scope.spawn(move |_| {
                    *result = file
                        .seek(SeekFrom::Start(offset))
                        .and_then(|_| read_full(file, chunk));
                });
            }
        }
    });

    let mut filled = Vec::with_capacity(q);
    for (file, result) in slots.iter_mut().zip(results) {
        let n = result?;
        if n < slot_size {
            *file = None;
        }
        filled.push(n);
    }
    Ok(filled)
}

/// Read until the buffer is full or the stream ends; returns bytes read
fn read_full(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
