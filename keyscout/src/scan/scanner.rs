use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::errors::{ScanError, ScanOutcome};
use crate::keywords::{Keyword, KeywordSet};

// Constants for file reading
const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// How a file's bytes were loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadStrategy {
    /// Single `fs::read` for small files
    Whole,
    /// `BufReader` for medium files
    Buffered,
    /// Memory map for large files
    Mapped,
}

impl ReadStrategy {
    /// Picks the strategy for a file of `size` bytes
    pub fn for_size(size: u64) -> Self {
        if size < SMALL_FILE_THRESHOLD {
            ReadStrategy::Whole
        } else if size >= LARGE_FILE_THRESHOLD {
            ReadStrategy::Mapped
        } else {
            ReadStrategy::Buffered
        }
    }
}

/// Keyword counts for one file, index-aligned to the keyword set it was scanned with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHits {
    pub path: PathBuf,
    pub counts: Vec<usize>,
    pub bytes_read: u64,
    pub strategy: ReadStrategy,
}

impl FileHits {
    /// Pairs each keyword with its count, including zero counts
    pub fn matches<'a>(
        &'a self,
        keywords: &'a KeywordSet,
    ) -> impl Iterator<Item = (&'a Keyword, usize)> + 'a {
        keywords.iter().zip(self.counts.iter().copied())
    }

    /// True if any keyword occurred at least once
    pub fn has_matches(&self) -> bool {
        self.counts.iter().any(|&c| c > 0)
    }
}

/// Counts keywords in a single file.
///
/// Implementations must be stateless with respect to the files they scan: the
/// coordinator calls them from many workers at once.
pub trait Scan: Send + Sync {
    fn scan(&self, path: &Path, keywords: &KeywordSet) -> ScanOutcome<FileHits>;
}

/// Reads a file, decodes it lossily and counts case-insensitive keyword occurrences
#[derive(Debug, Clone, Copy, Default)]
pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    fn read_whole(path: &Path) -> ScanOutcome<Vec<u8>> {
        fs::read(path).map_err(|e| ScanError::from_io(path, e))
    }

    fn read_buffered(path: &Path, size_hint: u64) -> ScanOutcome<Vec<u8>> {
        let file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::with_capacity(size_hint as usize);
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ScanError::from_io(path, e))?;
        Ok(bytes)
    }

    fn read_mapped(path: &Path) -> ScanOutcome<Mmap> {
        let file = File::open(path).map_err(|e| ScanError::from_io(path, e))?;
        // Safety: the map is read once and dropped before the scan returns.
        unsafe { Mmap::map(&file) }.map_err(|e| ScanError::from_io(path, e))
    }
}

impl Scan for FileScanner {
    fn scan(&self, path: &Path, keywords: &KeywordSet) -> ScanOutcome<FileHits> {
        trace!("Scanning file: {}", path.display());

        let metadata = fs::metadata(path).map_err(|e| ScanError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(ScanError::not_a_file(path));
        }

        let strategy = ReadStrategy::for_size(metadata.len());
        let (contents, bytes_read) = match strategy {
            ReadStrategy::Whole => {
                let bytes = Self::read_whole(path)?;
                (fold_text(&bytes, path), bytes.len() as u64)
            }
            ReadStrategy::Buffered => {
                let bytes = Self::read_buffered(path, metadata.len())?;
                (fold_text(&bytes, path), bytes.len() as u64)
            }
            ReadStrategy::Mapped => {
                let mmap = Self::read_mapped(path)?;
                (fold_text(&mmap, path), mmap.len() as u64)
            }
        };

        let counts = keywords
            .iter()
            .map(|keyword| count_occurrences(&contents, keyword.folded()))
            .collect();

        Ok(FileHits {
            path: path.to_path_buf(),
            counts,
            bytes_read,
            strategy,
        })
    }
}

/// Decodes bytes as UTF-8, replacing invalid sequences, and lower-cases the result
fn fold_text(bytes: &[u8], path: &Path) -> String {
    let text = String::from_utf8_lossy(bytes);
    // If it's Owned, at least one invalid sequence was replaced.
    if let Cow::Owned(_) = text {
        debug!("Invalid UTF-8 replaced in file: {}", path.display());
    }
    text.to_lowercase()
}

/// Counts non-overlapping occurrences of `needle`, scanning left to right
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}
