/// This module implements the report types for a scan and the merge rules that combine them.
///
/// # Ownership of Partial Results
///
/// A .NET implementation usually shares one dictionary between all workers:
/// ```csharp
/// var results = new Dictionary<string, List<(string, int)>>();
/// Parallel.ForEach(files, file => {
///     var found = Count(file);
///     lock (results) { /* append */ }
/// });
/// ```
///
/// Here each worker owns a `PartialReport` outright and hands it over by value:
/// ```rust,ignore
/// let mut partial = PartialReport::new(keywords.len());
/// partial.record(hits);          // no locking, the worker owns it
/// aggregator.merge(partial);     // ownership moves into the shared report
/// ```
///
/// Once `merge` takes the partial by value, the worker can no longer touch it, so a merged
/// entry can never be mutated or reused by its producer.
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::keywords::{Keyword, KeywordSet};
use crate::metrics::ScanStats;
use crate::scan::distributor::DistributionMode;
use crate::scan::scanner::FileHits;

/// Occurrences of one keyword in one file. Only created for counts above zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileMatch {
    /// The file that matched
    pub path: PathBuf,
    /// Number of non-overlapping occurrences
    pub count: usize,
}

/// A worker's private accumulation, index-aligned to the run's keyword set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialReport {
    entries: Vec<Vec<FileMatch>>,
    files_recorded: usize,
}

impl PartialReport {
    /// Creates an empty partial report for `keyword_count` keywords
    pub fn new(keyword_count: usize) -> Self {
        Self {
            entries: vec![Vec::new(); keyword_count],
            files_recorded: 0,
        }
    }

    /// Records the hits of one file, keeping only keywords that occurred
    pub fn record(&mut self, hits: FileHits) {
        self.files_recorded += 1;
        let FileHits { path, counts, .. } = hits;
        for (entry, &count) in self.entries.iter_mut().zip(counts.iter()) {
            if count > 0 {
                entry.push(FileMatch {
                    path: path.clone(),
                    count,
                });
            }
        }
    }

    /// Number of files folded into this partial report
    pub fn files_recorded(&self) -> usize {
        self.files_recorded
    }

    /// True if no keyword has any match
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Vec::is_empty)
    }
}

/// The final per-keyword mapping. Keyword order follows the keyword set; the order of
/// matches within a keyword is the order in which merges were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordReport {
    keywords: KeywordSet,
    entries: Vec<Vec<FileMatch>>,
}

impl KeywordReport {
    /// Creates a report with every keyword present and no matches
    pub fn new(keywords: KeywordSet) -> Self {
        let entries = vec![Vec::new(); keywords.len()];
        Self { keywords, entries }
    }

    /// Appends every entry of a partial report, keyword by keyword
    pub fn merge(&mut self, partial: PartialReport) {
        debug_assert_eq!(partial.entries.len(), self.entries.len());
        for (entry, matches) in self.entries.iter_mut().zip(partial.entries) {
            entry.extend(matches);
        }
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// Matches for a keyword, looked up case-insensitively
    pub fn get(&self, keyword: &str) -> Option<&[FileMatch]> {
        self.keywords
            .position(keyword)
            .map(|index| self.entries[index].as_slice())
    }

    /// Iterates keywords in order with their matches
    pub fn iter(&self) -> impl Iterator<Item = (&Keyword, &[FileMatch])> {
        self.keywords
            .iter()
            .zip(self.entries.iter().map(Vec::as_slice))
    }

    /// Sum of all counts across keywords and files
    pub fn total_matches(&self) -> usize {
        self.entries.iter().flatten().map(|m| m.count).sum()
    }

    /// Number of distinct files with at least one match
    pub fn files_with_matches(&self) -> usize {
        self.entries
            .iter()
            .flatten()
            .map(|m| m.path.as_path())
            .collect::<HashSet<&Path>>()
            .len()
    }

    /// True if no keyword matched anywhere
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Vec::is_empty)
    }
}

impl Serialize for KeywordReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (keyword, matches) in self.iter() {
            map.serialize_entry(keyword.as_str(), matches)?;
        }
        map.end()
    }
}

/// The outcome of one run in one distribution mode
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Per-keyword matches
    pub report: KeywordReport,
    /// Mode the run used
    pub mode: DistributionMode,
    /// Number of workers spawned
    pub workers: usize,
    /// Wall-clock time of the whole run
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Counters collected during the run
    pub stats: ScanStats,
}

impl ScanResult {
    /// Elapsed time in fractional seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

fn serialize_secs<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64())
}

/// Both modes run back to back over the same input
#[derive(Debug, Clone, Serialize)]
pub struct ModeComparison {
    pub pull_queue: ScanResult,
    pub static_partition: ScanResult,
}

impl ModeComparison {
    /// The mode that finished first
    pub fn faster(&self) -> DistributionMode {
        if self.pull_queue.elapsed <= self.static_partition.elapsed {
            DistributionMode::PullQueue
        } else {
            DistributionMode::StaticPartition
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanResult> {
        [&self.pull_queue, &self.static_partition].into_iter()
    }
}
