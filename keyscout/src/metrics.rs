use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::scan::scanner::ReadStrategy;

/// Tracks per-run scan counters. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // File outcome metrics
    files_scanned: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    bytes_read: Arc<AtomicU64>,

    // Read strategy metrics
    whole_reads: Arc<AtomicU64>,
    buffered_reads: Arc<AtomicU64>,
    mmap_reads: Arc<AtomicU64>,

    // Worker metrics
    merges: Arc<AtomicU64>,
    worker_failures: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            files_scanned: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
            whole_reads: Arc::new(AtomicU64::new(0)),
            buffered_reads: Arc::new(AtomicU64::new(0)),
            mmap_reads: Arc::new(AtomicU64::new(0)),
            merges: Arc::new(AtomicU64::new(0)),
            worker_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a successfully scanned file
    pub fn record_file_scanned(&self, bytes: u64, strategy: ReadStrategy) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
        let total = self.bytes_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        let counter = match strategy {
            ReadStrategy::Whole => &self.whole_reads,
            ReadStrategy::Buffered => &self.buffered_reads,
            ReadStrategy::Mapped => &self.mmap_reads,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        debug!("Read {} bytes via {:?}, total: {} bytes", bytes, strategy, total);
    }

    /// Records a file that could not be scanned
    pub fn record_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one partial report merged into the run's report
    pub fn record_merge(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a worker that stopped on a caught panic
    pub fn record_worker_failure(&self) {
        self.worker_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds a snapshot taken by an isolated worker
    pub fn absorb(&self, stats: &ScanStats) {
        self.files_scanned
            .fetch_add(stats.files_scanned, Ordering::Relaxed);
        self.files_failed
            .fetch_add(stats.files_failed, Ordering::Relaxed);
        self.bytes_read.fetch_add(stats.bytes_read, Ordering::Relaxed);
        self.whole_reads
            .fetch_add(stats.whole_reads, Ordering::Relaxed);
        self.buffered_reads
            .fetch_add(stats.buffered_reads, Ordering::Relaxed);
        self.mmap_reads.fetch_add(stats.mmap_reads, Ordering::Relaxed);
        self.merges.fetch_add(stats.merges, Ordering::Relaxed);
        self.worker_failures
            .fetch_add(stats.worker_failures, Ordering::Relaxed);
    }

    /// Gets the current counters
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            whole_reads: self.whole_reads.load(Ordering::Relaxed),
            buffered_reads: self.buffered_reads.load(Ordering::Relaxed),
            mmap_reads: self.mmap_reads.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            worker_failures: self.worker_failures.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Files scanned/failed: {}/{}\n\
             Bytes read: {}\n\
             Reads (whole/buffered/mmap): {}/{}/{}\n\
             Merges: {}\n\
             Worker failures: {}",
            stats.files_scanned,
            stats.files_failed,
            stats.bytes_read,
            stats.whole_reads,
            stats.buffered_reads,
            stats.mmap_reads,
            stats.merges,
            stats.worker_failures
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of scan counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub files_scanned: u64,
    pub files_failed: u64,
    pub bytes_read: u64,
    pub whole_reads: u64,
    pub buffered_reads: u64,
    pub mmap_reads: u64,
    pub merges: u64,
    pub worker_failures: u64,
}
