/// This module implements the concurrent keyword scan: one leaf scanner, two ways of
/// distributing files to workers, and the merge step that combines their results.
///
/// # .NET vs Rust Worker Pools
///
/// In .NET, a pull-based worker pool is usually a `BlockingCollection` drained by tasks:
/// ```csharp
/// var queue = new BlockingCollection<string>(new ConcurrentQueue<string>(files));
/// queue.CompleteAdding();
/// var tasks = Enumerable.Range(0, n).Select(_ => Task.Run(() => {
///     while (queue.TryTake(out var path)) { Count(path); }
/// }));
/// ```
///
/// In Rust, the same shape is a closed channel and a scoped Rayon pool. The borrow checker
/// proves that no worker outlives the queue or the shared report:
/// ```rust,ignore
/// let queue = WorkQueue::new(files);
/// pool.scope(|s| {
///     for worker in 0..workers {
///         s.spawn(|_| {
///             while let Some(path) = queue.try_take() { /* scan */ }
///         });
///     }
/// });
/// ```
///
/// # Two Distribution Modes
///
/// 1. **Pull queue**: workers share the queue and a mutex-guarded report. Each worker
///    accumulates privately and takes the lock exactly once, to merge.
/// 2. **Static partition**: each worker is moved its own chunk and shares nothing. Results
///    travel back over a channel as owned `WorkerMessage` values and the coordinator merges
///    them alone, so no lock is needed.
///
/// # Error Handling
///
/// A file that cannot be read is logged and skipped. A panic inside a scan is caught at the
/// worker boundary; the worker keeps what it had and stops. Neither aborts the run:
/// ```rust,ignore
/// match scan_files(&files, &keywords, workers, DistributionMode::PullQueue) {
///     Ok(result) => // Every readable file is in result.report,
///     Err(ScanError::NoInputFiles) => // Nothing to do,
///     Err(e) => // Other configuration problem
/// }
/// ```
pub mod aggregator;
pub mod coordinator;
pub mod distributor;
pub mod scanner;

pub use aggregator::SharedReport;
pub use coordinator::{ScanCoordinator, WorkerMessage};
pub use distributor::{partition, DistributionMode, WorkQueue};
pub use scanner::{count_occurrences, FileHits, FileScanner, ReadStrategy, Scan};

use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::errors::ScanOutcome;
use crate::keywords::KeywordSet;
use crate::results::ScanResult;

/// Scans `files` with the file system scanner in the given mode
pub fn scan_files(
    files: &[PathBuf],
    keywords: &KeywordSet,
    workers: NonZeroUsize,
    mode: DistributionMode,
) -> ScanOutcome<ScanResult> {
    ScanCoordinator::new().run(files, keywords, workers, mode)
}
