use serde::{Deserialize, Serialize};
use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::aggregator::SharedReport;
use super::distributor::{partition, DistributionMode, WorkQueue};
use super::scanner::{FileScanner, Scan};
use crate::errors::{ScanError, ScanOutcome};
use crate::keywords::KeywordSet;
use crate::metrics::{ScanMetrics, ScanStats};
use crate::results::{KeywordReport, ModeComparison, PartialReport, ScanResult};

/// What an isolated worker sends back to the coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerMessage {
    pub worker: usize,
    pub partial: PartialReport,
    pub stats: ScanStats,
}

/// Runs a full scan over a file list with a fixed number of workers
#[derive(Debug, Clone, Default)]
pub struct ScanCoordinator<S = FileScanner> {
    scanner: S,
}

impl ScanCoordinator<FileScanner> {
    /// Creates a coordinator backed by the file system scanner
    pub fn new() -> Self {
        Self::with_scanner(FileScanner::new())
    }
}

impl<S> ScanCoordinator<S>
where
    S: Scan + Clone + 'static,
{
    /// Creates a coordinator backed by a custom scanner
    pub fn with_scanner(scanner: S) -> Self {
        Self { scanner }
    }

    /// Scans `files` for `keywords` and returns the merged report with its elapsed time.
    ///
    /// Unreadable files are logged and skipped; only an empty file list or keyword set is
    /// an error.
    pub fn run(
        &self,
        files: &[PathBuf],
        keywords: &KeywordSet,
        workers: NonZeroUsize,
        mode: DistributionMode,
    ) -> ScanOutcome<ScanResult> {
        if files.is_empty() {
            return Err(ScanError::NoInputFiles);
        }
        if keywords.is_empty() {
            return Err(ScanError::NoKeywords);
        }

        info!(
            "Starting {} scan of {} files for {} keywords with {} workers",
            mode,
            files.len(),
            keywords.len(),
            workers
        );

        let metrics = ScanMetrics::new();
        let start = Instant::now();
        let report = match mode {
            DistributionMode::PullQueue => {
                self.run_pull_queue(files, keywords, workers.get(), &metrics)?
            }
            DistributionMode::StaticPartition => {
                self.run_static_partition(files, keywords, workers.get(), &metrics)?
            }
        };
        let elapsed = start.elapsed();

        metrics.log_stats();
        info!(
            "{} scan complete in {:.6}s. Found {} matches in {} files",
            mode,
            elapsed.as_secs_f64(),
            report.total_matches(),
            report.files_with_matches()
        );

        Ok(ScanResult {
            report,
            mode,
            workers: workers.get(),
            elapsed,
            stats: metrics.get_stats(),
        })
    }

    /// Runs both modes back to back over the same input
    pub fn compare_modes(
        &self,
        files: &[PathBuf],
        keywords: &KeywordSet,
        workers: NonZeroUsize,
    ) -> ScanOutcome<ModeComparison> {
        let pull_queue = self.run(files, keywords, workers, DistributionMode::PullQueue)?;
        let static_partition =
            self.run(files, keywords, workers, DistributionMode::StaticPartition)?;
        Ok(ModeComparison {
            pull_queue,
            static_partition,
        })
    }

    /// Shared-memory workers on a dedicated pool, pulling from one queue and merging
    /// into one mutex-guarded report.
    fn run_pull_queue(
        &self,
        files: &[PathBuf],
        keywords: &KeywordSet,
        workers: usize,
        metrics: &ScanMetrics,
    ) -> ScanOutcome<KeywordReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("keyscout-worker-{}", i))
            .build()
            .map_err(|e| ScanError::config_error(format!("Failed to build worker pool: {}", e)))?;

        let queue = WorkQueue::new(files);
        let shared = SharedReport::new(keywords.clone(), metrics.clone());
        let scanner = &self.scanner;

        pool.scope(|s| {
            for worker in 0..workers {
                let queue = &queue;
                let shared = &shared;
                s.spawn(move |_| {
                    let partial = drain(worker, scanner, keywords, metrics, || queue.try_take());
                    debug!(
                        "Worker {} done after {} files",
                        worker,
                        partial.files_recorded()
                    );
                    shared.merge(partial);
                });
            }
        });

        Ok(shared.into_report())
    }

    /// Isolated workers, each owning one chunk, its own scanner and keyword set. Results
    /// come back as messages and are merged here after every worker has finished.
    fn run_static_partition(
        &self,
        files: &[PathBuf],
        keywords: &KeywordSet,
        workers: usize,
        metrics: &ScanMetrics,
    ) -> ScanOutcome<KeywordReport> {
        let (sender, receiver) = crossbeam_channel::unbounded::<WorkerMessage>();
        let mut handles = Vec::with_capacity(workers);

        for (worker, chunk) in partition(files, workers).into_iter().enumerate() {
            let sender = sender.clone();
            let scanner = self.scanner.clone();
            let keywords = keywords.clone();

            let handle = thread::Builder::new()
                .name(format!("keyscout-isolated-{}", worker))
                .spawn(move || {
                    let local = ScanMetrics::new();
                    let mut paths = chunk.into_iter();
                    let partial = drain(worker, &scanner, &keywords, &local, || paths.next());
                    let message = WorkerMessage {
                        worker,
                        partial,
                        stats: local.get_stats(),
                    };
                    // The coordinator holds the receiver until every worker is joined.
                    let _ = sender.send(message);
                })?;
            handles.push((worker, handle));
        }
        drop(sender);

        for (worker, handle) in handles {
            if let Err(payload) = handle.join() {
                let err = ScanError::worker_failure(worker, panic_message(payload.as_ref()));
                warn!("{}", err);
                metrics.record_worker_failure();
            }
        }

        let mut report = KeywordReport::new(keywords.clone());
        for message in receiver.try_iter() {
            debug!(
                "Merging results of worker {} ({} files)",
                message.worker,
                message.partial.files_recorded()
            );
            metrics.absorb(&message.stats);
            report.merge(message.partial);
            metrics.record_merge();
        }

        Ok(report)
    }
}

/// Scans paths from `next` until it runs dry.
///
/// A panic inside a scan stops this worker only: it is logged as a worker failure and the
/// partial report built so far is still returned.
fn drain<S: Scan>(
    worker: usize,
    scanner: &S,
    keywords: &KeywordSet,
    metrics: &ScanMetrics,
    mut next: impl FnMut() -> Option<PathBuf>,
) -> PartialReport {
    let mut partial = PartialReport::new(keywords.len());

    while let Some(path) = next() {
        match panic::catch_unwind(AssertUnwindSafe(|| scanner.scan(&path, keywords))) {
            Ok(Ok(hits)) => {
                metrics.record_file_scanned(hits.bytes_read, hits.strategy);
                partial.record(hits);
            }
            Ok(Err(e)) => {
                warn!("Skipping {}: {}", path.display(), e);
                metrics.record_file_failed();
            }
            Err(payload) => {
                let err = ScanError::worker_failure(worker, panic_message(payload.as_ref()));
                warn!(
                    "{} while scanning {}; keeping results for {} files",
                    err,
                    path.display(),
                    partial.files_recorded()
                );
                metrics.record_file_failed();
                metrics.record_worker_failure();
                break;
            }
        }
    }

    partial
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
