use std::sync::{Mutex, PoisonError};
use tracing::trace;

use crate::keywords::KeywordSet;
use crate::metrics::ScanMetrics;
use crate::results::{KeywordReport, PartialReport};

/// The run-wide report shared by pull-queue workers.
///
/// Workers accumulate privately and call `merge` once; the lock is held for that one
/// merge only, never while a file is read.
#[derive(Debug)]
pub struct SharedReport {
    report: Mutex<KeywordReport>,
    metrics: ScanMetrics,
}

impl SharedReport {
    /// Creates a shared report with every keyword present
    pub fn new(keywords: KeywordSet, metrics: ScanMetrics) -> Self {
        Self {
            report: Mutex::new(KeywordReport::new(keywords)),
            metrics,
        }
    }

    /// Applies one worker's partial report as a single critical section
    pub fn merge(&self, partial: PartialReport) {
        let files = partial.files_recorded();
        // A panic cannot happen mid-merge, so a poisoned lock still holds a whole report.
        let mut report = self.report.lock().unwrap_or_else(PoisonError::into_inner);
        report.merge(partial);
        drop(report);

        self.metrics.record_merge();
        trace!("Merged partial report covering {} files", files);
    }

    /// Consumes the aggregator once every worker has merged
    pub fn into_report(self) -> KeywordReport {
        self.report
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
