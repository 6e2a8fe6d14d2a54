use crossbeam_channel::{Receiver, TryRecvError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use crate::errors::ScanError;

/// How files are handed to workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionMode {
    /// Shared-memory workers pulling one path at a time from a shared queue
    PullQueue,
    /// Isolated workers, each given one contiguous chunk up front
    StaticPartition,
}

impl DistributionMode {
    pub const ALL: [DistributionMode; 2] =
        [DistributionMode::PullQueue, DistributionMode::StaticPartition];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionMode::PullQueue => "pull-queue",
            DistributionMode::StaticPartition => "static-partition",
        }
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pull-queue" | "queue" | "threads" => Ok(DistributionMode::PullQueue),
            "static-partition" | "static" | "partition" => Ok(DistributionMode::StaticPartition),
            other => Err(ScanError::config_error(format!(
                "Unknown distribution mode: {}",
                other
            ))),
        }
    }
}

/// A closed queue of paths shared by pull-queue workers.
///
/// Every path is enqueued before the first worker starts, so an empty queue means the
/// work is done and a worker can exit instead of blocking.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    receiver: Receiver<PathBuf>,
}

impl WorkQueue {
    /// Enqueues every path and closes the queue
    pub fn new(files: &[PathBuf]) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(files.len().max(1));
        for path in files {
            // Capacity covers every path and the receiver is alive, so this cannot fail.
            let _ = sender.try_send(path.clone());
        }
        debug!("Queued {} files", files.len());
        Self { receiver }
    }

    /// Takes the next path without blocking; `None` once the queue is exhausted
    pub fn try_take(&self) -> Option<PathBuf> {
        match self.receiver.try_recv() {
            Ok(path) => Some(path),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Paths not yet taken
    pub fn remaining(&self) -> usize {
        self.receiver.len()
    }
}

/// Splits `files` into exactly `workers` contiguous chunks.
///
/// Chunk size is `max(1, len / workers)`; the last chunk absorbs the remainder. With
/// fewer files than workers, the trailing chunks are empty.
pub fn partition(files: &[PathBuf], workers: usize) -> Vec<Vec<PathBuf>> {
    let workers = workers.max(1);
    let chunk_size = (files.len() / workers).max(1);
    debug!(
        "Partitioning {} files into {} chunks of {}",
        files.len(),
        workers,
        chunk_size
    );

    (0..workers)
        .map(|worker| {
            let start = (worker * chunk_size).min(files.len());
            let end = if worker == workers - 1 {
                files.len()
            } else {
                ((worker + 1) * chunk_size).min(files.len())
            };
            files[start..end].to_vec()
        })
        .collect()
}
