pub mod config;
pub mod errors;
pub mod filters;
pub mod keywords;
pub mod metrics;
pub mod results;
pub mod scan;

pub use config::{CliOverrides, ModeSelection, ScanConfig};
pub use errors::{ScanError, ScanOutcome};
pub use keywords::{Keyword, KeywordSet};
pub use results::{FileMatch, KeywordReport, ModeComparison, PartialReport, ScanResult};
pub use scan::{scan_files, DistributionMode, ScanCoordinator};
