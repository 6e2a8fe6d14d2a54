use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{ScanError, ScanOutcome};
use crate::keywords::{Keyword, KeywordSet};
use crate::scan::DistributionMode;

/// Which distribution modes a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSelection {
    /// Both modes back to back, for comparison
    #[default]
    Both,
    PullQueue,
    StaticPartition,
}

impl ModeSelection {
    /// The modes to run, in order
    pub fn modes(&self) -> Vec<DistributionMode> {
        match self {
            ModeSelection::Both => DistributionMode::ALL.to_vec(),
            ModeSelection::PullQueue => vec![DistributionMode::PullQueue],
            ModeSelection::StaticPartition => vec![DistributionMode::StaticPartition],
        }
    }
}

impl fmt::Display for ModeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeSelection::Both => f.write_str("both"),
            ModeSelection::PullQueue => f.write_str("pull-queue"),
            ModeSelection::StaticPartition => f.write_str("static-partition"),
        }
    }
}

impl FromStr for ModeSelection {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("both") {
            return Ok(ModeSelection::Both);
        }
        Ok(match s.parse::<DistributionMode>()? {
            DistributionMode::PullQueue => ModeSelection::PullQueue,
            DistributionMode::StaticPartition => ModeSelection::StaticPartition,
        })
    }
}

/// Configuration for a scan run.
///
/// # Configuration Locations
///
/// Loaded from these locations, later ones overriding earlier ones:
/// 1. Global `$CONFIG_DIR/keyscout/config.yaml`
/// 2. Local `.keyscout.yaml` in the current directory
/// 3. Custom file given with `--config`
///
/// # Configuration Format
///
/// ```yaml
/// # Keywords to count (case-insensitive)
/// keywords: ["cat", "dog"]
///
/// # Directory holding the files (prompted for when missing)
/// root_path: "./notes"
///
/// # File extensions to include
/// file_extensions: ["txt"]
///
/// # Patterns to ignore (glob syntax)
/// ignore_patterns: ["**/draft_*.txt"]
///
/// # Descend into subdirectories
/// recursive: false
///
/// # Worker count (default: CPU cores)
/// worker_count: 4
///
/// # both | pull-queue | static-partition
/// mode: both
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
///
/// Command-line arguments take precedence over file values, see `merge_with_cli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Keywords to count
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Directory to collect files from; None when neither a file nor the CLI set it
    #[serde(default)]
    pub root_path: Option<PathBuf>,

    /// Extensions to include; None includes every non-binary file
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Option<Vec<String>>,

    /// Patterns to ignore (glob syntax)
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether to descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Number of workers per run
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Distribution modes to run
    #[serde(default)]
    pub mode: ModeSelection,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_file_extensions() -> Option<Vec<String>> {
    Some(vec!["txt".to_string()])
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            root_path: None,
            file_extensions: default_file_extensions(),
            ignore_patterns: Vec::new(),
            recursive: false,
            worker_count: default_worker_count(),
            mode: ModeSelection::default(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from the default locations
    pub fn load() -> ScanOutcome<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file.
    ///
    /// An explicitly given file must exist; the default locations are optional.
    pub fn load_from(config_path: Option<&Path>) -> ScanOutcome<Self> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("keyscout/config.yaml")),
            // Local config
            Some(PathBuf::from(".keyscout.yaml")),
        ];

        for path in default_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        // CLI values take precedence over config file values
        if let Some(keywords) = cli.keywords {
            self.keywords = keywords;
        }
        if cli.root_path.is_some() {
            self.root_path = cli.root_path;
        }
        if cli.file_extensions.is_some() {
            self.file_extensions = cli.file_extensions;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if cli.recursive {
            self.recursive = true;
        }
        if let Some(worker_count) = cli.worker_count {
            self.worker_count = worker_count;
        }
        if let Some(mode) = cli.mode {
            self.mode = mode;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }

    /// The validated keyword set
    pub fn keyword_set(&self) -> ScanOutcome<KeywordSet> {
        let mut set = KeywordSet::default();
        for text in self.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
            set.insert(Keyword::new(text)?);
        }
        if set.is_empty() {
            return Err(ScanError::NoKeywords);
        }
        Ok(set)
    }
}

/// Values given on the command line; `None` or empty means "not given"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub keywords: Option<Vec<String>>,
    pub root_path: Option<PathBuf>,
    pub file_extensions: Option<Vec<String>>,
    pub ignore_patterns: Vec<String>,
    pub recursive: bool,
    pub worker_count: Option<NonZeroUsize>,
    pub mode: Option<ModeSelection>,
    pub log_level: Option<String>,
}
