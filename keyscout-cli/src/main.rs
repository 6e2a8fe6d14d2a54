use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use keyscout::{
    filters::collect_files, CliOverrides, KeywordSet, ModeComparison, ModeSelection, ScanConfig,
    ScanCoordinator, ScanResult,
};
use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliScanConfig {
    /// Directory holding the files to scan (prompted for when missing)
    #[arg(short = 'd', long)]
    dir: Option<PathBuf>,

    /// Comma-separated keywords (prompted for when missing)
    #[arg(short = 'k', long)]
    keywords: Option<String>,

    /// File extensions to include (e.g. txt,md)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Number of workers to use
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Distribution mode (both|pull-queue|static-partition)
    #[arg(short, long)]
    mode: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count keyword occurrences in the files of a directory
    Scan(Box<CliScanConfig>),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(*args),
    }
}

fn run_scan(args: CliScanConfig) -> Result<()> {
    let mode = args
        .mode
        .as_deref()
        .map(str::parse::<ModeSelection>)
        .transpose()?;

    let overrides = CliOverrides {
        keywords: args.keywords.as_deref().map(split_list),
        root_path: args.dir,
        file_extensions: args.extensions.as_deref().map(split_list),
        ignore_patterns: args.ignore,
        recursive: args.recursive,
        worker_count: args.threads,
        mode,
        log_level: args.log_level,
    };

    let config = ScanConfig::load_from(args.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(overrides);
    init_tracing(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    let root_path = match &config.root_path {
        Some(path) => path.clone(),
        None => PathBuf::from(prompt("Enter the directory holding the files: ")?),
    };

    let files = collect_files(
        &root_path,
        &config.file_extensions,
        &config.ignore_patterns,
        config.recursive,
    )?;
    if !args.json {
        println!("Found {} files to scan.", files.len());
    }

    let keywords = if config.keywords.is_empty() {
        KeywordSet::parse(&prompt("Enter keywords to search for (comma separated): ")?)
    } else {
        config.keyword_set()?
    };

    let coordinator = ScanCoordinator::new();
    let results = match config.mode {
        ModeSelection::Both => {
            let comparison = coordinator.compare_modes(&files, &keywords, config.worker_count)?;
            if !args.json {
                print_comparison(&comparison);
            }
            vec![comparison.pull_queue, comparison.static_partition]
        }
        selection => {
            let mut results = Vec::new();
            for mode in selection.modes() {
                let result = coordinator.run(&files, &keywords, config.worker_count, mode)?;
                if !args.json {
                    print_scan_result(&result);
                }
                results.push(result);
            }
            results
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Prompts go to stderr so stdout stays clean for --json
fn prompt(message: &str) -> Result<String> {
    eprint!("{}", message);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_scan_result(result: &ScanResult) {
    println!(
        "\n=== Results ({}, {} workers) ===",
        result.mode.to_string().cyan(),
        result.workers
    );
    for (keyword, matches) in result.report.iter() {
        if matches.is_empty() {
            println!("{}: {}", keyword.as_str().yellow(), "no matches".dimmed());
            continue;
        }
        println!("{}:", keyword.as_str().yellow());
        let mut total = 0;
        for m in matches {
            total += m.count;
            println!(
                " --> {} (matches: {})",
                m.path.display().to_string().blue(),
                m.count.to_string().green()
            );
        }
        println!(" total: {}", total);
    }
    if result.stats.files_failed > 0 {
        println!(
            "{}",
            format!("Skipped {} unreadable files", result.stats.files_failed).red()
        );
    }
    println!(
        "Elapsed ({}): {:.8} s",
        result.mode,
        result.elapsed_secs()
    );
}

fn print_comparison(comparison: &ModeComparison) {
    for result in comparison.iter() {
        print_scan_result(result);
    }
    println!("\nFaster mode: {}", comparison.faster().to_string().green());
}
