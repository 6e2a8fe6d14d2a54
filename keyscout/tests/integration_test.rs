use anyhow::Result;
use keyscout::filters::collect_files;
use keyscout::{
    scan_files, DistributionMode, FileMatch, KeywordReport, KeywordSet, ScanCoordinator,
    ScanError,
};
use std::fs::{self, File};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn create_test_files(dir: impl AsRef<Path>, files: &[(&str, &str)]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for (name, content) in files {
        let path = dir.as_ref().join(name);
        fs::write(&path, content)?;
        paths.push(path);
    }
    Ok(paths)
}

fn create_corpus(
    dir: &tempfile::TempDir,
    file_count: usize,
    lines_per_file: usize,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for i in 0..file_count {
        let path = dir.path().join(format!("test_{}.txt", i));
        let mut file = File::create(&path)?;
        for j in 0..lines_per_file {
            writeln!(file, "Line {} in file {}: TODO implement this", j, i)?;
            if i % 3 == 0 {
                writeln!(file, "FIXME: bug in file {} line {}", i, j)?;
            }
        }
        paths.push(path);
    }
    Ok(paths)
}

fn workers(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

/// (keyword, path, count) triples sorted, for order-independent comparison
fn triples(report: &KeywordReport) -> Vec<(String, PathBuf, usize)> {
    let mut out: Vec<_> = report
        .iter()
        .flat_map(|(keyword, matches)| {
            matches
                .iter()
                .map(move |m| (keyword.as_str().to_string(), m.path.clone(), m.count))
        })
        .collect();
    out.sort();
    out
}

#[test]
fn test_cat_dog_bird_example() -> Result<()> {
    let dir = tempdir()?;
    let paths = create_test_files(&dir, &[("a.txt", "Cat cat dog"), ("b.txt", "no match here")])?;
    let keywords = KeywordSet::parse("cat, dog, bird");

    for mode in DistributionMode::ALL {
        let result = scan_files(&paths, &keywords, workers(4), mode)?;
        let report = &result.report;

        assert_eq!(
            report.get("cat").unwrap(),
            &[FileMatch {
                path: paths[0].clone(),
                count: 2
            }]
        );
        assert_eq!(
            report.get("dog").unwrap(),
            &[FileMatch {
                path: paths[0].clone(),
                count: 1
            }]
        );
        assert!(report.get("bird").unwrap().is_empty());
        assert_eq!(result.stats.files_scanned, 2);
    }
    Ok(())
}

#[test]
fn test_modes_agree_and_runs_are_idempotent() -> Result<()> {
    let dir = tempdir()?;
    let paths = create_corpus(&dir, 25, 20)?;
    let keywords = KeywordSet::parse("todo,fixme,absent");
    let coordinator = ScanCoordinator::new();

    let first = coordinator.compare_modes(&paths, &keywords, workers(4))?;
    let second = coordinator.compare_modes(&paths, &keywords, workers(3))?;

    let expected = triples(&first.pull_queue.report);
    assert_eq!(triples(&first.static_partition.report), expected);
    assert_eq!(triples(&second.pull_queue.report), expected);
    assert_eq!(triples(&second.static_partition.report), expected);

    assert_eq!(first.pull_queue.report.get("todo").unwrap().len(), 25);
    assert_eq!(first.pull_queue.report.get("fixme").unwrap().len(), 9);
    assert!(first.pull_queue.report.get("absent").unwrap().is_empty());
    Ok(())
}

#[test]
fn test_every_matching_file_appears_exactly_once() -> Result<()> {
    let dir = tempdir()?;
    let paths = create_corpus(&dir, 40, 5)?;
    let keywords = KeywordSet::parse("todo");

    for mode in DistributionMode::ALL {
        let result = scan_files(&paths, &keywords, workers(7), mode)?;
        let mut found: Vec<_> = result
            .report
            .get("todo")
            .unwrap()
            .iter()
            .map(|m| m.path.clone())
            .collect();
        found.sort();
        let mut expected = paths.clone();
        expected.sort();
        assert_eq!(found, expected);
        assert!(result.report.get("todo").unwrap().iter().all(|m| m.count == 5));
    }
    Ok(())
}

#[test]
fn test_more_workers_than_files() -> Result<()> {
    let dir = tempdir()?;
    let paths = create_test_files(&dir, &[("one.txt", "cat"), ("two.txt", "cat cat")])?;
    let keywords = KeywordSet::parse("cat");

    for mode in DistributionMode::ALL {
        let result = scan_files(&paths, &keywords, workers(16), mode)?;
        assert_eq!(result.workers, 16);
        assert_eq!(result.report.total_matches(), 3);
        assert_eq!(result.report.files_with_matches(), 2);
    }
    Ok(())
}

#[test]
fn test_unreadable_files_do_not_disturb_others() -> Result<()> {
    let dir = tempdir()?;
    let mut paths = create_test_files(
        &dir,
        &[("a.txt", "alpha beta"), ("b.txt", "beta beta"), ("c.txt", "gamma")],
    )?;
    let keywords = KeywordSet::parse("beta,gamma");

    let clean = scan_files(&paths, &keywords, workers(2), DistributionMode::PullQueue)?;

    let subdir = dir.path().join("subdir.txt");
    fs::create_dir(&subdir)?;
    paths.insert(1, dir.path().join("deleted.txt"));
    paths.insert(3, subdir);

    for mode in DistributionMode::ALL {
        let result = scan_files(&paths, &keywords, workers(2), mode)?;
        assert_eq!(triples(&result.report), triples(&clean.report));
        assert_eq!(result.stats.files_failed, 2);
        assert_eq!(result.stats.files_scanned, 3);
    }
    Ok(())
}

#[test]
fn test_invalid_utf8_file_is_scanned() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("latin1.txt");
    fs::write(&path, b"caf\xe9 CAT \x80\x81 cat")?;
    let keywords = KeywordSet::parse("cat,caf");

    let result = scan_files(&[path], &keywords, workers(1), DistributionMode::StaticPartition)?;
    assert_eq!(result.report.get("cat").unwrap()[0].count, 2);
    assert_eq!(result.report.get("caf").unwrap()[0].count, 1);
    Ok(())
}

#[test]
fn test_duplicate_keywords_report_once() -> Result<()> {
    let dir = tempdir()?;
    let paths = create_test_files(&dir, &[("a.txt", "cat")])?;
    let keywords = KeywordSet::parse("cat,Cat,cat");

    let result = scan_files(&paths, &keywords, workers(2), DistributionMode::PullQueue)?;
    assert_eq!(result.report.iter().count(), 1);
    assert_eq!(result.report.get("cat").unwrap().len(), 1);
    Ok(())
}

#[test]
fn test_collect_then_scan() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("notes.txt", "Rust rust RUST"),
            ("readme.md", "rust"),
            ("draft_1.txt", "rust"),
        ],
    )?;

    let files = collect_files(
        dir.path(),
        &Some(vec!["txt".to_string()]),
        &["**/draft_*".to_string()],
        false,
    )?;
    assert_eq!(files.len(), 1);

    let result = scan_files(
        &files,
        &KeywordSet::parse("rust"),
        workers(2),
        DistributionMode::PullQueue,
    )?;
    assert_eq!(result.report.total_matches(), 3);
    Ok(())
}

#[test]
fn test_empty_inputs_fail_before_scanning() {
    let err = scan_files(
        &[],
        &KeywordSet::parse("cat"),
        workers(1),
        DistributionMode::PullQueue,
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::NoInputFiles));

    let err = scan_files(
        &[PathBuf::from("a.txt")],
        &KeywordSet::parse(" , "),
        workers(1),
        DistributionMode::StaticPartition,
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::NoKeywords));
}

#[test]
fn test_result_serializes_to_json() -> Result<()> {
    let dir = tempdir()?;
    let paths = create_test_files(&dir, &[("a.txt", "dog")])?;
    let result = scan_files(
        &paths,
        &KeywordSet::parse("dog,cat"),
        workers(1),
        DistributionMode::StaticPartition,
    )?;

    let json: serde_json::Value = serde_json::to_value(&result)?;
    assert_eq!(json["mode"], "static-partition");
    assert_eq!(json["workers"], 1);
    assert_eq!(json["report"]["dog"][0]["count"], 1);
    assert_eq!(json["report"]["cat"], serde_json::json!([]));
    assert!(json["elapsed_secs"].as_f64().unwrap() >= 0.0);
    Ok(())
}
