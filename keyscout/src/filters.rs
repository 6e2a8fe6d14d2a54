use glob::Pattern;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::errors::{ScanError, ScanOutcome};

/// Checks if a file should be included based on its extension
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    match extensions {
        None => true,
        Some(exts) => {
            if let Some(ext) = path.extension() {
                if let Some(ext_str) = ext.to_str() {
                    return exts
                        .iter()
                        .map(|e| e.trim_start_matches('.'))
                        .any(|e| e.eq_ignore_ascii_case(ext_str));
                }
            }
            false
        }
    }
}

/// Checks if a file should be ignored based on ignore patterns
pub fn should_ignore(path: &Path, ignore_patterns: &[String]) -> bool {
    // Normalize so patterns written with '/' work on every platform
    let path_str = path.to_string_lossy().replace('\\', "/");

    if path_str.contains("/.git/") {
        return true;
    }

    ignore_patterns.iter().any(|pattern| match Pattern::new(pattern) {
        Ok(p) => p.matches(&path_str),
        Err(e) => {
            debug!("Skipping invalid ignore pattern '{}': {}", pattern, e);
            false
        }
    })
}

/// Checks if a file is likely to be binary
pub fn is_likely_binary(path: &Path) -> bool {
    // Common binary file extensions
    const BINARY_EXTENSIONS: &[&str] = &[
        "exe", "dll", "so", "dylib", "bin", "obj", "o", "class", "jar", "war", "ear", "png", "jpg",
        "jpeg", "gif", "bmp", "ico", "pdf", "doc", "docx", "xls", "xlsx", "zip", "tar", "gz", "7z",
        "rar",
    ];

    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return BINARY_EXTENSIONS
                .iter()
                .any(|&bin_ext| bin_ext.eq_ignore_ascii_case(ext_str));
        }
    }
    false
}

/// Determines if a file should be scanned
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
) -> bool {
    !is_likely_binary(path)
        && has_valid_extension(path, extensions)
        && !should_ignore(path, ignore_patterns)
}

/// Lists the files under `root` that pass the filters, sorted by path.
///
/// Only the top level is listed unless `recursive` is set.
pub fn collect_files(
    root: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
    recursive: bool,
) -> ScanOutcome<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ScanError::config_error(format!(
            "Directory does not exist: {}",
            root.display()
        )));
    }

    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(true)
        .ignore(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);
    if !recursive {
        walker.max_depth(Some(1));
    }

    let mut files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| should_include_file(entry.path(), extensions, ignore_patterns))
        .map(|entry| {
            trace!("Collected file: {}", entry.path().display());
            entry.into_path()
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(ScanError::NoInputFiles);
    }

    info!("Found {} files to scan in {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_has_valid_extension() {
        let extensions = Some(vec!["txt".to_string()]);
        assert!(has_valid_extension(Path::new("notes.txt"), &extensions));
        assert!(has_valid_extension(Path::new("NOTES.TXT"), &extensions));
        assert!(!has_valid_extension(Path::new("notes.md"), &extensions));
        assert!(!has_valid_extension(Path::new("notes"), &extensions));
        assert!(has_valid_extension(Path::new("notes.md"), &None));

        let dotted = Some(vec![".md".to_string()]);
        assert!(has_valid_extension(Path::new("readme.md"), &dotted));
    }

    #[test]
    fn test_should_ignore() {
        let ignore_patterns = vec!["**/draft_[0-4].txt".to_string(), "**/*.tmp".to_string()];

        assert!(should_ignore(Path::new("dir/draft_0.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("a/b/c.tmp"), &ignore_patterns));
        assert!(should_ignore(Path::new("repo/.git/config"), &ignore_patterns));

        assert!(!should_ignore(Path::new("dir/draft_5.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new("dir/final.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new("repo/.git2/config"), &ignore_patterns));
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let ignore_patterns = vec!["[unclosed".to_string()];
        assert!(!should_ignore(Path::new("a.txt"), &ignore_patterns));
    }

    #[test]
    fn test_is_likely_binary() {
        assert!(is_likely_binary(Path::new("test.exe")));
        assert!(is_likely_binary(Path::new("test.PDF")));
        assert!(!is_likely_binary(Path::new("test.txt")));
        assert!(!is_likely_binary(Path::new("test")));
    }

    #[test]
    fn test_collect_files_top_level_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("c.md"), "c").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.txt"), "d").unwrap();

        let extensions = Some(vec!["txt".to_string()]);
        let files = collect_files(dir.path(), &extensions, &[], false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let files = collect_files(dir.path(), &extensions, &[], true).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_collect_files_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            collect_files(&missing, &None, &[], false),
            Err(ScanError::ConfigError(_))
        ));

        fs::write(dir.path().join("only.md"), "x").unwrap();
        let extensions = Some(vec!["txt".to_string()]);
        assert!(matches!(
            collect_files(dir.path(), &extensions, &[], false),
            Err(ScanError::NoInputFiles)
        ));
    }
}
