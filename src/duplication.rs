//! Content-addressed duplicate code detection
//!
//! Every source file is reduced to normalized lines (trimmed, whitespace
//! collapsed, blank and comment lines dropped). Each run of
//! [`WINDOW_LINES`] consecutive normalized lines is hashed; a digest seen at
//! two or more locations is a duplicate.

use crate::complexity::round2;
use crate::config::LimitsConfig;
use crate::models::{CodeLocation, DuplicateCluster, DuplicationReport};
use crate::scanner::{SourceFile, SourceTree};
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_128;

pub const WINDOW_LINES: usize = 6;
pub const MAX_CLUSTERS: usize = 5;
pub const MAX_CLONES: usize = 3;

/// Collapsed form of a line, or `None` for blank and comment-only lines
pub fn normalize_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.starts_with('#')
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with("<!--")
    {
        return None;
    }
    Some(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn normalize(content: &str) -> Vec<String> {
    content.lines().filter_map(normalize_line).collect()
}

pub struct DuplicationDetector {
    max_file_bytes: u64,
}

impl DuplicationDetector {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_file_bytes: limits.max_file_bytes,
        }
    }

    pub fn detect(&self, tree: &SourceTree) -> DuplicationReport {
        let files: Vec<&SourceFile> = tree.source_files().collect();
        let normalized: Vec<(&SourceFile, Vec<String>)> = files
            .par_iter()
            .filter_map(|file| self.normalize_file(file).map(|lines| (*file, lines)))
            .collect();

        let mut windows: IndexMap<u128, Vec<CodeLocation>> = IndexMap::new();
        let mut total_lines = 0;

        for (file, lines) in &normalized {
            total_lines += lines.len();
            for (start, window) in lines.windows(WINDOW_LINES).enumerate() {
                let digest = xxh3_128(window.join("\n").as_bytes());
                windows.entry(digest).or_default().push(CodeLocation {
                    file: file.relative.clone(),
                    line: start + 1,
                });
            }
        }

        let mut duplicated_lines = 0;
        let mut clusters = Vec::new();
        for locations in windows.into_values().filter(|l| l.len() >= 2) {
            duplicated_lines += WINDOW_LINES * (locations.len() - 1);
            if clusters.len() < MAX_CLUSTERS {
                let occurrences = locations.len();
                let mut iter = locations.into_iter();
                if let Some(primary) = iter.next() {
                    clusters.push(DuplicateCluster {
                        primary,
                        occurrences,
                        clones: iter.take(MAX_CLONES).collect(),
                    });
                }
            }
        }

        let ratio = if total_lines == 0 {
            0.0
        } else {
            round2(duplicated_lines as f64 / total_lines as f64 * 100.0).clamp(0.0, 100.0)
        };

        info!(
            "Duplication: {:.2}% ({} of {} lines)",
            ratio, duplicated_lines, total_lines
        );

        DuplicationReport {
            ratio,
            duplicated_lines,
            total_lines,
            clusters,
        }
    }

    fn normalize_file(&self, file: &SourceFile) -> Option<Vec<String>> {
        if file.size > self.max_file_bytes {
            debug!("Skipping oversized file for duplication: {}", file.relative);
            return None;
        }
        match file.read_text() {
            Ok(content) => Some(normalize(&content)),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const BLOCK: &str = "def load(path):\n    with open(path) as f:\n        data = f.read()\n    items = data.split(',')\n    items = [i.strip() for i in items]\n    return items\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn detect(root: &Path) -> DuplicationReport {
        DuplicationDetector::new(&LimitsConfig::default()).detect(&SourceTree::scan(root))
    }

    #[test]
    fn test_normalize_line() {
        assert_eq!(normalize_line("   x   =    1  "), Some("x = 1".to_string()));
        assert_eq!(normalize_line("   "), None);
        assert_eq!(normalize_line("# comment"), None);
        assert_eq!(normalize_line("  // comment"), None);
        assert_eq!(normalize_line(" * doc"), None);
    }

    #[test]
    fn test_two_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", BLOCK);
        write(dir.path(), "b.py", BLOCK);

        let report = detect(dir.path());
        assert_eq!(report.total_lines, 12);
        assert_eq!(report.duplicated_lines, 6);
        assert_eq!(report.ratio, 50.0);
        assert_eq!(report.clusters.len(), 1);

        let cluster = &report.clusters[0];
        assert_eq!(cluster.primary.to_string(), "a.py:1");
        assert_eq!(cluster.occurrences, 2);
        assert_eq!(cluster.clones.len(), 1);
        assert_eq!(cluster.clones[0].to_string(), "b.py:1");
    }

    #[test]
    fn test_repeated_block_within_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let unique = |prefix: &str, n: usize| -> String {
            (0..n).map(|i| format!("{}_{} = {}\n", prefix, i, i)).collect()
        };
        let content = format!(
            "{}{}{}{}{}",
            unique("head", 5),
            BLOCK,
            unique("mid", 4),
            BLOCK,
            unique("tail", 3)
        );
        write(dir.path(), "m.py", &content);

        let report = detect(dir.path());
        assert_eq!(report.total_lines, 24);
        assert_eq!(report.duplicated_lines, 6);
        assert_eq!(report.ratio, round2(6.0 / 24.0 * 100.0));
        assert_eq!(report.clusters.len(), 1);

        let cluster = &report.clusters[0];
        assert_eq!(cluster.occurrences, 2);
        assert_eq!(cluster.primary.to_string(), "m.py:6");
        assert_eq!(cluster.clones[0].to_string(), "m.py:16");
    }

    #[test]
    fn test_formatting_differences_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", BLOCK);
        let reformatted = BLOCK
            .lines()
            .map(|l| format!("{}   \n\n# note\n", l.replace(" = ", "   =   ")))
            .collect::<String>();
        write(dir.path(), "b.py", &reformatted);

        let report = detect(dir.path());
        assert_eq!(report.duplicated_lines, 6);
    }

    #[test]
    fn test_short_files_have_no_windows() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "x = 1\ny = 2\n");
        write(dir.path(), "b.py", "x = 1\ny = 2\n");

        let report = detect(dir.path());
        assert_eq!(report.total_lines, 4);
        assert_eq!(report.ratio, 0.0);
        assert!(report.clusters.is_empty());
    }

    #[test]
    fn test_ratio_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "repeat.py", &"x = 1\n".repeat(12));

        let report = detect(dir.path());
        assert_eq!(report.total_lines, 12);
        // 7 identical windows: 6 * 6 duplicated lines exceed the total
        assert_eq!(report.duplicated_lines, 36);
        assert_eq!(report.ratio, 100.0);
        assert_eq!(report.clusters[0].occurrences, 7);
        assert_eq!(report.clusters[0].clones.len(), MAX_CLONES);
    }

    #[test]
    fn test_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        let report = detect(dir.path());
        assert_eq!(report.ratio, 0.0);
        assert_eq!(report.total_lines, 0);
    }
}
