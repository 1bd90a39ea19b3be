//! Tree scanner
//!
//! Lazy, exclusion-aware enumeration of every file under an analysis root.
//! All analysis layers consume the same [`SourceTree`], which is collected
//! once per run and never mutated afterwards.

use crate::error::{AnalysisError, AnalysisResult};
use ignore::WalkBuilder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path segments that are never descended into
pub const EXCLUDED_SEGMENTS: &[&str] = &[".git", "node_modules", "__pycache__", "venv", ".venv"];

/// Extensions treated as program source
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "pyi", "js", "jsx", "mjs", "cjs", "ts", "tsx", "go", "rs", "java", "kt", "kts", "php",
    "rb", "cs", "c", "h", "cpp", "cc", "hpp", "swift", "scala", "vue", "svelte",
];

/// Extensions treated as configuration
pub const CONFIG_EXTENSIONS: &[&str] = &[
    "yml", "yaml", "json", "toml", "ini", "cfg", "conf", "env", "properties", "xml", "tf",
];

pub fn is_excluded_segment(segment: &str) -> bool {
    EXCLUDED_SEGMENTS.contains(&segment)
}

/// A file discovered under the analysis root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or root-joined) path used for reading
    pub path: PathBuf,
    /// Path relative to the root, always `/`-separated
    pub relative: String,
    pub name: String,
    /// Lower-cased extension without the dot
    pub extension: Option<String>,
    pub size: u64,
}

impl SourceFile {
    fn from_path(root: &Path, path: &Path, size: u64) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        let relative = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let name = path.file_name()?.to_string_lossy().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        Some(Self {
            path: path.to_path_buf(),
            relative,
            name,
            extension,
            size,
        })
    }

    pub fn ext(&self) -> &str {
        self.extension.as_deref().unwrap_or("")
    }

    pub fn has_extension(&self, extensions: &[&str]) -> bool {
        extensions.contains(&self.ext())
    }

    pub fn is_source(&self) -> bool {
        self.has_extension(SOURCE_EXTENSIONS)
    }

    /// `.env`, `.env.local`, `prod.env` and friends
    pub fn is_env(&self) -> bool {
        self.name.starts_with(".env") || self.ext() == "env"
    }

    pub fn is_config(&self) -> bool {
        self.has_extension(CONFIG_EXTENSIONS) || self.is_env()
    }

    /// Relative path segments, excluding the file name
    pub fn dir_segments(&self) -> impl Iterator<Item = &str> {
        let mut parts: Vec<&str> = self.relative.split('/').collect();
        parts.pop();
        parts.into_iter()
    }

    /// Depth below the root (0 for files directly in the root)
    pub fn depth(&self) -> usize {
        self.relative.matches('/').count()
    }

    /// Read at most `max_bytes` from the start of the file
    pub fn read_prefix(&self, max_bytes: usize) -> AnalysisResult<String> {
        read_prefix(&self.path, max_bytes)
    }

    pub fn read_text(&self) -> AnalysisResult<String> {
        read_text(&self.path)
    }
}

/// Lazily walk `root`, yielding every readable file outside the exclusion set.
///
/// Entries are sorted by file name within each directory so the sequence is
/// stable for an unchanged tree. Unreadable entries are skipped.
pub fn scan(root: &Path) -> impl Iterator<Item = SourceFile> + '_ {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .require_git(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_excluded_segment(&entry.file_name().to_string_lossy())
        });

    builder.build().filter_map(move |entry| {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                return None;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            return None;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        SourceFile::from_path(root, entry.path(), size)
    })
}

/// The immutable file listing shared by every analysis layer
#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    files: Vec<SourceFile>,
}

impl SourceTree {
    pub fn scan(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let files = scan(&root).collect();
        Self { root, files }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn source_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.is_source())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Read at most `max_bytes` from the start of `path`, decoding lossily
pub fn read_prefix(path: &Path, max_bytes: usize) -> AnalysisResult<String> {
    let file = std::fs::File::open(path).map_err(|e| AnalysisError::file_access(path, e))?;
    let mut buf = Vec::with_capacity(max_bytes.min(64 * 1024));
    file.take(max_bytes as u64)
        .read_to_end(&mut buf)
        .map_err(|e| AnalysisError::file_access(path, e))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read a whole file, decoding lossily
pub fn read_text(path: &Path) -> AnalysisResult<String> {
    let bytes = std::fs::read(path).map_err(|e| AnalysisError::file_access(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Truncate `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncate `text` to at most `max_bytes` bytes without splitting a character
pub fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_skips_excluded_segments() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/app.py", "print(1)");
        write(dir.path(), ".git/config", "[core]");
        write(dir.path(), "node_modules/left-pad/index.js", "module.exports = 1");
        write(dir.path(), "pkg/__pycache__/app.cpython-311.pyc", "x");
        write(dir.path(), "venv/lib/site.py", "x");
        write(dir.path(), ".venv/lib/site.py", "x");
        write(dir.path(), ".github/workflows/ci.yml", "on: push");
        write(dir.path(), ".env", "KEY=1");

        let files: Vec<String> = scan(dir.path()).map(|f| f.relative).collect();
        assert_eq!(files, vec![".env", ".github/workflows/ci.yml", "src/app.py"]);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.py", "a.py", "c/d.py", "c/a.py"] {
            write(dir.path(), name, "x = 1");
        }
        let first: Vec<String> = scan(dir.path()).map(|f| f.relative).collect();
        let second: Vec<String> = scan(dir.path()).map(|f| f.relative).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["a.py", "b.py", "c/a.py", "c/d.py"]);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(scan(&missing).count(), 0);
    }

    #[test]
    fn test_source_file_classification() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "api/Main.PY", "x");
        write(dir.path(), "deploy/.env.production", "x");
        write(dir.path(), "deploy/values.yaml", "x");

        let tree = SourceTree::scan(dir.path());
        let files = tree.files();
        assert_eq!(files.len(), 3);

        let main = files.iter().find(|f| f.name == "Main.PY").unwrap();
        assert_eq!(main.ext(), "py");
        assert!(main.is_source());
        assert_eq!(main.depth(), 1);
        assert_eq!(main.dir_segments().collect::<Vec<_>>(), vec!["api"]);

        let env = files.iter().find(|f| f.name == ".env.production").unwrap();
        assert!(env.is_env());
        assert!(env.is_config());
        assert!(!env.is_source());
    }

    #[test]
    fn test_read_prefix_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.txt", &"a".repeat(10_000));
        let text = read_prefix(&dir.path().join("big.txt"), 5000).unwrap();
        assert_eq!(text.len(), 5000);
    }

    #[test]
    fn test_read_missing_file_is_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(&dir.path().join("missing.py")).unwrap_err();
        assert!(matches!(err, AnalysisError::FileAccess { .. }));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_bytes("héllo", 2), "h");
        assert_eq!(truncate_bytes("héllo", 3), "hé");
    }
}
