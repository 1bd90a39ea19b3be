//! File-level dependency graph
//!
//! Nodes are source files (id = discovery order). Edges come from import
//! statements found in each file's prefix, resolved heuristically by
//! substring containment against the known relative paths.

use crate::models::{DependencyGraph, GraphLink, GraphNode};
use crate::scanner::{truncate_chars, SourceFile, SourceTree};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

pub const MAX_NODES: usize = 50;
pub const MAX_LINKS: usize = 100;
/// Characters of each file scanned for imports
pub const IMPORT_SCAN_CHARS: usize = 10_000;

static IMPORT_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn import_patterns() -> &'static [Regex] {
    IMPORT_PATTERNS.get_or_init(|| {
        [
            // from package.module import name
            r"(?m)^\s*from\s+([\w.]+)\s+import\b",
            // import package.module / import com.acme.Type;
            r"(?m)^\s*import\s+([\w.]+)\s*(?:;|$|\bas\b|,)",
            // require('./module')
            r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#,
            // import x from './module' / import './module' / export * from './module'
            r#"(?m)^\s*(?:import|export)\s+(?:[\w*{}\s,$]+\s+from\s+)?['"]([^'"]+)['"]"#,
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

const STRIPPED_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".go", ".java", ".rs",
];

/// Module tokens named by import statements in `content`, in order
pub fn extract_imports(content: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = import_patterns()
        .iter()
        .flat_map(|re| {
            re.captures_iter(content)
                .filter_map(|c| c.get(1))
                .map(|m| (m.start(), m.as_str().to_string()))
        })
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, token)| token).collect()
}

/// Path-like form of a module token, or `None` if nothing is left
pub fn normalize_import(token: &str) -> Option<String> {
    let mut clean = token.trim();
    loop {
        let next = ["./", "../", "@/", "~/"]
            .iter()
            .find_map(|p| clean.strip_prefix(p));
        match next {
            Some(rest) => clean = rest,
            None => break,
        }
    }
    // Python relative imports (`.models`, `..core.db`)
    clean = clean.trim_start_matches('.');

    for ext in STRIPPED_EXTENSIONS {
        if let Some(stem) = clean.strip_suffix(ext) {
            clean = stem;
            break;
        }
    }

    let normalized = clean.replace('.', "/");
    let normalized = normalized.trim_matches('/');
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GraphBuilder;

impl GraphBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, tree: &SourceTree) -> DependencyGraph {
        let files: Vec<&SourceFile> = tree.source_files().collect();

        let mut links: IndexMap<(usize, usize), u32> = IndexMap::new();
        for (source_id, file) in files.iter().enumerate() {
            let content = match file.read_prefix(IMPORT_SCAN_CHARS * 4) {
                Ok(c) => c,
                Err(e) => {
                    debug!("{}", e);
                    continue;
                }
            };
            let content = truncate_chars(&content, IMPORT_SCAN_CHARS);

            for token in extract_imports(content) {
                let Some(target_id) = resolve(&token, &files) else {
                    continue;
                };
                if target_id == source_id {
                    continue;
                }
                *links.entry((source_id, target_id)).or_insert(0) += 1;
            }
        }

        let nodes: Vec<GraphNode> = files
            .iter()
            .enumerate()
            .take(MAX_NODES)
            .map(|(id, file)| GraphNode {
                id,
                name: file.name.clone(),
                path: file.relative.clone(),
                kind: "module".to_string(),
            })
            .collect();

        let links: Vec<GraphLink> = links
            .into_iter()
            .take(MAX_LINKS)
            .map(|((source, target), weight)| GraphLink {
                source,
                target,
                weight,
            })
            .collect();

        info!(
            "Dependency graph: {} of {} files, {} links",
            nodes.len(),
            files.len(),
            links.len()
        );
        DependencyGraph { nodes, links }
    }
}

/// First file (in discovery order) whose relative path contains the
/// normalized token
fn resolve(token: &str, files: &[&SourceFile]) -> Option<usize> {
    let needle = normalize_import(token)?;
    files.iter().position(|f| f.relative.contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn build(root: &Path) -> DependencyGraph {
        GraphBuilder::new().build(&SourceTree::scan(root))
    }

    #[test]
    fn test_extract_imports() {
        let content = r#"
import os
from app.models import User
const db = require('./db/client');
import { h } from "@/utils/helpers";
import './styles.css';
"#;
        assert_eq!(
            extract_imports(content),
            vec!["os", "app.models", "./db/client", "@/utils/helpers", "./styles.css"]
        );
    }

    #[test]
    fn test_normalize_import() {
        assert_eq!(normalize_import("app.models").as_deref(), Some("app/models"));
        assert_eq!(normalize_import("../../lib/util.js").as_deref(), Some("lib/util"));
        assert_eq!(normalize_import("@/components/Nav").as_deref(), Some("components/Nav"));
        assert_eq!(normalize_import("..core.db").as_deref(), Some("core/db"));
        assert_eq!(normalize_import("./"), None);
    }

    #[test]
    fn test_graph_links_and_weights() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app/main.py", "from app.models import User\nimport app.models\nfrom app.main import x\n");
        write(dir.path(), "app/models.py", "import os\n");

        let graph = build(dir.path());
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].path, "app/main.py");
        assert_eq!(graph.nodes[0].name, "main.py");
        assert_eq!(graph.nodes[0].kind, "module");
        // Two imports of the same target collapse into one weighted link;
        // the self import is dropped
        assert_eq!(
            graph.links,
            vec![GraphLink {
                source: 0,
                target: 1,
                weight: 2
            }]
        );
    }

    #[test]
    fn test_first_match_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/utils.js", "");
        write(dir.path(), "b/utils.js", "");
        write(dir.path(), "c/index.js", "const u = require('./utils');\n");

        let graph = build(dir.path());
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].source, 2);
        assert_eq!(graph.links[0].target, 0);
    }

    #[test]
    fn test_caps_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        // 60 modules, each importing the one after it
        for i in 0..60 {
            write(
                dir.path(),
                &format!("m{:02}.py", i),
                &format!("import m{:02}\n", (i + 1) % 60),
            );
        }

        let graph = build(dir.path());
        assert_eq!(graph.nodes.len(), MAX_NODES);
        assert_eq!(graph.links.len(), 60);
        // Links may reference nodes beyond the node cap
        assert!(graph.links.iter().any(|l| l.source >= MAX_NODES));
    }
}
