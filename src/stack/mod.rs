//! Technology stack detection
//!
//! Detection runs in three passes over the shared file listing:
//! 1. Manifests are parsed structurally and their dependency names matched
//!    against the keyword table
//! 2. Source files and unparsed manifests are sniffed over a bounded prefix
//! 3. File names and paths set the standards flags and testing summary

mod keywords;
mod manifests;

pub use keywords::{language_for_extension, Technology, TECHNOLOGIES};
pub use manifests::Manifest;

use crate::models::{StackCategory, StackProfile, Standards};
use crate::scanner::{SourceFile, SourceTree};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Bytes of content inspected when sniffing a file for keywords
pub const SNIFF_BYTES: usize = 5000;

#[derive(Debug, Default, Clone, Copy)]
pub struct StackDetector;

impl StackDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, tree: &SourceTree) -> StackProfile {
        let mut profile = StackProfile::default();

        for file in tree.files() {
            self.detect_file(file, &mut profile);
        }

        add_standards_technologies(&mut profile);

        profile.stack = profile
            .categories
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        info!(
            "Detected {} technologies (testing: {})",
            profile.stack.len(),
            profile.testing.detected
        );
        profile
    }

    fn detect_file(&self, file: &SourceFile, profile: &mut StackProfile) {
        if let Some(lang) = language_for_extension(file.ext()) {
            insert(profile, StackCategory::Languages, lang);
        }
        if matches!(file.ext(), "tsx" | "jsx") {
            insert(profile, StackCategory::Frontend, "React");
        }

        update_standards(&mut profile.standards, file);
        detect_testing(file, profile);

        let manifest = Manifest::from_file_name(&file.name);
        if let Some(manifest) = manifest {
            insert(profile, StackCategory::Languages, manifest.language());
        }

        let sniff = manifest.is_some() || file.is_source() || is_compose_file(&file.name);
        if !sniff {
            return;
        }

        let content = match file.read_prefix(SNIFF_BYTES) {
            Ok(c) => c,
            Err(e) => {
                debug!("Skipping {} for stack detection: {}", file.relative, e);
                return;
            }
        };

        let deps = manifest
            .map(|m| m.dependencies(&content))
            .unwrap_or_default();

        if deps.is_empty() {
            let lowered = content.to_lowercase();
            for tech in keywords::matches(&lowered) {
                insert(profile, tech.category, tech.name);
            }
        } else {
            for dep in &deps {
                for tech in keywords::matches(dep) {
                    insert(profile, tech.category, tech.name);
                }
            }
        }
    }
}

fn insert(profile: &mut StackProfile, category: StackCategory, name: &str) {
    profile
        .categories
        .entry(category)
        .or_default()
        .insert(name.to_string());
}

fn is_compose_file(name: &str) -> bool {
    matches!(
        name,
        "docker-compose.yml" | "docker-compose.yaml" | "compose.yml" | "compose.yaml"
    )
}

fn is_docker_file(name: &str) -> bool {
    name == "Dockerfile"
        || name.starts_with("Dockerfile.")
        || name.ends_with(".dockerfile")
        || is_compose_file(name)
}

fn is_ci_file(file: &SourceFile) -> bool {
    let in_ci_dir = file
        .dir_segments()
        .any(|s| s == ".github" || s == ".circleci");
    in_ci_dir
        || matches!(
            file.name.as_str(),
            ".gitlab-ci.yml"
                | "Jenkinsfile"
                | "azure-pipelines.yml"
                | ".travis.yml"
                | "bitbucket-pipelines.yml"
        )
}

fn is_kubernetes_file(file: &SourceFile) -> bool {
    let in_k8s_dir = file
        .dir_segments()
        .any(|s| matches!(s, "k8s" | "kubernetes" | "helm"));
    in_k8s_dir
        || matches!(
            file.name.as_str(),
            "deployment.yaml"
                | "deployment.yml"
                | "k8s.yaml"
                | "k8s.yml"
                | "kustomization.yaml"
                | "kustomization.yml"
                | "Chart.yaml"
        )
}

fn is_openapi_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    (lower.starts_with("openapi") || lower.starts_with("swagger"))
        && matches!(
            lower.rsplit('.').next(),
            Some("yaml" | "yml" | "json")
        )
}

fn is_lint_config(name: &str) -> bool {
    name.starts_with(".eslintrc")
        || name.starts_with("eslint.config.")
        || name.starts_with(".prettierrc")
        || name.starts_with("prettier.config.")
        || name.starts_with(".stylelintrc")
        || matches!(
            name,
            ".flake8"
                | "ruff.toml"
                | ".ruff.toml"
                | ".pylintrc"
                | ".rubocop.yml"
                | ".golangci.yml"
                | ".golangci.yaml"
                | "rustfmt.toml"
                | ".rustfmt.toml"
                | "clippy.toml"
                | "biome.json"
        )
}

fn update_standards(standards: &mut Standards, file: &SourceFile) {
    let name = file.name.as_str();
    standards.has_readme |= name.to_lowercase().starts_with("readme");
    standards.has_gitignore |= name == ".gitignore";
    standards.has_docker |= is_docker_file(name);
    standards.has_ci |= is_ci_file(file);
    standards.has_terraform |= file.ext() == "tf";
    standards.has_kubernetes |= is_kubernetes_file(file);
    standards.has_openapi |= is_openapi_file(name);
    standards.has_linting |= is_lint_config(name);
}

fn is_test_file(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("test")
        || lower.ends_with("_test.go")
        || lower.ends_with(".spec.ts")
        || lower.ends_with(".spec.tsx")
        || lower.ends_with(".spec.js")
        || lower.ends_with("_spec.rb")
}

fn detect_testing(file: &SourceFile, profile: &mut StackProfile) {
    if !is_test_file(&file.name) {
        return;
    }
    profile.testing.detected = true;

    let framework = match file.ext() {
        "py" => Some("pytest"),
        "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" => Some("jest/vitest/playwright"),
        "go" => Some("go test"),
        "rs" => Some("cargo test"),
        "rb" if file.name.ends_with("_spec.rb") => Some("RSpec"),
        "java" | "kt" | "php" | "rb" => content_framework(file),
        _ => None,
    };

    if let Some(framework) = framework {
        profile.testing.frameworks.insert(framework.to_string());
    }
}

/// Frameworks only recognizable from the test file's imports
fn content_framework(file: &SourceFile) -> Option<&'static str> {
    let content = file.read_prefix(SNIFF_BYTES).ok()?;
    if content.contains("org.junit") || content.contains("JUnit") {
        Some("JUnit")
    } else if content.contains("PHPUnit") {
        Some("PHPUnit")
    } else if content.contains("RSpec") {
        Some("RSpec")
    } else {
        None
    }
}

fn add_standards_technologies(profile: &mut StackProfile) {
    let standards = profile.standards;
    if standards.has_docker {
        insert(profile, StackCategory::Infrastructure, "Docker");
    }
    if standards.has_terraform {
        insert(profile, StackCategory::Infrastructure, "Terraform");
    }
    if standards.has_kubernetes {
        insert(profile, StackCategory::Infrastructure, "Kubernetes");
    }
    if standards.has_openapi {
        insert(profile, StackCategory::Tools, "OpenAPI");
    }
}
