//! Structural manifest parsing
//!
//! Extracts dependency names from the package manifests we understand.
//! Anything that fails to parse yields an empty list; the caller then falls
//! back to keyword sniffing over the raw content.

use serde::Deserialize;
use std::collections::HashMap;

/// Manifest kinds recognized by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Manifest {
    PackageJson,
    Requirements,
    PyProject,
    Pipfile,
    CargoToml,
    GoMod,
    ComposerJson,
    Gemfile,
    PomXml,
    Gradle,
}

impl Manifest {
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "package.json" => Some(Manifest::PackageJson),
            "requirements.txt" | "requirements-dev.txt" | "dev-requirements.txt" => {
                Some(Manifest::Requirements)
            }
            "pyproject.toml" => Some(Manifest::PyProject),
            "Pipfile" => Some(Manifest::Pipfile),
            "Cargo.toml" => Some(Manifest::CargoToml),
            "go.mod" => Some(Manifest::GoMod),
            "composer.json" => Some(Manifest::ComposerJson),
            "Gemfile" => Some(Manifest::Gemfile),
            "pom.xml" => Some(Manifest::PomXml),
            "build.gradle" | "build.gradle.kts" => Some(Manifest::Gradle),
            _ => None,
        }
    }

    /// Language/ecosystem implied by the manifest's presence
    pub fn language(&self) -> &'static str {
        match self {
            Manifest::PackageJson => "Node.js/NPM",
            Manifest::Requirements | Manifest::PyProject | Manifest::Pipfile => "Python",
            Manifest::CargoToml => "Rust",
            Manifest::GoMod => "Go",
            Manifest::ComposerJson => "PHP",
            Manifest::Gemfile => "Ruby",
            Manifest::PomXml | Manifest::Gradle => "Java/JVM",
        }
    }

    /// Dependency names declared in `content`, lower-cased
    pub fn dependencies(&self, content: &str) -> Vec<String> {
        let names = match self {
            Manifest::PackageJson => parse_package_json(content),
            Manifest::Requirements => parse_requirements(content),
            Manifest::PyProject => parse_pyproject(content),
            Manifest::Pipfile => parse_pipfile(content),
            Manifest::CargoToml => parse_cargo_toml(content),
            Manifest::GoMod => parse_go_mod(content),
            Manifest::ComposerJson => parse_composer_json(content),
            // No structured parse; keyword sniffing covers these
            Manifest::Gemfile | Manifest::PomXml | Manifest::Gradle => vec![],
        };
        names.into_iter().map(|n| n.to_lowercase()).collect()
    }
}

/// Minimal package.json structure for parsing
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PackageJson {
    dependencies: HashMap<String, serde_json::Value>,
    #[serde(rename = "devDependencies")]
    dev_dependencies: HashMap<String, serde_json::Value>,
}

/// Minimal pyproject.toml structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PyProjectToml {
    project: Option<PyProjectProject>,
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PyProjectProject {
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PyProjectTool {
    poetry: Option<PoetrySection>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PoetrySection {
    dependencies: HashMap<String, toml::Value>,
    #[serde(rename = "dev-dependencies")]
    dev_dependencies: HashMap<String, toml::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Pipfile {
    packages: HashMap<String, toml::Value>,
    #[serde(rename = "dev-packages")]
    dev_packages: HashMap<String, toml::Value>,
}

/// Minimal Cargo.toml structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CargoToml {
    dependencies: HashMap<String, toml::Value>,
    #[serde(rename = "dev-dependencies")]
    dev_dependencies: HashMap<String, toml::Value>,
    workspace: Option<CargoWorkspace>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CargoWorkspace {
    dependencies: HashMap<String, toml::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ComposerJson {
    require: HashMap<String, serde_json::Value>,
    #[serde(rename = "require-dev")]
    require_dev: HashMap<String, serde_json::Value>,
}

fn sorted_keys<V>(maps: &[&HashMap<String, V>]) -> Vec<String> {
    let mut keys: Vec<String> = maps.iter().flat_map(|m| m.keys().cloned()).collect();
    keys.sort();
    keys
}

fn parse_package_json(content: &str) -> Vec<String> {
    serde_json::from_str::<PackageJson>(content)
        .map(|pkg| sorted_keys(&[&pkg.dependencies, &pkg.dev_dependencies]))
        .unwrap_or_default()
}

/// Package name before any version specifier, extras or markers
fn requirement_name(spec: &str) -> &str {
    spec.split(['=', '<', '>', '!', '~', '[', ';', '@', ' '])
        .next()
        .unwrap_or("")
        .trim()
}

fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
        .map(requirement_name)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .collect()
}

fn parse_pyproject(content: &str) -> Vec<String> {
    let Ok(pyproject) = toml::from_str::<PyProjectToml>(content) else {
        return vec![];
    };

    let mut names: Vec<String> = pyproject
        .project
        .map(|p| {
            p.dependencies
                .iter()
                .map(|d| requirement_name(d).to_string())
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if let Some(poetry) = pyproject.tool.and_then(|t| t.poetry) {
        names.extend(
            sorted_keys(&[&poetry.dependencies, &poetry.dev_dependencies])
                .into_iter()
                .filter(|n| n != "python"),
        );
    }
    names
}

fn parse_pipfile(content: &str) -> Vec<String> {
    toml::from_str::<Pipfile>(content)
        .map(|p| sorted_keys(&[&p.packages, &p.dev_packages]))
        .unwrap_or_default()
}

fn parse_cargo_toml(content: &str) -> Vec<String> {
    let Ok(cargo) = toml::from_str::<CargoToml>(content) else {
        return vec![];
    };
    let workspace = cargo.workspace.unwrap_or_default();
    sorted_keys(&[
        &cargo.dependencies,
        &cargo.dev_dependencies,
        &workspace.dependencies,
    ])
}

fn parse_go_mod(content: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_require_block = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("require (") {
            in_require_block = true;
            continue;
        }
        if in_require_block && line.starts_with(')') {
            in_require_block = false;
            continue;
        }
        let module = if in_require_block {
            line.split_whitespace().next()
        } else if let Some(rest) = line.strip_prefix("require ") {
            rest.split_whitespace().next()
        } else {
            None
        };
        if let Some(m) = module.filter(|m| !m.starts_with("//")) {
            names.push(m.to_string());
        }
    }
    names
}

fn parse_composer_json(content: &str) -> Vec<String> {
    serde_json::from_str::<ComposerJson>(content)
        .map(|c| sorted_keys(&[&c.require, &c.require_dev]))
        .unwrap_or_default()
}
