//! Reverse-proxy configuration checks (nginx)

use crate::models::{Finding, Severity};
use crate::scanner::SourceFile;
use regex::Regex;
use std::sync::OnceLock;

pub const FINDING_TYPE: &str = "Infrastructure Misconfiguration";

static LEGACY_TLS: OnceLock<Option<Regex>> = OnceLock::new();
static GZIP_ON: OnceLock<Option<Regex>> = OnceLock::new();

fn legacy_tls() -> Option<&'static Regex> {
    LEGACY_TLS
        .get_or_init(|| Regex::new(r"ssl_protocols[^;]*\b(SSLv2|SSLv3|TLSv1|TLSv1\.1)(\s|;)").ok())
        .as_ref()
}

fn gzip_on() -> Option<&'static Regex> {
    GZIP_ON
        .get_or_init(|| Regex::new(r"(?m)^\s*gzip\s+on\s*;").ok())
        .as_ref()
}

const NGINX_DIRS: &[&str] = &["nginx", "sites-available", "sites-enabled", "conf.d"];

/// `nginx.conf`, or any `.conf` file living under an nginx-style directory
pub fn applies_to(file: &SourceFile) -> bool {
    if file.ext() != "conf" {
        return false;
    }
    file.name.to_lowercase().contains("nginx")
        || file
            .dir_segments()
            .any(|s| NGINX_DIRS.contains(&s.to_lowercase().as_str()))
}

#[derive(Debug, Default)]
pub struct InfraScan {
    pub findings: Vec<Finding>,
    /// No `gzip on` directive; surfaces as a roadmap suggestion only
    pub compression_missing: bool,
}

pub fn scan_content(file: &str, content: &str) -> InfraScan {
    let mut scan = InfraScan::default();
    let lower = content.to_lowercase();

    if !lower.contains("strict-transport-security") {
        scan.findings.push(Finding::new(
            FINDING_TYPE,
            Severity::Medium,
            "Missing HSTS Header",
            file,
            "No Strict-Transport-Security header is set; clients may be downgraded to plain HTTP.",
        ));
    }
    if !lower.contains("content-security-policy") {
        scan.findings.push(Finding::new(
            FINDING_TYPE,
            Severity::Medium,
            "Missing CSP Header",
            file,
            "No Content-Security-Policy header is set; injected scripts are not restricted.",
        ));
    }
    if legacy_tls().is_some_and(|re| re.is_match(content)) {
        scan.findings.push(Finding::new(
            FINDING_TYPE,
            Severity::High,
            "Legacy TLS Protocol",
            file,
            "ssl_protocols enables SSLv2/SSLv3/TLSv1/TLSv1.1, which are deprecated and insecure.",
        ));
    }
    scan.compression_missing = !gzip_on().is_some_and(|re| re.is_match(content));
    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARDENED: &str = r#"
server {
    listen 443 ssl;
    ssl_protocols TLSv1.2 TLSv1.3;
    gzip on;
    add_header Strict-Transport-Security "max-age=63072000" always;
    add_header Content-Security-Policy "default-src 'self'" always;
}
"#;

    #[test]
    fn test_hardened_config_is_clean() {
        let scan = scan_content("nginx.conf", HARDENED);
        assert!(scan.findings.is_empty());
        assert!(!scan.compression_missing);
    }

    #[test]
    fn test_bare_config() {
        let scan = scan_content(
            "deploy/nginx/site.conf",
            "server {\n    listen 443 ssl;\n    ssl_protocols TLSv1 TLSv1.1 TLSv1.2;\n}\n",
        );
        let labels: Vec<&str> = scan.findings.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Missing HSTS Header", "Missing CSP Header", "Legacy TLS Protocol"]
        );
        assert_eq!(scan.findings[0].severity, Severity::Medium);
        assert_eq!(scan.findings[2].severity, Severity::High);
        assert!(scan.compression_missing);
    }

    #[test]
    fn test_modern_tls_is_not_legacy() {
        let content = "ssl_protocols TLSv1.2 TLSv1.3;";
        assert!(!legacy_tls().unwrap().is_match(content));
        assert!(legacy_tls().unwrap().is_match("ssl_protocols TLSv1.1;"));
    }
}
