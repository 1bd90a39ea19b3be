//! Live TLS certificate expiry checks
//!
//! Candidate domains are pulled from URLs in config and env files. Common
//! public hosts are skipped, and at most [`MAX_PROBED_DOMAINS`] unique
//! candidates are probed. A domain that cannot be reached becomes an
//! `unreachable` probe entry and never a finding. A certificate that is
//! already expired still completes the handshake and is reported as
//! expiring with a negative day count.

use crate::config::{SecOpsConfig, MAX_PROBED_DOMAINS};
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{DomainProbe, Finding, ProbeStatus, Severity};
use crate::scanner::SourceFile;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rayon::prelude::*;
use regex::Regex;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::{mpsc, Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const FINDING_TYPE: &str = "SecOps";

/// Hosts never worth probing: registries, CDNs, docs and placeholders
const ALLOWED_DOMAINS: &[&str] = &[
    "localhost",
    "example.com",
    "example.org",
    "example.net",
    "github.com",
    "githubusercontent.com",
    "gitlab.com",
    "bitbucket.org",
    "google.com",
    "googleapis.com",
    "gstatic.com",
    "npmjs.org",
    "npmjs.com",
    "yarnpkg.com",
    "pypi.org",
    "pythonhosted.org",
    "crates.io",
    "rubygems.org",
    "golang.org",
    "go.dev",
    "maven.org",
    "gradle.org",
    "docker.io",
    "docker.com",
    "amazonaws.com",
    "microsoft.com",
    "azure.com",
    "cloudflare.com",
    "jsdelivr.net",
    "unpkg.com",
    "mozilla.org",
    "w3.org",
    "schema.org",
    "json-schema.org",
    "apache.org",
    "readthedocs.io",
    "sentry.io",
    "openai.com",
];

static URL_HOST: OnceLock<Option<Regex>> = OnceLock::new();

fn url_host() -> Option<&'static Regex> {
    URL_HOST
        .get_or_init(|| {
            Regex::new(r"(?i)\bhttps?://([a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+)")
                .ok()
        })
        .as_ref()
}

fn is_allowed(host: &str) -> bool {
    ALLOWED_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Bare IPs and hosts without an alphabetic TLD are not probed
fn is_probeable(host: &str) -> bool {
    host.rsplit('.')
        .next()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

pub fn applies_to(file: &SourceFile) -> bool {
    file.is_config()
}

/// Candidate domains in `content`, lower-cased, in order of appearance
pub fn extract_domains(content: &str) -> Vec<String> {
    let Some(re) = url_host() else {
        return vec![];
    };
    re.captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .filter(|h| is_probeable(h) && !is_allowed(h))
        .collect()
}

/// Source of certificate expiry dates for a domain
pub trait CertificateProbe: Send + Sync {
    fn expiry(&self, domain: &str, timeout: Duration) -> AnalysisResult<DateTime<Utc>>;
}

/// Chain verification that tolerates an out-of-date validity window.
///
/// The full WebPKI check runs first. If it fails, the chain is checked
/// again at the midpoint of the leaf's own validity period; passing then
/// means the clock was the only problem, so the handshake may finish and
/// the expiry date can be read. Untrusted or mismatched chains still fail.
#[derive(Debug)]
struct ExpiryTolerantVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for ExpiryTolerantVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let err = match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(verified) => return Ok(verified),
            Err(e) => e,
        };
        let Some(within_validity) = validity_midpoint(end_entity) else {
            return Err(err);
        };
        debug!("Certificate rejected at current time ({}), rechecking within its validity", err);
        self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            within_validity,
        )
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// A moment halfway between notBefore and notAfter of `cert`
fn validity_midpoint(cert: &CertificateDer<'_>) -> Option<UnixTime> {
    let (_, parsed) = x509_parser::parse_x509_certificate(cert.as_ref()).ok()?;
    let validity = parsed.validity();
    let start = validity.not_before.timestamp();
    let end = validity.not_after.timestamp();
    let mid = start.checked_add(end.checked_sub(start)? / 2)?;
    let secs = u64::try_from(mid).ok()?;
    Some(UnixTime::since_unix_epoch(Duration::from_secs(secs)))
}

/// Resolve `domain:443` within `timeout`.
///
/// The system resolver has no timeout of its own, so the lookup runs on a
/// helper thread that is abandoned once the budget is spent.
fn resolve(domain: &str, timeout: Duration) -> AnalysisResult<SocketAddr> {
    let (tx, rx) = mpsc::channel();
    let host = domain.to_string();
    thread::spawn(move || {
        let addrs = (host.as_str(), 443)
            .to_socket_addrs()
            .map(|found| found.collect::<Vec<_>>());
        let _ = tx.send(addrs);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(addrs)) => addrs
            .into_iter()
            .next()
            .ok_or_else(|| AnalysisError::network(domain, "no address resolved")),
        Ok(Err(e)) => Err(AnalysisError::network(domain, e)),
        Err(_) => Err(AnalysisError::network(domain, "address resolution timed out")),
    }
}

/// Production probe: a real TLS handshake on port 443 verified against the
/// Mozilla root set
pub struct TlsProbe {
    config: Arc<ClientConfig>,
}

impl TlsProbe {
    pub fn new() -> AnalysisResult<Self> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.into(),
        };
        let provider: Arc<CryptoProvider> = Arc::new(rustls::crypto::ring::default_provider());
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .map_err(|e| AnalysisError::network("*", e))?;
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| AnalysisError::network("*", e))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(ExpiryTolerantVerifier { inner }))
            .with_no_client_auth();
        Ok(Self {
            config: Arc::new(config),
        })
    }
}

impl CertificateProbe for TlsProbe {
    /// Resolution, connect and handshake share one `timeout` budget
    fn expiry(&self, domain: &str, timeout: Duration) -> AnalysisResult<DateTime<Utc>> {
        let deadline = Instant::now() + timeout;
        let server_name =
            ServerName::try_from(domain.to_string()).map_err(|e| AnalysisError::network(domain, e))?;

        let addr = resolve(domain, timeout)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AnalysisError::network(domain, "timed out before connecting"));
        }

        let mut sock = TcpStream::connect_timeout(&addr, remaining)
            .map_err(|e| AnalysisError::network(domain, e))?;
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(Duration::from_millis(1));
        sock.set_read_timeout(Some(remaining))
            .and_then(|_| sock.set_write_timeout(Some(remaining)))
            .map_err(|e| AnalysisError::network(domain, e))?;

        let mut conn = ClientConnection::new(Arc::clone(&self.config), server_name)
            .map_err(|e| AnalysisError::network(domain, e))?;
        while conn.is_handshaking() {
            conn.complete_io(&mut sock)
                .map_err(|e| AnalysisError::network(domain, e))?;
        }

        let leaf = conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| AnalysisError::network(domain, "no peer certificate"))?;
        let (_, cert) = x509_parser::parse_x509_certificate(leaf.as_ref())
            .map_err(|e| AnalysisError::network(domain, format!("invalid certificate: {e:?}")))?;

        let not_after = cert.validity().not_after.timestamp();
        DateTime::from_timestamp(not_after, 0)
            .ok_or_else(|| AnalysisError::network(domain, "certificate expiry out of range"))
    }
}

#[derive(Debug, Default)]
pub struct SecOpsScan {
    pub findings: Vec<Finding>,
    pub probes: Vec<DomainProbe>,
}

pub struct SecOpsScanner {
    config: SecOpsConfig,
    probe: Option<Arc<dyn CertificateProbe>>,
}

impl SecOpsScanner {
    pub fn new(config: SecOpsConfig) -> Self {
        let probe: Option<Arc<dyn CertificateProbe>> = if config.enabled {
            match TlsProbe::new() {
                Ok(p) => Some(Arc::new(p)),
                Err(e) => {
                    warn!("TLS client unavailable, domains will not be probed: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self { config, probe }
    }

    pub fn with_probe(config: SecOpsConfig, probe: Arc<dyn CertificateProbe>) -> Self {
        Self {
            config,
            probe: Some(probe),
        }
    }

    /// Unique candidate domains mapped to the first file mentioning them.
    ///
    /// `mentions` yields (relative file, domain) pairs in scan order.
    pub fn candidates<'a>(
        &self,
        mentions: impl IntoIterator<Item = (&'a str, String)>,
    ) -> IndexMap<String, String> {
        let limit = self.config.domain_limit().min(MAX_PROBED_DOMAINS);
        let mut found: IndexMap<String, String> = IndexMap::new();
        for (file, domain) in mentions {
            if found.contains_key(&domain) {
                continue;
            }
            if found.len() >= limit {
                break;
            }
            found.insert(domain, file.to_string());
        }
        found
    }

    pub fn probe(&self, candidates: &IndexMap<String, String>) -> SecOpsScan {
        self.probe_at(candidates, Utc::now())
    }

    fn probe_at(&self, candidates: &IndexMap<String, String>, now: DateTime<Utc>) -> SecOpsScan {
        if !self.config.enabled || candidates.is_empty() {
            if !candidates.is_empty() {
                debug!("SecOps probing disabled; skipping {} domains", candidates.len());
            }
            return SecOpsScan::default();
        }

        let timeout = self.config.timeout();
        let entries: Vec<(&String, &String)> = candidates.iter().collect();
        let results: Vec<(DomainProbe, Option<Finding>)> = entries
            .par_iter()
            .map(|(domain, file)| self.probe_one(domain, file, timeout, now))
            .collect();

        let mut scan = SecOpsScan::default();
        for (probe, finding) in results {
            scan.probes.push(probe);
            scan.findings.extend(finding);
        }
        scan
    }

    fn probe_one(
        &self,
        domain: &str,
        file: &str,
        timeout: Duration,
        now: DateTime<Utc>,
    ) -> (DomainProbe, Option<Finding>) {
        let result = match &self.probe {
            Some(probe) => probe.expiry(domain, timeout),
            None => Err(AnalysisError::network(domain, "TLS client unavailable")),
        };

        let expiry = match result {
            Ok(expiry) => expiry,
            Err(e) => {
                debug!("Domain probe failed: {}", e);
                let probe = DomainProbe {
                    domain: domain.to_string(),
                    status: ProbeStatus::Unreachable,
                    days_remaining: None,
                    detail: e.to_string(),
                };
                return (probe, None);
            }
        };

        let days = (expiry - now).num_days();
        if days < self.config.expiry_warning_days {
            let detail = if days < 0 {
                format!("Certificate expired {} days ago", -days)
            } else {
                format!("Certificate expires in {} days", days)
            };
            let finding = Finding::new(
                FINDING_TYPE,
                Severity::High,
                "Expiring TLS Certificate",
                file,
                format!(
                    "The TLS certificate for {}: {} ({}).",
                    domain,
                    detail.to_lowercase(),
                    expiry.format("%Y-%m-%d")
                ),
            );
            let probe = DomainProbe {
                domain: domain.to_string(),
                status: ProbeStatus::Expiring,
                days_remaining: Some(days),
                detail,
            };
            (probe, Some(finding))
        } else {
            let probe = DomainProbe {
                domain: domain.to_string(),
                status: ProbeStatus::Valid,
                days_remaining: Some(days),
                detail: format!("Certificate valid until {}", expiry.format("%Y-%m-%d")),
            };
            (probe, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    struct FakeProbe {
        now: DateTime<Utc>,
        days: HashMap<&'static str, i64>,
    }

    impl CertificateProbe for FakeProbe {
        fn expiry(&self, domain: &str, _timeout: Duration) -> AnalysisResult<DateTime<Utc>> {
            self.days
                .get(domain)
                .map(|d| self.now + chrono::Duration::days(*d))
                .ok_or_else(|| AnalysisError::network(domain, "connection refused"))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn scanner(days: &[(&'static str, i64)]) -> SecOpsScanner {
        let probe = FakeProbe {
            now: now(),
            days: days.iter().copied().collect(),
        };
        SecOpsScanner::with_probe(SecOpsConfig::default(), Arc::new(probe))
    }

    #[test]
    fn test_extract_domains_skips_allow_list() {
        let content = "API=https://api.acme-corp.io/v1\nDOCS=https://docs.github.com/x\nLOCAL=http://localhost:8000\nIP=http://10.0.0.1/\nCDN=https://cdn.jsdelivr.net/npm/x";
        assert_eq!(extract_domains(content), vec!["api.acme-corp.io"]);
    }

    #[test]
    fn test_candidates_are_unique_and_capped() {
        let s = scanner(&[]);
        let env = "A=https://one.acme.io\nB=https://ONE.acme.io/x\nC=https://two.acme.io";
        let yaml = "x: https://three.acme.io\ny: https://four.acme.io";
        let mentions = extract_domains(env)
            .into_iter()
            .map(|d| (".env", d))
            .chain(
                extract_domains(yaml)
                    .into_iter()
                    .map(|d| ("deploy/values.yaml", d)),
            );

        let found = s.candidates(mentions);
        let domains: Vec<&str> = found.keys().map(String::as_str).collect();
        assert_eq!(domains, vec!["one.acme.io", "two.acme.io", "three.acme.io"]);
        assert_eq!(found["three.acme.io"], "deploy/values.yaml");
    }

    #[test]
    fn test_probe_statuses() {
        let s = scanner(&[("soon.acme.io", 10), ("later.acme.io", 90)]);
        let mut candidates = IndexMap::new();
        candidates.insert("soon.acme.io".to_string(), ".env".to_string());
        candidates.insert("later.acme.io".to_string(), ".env".to_string());
        candidates.insert("down.acme.io".to_string(), "config.yml".to_string());

        let scan = s.probe_at(&candidates, now());
        let statuses: Vec<ProbeStatus> = scan.probes.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![ProbeStatus::Expiring, ProbeStatus::Valid, ProbeStatus::Unreachable]
        );
        assert_eq!(scan.probes[0].days_remaining, Some(10));
        assert_eq!(scan.probes[2].days_remaining, None);

        assert_eq!(scan.findings.len(), 1);
        assert_eq!(scan.findings[0].kind, "SecOps");
        assert_eq!(scan.findings[0].severity, Severity::High);
        assert_eq!(scan.findings[0].file, ".env");
    }

    #[test]
    fn test_expired_certificate_is_flagged() {
        let s = scanner(&[("old.acme.io", -3)]);
        let mut candidates = IndexMap::new();
        candidates.insert("old.acme.io".to_string(), "config/prod.yml".to_string());

        let scan = s.probe_at(&candidates, now());
        assert_eq!(scan.probes[0].status, ProbeStatus::Expiring);
        assert_eq!(scan.probes[0].days_remaining, Some(-3));
        assert_eq!(scan.probes[0].detail, "Certificate expired 3 days ago");

        assert_eq!(scan.findings.len(), 1);
        assert_eq!(scan.findings[0].kind, FINDING_TYPE);
        assert_eq!(scan.findings[0].severity, Severity::High);
        assert_eq!(scan.findings[0].file, "config/prod.yml");
    }

    #[test]
    fn test_resolution_is_bounded_by_timeout() {
        let started = std::time::Instant::now();
        let err = resolve("unresolvable.invalid", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, AnalysisError::Network { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_validity_midpoint_rejects_garbage() {
        let junk = CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x00]);
        assert!(validity_midpoint(&junk).is_none());
    }

    #[test]
    fn test_disabled_probing_does_nothing() {
        let mut config = SecOpsConfig::default();
        config.enabled = false;
        let s = SecOpsScanner::with_probe(
            config,
            Arc::new(FakeProbe {
                now: now(),
                days: HashMap::new(),
            }),
        );
        let mut candidates = IndexMap::new();
        candidates.insert("api.acme.io".to_string(), ".env".to_string());
        let scan = s.probe_at(&candidates, now());
        assert!(scan.probes.is_empty());
        assert!(scan.findings.is_empty());
    }
}
