// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Hyperpolymath

//! URL validation for submission attestation links
//!
//! Validation is a two-step boundary check:
//! 1. Format: optional `http`/`https` scheme, a dot-separated domain
//!    ending in a >=2 character top-level label, optional URL-safe path.
//!    Checked first so malformed input never costs a network request.
//! 2. Reachability: a single HEAD request with redirects followed and a
//!    10 second timeout. Only status 200 counts as reachable; anything
//!    else, including transport failures, is invalid. No retries.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Timeout for the reachability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

static URL_FORMAT: OnceLock<Regex> = OnceLock::new();

fn url_format() -> &'static Regex {
    URL_FORMAT.get_or_init(|| {
        Regex::new(r"^(https?://)?([A-Za-z0-9_-]+\.)+[A-Za-z]{2,}(/[-A-Za-z0-9@:%_+.~#?&/=]*)?$")
            .expect("URL format pattern is valid")
    })
}

/// Which required link is being validated. Only used to tag diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Model,
    PdfReport,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Model => write!(f, "Model Link"),
            LinkKind::PdfReport => write!(f, "PDF Report"),
        }
    }
}

/// Result of validating a single URL. Consumed immediately, never cached.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub diagnostic: Option<String>,
}

impl ValidationOutcome {
    fn ok() -> Self {
        Self {
            valid: true,
            diagnostic: None,
        }
    }

    fn invalid(diagnostic: String) -> Self {
        Self {
            valid: false,
            diagnostic: Some(diagnostic),
        }
    }

    /// 0/1 flag as reported in the result payload.
    pub fn as_flag(&self) -> u8 {
        u8::from(self.valid)
    }
}

/// Reachability probe seam. Tests substitute deterministic fakes; the
/// pipeline uses [`HttpProber`].
pub trait Prober: Send + Sync {
    /// Issue a single HEAD request. `Ok(status)` for any HTTP response,
    /// `Err(detail)` for transport-level failures (timeout, DNS,
    /// connection refused, TLS).
    fn head(&self, url: &str) -> Result<u16, String>;
}

/// Blocking HEAD probe over the real network.
#[derive(Debug, Default)]
pub struct HttpProber;

impl Prober for HttpProber {
    fn head(&self, url: &str) -> Result<u16, String> {
        // Redirects are followed by the client's default policy.
        let client = reqwest::blocking::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|err| err.to_string())?;
        let response = client.head(url).send().map_err(|err| err.to_string())?;
        Ok(response.status().as_u16())
    }
}

/// Validate one URL: format first, then a single reachability probe.
pub fn validate_url(prober: &dyn Prober, url: &str, kind: LinkKind) -> ValidationOutcome {
    if !url_format().is_match(url) {
        tracing::warn!("Invalid {} URL format: {}", kind, url);
        return ValidationOutcome::invalid(format!("invalid {kind} URL format: {url}"));
    }

    match prober.head(url) {
        Ok(200) => ValidationOutcome::ok(),
        Ok(status) => {
            tracing::warn!("{} URL not reachable (status code {}): {}", kind, status, url);
            ValidationOutcome::invalid(format!(
                "{kind} URL not reachable (status code {status}): {url}"
            ))
        }
        Err(detail) => {
            tracing::warn!("Error probing {} URL {}: {}", kind, url, detail);
            ValidationOutcome::invalid(format!("error probing {kind} URL {url}: {detail}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProber {
        response: Result<u16, String>,
        calls: AtomicUsize,
    }

    impl ScriptedProber {
        fn returning(response: Result<u16, String>) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Prober for ScriptedProber {
        fn head(&self, _url: &str) -> Result<u16, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    #[test]
    fn test_format_accepts_common_shapes() {
        assert!(url_format().is_match("https://example.com"));
        assert!(url_format().is_match("http://sub.example.org/path/to/file.pdf"));
        assert!(url_format().is_match("example.com/model"));
        assert!(url_format().is_match("huggingface.co/acme/model?rev=main"));
    }

    #[test]
    fn test_format_rejects_bad_shapes() {
        assert!(!url_format().is_match("ftp://example.com/model"));
        assert!(!url_format().is_match(""));
        assert!(!url_format().is_match("not a url"));
        assert!(!url_format().is_match("https://nodots"));
    }

    #[test]
    fn test_malformed_url_never_probed() {
        let prober = ScriptedProber::returning(Ok(200));
        let outcome = validate_url(&prober, "ftp://example.com/model", LinkKind::Model);

        assert!(!outcome.valid);
        assert_eq!(prober.call_count(), 0);
        let diagnostic = outcome.diagnostic.expect("format failures carry a diagnostic");
        assert!(diagnostic.contains("format"));
    }

    #[test]
    fn test_status_200_is_valid() {
        let prober = ScriptedProber::returning(Ok(200));
        let outcome = validate_url(&prober, "https://example.com/report.pdf", LinkKind::PdfReport);

        assert!(outcome.valid);
        assert!(outcome.diagnostic.is_none());
        assert_eq!(prober.call_count(), 1);
    }

    #[test]
    fn test_status_404_is_invalid_with_diagnostic() {
        let prober = ScriptedProber::returning(Ok(404));
        let outcome = validate_url(&prober, "https://example.com/report.pdf", LinkKind::PdfReport);

        assert!(!outcome.valid);
        let diagnostic = outcome.diagnostic.expect("probe failures carry a diagnostic");
        assert!(diagnostic.contains("404"));
        assert!(diagnostic.contains("PDF Report"));
    }

    #[test]
    fn test_transport_failure_is_invalid() {
        let prober = ScriptedProber::returning(Err("connection refused".to_string()));
        let outcome = validate_url(&prober, "https://example.com", LinkKind::Model);

        assert!(!outcome.valid);
        let diagnostic = outcome.diagnostic.expect("transport failures carry a diagnostic");
        assert!(diagnostic.contains("connection refused"));
    }
}
