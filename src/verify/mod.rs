// src/verify/mod.rs
// =============================================================================
// This module runs one verification case and produces one verdict.
//
// Submodules:
// - http: the strategy for http:// and https:// URLs
// - ftp:  the strategy for ftp:// and ftps:// URLs
//
// The flow for one case:
//   scheme dispatch -> transport probe -> size check -> child-link check
//   (HTTP only) -> hash check -> recency check (FTP only)
// Checks run cheapest-first on purpose: a size mismatch already proves the
// files differ, so we never download a large file just to hash it. The
// first failing check fills in the verdict and stops.
//
// Nothing escapes a case as an error: every failure mode - bad scheme,
// unreachable host, missing local file, mismatched hash - comes back as a
// Verdict, so one bad link can never abort a batch.
//
// Rust concepts:
// - Enums with data: Reason carries the specifics of each failure
// - thiserror #[error(...)]: a display template per reason
// - Exhaustive match: adding a Reason variant forces every consumer to care
// =============================================================================

mod ftp;
mod http;

use crate::probe::ProbeError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// One row of input: a URL to verify plus optional comparison criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationCase {
    /// Free-text description, echoed into the verdict
    #[serde(default)]
    pub description: String,
    /// The address to verify (http, https, ftp, ftps)
    #[serde(default)]
    pub url: String,
    /// Optional local path to a known-good copy of the remote file
    #[serde(default)]
    pub orig_file: String,
    /// Optional URL that must appear as an anchor on the page (HTTP only).
    /// 'contains_url' is the legacy column name for this field.
    #[serde(default, alias = "contains_url")]
    pub check_child_url: String,
    /// Optional UTC cutoff: fail if the remote file was modified at or
    /// after this instant (FTP only; comes from the CLI, not the CSV)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_posted_after: Option<NaiveDateTime>,
    /// Free-text comment, passed through untouched
    #[serde(default)]
    pub comment: String,
}

/// Why a case passed or failed - a closed set, one variant per failure kind
///
/// These replace the magic numeric sentinels of older tooling: every
/// variant carries the specifics (which file, which sizes, which host) so
/// the report is actionable without a re-run.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Reason {
    #[error("ok")]
    Ok,

    #[error("URL scheme \"{scheme}\" of \"{url}\" is not supported")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("transport error for \"{url}\": {detail}")]
    TransportError { url: String, detail: String },

    #[error("\"{url}\" returned HTTP {status} {reason}")]
    HttpStatus {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("file not found on server: \"{url}\"")]
    RemoteNotFound { url: String },

    #[error("cannot read local file \"{path}\": {detail}")]
    LocalFileError { path: String, detail: String },

    #[error(
        "remote file size ({remote}) != local file size ({local}): \
         \"{url}\" vs known good file \"{path}\""
    )]
    SizeMismatch {
        url: String,
        path: String,
        remote: u64,
        local: u64,
    },

    #[error("unable to download \"{url}\": {detail}")]
    DownloadError { url: String, detail: String },

    #[error(
        "hash check failed: posted file \"{url}\" and known good file \
         \"{path}\" are not the same"
    )]
    HashMismatch { url: String, path: String },

    #[error("hash check could not run on \"{url}\" vs \"{path}\": {detail}")]
    HashCheckError {
        url: String,
        path: String,
        detail: String,
    },

    #[error("\"{url}\" does not contain a link to \"{child_url}\"")]
    ChildLinkNotFound { url: String, child_url: String },

    #[error("stale file: \"{url}\" was modified {modified}, at or after the cutoff {cutoff}")]
    StaleFile {
        url: String,
        modified: NaiveDateTime,
        cutoff: NaiveDateTime,
    },

    #[error("unexpected error while checking \"{url}\": {detail}")]
    Unexpected { url: String, detail: String },
}

impl Reason {
    /// Short machine-friendly code, used in the condensed failure view
    pub fn code(&self) -> &'static str {
        match self {
            Reason::Ok => "ok",
            Reason::UnsupportedScheme { .. } => "unsupported_scheme",
            Reason::TransportError { .. } => "transport_error",
            Reason::HttpStatus { .. } => "http_status",
            Reason::RemoteNotFound { .. } => "remote_not_found",
            Reason::LocalFileError { .. } => "local_file_error",
            Reason::SizeMismatch { .. } => "size_mismatch",
            Reason::DownloadError { .. } => "download_error",
            Reason::HashMismatch { .. } => "hash_mismatch",
            Reason::HashCheckError { .. } => "hash_check_error",
            Reason::ChildLinkNotFound { .. } => "child_link_not_found",
            Reason::StaleFile { .. } => "stale_file",
            Reason::Unexpected { .. } => "unexpected_error",
        }
    }

    /// Map a probe failure onto a reason, tagged with the URL it hit
    pub fn from_probe(url: &str, error: ProbeError) -> Reason {
        match error {
            ProbeError::HttpStatus { status, reason } => Reason::HttpStatus {
                url: url.to_string(),
                status,
                reason,
            },
            ProbeError::FtpNotFound(_) => Reason::RemoteNotFound {
                url: url.to_string(),
            },
            other => Reason::TransportError {
                url: url.to_string(),
                detail: other.to_string(),
            },
        }
    }
}

/// The structured result of verifying one case
///
/// Built by exactly one strategy, then immutable. Field names line up with
/// the results CSV columns so the report stays stable for spreadsheet
/// consumers.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub success: bool,
    pub reason: Reason,
    /// Extra notes that do not fail the case (e.g. "timestamp not
    /// supported over HTTP")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub description: String,
    pub url: String,
    /// Transport status line for the main URL ("200 OK", "550 ...")
    pub request_status: Option<String>,
    pub child_url: String,
    pub child_url_status: Option<String>,
    pub child_url_reason: String,
    pub child_url_header: Option<String>,
    pub size_on_server: Option<u64>,
    pub downloaded_file_size: Option<u64>,
    pub orig_file_size: Option<u64>,
    pub orig_file_path: String,
    /// FTP MDTM time (UTC); always empty for HTTP
    pub timestamp: Option<NaiveDateTime>,
    /// One-line header summary from the transport
    pub header: Option<String>,
    pub comment: String,
}

impl Verdict {
    /// Start a verdict with the case's fields echoed and everything else
    /// unknown. Strategies fill in the rest.
    pub fn for_case(case: &VerificationCase) -> Verdict {
        Verdict {
            success: false,
            reason: Reason::Ok,
            warning: None,
            description: case.description.trim().to_string(),
            url: case.url.trim().to_string(),
            request_status: None,
            child_url: case.check_child_url.trim().to_string(),
            child_url_status: None,
            child_url_reason: String::new(),
            child_url_header: None,
            size_on_server: None,
            downloaded_file_size: None,
            orig_file_size: None,
            orig_file_path: case.orig_file.trim().to_string(),
            timestamp: None,
            header: None,
            comment: case.comment.clone(),
        }
    }

    /// Finish as a failure with this reason
    pub fn fail(mut self, reason: Reason) -> Verdict {
        log::debug!("case \"{}\" failed: {reason}", self.url);
        self.success = false;
        self.reason = reason;
        self
    }

    /// Finish as a pass
    pub fn pass(mut self) -> Verdict {
        self.success = true;
        self.reason = Reason::Ok;
        self
    }

    /// Attach a non-fatal note
    pub fn with_warning(mut self, note: String) -> Verdict {
        log::debug!("case \"{}\": {note}", self.url);
        match &mut self.warning {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&note);
            }
            None => self.warning = Some(note),
        }
        self
    }

    /// Reason text plus any warnings, as shown in the report's reason cell
    pub fn reason_text(&self) -> String {
        let base = match &self.reason {
            Reason::Ok => String::new(),
            other => other.to_string(),
        };
        match (&self.warning, base.is_empty()) {
            (None, _) => base,
            (Some(w), true) => format!("warning: {w}"),
            (Some(w), false) => format!("{base}; warning: {w}"),
        }
    }
}

/// Knobs a single verification run needs
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Download and hash-compare when orig_file is set
    pub hash_check: bool,
    /// Per network operation timeout
    pub timeout: std::time::Duration,
    /// Directory for scratch downloads (must exist)
    pub scratch_dir: PathBuf,
}

/// Trim and strip trailing slashes, the normalization used everywhere a
/// URL is compared to another URL
pub fn clean_url(unclean: &str) -> String {
    let mut result = unclean.trim();
    while let Some(stripped) = result.strip_suffix('/') {
        result = stripped;
    }
    result.to_string()
}

/// Verify one case end to end. Never fails - every outcome is a Verdict.
pub async fn verify_case(
    client: &reqwest::Client,
    case: &VerificationCase,
    options: &CheckOptions,
) -> Verdict {
    let verdict = Verdict::for_case(case);
    let url_text = verdict.url.clone();

    // Scheme dispatch. An unparseable URL and an unsupported scheme are
    // both input errors: no network call happens for either.
    let parsed = match Url::parse(&url_text) {
        Ok(u) => u,
        Err(e) => {
            return verdict.fail(Reason::UnsupportedScheme {
                url: url_text,
                scheme: format!("<unparseable: {e}>"),
            });
        }
    };

    match parsed.scheme() {
        "http" | "https" => http::check(client, case, options).await,
        "ftp" | "ftps" => ftp::check(parsed, case.clone(), options.clone()).await,
        other => verdict.fail(Reason::UnsupportedScheme {
            url: url_text,
            scheme: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn options() -> CheckOptions {
        CheckOptions {
            hash_check: true,
            timeout: Duration::from_secs(5),
            scratch_dir: std::env::temp_dir(),
        }
    }

    #[test]
    fn test_clean_url_strips_slashes_and_whitespace() {
        assert_eq!(clean_url("  https://example.com/a/ "), "https://example.com/a");
        assert_eq!(clean_url("https://example.com///"), "https://example.com");
        assert_eq!(clean_url(""), "");
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_terminal() {
        let client = reqwest::Client::new();
        let case = VerificationCase {
            url: "gopher://example.com/file.txt".to_string(),
            ..Default::default()
        };
        let verdict = verify_case(&client, &case, &options()).await;
        assert!(!verdict.success);
        assert_eq!(verdict.reason.code(), "unsupported_scheme");
        // no network call was made, so transport fields stay empty
        assert!(verdict.request_status.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_url_is_input_error() {
        let client = reqwest::Client::new();
        let case = VerificationCase {
            url: "not a url at all".to_string(),
            ..Default::default()
        };
        let verdict = verify_case(&client, &case, &options()).await;
        assert!(!verdict.success);
        assert_eq!(verdict.reason.code(), "unsupported_scheme");
    }

    #[test]
    fn test_reason_text_folds_in_warnings() {
        let case = VerificationCase {
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        let verdict = Verdict::for_case(&case)
            .with_warning("timestamp not supported over HTTP".to_string())
            .pass();
        assert!(verdict.success);
        assert_eq!(
            verdict.reason_text(),
            "warning: timestamp not supported over HTTP"
        );
    }

    #[test]
    fn test_reason_display_templates_name_the_specifics() {
        let reason = Reason::SizeMismatch {
            url: "https://example.com/doc.pdf".to_string(),
            path: "/tmp/doc.pdf".to_string(),
            remote: 1024,
            local: 1023,
        };
        let text = reason.to_string();
        assert!(text.contains("1024"));
        assert!(text.contains("1023"));
        assert!(text.contains("doc.pdf"));
        assert_eq!(reason.code(), "size_mismatch");
    }

    #[test]
    fn test_verdict_echoes_case_fields_trimmed() {
        let case = VerificationCase {
            description: " OASIS page ".to_string(),
            url: " https://example.com/x ".to_string(),
            orig_file: " /tmp/x.pdf ".to_string(),
            check_child_url: " https://other.org/ ".to_string(),
            comment: "keep as-is".to_string(),
            ..Default::default()
        };
        let v = Verdict::for_case(&case);
        assert_eq!(v.description, "OASIS page");
        assert_eq!(v.url, "https://example.com/x");
        assert_eq!(v.orig_file_path, "/tmp/x.pdf");
        assert_eq!(v.child_url, "https://other.org/");
        assert_eq!(v.comment, "keep as-is");
    }
}
