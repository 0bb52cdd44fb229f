// src/probe/http.rs
// =============================================================================
// The HTTP/HTTPS variant of the resource probe.
//
// Key functionality:
// - probe(): HEAD request for status + content-length (no body download).
//   Servers that reject HEAD (405/501) get a GET retry, headers only.
// - fetch(): full GET streamed chunk-by-chunk into a scratch file, so a
//   50 MB PDF never sits in memory.
// - page_text(): full GET as text, for the child-link anchor check.
//
// We deliberately do NOT trust Last-Modified on HTTP responses, so this
// transport never reports a modification time.
//
// Rust concepts:
// - async/await: network I/O without blocking the runtime
// - Streams: response.bytes_stream() yields chunks as they arrive
// =============================================================================

use super::{Download, ProbeError};
use futures::StreamExt; // gives us .next() on the byte stream
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

/// What a metadata probe learned about an HTTP resource
#[derive(Debug, Clone)]
pub struct HttpProbe {
    /// Final status code, after redirects
    pub status: u16,
    /// Canonical reason phrase ("OK", "Not Found", ...)
    pub reason: String,
    /// Content-Length header, when the server sends one
    pub content_length: Option<u64>,
    /// Content-Type header, kept for the report's header column
    pub content_type: Option<String>,
}

impl HttpProbe {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// One-line header summary for the report
    pub fn header_summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ct) = &self.content_type {
            parts.push(format!("content-type: {ct}"));
        }
        if let Some(len) = self.content_length {
            parts.push(format!("content-length: {len}"));
        }
        parts.join("; ")
    }
}

/// Build the shared HTTP client
///
/// One client for the whole run: reqwest pools connections internally and
/// is cheap to clone (it's reference-counted).
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(concat!("linkcheck/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Metadata-only probe: HEAD first, GET fallback
pub async fn probe(client: &Client, url: &str) -> Result<HttpProbe, ProbeError> {
    let response = match client.head(url).send().await {
        Ok(r) => {
            // Some servers refuse HEAD outright; retry those with GET.
            // The body is dropped unread, so this stays cheap.
            if matches!(
                r.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) {
                log::debug!("HEAD rejected ({}) for {url}, retrying with GET", r.status());
                client.get(url).send().await.map_err(categorize)?
            } else {
                r
            }
        }
        Err(e) => {
            log::debug!("HEAD failed for {url} ({e}), retrying with GET");
            client.get(url).send().await.map_err(categorize)?
        }
    };
    Ok(summarize(&response))
}

/// Download the resource to a scratch file, streaming
pub async fn fetch(client: &Client, url: &str, scratch_dir: &Path) -> Result<Download, ProbeError> {
    let response = client.get(url).send().await.map_err(categorize)?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProbeError::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    let mut file = NamedTempFile::new_in(scratch_dir)?;
    let mut size: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(categorize)?;
        file.write_all(&chunk)?;
        size += chunk.len() as u64;
    }
    file.flush()?;
    log::debug!("downloaded {size} bytes from {url}");
    Ok(Download { file, size })
}

/// Fetch the page body as text, plus the probe summary of the response
///
/// Used only for the child-link check, where we need the HTML itself.
pub async fn page_text(client: &Client, url: &str) -> Result<(HttpProbe, String), ProbeError> {
    let response = client.get(url).send().await.map_err(categorize)?;
    let summary = summarize(&response);
    if !(200..300).contains(&summary.status) {
        return Err(ProbeError::HttpStatus {
            status: summary.status,
            reason: summary.reason.clone(),
        });
    }
    let text = response.text().await.map_err(categorize)?;
    Ok((summary, text))
}

// Pull the fields we care about out of a response's status line and headers
fn summarize(response: &reqwest::Response) -> HttpProbe {
    let status = response.status();
    HttpProbe {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("").to_string(),
        content_length: response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok()),
        content_type: response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

// Sort a reqwest error into our closed ProbeError taxonomy
//
// reqwest reports everything as one opaque error type; we sniff it apart so
// the verdict can say "timed out" vs "DNS" vs "certificate" specifically.
fn categorize(error: reqwest::Error) -> ProbeError {
    let error_string = error.to_string();

    if error.is_timeout() {
        ProbeError::Timeout
    } else if error.is_redirect() {
        ProbeError::TooManyRedirects
    } else if error.is_connect() {
        if error_string.contains("dns") {
            ProbeError::Dns(error_string)
        } else {
            ProbeError::Connect(error_string)
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        ProbeError::Tls(error_string)
    } else {
        ProbeError::Other(error_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_summary_formats_both_fields() {
        let p = HttpProbe {
            status: 200,
            reason: "OK".to_string(),
            content_length: Some(1024),
            content_type: Some("application/pdf".to_string()),
        };
        assert_eq!(
            p.header_summary(),
            "content-type: application/pdf; content-length: 1024"
        );
    }

    #[test]
    fn test_header_summary_empty_when_no_headers() {
        let p = HttpProbe {
            status: 204,
            reason: "No Content".to_string(),
            content_length: None,
            content_type: None,
        };
        assert_eq!(p.header_summary(), "");
    }

    #[test]
    fn test_is_success_bounds() {
        let mut p = HttpProbe {
            status: 200,
            reason: String::new(),
            content_length: None,
            content_type: None,
        };
        assert!(p.is_success());
        p.status = 299;
        assert!(p.is_success());
        p.status = 301;
        assert!(!p.is_success());
        p.status = 404;
        assert!(!p.is_success());
    }
}
