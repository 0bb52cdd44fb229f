// src/probe/mod.rs
// =============================================================================
// This module obtains existence/metadata/content for a single remote URL.
//
// Submodules:
// - http: HEAD-first metadata probe and streaming GET download (reqwest)
// - ftp: per-case FTP session with SIZE/MDTM queries and RETR download
//
// The probe does not decide pass/fail - it reports what the remote looks
// like and leaves the judgement to the verifier. What it MUST do is keep
// failure kinds distinct: "host does not resolve", "timed out", "server said
// 404" and "FTP 550" all need different reason text in the final verdict.
//
// Rust concepts:
// - thiserror: derive Display + Error for a closed error enum
// - pub use: re-export submodule items for a flat probe:: API
// =============================================================================

mod ftp;
mod http;

pub use ftp::FtpProbe;
pub use http::{fetch, http_client, page_text, probe, HttpProbe};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Everything that can go wrong while probing or fetching one URL
///
/// Each variant maps to distinct reason text downstream; none of these are
/// ever collapsed into a generic "request failed".
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Hostname did not resolve
    #[error("could not resolve host for \"{0}\"")]
    Dns(String),

    /// TCP-level failure (refused, unreachable, reset)
    #[error("connection failed: {0}")]
    Connect(String),

    /// The per-operation timeout expired
    #[error("operation timed out")]
    Timeout,

    /// TLS/certificate trouble on an https URL
    #[error("TLS error: {0}")]
    Tls(String),

    /// The redirect limit was exceeded
    #[error("too many redirects")]
    TooManyRedirects,

    /// The server answered with a non-success HTTP status
    #[error("HTTP {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    /// FTP server rejected the login
    #[error("FTP login failed: {0}")]
    FtpLogin(String),

    /// FTP 550: the file does not exist on the server
    #[error("file not found on server: {0}")]
    FtpNotFound(String),

    /// Any other FTP protocol-level failure
    #[error("FTP session error: {0}")]
    FtpSession(String),

    /// Local I/O while writing a download to scratch
    #[error("scratch file error: {0}")]
    Scratch(#[from] std::io::Error),

    /// The URL itself was unusable (no host, bad port, ...)
    #[error("bad URL: {0}")]
    BadUrl(String),

    /// Anything reqwest reports that doesn't fit the buckets above
    #[error("{0}")]
    Other(String),
}

/// A remote file downloaded to scratch for byte-level comparison
///
/// The temp file is deleted when this struct drops, which is exactly the
/// lifetime we want: one verification case, no leftovers.
#[derive(Debug)]
pub struct Download {
    pub file: NamedTempFile,
    pub size: u64,
}

impl Download {
    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }
}
