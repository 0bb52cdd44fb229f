// src/verify/ftp.rs
// =============================================================================
// The FTP/FTPS verification strategy.
//
// Check order for one case (cheapest first, first failure is terminal):
// 1. Session: connect + login; MDTM is queried up front while the control
//    channel is fresh, so the verdict always carries the timestamp
// 2. Size: local known-good file vs SIZE (or the measured size of a RETR
//    download when the server refuses SIZE)
// 3. Hash: download (if not already) and compare sha256 digests
// 4. Recency: fail if the remote file was modified at or after the cutoff
//
// Child-link checks only make sense on HTML pages, so check_child_url on an
// FTP case produces a warning, not a failure.
//
// suppaftp is blocking, so the whole strategy runs inside spawn_blocking;
// the async wrapper below is the only thing the dispatcher sees.
// =============================================================================

use super::{CheckOptions, Reason, Verdict, VerificationCase};
use crate::compare;
use crate::probe::{Download, FtpProbe};
use chrono::NaiveDateTime;
use std::fs;
use std::path::Path;
use url::Url;

/// Async wrapper: hop onto the blocking pool for the whole case
pub async fn check(url: Url, case: VerificationCase, options: CheckOptions) -> Verdict {
    let fallback = Verdict::for_case(&case);
    let url_text = fallback.url.clone();
    match tokio::task::spawn_blocking(move || check_blocking(url, case, options)).await {
        Ok(verdict) => verdict,
        // The blocking task panicked or was cancelled; still a verdict
        Err(e) => fallback.fail(Reason::Unexpected {
            url: url_text,
            detail: e.to_string(),
        }),
    }
}

fn check_blocking(url: Url, case: VerificationCase, options: CheckOptions) -> Verdict {
    let verdict = Verdict::for_case(&case);
    let url_text = verdict.url.clone();

    // --- 1. session ---------------------------------------------------------
    let mut probe = match FtpProbe::open(&url, options.timeout) {
        Ok(p) => p,
        Err(e) => return verdict.fail(Reason::from_probe(&url_text, e)),
    };

    // One session per case: whatever happens below, say QUIT on the way out
    let verdict = run_checks(&mut probe, verdict, &case, &options);
    probe.close();
    verdict
}

fn run_checks(
    probe: &mut FtpProbe,
    mut verdict: Verdict,
    case: &VerificationCase,
    options: &CheckOptions,
) -> Verdict {
    let url = verdict.url.clone();
    verdict.request_status = Some("logged in".to_string());

    // Grab the modification time while we're here; the recency comparison
    // itself waits until the cheaper checks have passed
    match probe.modified() {
        Ok(modified) => verdict.timestamp = modified,
        Err(e) => {
            if case.not_posted_after.is_some() {
                return verdict.fail(Reason::from_probe(&url, e));
            }
            // Nobody asked for the timestamp, so a missing MDTM is not fatal
            log::debug!("MDTM unavailable for {url}: {e}");
        }
    }

    let mut download: Option<Download> = None;

    // --- 2. size check ------------------------------------------------------
    let orig_path = verdict.orig_file_path.clone();
    if !orig_path.is_empty() {
        let local_size = match fs::metadata(&orig_path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return verdict.fail(Reason::LocalFileError {
                    path: orig_path,
                    detail: e.to_string(),
                });
            }
        };
        verdict.orig_file_size = Some(local_size);

        let remote_size = match probe.size() {
            Ok(Some(n)) => {
                verdict.size_on_server = Some(n);
                n
            }
            Ok(None) => {
                // Server refused SIZE: download and measure instead
                match probe.download(&options.scratch_dir) {
                    Ok(d) => {
                        verdict.downloaded_file_size = Some(d.size);
                        let n = d.size;
                        download = Some(d);
                        n
                    }
                    Err(e) => {
                        return verdict.fail(Reason::from_probe(&url, e));
                    }
                }
            }
            Err(e) => return verdict.fail(Reason::from_probe(&url, e)),
        };

        if !compare::sizes_match(remote_size, local_size) {
            return verdict.fail(Reason::SizeMismatch {
                url,
                path: orig_path,
                remote: remote_size,
                local: local_size,
            });
        }
    }

    // --- 3. hash check ------------------------------------------------------
    let orig_path = verdict.orig_file_path.clone();
    if options.hash_check && !orig_path.is_empty() {
        let download = match download {
            Some(d) => d,
            None => match probe.download(&options.scratch_dir) {
                Ok(d) => {
                    verdict.downloaded_file_size = Some(d.size);
                    d
                }
                Err(e) => {
                    return verdict.fail(Reason::DownloadError {
                        url,
                        detail: e.to_string(),
                    });
                }
            },
        };

        let orig = orig_path;
        match compare::hashes_match(download.path(), Path::new(&orig), Default::default()) {
            Ok(true) => {}
            Ok(false) => return verdict.fail(Reason::HashMismatch { url, path: orig }),
            Err(e) => {
                return verdict.fail(Reason::HashCheckError {
                    url,
                    path: orig,
                    detail: e.to_string(),
                });
            }
        }
    }

    // --- 4. recency check ---------------------------------------------------
    if let Some(cutoff) = case.not_posted_after {
        match verdict.timestamp {
            Some(modified) if is_stale(modified, cutoff) => {
                return verdict.fail(Reason::StaleFile {
                    url,
                    modified,
                    cutoff,
                });
            }
            Some(_) => {}
            None => {
                return verdict.fail(Reason::TransportError {
                    url,
                    detail: "server did not return a modification time (MDTM)".to_string(),
                });
            }
        }
    }

    // --- child links are an HTTP-only concept --------------------------------
    if !verdict.child_url.is_empty() {
        verdict = verdict.with_warning(format!(
            "\"{url}\" is FTP; the child-link check is ignored"
        ));
    }

    verdict.pass()
}

/// A file modified at or after the cutoff has been re-posted too recently
fn is_stale(modified: NaiveDateTime, cutoff: NaiveDateTime) -> bool {
    modified >= cutoff
}
