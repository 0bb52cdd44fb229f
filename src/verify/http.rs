// src/verify/http.rs
// =============================================================================
// The HTTP/HTTPS verification strategy.
//
// Check order for one case (cheapest first, first failure is terminal):
// 1. Reachability: HEAD-first probe; a non-success status fails the case
// 2. Size: local known-good file vs content-length (or the measured size
//    of a download when the server sends no content-length)
// 3. Child link: fetch the page, parse anchors, look for the required URL
// 4. Hash: download (if not already) and compare sha256 digests
//
// Recency thresholds are refused politely: HTTP servers don't give us a
// trustworthy modified time, so not_posted_after only produces a warning.
// =============================================================================

use super::{clean_url, CheckOptions, Reason, Verdict, VerificationCase};
use crate::compare;
use crate::probe::{self, Download};
use reqwest::Client;
use scraper::{Html, Selector};
use std::fs;
use std::path::Path;
use url::Url;

pub async fn check(client: &Client, case: &VerificationCase, options: &CheckOptions) -> Verdict {
    let mut verdict = Verdict::for_case(case);
    let url = verdict.url.clone();

    // --- 1. transport probe -------------------------------------------------
    let head = match probe::probe(client, &url).await {
        Ok(p) => p,
        Err(e) => return verdict.fail(Reason::from_probe(&url, e)),
    };
    verdict.request_status = Some(format!("{} {}", head.status, head.reason));
    verdict.header = Some(head.header_summary());
    if !head.is_success() {
        return verdict.fail(Reason::HttpStatus {
            url,
            status: head.status,
            reason: head.reason,
        });
    }

    // Downloaded at most once, shared by the size fallback and the hash check
    let mut download: Option<Download> = None;

    // --- 2. size check ------------------------------------------------------
    if !verdict.orig_file_path.is_empty() {
        let local_size = match fs::metadata(&verdict.orig_file_path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                return verdict.fail(Reason::LocalFileError {
                    path: case.orig_file.trim().to_string(),
                    detail: e.to_string(),
                });
            }
        };
        verdict.orig_file_size = Some(local_size);

        let remote_size = match head.content_length {
            Some(n) => {
                verdict.size_on_server = Some(n);
                n
            }
            None => {
                // No content-length header (chunked responses, some CDNs):
                // download now and measure what actually arrived
                match probe::fetch(client, &url, &options.scratch_dir).await {
                    Ok(d) => {
                        verdict.downloaded_file_size = Some(d.size);
                        let n = d.size;
                        download = Some(d);
                        n
                    }
                    Err(e) => {
                        return verdict.fail(Reason::DownloadError {
                            url,
                            detail: e.to_string(),
                        });
                    }
                }
            }
        };

        if !compare::sizes_match(remote_size, local_size) {
            // Terminal: unequal sizes prove unequal content, no hashing needed
            return verdict.fail(Reason::SizeMismatch {
                url,
                path: case.orig_file.trim().to_string(),
                remote: remote_size,
                local: local_size,
            });
        }
    }

    // --- 3. child-link check ------------------------------------------------
    if !verdict.child_url.is_empty() {
        match probe::page_text(client, &url).await {
            Ok((summary, html)) => {
                verdict.child_url_status = Some(format!("{} {}", summary.status, summary.reason));
                verdict.child_url_header = Some(summary.header_summary());
                if !contains_child_url(&html, &url, &verdict.child_url) {
                    let child_url = verdict.child_url.clone();
                    verdict.child_url_reason = format!("no anchor matching \"{child_url}\"");
                    return verdict.fail(Reason::ChildLinkNotFound { url, child_url });
                }
                verdict.child_url_reason = "found".to_string();
            }
            Err(e) => {
                verdict.child_url_reason = e.to_string();
                return verdict.fail(Reason::from_probe(&url, e));
            }
        }
    }

    // --- 4. hash check ------------------------------------------------------
    if options.hash_check && !verdict.orig_file_path.is_empty() {
        let download = match download {
            Some(d) => d,
            None => match probe::fetch(client, &url, &options.scratch_dir).await {
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

        let orig = verdict.orig_file_path.clone();
        match compare::hashes_match(download.path(), Path::new(&orig), Default::default()) {
            Ok(true) => {}
            Ok(false) => return verdict.fail(Reason::HashMismatch { url, path: orig }),
            Err(e) => {
                // Unreadable is not the same as unequal; report it as such
                return verdict.fail(Reason::HashCheckError {
                    url,
                    path: orig,
                    detail: e.to_string(),
                });
            }
        }
        // the scratch download is dropped (and deleted) here
    }

    // --- recency is an FTP-only concept -------------------------------------
    if case.not_posted_after.is_some() {
        verdict = verdict.with_warning(format!(
            "\"{url}\" is HTTP; file timestamps are not supported, cutoff ignored"
        ));
    }

    verdict.pass()
}

/// Does the page contain an anchor pointing at `child_url`?
///
/// Anchors are resolved against the page URL first (so relative hrefs
/// count), then both sides are normalized (trimmed, trailing slashes
/// stripped) and compared by equality or suffix. Suffix matching is what
/// lets "/reports/atc.pdf" find "https://cdn.example.com/reports/atc.pdf".
pub fn contains_child_url(html: &str, page_url: &str, child_url: &str) -> bool {
    let wanted = clean_url(child_url);
    if wanted.is_empty() {
        return false;
    }
    extract_anchors(html, page_url).iter().any(|anchor| {
        let anchor = clean_url(anchor);
        anchor == wanted || anchor.ends_with(&wanted)
    })
}

// All <a href> targets on the page, resolved to absolute URLs where the
// page URL allows it. Unresolvable hrefs are kept verbatim rather than
// dropped - a literal match is still a match.
fn extract_anchors(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    // constant selector, known valid
    let selector = Selector::parse("a[href]").unwrap();
    let base = Url::parse(page_url).ok();

    let mut anchors = Vec::new();
    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            let href = href.trim();
            if href.is_empty() {
                continue;
            }
            let resolved = match (&base, Url::parse(href)) {
                (_, Ok(u)) => u.to_string(),
                (Some(b), Err(_)) => match b.join(href) {
                    Ok(u) => u.to_string(),
                    Err(_) => href.to_string(),
                },
                (None, Err(_)) => href.to_string(),
            };
            anchors.push(resolved);
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://example.com/reports/index.html";

    #[test]
    fn test_absolute_anchor_is_found() {
        let html = r#"<a href="http://other.org/">elsewhere</a>"#;
        assert!(contains_child_url(html, PAGE, "http://other.org/"));
    }

    #[test]
    fn test_missing_anchor_is_not_found() {
        let html = r#"<a href="http://somewhere.else/">elsewhere</a>"#;
        assert!(!contains_child_url(html, PAGE, "http://other.org/"));
    }

    #[test]
    fn test_relative_anchor_resolves_against_page() {
        let html = r#"<a href="atc.pdf">ATC</a>"#;
        assert!(contains_child_url(
            html,
            PAGE,
            "https://example.com/reports/atc.pdf"
        ));
    }

    #[test]
    fn test_trailing_slash_and_whitespace_normalized() {
        let html = r#"<a href="https://other.org">elsewhere</a>"#;
        assert!(contains_child_url(html, PAGE, " https://other.org/ "));
        // and the reverse: anchor has the slash, wanted does not
        let html2 = r#"<a href="https://other.org/">elsewhere</a>"#;
        assert!(contains_child_url(html2, PAGE, "https://other.org"));
    }

    #[test]
    fn test_suffix_match_finds_wrapped_links() {
        let html = r#"<a href="https://cdn.example.com/pub/reports/atc.pdf">ATC</a>"#;
        assert!(contains_child_url(html, PAGE, "/pub/reports/atc.pdf"));
    }

    #[test]
    fn test_empty_child_url_never_matches() {
        let html = r#"<a href="https://other.org/">elsewhere</a>"#;
        assert!(!contains_child_url(html, PAGE, ""));
        assert!(!contains_child_url(html, PAGE, "///"));
    }

    #[test]
    fn test_extract_anchors_skips_anchorless_markup() {
        let html = r#"<p>no links here</p><a name="top">anchor without href</a>"#;
        assert!(extract_anchors(html, PAGE).is_empty());
    }
}
