// src/batch/table.rs
// =============================================================================
// CSV in, CSV out.
//
// Input table columns (fixed order, header row expected):
//   description, url, orig_file, check_child_url, comment
// The legacy header name 'contains_url' is accepted for check_child_url.
// Files without a header row are accepted too: if no 'url' column is found
// the columns are taken positionally. Absent cells become empty strings so
// nothing downstream ever sees a null.
//
// Output table columns are fixed so spreadsheet viewers always see the same
// layout; see REPORT_COLUMNS below.
// =============================================================================

use crate::verify::{Verdict, VerificationCase};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::Path;

/// Input column order, for headerless files
const CASE_COLUMNS: [&str; 5] = ["description", "url", "orig_file", "check_child_url", "comment"];

/// Results column order. Do not reorder: downstream spreadsheets rely on it.
pub const REPORT_COLUMNS: [&str; 15] = [
    "success",
    "description",
    "url",
    "request status",
    "reason",
    "child url",
    "child url status",
    "child url reason",
    "child url header",
    "size on server",
    "downloaded file size",
    "orig file size",
    "orig file path",
    "timestamp",
    "header",
];

/// Read verification cases from a CSV file
pub fn read_cases(path: &Path) -> Result<Vec<VerificationCase>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true) // short rows are padded with empty strings below
        .from_path(path)
        .with_context(|| format!("cannot open links file {}", path.display()))?;

    // Work out which column is which. Header names are normalized
    // (trimmed, lowercased, legacy alias folded in); a file whose first
    // row doesn't include 'url' is treated as headerless.
    let headers = reader.headers()?.clone();
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| {
            let h = h.trim().to_lowercase();
            if h == "contains_url" {
                "check_child_url".to_string()
            } else {
                h
            }
        })
        .collect();
    let has_header = normalized.iter().any(|h| h == "url");

    let column_index = |name: &str| -> usize {
        if has_header {
            normalized
                .iter()
                .position(|h| h == name)
                .unwrap_or(usize::MAX)
        } else {
            CASE_COLUMNS.iter().position(|c| *c == name).unwrap()
        }
    };
    let idx_description = column_index("description");
    let idx_url = column_index("url");
    let idx_orig_file = column_index("orig_file");
    let idx_child = column_index("check_child_url");
    let idx_comment = column_index("comment");

    let mut cases = Vec::new();
    if !has_header {
        // the first row was data, not a header
        cases.push(case_from(&headers, idx_description, idx_url, idx_orig_file, idx_child, idx_comment));
    }
    for record in reader.records() {
        let record = record.with_context(|| format!("bad row in {}", path.display()))?;
        cases.push(case_from(&record, idx_description, idx_url, idx_orig_file, idx_child, idx_comment));
    }
    log::debug!("read {} case(s) from {}", cases.len(), path.display());
    Ok(cases)
}

// absent cell -> empty string, never a missing value
fn cell(record: &csv::StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

fn case_from(
    record: &csv::StringRecord,
    idx_description: usize,
    idx_url: usize,
    idx_orig_file: usize,
    idx_child: usize,
    idx_comment: usize,
) -> VerificationCase {
    VerificationCase {
        description: cell(record, idx_description),
        url: cell(record, idx_url),
        orig_file: cell(record, idx_orig_file),
        check_child_url: cell(record, idx_child),
        not_posted_after: None, // CLI-only field, not part of the CSV
        comment: cell(record, idx_comment),
    }
}

/// Write the verdicts to a results CSV, backing up any existing file first
pub fn write_report(path: &Path, verdicts: &[Verdict]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    backup_existing(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create results file {}", path.display()))?;
    writer.write_record(REPORT_COLUMNS)?;
    for verdict in verdicts {
        writer.write_record(report_row(verdict))?;
    }
    writer.flush()?;
    log::debug!("wrote {} row(s) to {}", verdicts.len(), path.display());
    Ok(())
}

// One results row, in REPORT_COLUMNS order
fn report_row(v: &Verdict) -> Vec<String> {
    vec![
        v.success.to_string(),
        v.description.clone(),
        v.url.clone(),
        v.request_status.clone().unwrap_or_default(),
        v.reason_text(),
        v.child_url.clone(),
        v.child_url_status.clone().unwrap_or_default(),
        v.child_url_reason.clone(),
        v.child_url_header.clone().unwrap_or_default(),
        opt_number(v.size_on_server),
        opt_number(v.downloaded_file_size),
        opt_number(v.orig_file_size),
        v.orig_file_path.clone(),
        v.timestamp
            .map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default(),
        v.header.clone().unwrap_or_default(),
    ]
}

fn opt_number(n: Option<u64>) -> String {
    n.map(|n| n.to_string()).unwrap_or_default()
}

/// If `path` already exists, rename it out of the way with a timestamp
/// suffix instead of overwriting last run's results
pub fn backup_existing(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("results");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("csv");
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let backup = path.with_file_name(format!("{stem}.{stamp}.{ext}"));
    fs::rename(path, &backup)
        .with_context(|| format!("cannot back up {} to {}", path.display(), backup.display()))?;
    log::info!("backed up previous results to {}", backup.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::Reason;
    use std::io::Write;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_cases_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "links.csv",
            "description,url,orig_file,check_child_url,comment\n\
             OASIS page,https://example.com/x, , http://other.org/ ,note\n",
        );
        let cases = read_cases(&path).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].description, "OASIS page");
        assert_eq!(cases[0].url, "https://example.com/x");
        assert_eq!(cases[0].orig_file, "");
        assert_eq!(cases[0].check_child_url, "http://other.org/");
        assert_eq!(cases[0].comment, "note");
    }

    #[test]
    fn test_legacy_contains_url_header_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "links.csv",
            "description,url,orig_file,contains_url,comment\n\
             a,https://example.com,,http://child.example/,\n",
        );
        let cases = read_cases(&path).unwrap();
        assert_eq!(cases[0].check_child_url, "http://child.example/");
    }

    #[test]
    fn test_headerless_file_reads_positionally() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "links.csv",
            "first,https://example.com/a,,,\n\
             second,https://example.com/b,,,\n",
        );
        let cases = read_cases(&path).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].description, "first");
        assert_eq!(cases[1].url, "https://example.com/b");
    }

    #[test]
    fn test_short_rows_become_empty_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "links.csv",
            "description,url,orig_file,check_child_url,comment\n\
             bare,https://example.com\n",
        );
        let cases = read_cases(&path).unwrap();
        assert_eq!(cases[0].orig_file, "");
        assert_eq!(cases[0].check_child_url, "");
        assert_eq!(cases[0].comment, "");
    }

    #[test]
    fn test_write_report_columns_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.csv");

        let case = VerificationCase {
            description: "d".to_string(),
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        let mut verdict = Verdict::for_case(&case);
        verdict.size_on_server = Some(1024);
        let verdict = verdict.fail(Reason::SizeMismatch {
            url: "https://example.com".to_string(),
            path: "/tmp/x".to_string(),
            remote: 1024,
            local: 1023,
        });

        write_report(&path, &[verdict]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert_eq!(
            header,
            "success,description,url,request status,reason,child url,\
             child url status,child url reason,child url header,size on server,\
             downloaded file size,orig file size,orig file path,timestamp,header"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("false,d,https://example.com"));
        assert!(row.contains("1024"));
    }

    #[test]
    fn test_backup_preserves_previous_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "old run\n").unwrap();

        backup_existing(&path).unwrap();
        assert!(!path.exists());

        // exactly one backup file, still holding the old content
        let backups: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "old run\n");
    }
}
