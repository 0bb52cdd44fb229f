// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the settings file and merge in the flags
// 3. Dispatch to the appropriate subcommand handler (batch, url)
// 4. Print results, write the report, exit with a proper code
//    (0 = every check passed, 1 = at least one failure, 2 = error)
//
// Rust concepts used:
// - async/await: verification is network-bound, cases run concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// - match: Pattern matching to handle different subcommands
// =============================================================================

// Module declarations - tells Rust about our other source files
mod batch; // src/batch/ - run a table of cases, write the report
mod cli; // src/cli.rs - command-line parsing
mod compare; // src/compare.rs - size and hash comparison
mod config; // src/config.rs - JSON settings file
mod probe; // src/probe/ - HTTP and FTP resource probes
mod verify; // src/verify/ - per-case verification strategies

use anyhow::{Context, Result};
use batch::BatchOptions;
use chrono::NaiveDateTime;
use clap::Parser;
use cli::{Cli, Commands};
use config::Settings;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use verify::{CheckOptions, Verdict, VerificationCase};

// The #[tokio::main] attribute transforms our async main into a real main
// function: it creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    // RUST_LOG=debug linkcheck ... turns on diagnostics
    env_logger::init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {e:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Batch {
            input,
            output,
            no_hash_check,
            concurrency,
            json,
            open,
            config,
        } => {
            handle_batch(
                input,
                output,
                no_hash_check,
                concurrency,
                json,
                open,
                config,
            )
            .await
        }
        Commands::Url {
            url,
            orig_file,
            child_url,
            not_posted_after,
            no_hash_check,
            json,
            config,
        } => {
            handle_url(
                url,
                orig_file,
                child_url,
                not_posted_after,
                no_hash_check,
                json,
                config,
            )
            .await
        }
    }
}

// Handles the 'batch' subcommand: a whole CSV of cases
#[allow(clippy::too_many_arguments)]
async fn handle_batch(
    input: PathBuf,
    output: Option<PathBuf>,
    no_hash_check: bool,
    concurrency: Option<usize>,
    json: bool,
    open: bool,
    config: Option<PathBuf>,
) -> Result<i32> {
    let settings = Settings::load(config.as_deref())?;
    settings.ensure_dirs()?;

    // A bare filename with no directory part is looked up in dir_in,
    // so "links.csv" just works from anywhere
    let input = resolve_in_dir(input, &settings.dir_in);
    let cases = batch::table::read_cases(&input)?;
    if cases.is_empty() {
        println!("⚠️  No cases found in {}", input.display());
        return Ok(0);
    }

    println!("🔍 Checking {} link(s) from {}\n", cases.len(), input.display());

    // Ctrl-C flips the cancellation flag; cases already in flight finish,
    // unstarted cases are skipped, and the report is still written
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n⏹️  Cancelling: waiting for in-flight cases to finish...");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let timeout = Duration::from_secs(settings.timeout_secs);
    let options = BatchOptions {
        concurrency: concurrency.unwrap_or(settings.concurrency),
        verbose: settings.verbose && !json,
        check: CheckOptions {
            hash_check: !no_hash_check && settings.hash_check,
            timeout,
            scratch_dir: settings.dir_home.clone(),
        },
    };
    let client = probe::http_client(timeout).context("failed to create HTTP client")?;

    let report = batch::run(&client, cases, &options, cancel).await;

    // Print results and persist the report
    if json {
        println!("{}", serde_json::to_string_pretty(&report.verdicts)?);
    } else {
        print_table(&report.verdicts);
        print_failure_summary(&report);
    }

    let output = resolve_in_dir(
        output.unwrap_or_else(|| settings.default_results_csv.clone()),
        &settings.dir_out,
    );
    batch::table::write_report(&output, &report.verdicts)?;
    println!("\n******  Results file: {}  ******", output.display());

    // Show the report in whatever the OS considers a CSV viewer
    if open || settings.open_results {
        if let Err(e) = open::that(&output) {
            log::warn!("cannot open results file {}: {e}", output.display());
        }
    }

    if report.failure_count() > 0 {
        Ok(1) // Exit code 1 = at least one link check failed
    } else {
        Ok(0) // Exit code 0 = all good
    }
}

// Handles the 'url' subcommand: one ad hoc case, no CSV involved
async fn handle_url(
    url: String,
    orig_file: Option<PathBuf>,
    child_url: Option<String>,
    not_posted_after: Option<String>,
    no_hash_check: bool,
    json: bool,
    config: Option<PathBuf>,
) -> Result<i32> {
    let settings = Settings::load(config.as_deref())?;
    settings.ensure_dirs()?;

    let case = VerificationCase {
        description: "ad hoc".to_string(),
        url,
        orig_file: orig_file.map(|p| p.display().to_string()).unwrap_or_default(),
        check_child_url: child_url.unwrap_or_default(),
        not_posted_after: not_posted_after.as_deref().map(parse_cutoff).transpose()?,
        comment: String::new(),
    };

    let timeout = Duration::from_secs(settings.timeout_secs);
    let options = CheckOptions {
        hash_check: !no_hash_check && settings.hash_check,
        timeout,
        scratch_dir: settings.dir_home.clone(),
    };
    let client = probe::http_client(timeout).context("failed to create HTTP client")?;

    let verdict = verify::verify_case(&client, &case, &options).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_verdict(&verdict);
    }

    Ok(if verdict.success { 0 } else { 1 })
}

// "links.csv" -> dir/links.csv; anything with a directory part is kept as-is
fn resolve_in_dir(path: PathBuf, dir: &Path) -> PathBuf {
    if path.parent().map(|p| p.as_os_str().is_empty()).unwrap_or(true) {
        dir.join(path)
    } else {
        path
    }
}

// Accept both "2026-01-31T00:00:00" and a bare "2026-01-31" (midnight UTC)
fn parse_cutoff(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
        })
        .with_context(|| format!("\"{text}\" is not a timestamp (expected YYYY-MM-DDTHH:MM:SS)"))
}

// Prints results as a human-readable table in the terminal
fn print_table(verdicts: &[Verdict]) {
    // Print table header
    println!("{:<8} {:<28} {:<50} {:<40}", "RESULT", "DESCRIPTION", "URL", "REASON");
    println!("{}", "=".repeat(128));

    for verdict in verdicts {
        let result = if verdict.success { "✅ OK" } else { "❌ FAIL" };
        println!(
            "{:<8} {:<28} {:<50} {:<40}",
            result,
            truncate(&verdict.description, 26),
            truncate(&verdict.url, 48),
            truncate(&verdict.reason_text(), 60),
        );
    }

    println!();

    // Print summary
    let ok_count = verdicts.iter().filter(|v| v.success).count();
    println!("📊 Summary:");
    println!("   ✅ Passed: {}", ok_count);
    println!("   ❌ Failed: {}", verdicts.len() - ok_count);
    println!("   📋 Total:  {}", verdicts.len());
}

// The condensed failure-only view: one line per failed case, just enough
// to start investigating without re-running anything
fn print_failure_summary(report: &batch::BatchReport) {
    let failures = report.failures();
    if failures.is_empty() {
        return;
    }
    println!("\n{}", "*".repeat(60));
    println!("{} link check(s) failed:\n", failures.len());
    for verdict in failures {
        println!(
            "   {:<28} [{}] {}",
            truncate(&verdict.description, 26),
            verdict.reason.code(),
            verdict.reason_text()
        );
    }
    println!("{}", "*".repeat(60));
}

// Full detail for a single-URL run
fn print_verdict(verdict: &Verdict) {
    if verdict.success {
        println!("✅ Passed: {}", verdict.url);
    } else {
        println!("❌ Failed: {}", verdict.url);
        println!("   Reason: {}", verdict.reason_text());
    }
    if let Some(status) = &verdict.request_status {
        println!("   Status: {status}");
    }
    if let Some(size) = verdict.size_on_server {
        println!("   Size on server: {size}");
    }
    if let Some(size) = verdict.orig_file_size {
        println!("   Local file size: {size}");
    }
    if let Some(ts) = verdict.timestamp {
        println!("   Remote modified: {ts}");
    }
    if let Some(warning) = &verdict.warning {
        println!("   ⚠️  {warning}");
    }
}

// Truncate a string for fixed-width table display
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why exit codes?
//    - Shell scripts and CI pipelines branch on them
//    - 0 means "all links verified", 1 "something failed", 2 "we broke"
//    - std::process::exit() skips destructors, which is fine this late
//
// 2. Why is cancellation just an AtomicBool?
//    - The batch only needs a yes/no "should I start another case?"
//    - An atomic flag is the simplest thing that works across tasks
//    - In-flight cases finish cleanly, so the report stays consistent
//
// 3. Why settings file AND flags?
//    - The settings file holds what you always want (directories, timeout)
//    - Flags override per run (--no-hash-check for a quick pass)
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cutoff_full_timestamp() {
        let ts = parse_cutoff("2026-01-31T12:30:00").unwrap();
        assert_eq!(ts.to_string(), "2026-01-31 12:30:00");
    }

    #[test]
    fn test_parse_cutoff_bare_date_is_midnight() {
        let ts = parse_cutoff(" 2026-01-31 ").unwrap();
        assert_eq!(ts.to_string(), "2026-01-31 00:00:00");
    }

    #[test]
    fn test_parse_cutoff_rejects_garbage() {
        assert!(parse_cutoff("next tuesday").is_err());
    }

    #[test]
    fn test_resolve_in_dir_only_bare_names() {
        let dir = Path::new("/data/in");
        assert_eq!(
            resolve_in_dir(PathBuf::from("links.csv"), dir),
            PathBuf::from("/data/in/links.csv")
        );
        assert_eq!(
            resolve_in_dir(PathBuf::from("./links.csv"), dir),
            PathBuf::from("./links.csv")
        );
        assert_eq!(
            resolve_in_dir(PathBuf::from("/abs/links.csv"), dir),
            PathBuf::from("/abs/links.csv")
        );
    }

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-much-longer-string", 10), "a-much-...");
    }
}
