// src/batch/mod.rs
// =============================================================================
// This module runs a whole table of verification cases and builds the report.
//
// Submodules:
// - table: CSV reading (cases in) and writing (report out)
//
// How a batch runs:
// 1. Cases fan out over a bounded number of concurrent tasks
//    (buffer_unordered, like checking many links at once - but bounded so
//    we never hammer a remote FTP/HTTP host)
// 2. Each task produces exactly one Verdict; a panicking case is caught at
//    this boundary and turned into an "unexpected error" verdict, so one
//    bad link never takes down the run
// 3. Results are put back into input order - row order in the report is
//    part of the contract, completion order is not
// 4. A cancellation flag is consulted before each case starts: Ctrl-C stops
//    new cases, already-finished verdicts still make it into the report
//
// Rust concepts:
// - StreamExt::buffer_unordered: N futures in flight, results as they land
// - catch_unwind: a panic becomes a value instead of unwinding the batch
// - AtomicBool: the cheapest possible cross-task cancellation signal
// =============================================================================

pub mod table;

use crate::verify::{verify_case, CheckOptions, Reason, Verdict, VerificationCase};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Settings for one batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// How many cases may be in flight at once
    pub concurrency: usize,
    /// Print progress per completed case
    pub verbose: bool,
    /// Per-case verification knobs (hash toggle, timeout, scratch dir)
    pub check: CheckOptions,
}

/// Ordered verdicts for one run, plus failure accounting
#[derive(Debug)]
pub struct BatchReport {
    /// One verdict per input case, in input order
    pub verdicts: Vec<Verdict>,
}

impl BatchReport {
    pub fn failure_count(&self) -> usize {
        self.verdicts.iter().filter(|v| !v.success).count()
    }

    /// The condensed failure-only view: just what triage needs
    pub fn failures(&self) -> Vec<&Verdict> {
        self.verdicts.iter().filter(|v| !v.success).collect()
    }
}

/// Run every case and collect the verdicts
///
/// This function cannot fail: whatever goes wrong inside a case ends up as
/// that case's verdict, and cancellation just means fewer verdicts.
pub async fn run(
    client: &reqwest::Client,
    cases: Vec<VerificationCase>,
    options: &BatchOptions,
    cancel: Arc<AtomicBool>,
) -> BatchReport {
    let total = cases.len();
    let futures = cases.into_iter().enumerate().map(|(index, case)| {
        // Each task gets its own handles; Client is reference-counted and
        // cheap to clone
        let client = client.clone();
        let check = options.check.clone();
        let cancel = cancel.clone();
        async move {
            // Cancellation is between cases: a case either runs fully or
            // not at all
            if cancel.load(Ordering::SeqCst) {
                log::info!("cancelled before case {}: {}", index + 1, case.url);
                return None;
            }
            let result = AssertUnwindSafe(verify_case(&client, &case, &check))
                .catch_unwind()
                .await;
            let verdict = match result {
                Ok(v) => v,
                Err(_) => {
                    // The catch boundary: a panic inside one case becomes
                    // that case's verdict
                    let url = case.url.trim().to_string();
                    Verdict::for_case(&case).fail(Reason::Unexpected {
                        url,
                        detail: "verification panicked".to_string(),
                    })
                }
            };
            Some((index, verdict))
        }
    });

    let mut in_flight = stream::iter(futures).buffer_unordered(options.concurrency.max(1));
    let mut finished = 0usize;
    let mut indexed: Vec<(usize, Verdict)> = Vec::with_capacity(total);
    while let Some(item) = in_flight.next().await {
        let Some((index, verdict)) = item else {
            continue; // skipped by cancellation
        };
        finished += 1;
        if options.verbose {
            println!(
                "Finished {finished} of {total}, {}: {}",
                verdict.description, verdict.url
            );
            if verdict.success {
                println!("    - ✅ Passed");
            } else {
                println!("    - ❌ Failed: {}", verdict.reason_text());
            }
        }
        indexed.push((index, verdict));
    }

    // completion order -> input order
    indexed.sort_by_key(|(index, _)| *index);
    BatchReport {
        verdicts: indexed.into_iter().map(|(_, verdict)| verdict).collect(),
    }
}
