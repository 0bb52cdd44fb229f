// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Rust concepts:
// - Structs: Custom data types that group related data
// - Enums: Types that can be one of several variants
// - Derive macros: Automatically generate code for our types
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "linkcheck",
    version = "0.1.0",
    about = "Deep-check published links: reachability, size, hash, child links",
    long_about = "linkcheck verifies that published URLs (http, https, ftp, ftps) are alive \
                  and, when a known-good local copy is supplied, that the posted file still \
                  matches it by size and cryptographic hash. It can also verify that a page \
                  links to a required child URL, and that an FTP file has not been re-posted \
                  after a cutoff timestamp."
)]
pub struct Cli {
    // The #[command(subcommand)] attribute tells clap that this field
    // will hold one of the subcommands defined in the Commands enum
    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands (batch, url)
//
// Each variant represents a different subcommand the user can run
// The fields inside each variant become the arguments for that subcommand
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every verification case listed in a CSV file
    ///
    /// Example: linkcheck batch links_to_check.csv --output results.csv
    Batch {
        /// CSV file of cases with columns:
        /// description, url, orig_file, check_child_url, comment
        /// (the legacy column name 'contains_url' is accepted for
        /// check_child_url)
        input: PathBuf,

        /// Where to write the results CSV
        ///
        /// Defaults to the results path from the settings file. An existing
        /// file at this location is backed up, not overwritten.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip the hash comparison even when orig_file is supplied
        ///
        /// Size comparison still runs; this only disables the (expensive)
        /// download-and-hash step.
        #[arg(long)]
        no_hash_check: bool,

        /// How many cases to verify at the same time
        ///
        /// Defaults to the value from the settings file.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// Open the results CSV in the OS-default viewer when done
        #[arg(long)]
        open: bool,

        /// Use this settings file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Verify a single URL without a CSV file
    ///
    /// Example: linkcheck url https://example.com/doc.pdf --orig-file ./doc.pdf
    Url {
        /// The URL to verify (http, https, ftp or ftps)
        url: String,

        /// Local known-good copy to compare against by size and hash
        #[arg(long)]
        orig_file: Option<PathBuf>,

        /// A link that must appear as an anchor on the page (HTTP only)
        #[arg(long)]
        child_url: Option<String>,

        /// Fail if the remote file was modified at or after this UTC
        /// timestamp, e.g. 2026-01-31T00:00:00 (FTP only)
        #[arg(long)]
        not_posted_after: Option<String>,

        /// Skip the hash comparison even when --orig-file is supplied
        #[arg(long)]
        no_hash_check: bool,

        /// Output the verdict as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Use this settings file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
