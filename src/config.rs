// src/config.rs
// =============================================================================
// This module loads and saves our settings file.
//
// The settings live in a small JSON file in the platform config directory
// (e.g., ~/.config/linkcheck/config.json on Linux). If the file does not
// exist yet, we create it with defaults so the user has something to edit.
//
// Command-line flags always win over the settings file; the file only
// supplies defaults for things you don't want to type every run.
//
// Rust concepts:
// - serde derive: turn a struct into JSON and back automatically
// - #[serde(default)]: missing keys fall back to Default::default()
// - Default trait: one place that defines what "fresh install" looks like
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// All tunables in one struct
//
// #[serde(default)] on the struct means a config file written by an older
// version (missing newer keys) still loads; the gaps are filled from
// Settings::default().
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Download and hash-compare files when orig_file is supplied
    pub hash_check: bool,
    /// Print per-case progress while a batch runs
    pub verbose: bool,
    /// Open the results CSV in the OS-default viewer after a batch
    pub open_results: bool,
    /// Working directory: scratch downloads land here
    pub dir_home: PathBuf,
    /// Where input CSVs are looked for when a bare filename is given
    pub dir_in: PathBuf,
    /// Where results CSVs are written when a bare filename is given
    pub dir_out: PathBuf,
    /// Results file used when --output is not given
    pub default_results_csv: PathBuf,
    /// How many cases to verify at the same time
    pub concurrency: usize,
    /// Per network operation timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Platform data dir, or the current directory as a last resort
        let home = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linkcheck");
        Settings {
            hash_check: true,
            verbose: true,
            open_results: false,
            dir_in: home.join("inputs"),
            dir_out: home.join("outputs"),
            default_results_csv: home.join("outputs").join("links_to_check_results.csv"),
            dir_home: home,
            concurrency: 8,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Where the settings file lives when --config is not given
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linkcheck")
            .join("config.json")
    }

    /// Load settings from `path`, or from the default location.
    ///
    /// A missing file is not an error: we write the defaults there so the
    /// next run (and the user) can see and edit them.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let path = path.map(PathBuf::from).unwrap_or_else(Settings::default_path);
        if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("cannot read settings file {}", path.display()))?;
            let settings: Settings = serde_json::from_str(&text)
                .with_context(|| format!("settings file {} is not valid JSON", path.display()))?;
            log::debug!("loaded settings from {}", path.display());
            Ok(settings)
        } else {
            let settings = Settings::default();
            // First run: persist the defaults. Failure to write is only a
            // warning; we can still run with in-memory defaults.
            if let Err(e) = settings.save(&path) {
                log::warn!("could not create settings file {}: {e:#}", path.display());
            }
            Ok(settings)
        }
    }

    /// Write the settings to `path` as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create directory {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)
            .with_context(|| format!("cannot write settings file {}", path.display()))?;
        log::debug!("saved settings to {}", path.display());
        Ok(())
    }

    /// Make sure the working directories exist before a batch runs
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.dir_home, &self.dir_in, &self.dir_out] {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let s = Settings::default();
        assert!(s.hash_check);
        assert!(s.verbose);
        assert!(!s.open_results);
        assert!(s.concurrency > 0);
        assert!(s.timeout_secs > 0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut s = Settings::default();
        s.hash_check = false;
        s.concurrency = 3;
        s.save(&path).unwrap();

        let loaded = Settings::load(Some(&path)).unwrap();
        assert!(!loaded.hash_check);
        assert_eq!(loaded.concurrency, 3);
    }

    #[test]
    fn test_load_creates_missing_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh").join("config.json");

        let loaded = Settings::load(Some(&path)).unwrap();
        assert!(loaded.hash_check);
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_fills_gaps_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"concurrency": 2}"#).unwrap();

        let loaded = Settings::load(Some(&path)).unwrap();
        assert_eq!(loaded.concurrency, 2);
        assert!(loaded.hash_check); // not in the file, comes from Default
    }
}
