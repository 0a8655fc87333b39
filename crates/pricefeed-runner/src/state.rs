//! Persisted last-run timestamps, one per run identity.
//!
//! The store is a single JSON object (`{"daraz_selenium": "2026-03-01T02:00:00.123"}`)
//! read and rewritten whole. Writes go to a sibling temp file that is then
//! renamed over the original, so a crash mid-write never leaves a truncated
//! document behind.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::RunnerError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses a stored timestamp. Accepts the format this store writes, RFC 3339
/// with an offset, and a bare date.
pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Clone)]
pub struct RunStateStore {
    path: PathBuf,
}

impl RunStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole document. Missing or unreadable documents read as empty.
    #[must_use]
    pub fn load(&self) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "run state unreadable");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "run state is not a JSON object of timestamps; treating as empty"
            );
            BTreeMap::new()
        })
    }

    /// Last recorded run for `identity`, if one parses.
    #[must_use]
    pub fn last_run(&self, identity: &str) -> Option<NaiveDateTime> {
        let state = self.load();
        let raw = state.get(identity)?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            tracing::warn!(identity, value = %raw, "unparseable last-run timestamp ignored");
        }
        parsed
    }

    /// `true` when `identity` has no recorded run, or its last run was at
    /// least `interval_days` whole calendar days before `today`.
    ///
    /// An interval of 0 always runs.
    #[must_use]
    pub fn should_run(&self, identity: &str, interval_days: u32, today: NaiveDate) -> bool {
        if interval_days == 0 {
            return true;
        }
        let Some(last) = self.last_run(identity) else {
            return true;
        };
        let elapsed = (today - last.date()).num_days();
        elapsed >= i64::from(interval_days)
    }

    /// Records `at` as the last run of `identity`, keeping other identities.
    ///
    /// # Errors
    ///
    /// [`RunnerError::StateIo`] if the directory, temp file, or rename fails;
    /// [`RunnerError::StateSerialize`] if the document cannot be encoded.
    pub fn mark_run_complete(&self, identity: &str, at: NaiveDateTime) -> Result<(), RunnerError> {
        let mut state = self.load();
        state.insert(
            identity.to_owned(),
            at.format(TIMESTAMP_FORMAT).to_string(),
        );
        let body = serde_json::to_string_pretty(&state)?;

        let io_err = |path: &Path, source: std::io::Error| RunnerError::StateIo {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, body).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;

        tracing::debug!(identity, path = %self.path.display(), "run state updated");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
