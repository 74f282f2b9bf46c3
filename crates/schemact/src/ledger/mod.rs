//! The durable migration ledger: a JSON file recording every applied
//! migration, protected by a sibling lock file.
//!
//! All mutating operations here are synchronous (the state is a small JSON
//! document, not a network resource); the engine runs them through
//! [`tokio::task::spawn_blocking`] so the async runtime is never blocked for
//! longer than a single file-system call.

pub mod liveness;
pub mod lock;

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, Result};

/// One applied migration's record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    /// The migration file's name, relative to the migrations directory.
    pub filename: String,
    /// Lowercase hex SHA-256 of the file's bytes at application time.
    pub hash: String,
    /// When the migration was applied.
    #[serde(rename = "appliedAt")]
    pub applied_at: DateTime<Utc>,
    /// Which `up()` invocation produced this entry; the unit of rollback.
    pub batch: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerState {
    migrations: Vec<LedgerEntry>,
    #[serde(rename = "currentBatch")]
    current_batch: u32,
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// The ledger, bound to a JSON file on disk and the lock that guards it.
pub struct Ledger {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
    lock_retry_delay: Duration,
    state: LedgerState,
}

impl Ledger {
    /// Loads the ledger from `path`, starting from empty state if the file
    /// doesn't exist yet.
    ///
    /// # Errors
    /// Returns [`EngineError::LedgerCorrupted`] if the file exists but
    /// isn't valid JSON in the expected shape. Never attempts to repair it.
    pub fn load(
        path: impl Into<PathBuf>,
        lock_path: impl Into<PathBuf>,
        lock_timeout: Duration,
        lock_retry_delay: Duration,
    ) -> Result<Self> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| EngineError::LedgerCorrupted(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(e) => return Err(EngineError::Io(e)),
        };
        Ok(Self {
            path,
            lock_path: lock_path.into(),
            lock_timeout,
            lock_retry_delay,
            state,
        })
    }

    /// All applied entries, in append order.
    #[must_use]
    pub fn applied_entries(&self) -> &[LedgerEntry] {
        &self.state.migrations
    }

    /// The most recent batch number; `0` if nothing has ever been applied.
    #[must_use]
    pub const fn current_batch(&self) -> u32 {
        self.state.current_batch
    }

    /// Confirms every applied entry's file is present in `files` and its
    /// current hash matches the stored one.
    ///
    /// # Errors
    /// Returns [`EngineError::Integrity`] naming the first filename found
    /// missing or modified.
    pub fn validate_integrity(&self, files: &HashMap<String, Vec<u8>>) -> Result<()> {
        for entry in &self.state.migrations {
            match files.get(&entry.filename) {
                None => {
                    return Err(EngineError::Integrity(format!(
                        "{} is missing from the migrations directory",
                        entry.filename
                    )));
                }
                Some(bytes) => {
                    let current_hash = compute_hash(bytes);
                    if current_hash != entry.hash {
                        return Err(EngineError::Integrity(format!(
                            "{} has been modified since it was applied",
                            entry.filename
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Filenames present in `discovered` that have no ledger entry yet,
    /// preserving discovery order.
    #[must_use]
    pub fn pending(&self, discovered: &[String]) -> Vec<String> {
        discovered
            .iter()
            .filter(|name| !self.state.migrations.iter().any(|e| &e.filename == *name))
            .cloned()
            .collect()
    }

    /// The entries of the most recent batch, in reverse append order (the
    /// order a rollback should undo them in).
    #[must_use]
    pub fn last_batch_entries(&self) -> Vec<&LedgerEntry> {
        self.state
            .migrations
            .iter()
            .filter(|e| e.batch == self.state.current_batch)
            .rev()
            .collect()
    }

    /// Acquires the lock, appends one new batch covering every `(filename,
    /// bytes)` pair with a single shared timestamp and batch number,
    /// persists atomically, and releases the lock. A no-op on empty input —
    /// no lock is taken.
    ///
    /// # Errors
    /// Returns [`EngineError::LockContention`] on acquisition timeout, or an
    /// IO/serialization error if persistence fails.
    pub fn record_batch(&mut self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        lock::acquire(&self.lock_path, self.lock_timeout, self.lock_retry_delay)?;
        let result = self.record_batch_locked(entries);
        // The lock is released only after persistence is attempted; either
        // way we must not leave it held.
        lock::release(&self.lock_path)?;
        result
    }

    fn record_batch_locked(&mut self, entries: Vec<(String, Vec<u8>)>) -> Result<()> {
        let now = Utc::now();
        let batch = self.state.current_batch + 1;
        for (filename, bytes) in entries {
            self.state.migrations.push(LedgerEntry {
                filename,
                hash: compute_hash(&bytes),
                applied_at: now,
                batch,
            });
        }
        self.state.current_batch = batch;
        self.persist()
    }

    /// Acquires the lock, drops every entry in the current batch,
    /// decrements the batch counter, persists, and releases the lock.
    ///
    /// # Errors
    /// Returns [`EngineError::LockContention`] on acquisition timeout, or an
    /// IO/serialization error if persistence fails.
    pub fn rollback_last_batch(&mut self) -> Result<()> {
        lock::acquire(&self.lock_path, self.lock_timeout, self.lock_retry_delay)?;
        let result = self.rollback_last_batch_locked();
        lock::release(&self.lock_path)?;
        result
    }

    fn rollback_last_batch_locked(&mut self) -> Result<()> {
        let current = self.state.current_batch;
        self.state.migrations.retain(|e| e.batch != current);
        self.state.current_batch = current.saturating_sub(1);
        self.persist()
    }

    /// Unconditionally removes the lock file. Operator-visible; bypasses
    /// the staleness heuristic.
    pub fn force_unlock(&self) -> Result<()> {
        lock::force_unlock(&self.lock_path)
    }

    /// Confirms the ledger's directory accepts a new file, without touching
    /// the real ledger. Meant to be called before any migration runs, so a
    /// read-only ledger path is caught as an ordinary error instead of
    /// surfacing only after migrations have already committed.
    ///
    /// # Errors
    /// Returns [`EngineError::Io`] if the directory doesn't exist or can't
    /// be written to.
    pub fn check_writable(&self) -> Result<()> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        tempfile::Builder::new()
            .prefix(".schemact_ledger_writable_check")
            .rand_bytes(8)
            .tempfile_in(dir.unwrap_or_else(|| Path::new(".")))?;
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.state)?;
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = tempfile::Builder::new()
            .prefix(".schemact_ledger_write")
            .rand_bytes(8)
            .tempfile_in(dir.unwrap_or_else(|| Path::new(".")))?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| EngineError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ledger(dir: &Path) -> Ledger {
        Ledger::load(
            dir.join("ledger.json"),
            dir.join("ledger.json.lock"),
            Duration::from_secs(1),
            Duration::from_millis(5),
        )
        .unwrap()
    }

    #[test]
    fn load_is_empty_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = test_ledger(dir.path());
        assert!(ledger.applied_entries().is_empty());
        assert_eq!(ledger.current_batch(), 0);
    }

    #[test]
    fn corrupted_ledger_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ledger.json"), "not json").unwrap();
        let result = Ledger::load(
            dir.path().join("ledger.json"),
            dir.path().join("ledger.json.lock"),
            Duration::from_secs(1),
            Duration::from_millis(5),
        );
        assert!(matches!(result, Err(EngineError::LedgerCorrupted(_))));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = test_ledger(dir.path());
        ledger.record_batch(Vec::new()).unwrap();
        assert_eq!(ledger.current_batch(), 0);
        assert!(!dir.path().join("ledger.json").exists());
    }

    #[test]
    fn record_then_rollback_restores_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = test_ledger(dir.path());

        ledger
            .record_batch(vec![
                ("001.sigl".to_string(), b"a".to_vec()),
                ("002.sigl".to_string(), b"b".to_vec()),
            ])
            .unwrap();
        assert_eq!(ledger.current_batch(), 1);
        assert_eq!(ledger.applied_entries().len(), 2);

        ledger.rollback_last_batch().unwrap();
        assert_eq!(ledger.current_batch(), 0);
        assert!(ledger.applied_entries().is_empty());
    }

    #[test]
    fn batch_rollback_then_reapply_reuses_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = test_ledger(dir.path());

        let files = vec![
            ("001.sigl".to_string(), b"a".to_vec()),
            ("002.sigl".to_string(), b"b".to_vec()),
            ("003.sigl".to_string(), b"c".to_vec()),
        ];
        ledger.record_batch(files.clone()).unwrap();
        let batch_n = ledger.current_batch();
        ledger.rollback_last_batch().unwrap();
        assert_eq!(ledger.current_batch(), batch_n - 1);

        ledger.record_batch(files).unwrap();
        assert_eq!(ledger.current_batch(), batch_n);
        assert_eq!(ledger.applied_entries().len(), 3);
    }

    #[test]
    fn last_batch_entries_are_in_reverse_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = test_ledger(dir.path());
        ledger
            .record_batch(vec![
                ("001.sigl".to_string(), b"a".to_vec()),
                ("002.sigl".to_string(), b"b".to_vec()),
            ])
            .unwrap();
        let last = ledger.last_batch_entries();
        assert_eq!(last[0].filename, "002.sigl");
        assert_eq!(last[1].filename, "001.sigl");
    }

    #[test]
    fn integrity_detects_missing_and_modified_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = test_ledger(dir.path());
        ledger
            .record_batch(vec![("001.sigl".to_string(), b"original".to_vec())])
            .unwrap();

        let mut files = HashMap::new();
        assert!(ledger.validate_integrity(&files).is_err());

        files.insert("001.sigl".to_string(), b"tampered".to_vec());
        assert!(ledger.validate_integrity(&files).is_err());

        files.insert("001.sigl".to_string(), b"original".to_vec());
        assert!(ledger.validate_integrity(&files).is_ok());
    }

    #[test]
    fn check_writable_succeeds_for_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = test_ledger(dir.path());
        ledger.check_writable().unwrap();
    }

    #[test]
    fn check_writable_fails_for_a_missing_directory() {
        let ledger = Ledger::load(
            "/no/such/directory/ledger.json",
            "/no/such/directory/ledger.json.lock",
            Duration::from_secs(1),
            Duration::from_millis(5),
        )
        .unwrap();
        assert!(ledger.check_writable().is_err());
    }

    #[test]
    fn pending_preserves_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = test_ledger(dir.path());
        ledger
            .record_batch(vec![("001.sigl".to_string(), b"a".to_vec())])
            .unwrap();

        let discovered = vec![
            "001.sigl".to_string(),
            "002.sigl".to_string(),
            "003.sigl".to_string(),
        ];
        assert_eq!(ledger.pending(&discovered), vec!["002.sigl", "003.sigl"]);
    }
}
