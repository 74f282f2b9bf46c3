//! The ledger's exclusive file lock: OS-level atomic presence, with
//! cross-process stale-owner detection.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::liveness::is_process_alive;
use crate::error::{EngineError, Result};

/// The contents of a lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// The holding process's id.
    pub pid: u32,
    /// The holding process's hostname.
    pub hostname: String,
    /// A fresh random id generated for this acquisition attempt.
    #[serde(rename = "lockId")]
    pub lock_id: String,
    /// When this lock was acquired.
    #[serde(rename = "acquiredAt")]
    pub acquired_at: DateTime<Utc>,
}

impl LockInfo {
    fn for_this_process() -> Self {
        Self {
            pid: std::process::id(),
            hostname: hostname(),
            lock_id: uuid::Uuid::new_v4().to_string(),
            acquired_at: Utc::now(),
        }
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string())
}

fn read_lock_file(path: &Path) -> Option<LockInfo> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Removes a stale lock file if, and only if, it was acquired by this host,
/// its age exceeds `staleness_timeout`, and its owning process is not alive.
/// A lock held by a different host is never considered stale: liveness of a
/// remote process cannot be disproven from here.
fn unlink_if_stale(path: &Path, staleness_timeout: Duration) {
    let Some(info) = read_lock_file(path) else {
        return;
    };
    if info.hostname != hostname() {
        return;
    }
    let age = Utc::now().signed_duration_since(info.acquired_at);
    let age = age.to_std().unwrap_or(Duration::ZERO);
    if age > staleness_timeout && !is_process_alive(info.pid) {
        let _ = std::fs::remove_file(path);
    }
}

/// Attempts to write `info` to a per-attempt temporary file, then rename it
/// onto `lock_path`. The rename is the protocol's single linearization
/// point: if another attempt already renamed its own file there first, this
/// call still "succeeds" at the filesystem level (rename replaces the
/// target), so ownership is confirmed by re-reading and comparing `lock_id`.
fn try_acquire_once(lock_path: &Path) -> Result<LockInfo> {
    let info = LockInfo::for_this_process();
    let dir = lock_path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = tempfile::Builder::new()
        .prefix(".schemact_lock_attempt")
        .rand_bytes(8)
        .tempfile_in(dir.unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(serde_json::to_string(&info)?.as_bytes())?;
    tmp.flush()?;
    tmp.persist(lock_path)
        .map_err(|e| EngineError::Io(e.error))?;
    Ok(info)
}

/// Acquires the ledger lock, retrying until `timeout` elapses.
///
/// # Errors
/// Returns [`EngineError::LockContention`] if no attempt wins ownership
/// before the deadline.
pub fn acquire(lock_path: &Path, timeout: Duration, retry_delay: Duration) -> Result<LockInfo> {
    let deadline = Instant::now() + timeout;
    loop {
        unlink_if_stale(lock_path, timeout);

        let attempt = try_acquire_once(lock_path)?;
        if let Some(current) = read_lock_file(lock_path) {
            if current.lock_id == attempt.lock_id {
                return Ok(attempt);
            }
        }

        if Instant::now() >= deadline {
            let holder = read_lock_file(lock_path)
                .map(|c| format!("pid {} on {}", c.pid, c.hostname))
                .unwrap_or_else(|| "unknown (lock file unreadable)".to_string());
            return Err(EngineError::LockContention { holder });
        }
        std::thread::sleep(retry_delay);
    }
}

/// Unconditionally removes the lock file. Operator-visible; bypasses the
/// staleness heuristic entirely.
pub fn force_unlock(lock_path: &Path) -> Result<()> {
    match std::fs::remove_file(lock_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::Io(e)),
    }
}

/// Releases the lock by unlinking it. Called only after the ledger's own
/// persistence succeeds.
pub fn release(lock_path: &Path) -> Result<()> {
    force_unlock(lock_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("ledger.json.lock");

        let info = acquire(&lock_path, Duration::from_millis(500), Duration::from_millis(10)).unwrap();
        assert_eq!(info.pid, std::process::id());
        assert!(lock_path.exists());

        release(&lock_path).unwrap();
        assert!(!lock_path.exists());
    }

    #[test]
    fn stale_same_host_lock_with_dead_pid_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("ledger.json.lock");

        let stale = LockInfo {
            pid: 999_999, // exceedingly unlikely to be a live pid
            hostname: hostname(),
            lock_id: "stale".to_string(),
            acquired_at: Utc::now() - chrono::Duration::hours(1),
        };
        std::fs::write(&lock_path, serde_json::to_string(&stale).unwrap()).unwrap();

        let info = acquire(&lock_path, Duration::from_millis(500), Duration::from_millis(10)).unwrap();
        assert_ne!(info.lock_id, "stale");
    }

    #[test]
    fn force_unlock_is_unconditional() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("ledger.json.lock");
        std::fs::write(&lock_path, "not even valid json").unwrap();
        force_unlock(&lock_path).unwrap();
        assert!(!lock_path.exists());
    }
}
