//! Per-exercise key-value persistence.
//!
//! [`KvStore`] maps a key-value scope onto the filesystem: one directory
//! per exercise scope, one JSON file per key.  The attempt counter lives
//! under the [`RECORD_ATTEMPTS_KEY`] key as a bare JSON-encoded integer,
//! so the remaining-attempt count survives application restarts.
//!
//! | Platform | Scope directory |
//! |----------|-----------------|
//! | Windows  | `%APPDATA%\response-recorder\state\<scope>\` |
//! | macOS    | `~/Library/Application Support/response-recorder/state/<scope>/` |
//! | Linux    | `~/.config/response-recorder/state/<scope>/` |

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::AppPaths;

/// Key under which the remaining-attempt count is persisted.
pub const RECORD_ATTEMPTS_KEY: &str = "recordAttempts";

// ---------------------------------------------------------------------------
// KvStore
// ---------------------------------------------------------------------------

/// A tiny JSON-file-per-key store scoped to one exercise.
///
/// Values are written eagerly on every [`set`](Self::set) so a crash or
/// restart never loses more than the in-flight mutation — the same
/// read-after-write contract the attempt counter relies on.
#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    /// Open the store for `scope` under the platform state directory.
    pub fn open_scope(scope: &str) -> Self {
        Self {
            dir: AppPaths::new().state_dir.join(scope),
        }
    }

    /// Open a store rooted at an explicit directory (useful for tests).
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Read and deserialize the value stored under `key`.
    ///
    /// Returns `None` when the key has never been written.  A file that
    /// exists but fails to parse is treated the same way, with a warning —
    /// a corrupt counter should not wedge the recorder.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.key_path(key);
        if !path.exists() {
            return None;
        }
        let data = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring unparseable value at {}: {e}", path.display());
                None
            }
        }
    }

    /// Serialize `value` as JSON and persist it under `key`, creating the
    /// scope directory as needed.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating store scope {}", self.dir.display()))?;
        let path = self.key_path(key);
        let data = serde_json::to_string(value)?;
        std::fs::write(&path, data)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Remove the value stored under `key`, if any.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("removing {}", path.display()))?;
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn get_missing_key_returns_none() {
        let dir = tempdir().expect("temp dir");
        let store = KvStore::at(dir.path().join("scope"));
        assert_eq!(store.get::<i32>(RECORD_ATTEMPTS_KEY), None);
    }

    #[test]
    fn read_after_write_round_trips() {
        let dir = tempdir().expect("temp dir");
        let store = KvStore::at(dir.path().join("scope"));

        store.set(RECORD_ATTEMPTS_KEY, &3_i32).expect("set");
        assert_eq!(store.get::<i32>(RECORD_ATTEMPTS_KEY), Some(3));

        store.set(RECORD_ATTEMPTS_KEY, &2_i32).expect("set");
        assert_eq!(store.get::<i32>(RECORD_ATTEMPTS_KEY), Some(2));
    }

    #[test]
    fn value_is_bare_json_integer_on_disk() {
        let dir = tempdir().expect("temp dir");
        let store = KvStore::at(dir.path().to_path_buf());

        store.set(RECORD_ATTEMPTS_KEY, &5_i32).expect("set");
        let raw = std::fs::read_to_string(dir.path().join("recordAttempts.json")).unwrap();
        assert_eq!(raw, "5");
    }

    #[test]
    fn a_second_store_on_the_same_dir_sees_the_value() {
        // Simulates a page-reload: a fresh handle reads what the old one wrote.
        let dir = tempdir().expect("temp dir");
        let first = KvStore::at(dir.path().to_path_buf());
        first.set(RECORD_ATTEMPTS_KEY, &1_i32).expect("set");

        let second = KvStore::at(dir.path().to_path_buf());
        assert_eq!(second.get::<i32>(RECORD_ATTEMPTS_KEY), Some(1));
    }

    #[test]
    fn scopes_are_independent() {
        let dir = tempdir().expect("temp dir");
        let a = KvStore::at(dir.path().join("exercise-a"));
        let b = KvStore::at(dir.path().join("exercise-b"));

        a.set(RECORD_ATTEMPTS_KEY, &3_i32).expect("set");
        assert_eq!(b.get::<i32>(RECORD_ATTEMPTS_KEY), None);
    }

    #[test]
    fn corrupt_value_reads_as_none() {
        let dir = tempdir().expect("temp dir");
        let store = KvStore::at(dir.path().to_path_buf());
        std::fs::write(dir.path().join("recordAttempts.json"), "not json at all").unwrap();

        assert_eq!(store.get::<i32>(RECORD_ATTEMPTS_KEY), None);
    }

    #[test]
    fn remove_deletes_the_key() {
        let dir = tempdir().expect("temp dir");
        let store = KvStore::at(dir.path().to_path_buf());

        store.set(RECORD_ATTEMPTS_KEY, &4_i32).expect("set");
        store.remove(RECORD_ATTEMPTS_KEY).expect("remove");
        assert_eq!(store.get::<i32>(RECORD_ATTEMPTS_KEY), None);

        // Removing a missing key is fine.
        store.remove(RECORD_ATTEMPTS_KEY).expect("remove again");
    }
}
