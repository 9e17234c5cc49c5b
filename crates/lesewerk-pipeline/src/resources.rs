// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporary artifact lifecycle.
//
// Conversion outputs staged on disk must always be deleted, even when the
// consumer crashes between staging and pickup. Deletion is retried with a
// delay because another process (a virus scanner, a slow reader) may still
// hold the file open when we first try.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lesewerk_core::error::Result;
use tracing::{debug, warn};

/// A fresh opaque token for naming request-scoped artifacts.
pub fn request_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// How hard to try when deleting a temporary file.
#[derive(Debug, Clone)]
pub struct CleanupPolicy {
    /// Total deletion attempts before giving up.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_millis(200),
        }
    }
}

/// Delete a file, retrying per the policy. A file that is already gone
/// counts as removed.
///
/// Deletion failure is never fatal: exhausting the retry budget logs a
/// warning and returns `false`, leaving the file behind.
pub fn remove_file_with_retry(path: &Path, policy: &CleanupPolicy) -> bool {
    remove_file_with_retry_using(path, policy, &mut std::thread::sleep)
}

/// [`remove_file_with_retry`] with the inter-attempt delay routed through
/// `sleep`, so callers can simulate lock contention without real waiting.
pub fn remove_file_with_retry_using(
    path: &Path,
    policy: &CleanupPolicy,
    sleep: &mut dyn FnMut(Duration),
) -> bool {
    let mut attempt = 1u32;
    loop {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), attempt, "temporary file removed");
                return true;
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return true,
            Err(err) if attempt >= policy.max_attempts.max(1) => {
                warn!(
                    path = %path.display(),
                    attempt,
                    %err,
                    "leaking temporary file, retry budget exhausted"
                );
                return false;
            }
            Err(err) => {
                warn!(path = %path.display(), attempt, %err, "removal failed, retrying");
                sleep(policy.retry_delay);
                attempt += 1;
            }
        }
    }
}

/// RAII guard for a temporary file: deleted (with retries) on drop unless
/// ownership is taken with [`TempArtifact::into_path`].
pub struct TempArtifact {
    path: Option<PathBuf>,
    policy: CleanupPolicy,
}

impl TempArtifact {
    /// Guard an existing path.
    pub fn new(path: impl Into<PathBuf>, policy: CleanupPolicy) -> Self {
        Self {
            path: Some(path.into()),
            policy,
        }
    }

    /// Create the file with the given contents and guard it.
    pub fn write(path: impl Into<PathBuf>, bytes: &[u8], policy: CleanupPolicy) -> Result<Self> {
        let path = path.into();
        std::fs::write(&path, bytes)?;
        Ok(Self::new(path, policy))
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().expect("guard holds a path until drop")
    }

    /// Disarm the guard and hand the path to the caller, who now owns
    /// deletion.
    pub fn into_path(mut self) -> PathBuf {
        self.path.take().expect("guard holds a path until drop")
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            remove_file_with_retry(&path, &self.policy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_policy() -> CleanupPolicy {
        CleanupPolicy {
            max_attempts: 3,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn tokens_are_unique_hex() {
        let a = request_token();
        let b = request_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn removes_existing_file_without_sleeping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.pdf");
        std::fs::write(&path, b"data").unwrap();

        let mut sleeps = 0;
        assert!(remove_file_with_retry_using(&path, &quick_policy(), &mut |_| {
            sleeps += 1
        }));
        assert_eq!(sleeps, 0);
        assert!(!path.exists());
    }

    #[test]
    fn retries_until_the_file_becomes_removable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("busy.pdf");
        // A directory at the path makes remove_file fail like a held lock;
        // the injected sleep clears it after the second failed attempt.
        std::fs::create_dir(&path).unwrap();

        let mut sleeps = 0;
        let path_clone = path.clone();
        assert!(remove_file_with_retry_using(&path, &quick_policy(), &mut |_| {
            sleeps += 1;
            if sleeps == 2 {
                std::fs::remove_dir(&path_clone).unwrap();
                std::fs::write(&path_clone, b"now a file").unwrap();
            }
        }));
        assert_eq!(sleeps, 2);
        assert!(!path.exists());
    }

    #[test]
    fn retry_exhaustion_warns_instead_of_raising() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stuck.pdf");
        std::fs::create_dir(&path).unwrap();

        let mut sleeps = 0;
        let removed = remove_file_with_retry_using(&path, &quick_policy(), &mut |_| sleeps += 1);
        assert!(!removed);
        // max_attempts = 3: two sleeps between the three attempts.
        assert_eq!(sleeps, 2);
        assert!(path.exists());
    }

    #[test]
    fn missing_file_counts_as_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-created.pdf");
        assert!(remove_file_with_retry(&path, &quick_policy()));
    }

    #[test]
    fn guard_deletes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guarded.pdf");
        {
            let artifact = TempArtifact::write(&path, b"bytes", quick_policy()).unwrap();
            assert!(artifact.path().exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn into_path_disarms_the_guard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept.pdf");
        let artifact = TempArtifact::write(&path, b"bytes", quick_policy()).unwrap();
        let owned = artifact.into_path();
        assert!(owned.exists());
        std::fs::remove_file(owned).unwrap();
    }
}
