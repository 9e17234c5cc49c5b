// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Staged conversion outputs with one-shot pickup semantics.

use std::path::{Path, PathBuf};

use lesewerk_core::error::{LesewerkError, Result};
use tracing::{debug, instrument};

use crate::resources::{CleanupPolicy, remove_file_with_retry};

/// Stores finished conversion outputs under opaque tokens until they are
/// collected exactly once.
///
/// `stage` writes the bytes under the token; `take` reads them back and
/// deletes the file (with retries), so a second `take` for the same token
/// fails. This keeps the staging directory from accumulating outputs whose
/// consumers never return.
pub struct ArtifactStore {
    root: PathBuf,
    policy: CleanupPolicy,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: CleanupPolicy::default(),
        }
    }

    pub fn with_policy(root: impl Into<PathBuf>, policy: CleanupPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    fn artifact_path(&self, token: &str) -> PathBuf {
        self.root.join(format!("{token}.pdf"))
    }

    /// Stage output bytes under the given token.
    #[instrument(skip_all, fields(token, bytes = bytes.len()))]
    pub fn stage(&self, token: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.artifact_path(token);
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), "artifact staged");
        Ok(path)
    }

    /// Whether an artifact is currently staged for the token.
    pub fn contains(&self, token: &str) -> bool {
        self.artifact_path(token).exists()
    }

    /// Collect a staged artifact, removing it from the store.
    ///
    /// Once the bytes are read the retrieval has succeeded; a deletion that
    /// exhausts its retries is logged by the cleanup helper and never turns
    /// into an error here.
    #[instrument(skip_all, fields(token))]
    pub fn take(&self, token: &str) -> Result<Vec<u8>> {
        let path = self.artifact_path(token);
        let bytes = std::fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                LesewerkError::Resource(format!("no staged artifact for token {token}"))
            } else {
                LesewerkError::Io(err)
            }
        })?;
        remove_file_with_retry(&path, &self.policy);
        debug!(bytes = bytes.len(), "artifact collected");
        Ok(bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
