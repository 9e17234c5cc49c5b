// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-pipeline — the conversion orchestrator.
//
// Drives the per-page render → recognize → overlay loop, merges the result
// onto the original document, and assembles the conversion report. Also owns
// the lifecycle of temporary artifacts (staged outputs, one-shot pickup,
// retried deletion).

pub mod artifacts;
pub mod orchestrator;
pub mod resources;

pub use artifacts::ArtifactStore;
pub use orchestrator::{Pipeline, ProgressFn};
pub use resources::{
    CleanupPolicy, TempArtifact, remove_file_with_retry, remove_file_with_retry_using,
    request_token,
};
