// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Lesewerk.
//
// The variants encode the failure scope policy: render, overlay, and
// per-engine failures are page- or engine-scoped and are absorbed inside the
// per-page loop; composition, configuration, and resource-creation failures
// are fatal to the whole conversion.

use thiserror::Error;

/// Top-level error type for all Lesewerk operations.
#[derive(Debug, Error)]
pub enum LesewerkError {
    // -- Page-scoped --
    #[error("page rasterization failed: {0}")]
    Render(String),

    #[error("overlay synthesis failed: {0}")]
    Overlay(String),

    // -- Engine-scoped --
    #[error("OCR engine '{engine}' unavailable: {reason}")]
    EngineUnavailable { engine: String, reason: String },

    #[error("OCR engine '{engine}' failed: {reason}")]
    EngineFailed { engine: String, reason: String },

    // -- Configuration --
    #[error("unsupported OCR engine: {0}")]
    UnsupportedEngine(String),

    #[error("invalid conversion configuration: {0}")]
    InvalidConfig(String),

    // -- Document-fatal --
    #[error("document composition failed: {0}")]
    Composition(String),

    #[error("temporary artifact error: {0}")]
    Resource(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LesewerkError {
    /// Whether this error may be absorbed at the per-page boundary.
    ///
    /// Page-scoped and engine-scoped errors leave the page without an
    /// overlay; everything else aborts the conversion.
    pub fn is_page_scoped(&self) -> bool {
        matches!(
            self,
            Self::Render(_)
                | Self::Overlay(_)
                | Self::EngineUnavailable { .. }
                | Self::EngineFailed { .. }
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LesewerkError>;
