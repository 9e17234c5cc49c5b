// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The recognition capability contract.

use image::DynamicImage;
use lesewerk_core::error::Result;
use lesewerk_core::types::RawDetection;

/// A text-recognition engine.
///
/// Implementations wrap an external recognition capability and translate its
/// native result shape into [`RawDetection`] before returning, so that no
/// downstream code ever branches on engine identity.
///
/// Engines are constructed at most once per process (see
/// [`EngineRegistry`](crate::registry::EngineRegistry)) and must tolerate
/// concurrent `recognize` calls, which is why the trait requires
/// `Send + Sync`. An engine whose underlying capability is not itself
/// concurrency-safe must serialize access internally.
pub trait TextRecognizer: Send + Sync {
    /// The engine identifier, e.g. `"ocrs"`.
    fn id(&self) -> &str;

    /// Recognize text regions in a rendered page image.
    ///
    /// May return an empty sequence — that is a valid result, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LesewerkError::EngineFailed`](lesewerk_core::LesewerkError)
    /// when the call itself fails.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawDetection>>;
}

impl std::fmt::Debug for dyn TextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRecognizer")
            .field("id", &self.id())
            .finish()
    }
}
