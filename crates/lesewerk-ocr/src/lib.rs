// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-ocr — Text recognition boundary for the Lesewerk conversion engine.
//
// Provides the `TextRecognizer` trait that pluggable engines implement, a
// process-wide registry with guarded one-time engine construction, result
// normalization, per-page engine selection, and recognition preprocessing.
// The built-in `ocrs` engine (pure-Rust neural OCR via `rten`) is available
// behind the "ocrs" feature.

pub mod engine;
pub mod normalize;
pub mod preprocess;
pub mod registry;
pub mod select;

#[cfg(feature = "ocrs")]
pub mod ocrs;

pub use engine::TextRecognizer;
pub use normalize::normalize_detections;
pub use registry::EngineRegistry;
pub use select::run_engines;

#[cfg(feature = "ocrs")]
pub use ocrs::{OcrsConfig, OcrsRecognizer};
