// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in recognition engine backed by the `ocrs` crate — pure-Rust neural
// OCR with models executed via `rten`.
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Models can be obtained by running the `ocrs-cli` tool once:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png  # downloads models to ~/.cache/ocrs/
//   ```
//
// The default cache directory is `$XDG_CACHE_HOME/ocrs` (typically
// `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use image::DynamicImage;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::RawDetection;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::engine::TextRecognizer;
use crate::preprocess::prepare_for_recognition;

/// Engine identifier used in configuration and reports.
pub const OCRS_ENGINE_ID: &str = "ocrs";

/// The `ocrs` line recognizer reports no per-line score, so recognised lines
/// carry this nominal confidence.
const NOMINAL_CONFIDENCE: f32 = 0.9;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Default directory for cached model files.
///
/// Follows the XDG Base Directory specification: `$XDG_CACHE_HOME/ocrs`,
/// falling back to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Configuration for constructing an [`OcrsRecognizer`].
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        let dir = default_model_dir();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }
}

impl OcrsConfig {
    /// Create a config with an explicit model directory.
    ///
    /// Expects the directory to contain `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Create a config pointing at two specific model files.
    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Verify that both model files exist before attempting to load them.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(LesewerkError::EngineUnavailable {
                    engine: OCRS_ENGINE_ID.into(),
                    reason: format!(
                        "model not found at {}; run `ocrs-cli` once to download models",
                        path.display()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Recognition engine backed by `ocrs`.
///
/// Model loading is the expensive step — the registry constructs this once
/// per process and reuses it for every page.
///
/// The `ocrs` and `rten` crates must be compiled in release mode; debug
/// builds are 10-100x slower.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load the detection and recognition models and initialise the engine.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrsConfig) -> Result<Self> {
        config.validate()?;

        info!("loading text-detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            LesewerkError::EngineUnavailable {
                engine: OCRS_ENGINE_ID.into(),
                reason: format!(
                    "failed to load detection model from {}: {}",
                    config.detection_model_path.display(),
                    err
                ),
            }
        })?;

        info!("loading text-recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                LesewerkError::EngineUnavailable {
                    engine: OCRS_ENGINE_ID.into(),
                    reason: format!(
                        "failed to load recognition model from {}: {}",
                        config.recognition_model_path.display(),
                        err
                    ),
                }
            })?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| LesewerkError::EngineUnavailable {
            engine: OCRS_ENGINE_ID.into(),
            reason: format!("failed to initialise engine: {err}"),
        })?;

        info!("ocrs engine initialised");
        Ok(Self { engine })
    }

    fn failed(reason: String) -> LesewerkError {
        LesewerkError::EngineFailed {
            engine: OCRS_ENGINE_ID.into(),
            reason,
        }
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn id(&self) -> &str {
        OCRS_ENGINE_ID
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<RawDetection>> {
        // Binarize before recognition; scanned pages with uneven lighting
        // detect noticeably better this way.
        let prepared = prepare_for_recognition(image);
        let rgb = prepared.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height))
            .map_err(|err| Self::failed(format!("image source ({width}x{height}): {err}")))?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| Self::failed(format!("preprocessing failed: {err}")))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| Self::failed(format!("word detection failed: {err}")))?;
        debug!(word_count = word_rects.len(), "words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| Self::failed(format!("line recognition failed: {err}")))?;

        // Lines the recognizer could not decode come back as `None`; each
        // recognized line carries its own rotated rect.
        let mut detections = Vec::with_capacity(line_texts.len());
        for line in line_texts.iter().flatten() {
            let text = line.to_string();
            if text.trim().is_empty() {
                continue;
            }

            let corners = line.rotated_rect().corners();
            let quad = [
                [corners[0].x, corners[0].y],
                [corners[1].x, corners[1].y],
                [corners[2].x, corners[2].y],
                [corners[3].x, corners[3].y],
            ];
            detections.push(RawDetection {
                quad,
                text,
                confidence: NOMINAL_CONFIDENCE,
            });
        }

        debug!(line_count = detections.len(), "recognition complete");
        Ok(detections)
    }
}
