// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page engine execution and best-engine selection.

use image::DynamicImage;
use lesewerk_core::types::{PageEngineResult, PageOcr};
use tracing::{debug, instrument, warn};

use crate::normalize::normalize_detections;
use crate::registry::EngineRegistry;

/// Run the configured engines over one page image and pick the winner.
///
/// Engines run in configured order. An engine that cannot be constructed or
/// that fails on this page is skipped with a warning; the page continues
/// with the remaining engines. Engines whose normalized output is empty are
/// left out of the result entirely.
///
/// The winning engine is the one with the strictly greatest mean confidence;
/// on a tie the earlier-configured engine keeps the win.
#[instrument(skip_all, fields(engines = engine_ids.len()))]
pub fn run_engines(
    registry: &EngineRegistry,
    engine_ids: &[String],
    image: &DynamicImage,
    confidence_threshold: f32,
) -> PageOcr {
    let mut ocr = PageOcr::default();

    for id in engine_ids {
        let engine = match registry.recognizer(id) {
            Ok(engine) => engine,
            Err(err) => {
                warn!(engine = %id, error = %err, "skipping engine");
                continue;
            }
        };

        let detections = match engine.recognize(image) {
            Ok(detections) => detections,
            Err(err) => {
                warn!(engine = %id, error = %err, "engine failed on page");
                continue;
            }
        };

        let items = normalize_detections(detections, confidence_threshold);
        if items.is_empty() {
            debug!(engine = %id, "no items survived normalization");
            continue;
        }

        let result = PageEngineResult::from_items(items);
        debug!(
            engine = %id,
            count = result.count,
            avg_confidence = result.avg_confidence,
            "engine produced items"
        );

        // Strict comparison: an equal score never displaces the
        // earlier-configured winner.
        if ocr.best_engine.is_none() || result.avg_confidence > ocr.best_confidence {
            ocr.best_engine = Some(id.clone());
            ocr.best_confidence = result.avg_confidence;
        }
        ocr.engine_results.insert(id.clone(), result);
    }

    ocr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TextRecognizer;
    use lesewerk_core::error::{LesewerkError, Result};
    use lesewerk_core::types::RawDetection;
    use std::sync::Arc;

    struct FixedEngine {
        id: String,
        detections: Vec<RawDetection>,
    }

    impl TextRecognizer for FixedEngine {
        fn id(&self) -> &str {
            &self.id
        }
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>> {
            Ok(self.detections.clone())
        }
    }

    struct FailingEngine;

    impl TextRecognizer for FailingEngine {
        fn id(&self) -> &str {
            "failing"
        }
        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<RawDetection>> {
            Err(LesewerkError::EngineFailed {
                engine: "failing".into(),
                reason: "inference aborted".into(),
            })
        }
    }

    fn detection(text: &str, confidence: f32) -> RawDetection {
        RawDetection {
            quad: [[0.0, 0.0], [10.0, 0.0], [10.0, 4.0], [0.0, 4.0]],
            text: text.to_string(),
            confidence,
        }
    }

    fn fixed(id: &str, confidences: &[f32]) -> Arc<dyn TextRecognizer> {
        Arc::new(FixedEngine {
            id: id.to_string(),
            detections: confidences
                .iter()
                .enumerate()
                .map(|(i, &c)| detection(&format!("word{i}"), c))
                .collect(),
        })
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn blank() -> DynamicImage {
        DynamicImage::new_luma8(8, 8)
    }

    #[test]
    fn highest_mean_confidence_wins() {
        let mut registry = EngineRegistry::empty();
        registry.register_instance(fixed("low", &[0.6, 0.6]));
        registry.register_instance(fixed("high", &[0.9, 0.7]));

        let ocr = run_engines(&registry, &ids(&["low", "high"]), &blank(), 0.5);
        assert_eq!(ocr.best_engine.as_deref(), Some("high"));
        assert!((ocr.best_confidence - 0.8).abs() < 1e-6);
        assert_eq!(ocr.engine_results.len(), 2);
    }

    #[test]
    fn tie_goes_to_earlier_configured_engine() {
        let mut registry = EngineRegistry::empty();
        registry.register_instance(fixed("first", &[0.8]));
        registry.register_instance(fixed("second", &[0.8]));

        let ocr = run_engines(&registry, &ids(&["first", "second"]), &blank(), 0.5);
        assert_eq!(ocr.best_engine.as_deref(), Some("first"));
    }

    #[test]
    fn failing_engine_is_skipped() {
        let mut registry = EngineRegistry::empty();
        registry.register_instance(Arc::new(FailingEngine));
        registry.register_instance(fixed("ok", &[0.7]));

        let ocr = run_engines(&registry, &ids(&["failing", "ok"]), &blank(), 0.5);
        assert_eq!(ocr.best_engine.as_deref(), Some("ok"));
        assert!(!ocr.engine_results.contains_key("failing"));
    }

    #[test]
    fn unavailable_engine_is_skipped() {
        let mut registry = EngineRegistry::empty();
        registry.register("absent", || {
            Err(LesewerkError::EngineUnavailable {
                engine: "absent".into(),
                reason: "models missing".into(),
            })
        });
        registry.register_instance(fixed("ok", &[0.7]));

        let ocr = run_engines(&registry, &ids(&["absent", "ok"]), &blank(), 0.5);
        assert_eq!(ocr.best_engine.as_deref(), Some("ok"));
    }

    #[test]
    fn empty_page_has_no_best_engine() {
        let mut registry = EngineRegistry::empty();
        registry.register_instance(fixed("quiet", &[]));

        let ocr = run_engines(&registry, &ids(&["quiet"]), &blank(), 0.5);
        assert!(ocr.best_engine.is_none());
        assert!(ocr.engine_results.is_empty());
        assert!(ocr.best_items().is_none());
    }

    #[test]
    fn engine_with_all_items_filtered_is_omitted() {
        let mut registry = EngineRegistry::empty();
        registry.register_instance(fixed("faint", &[0.2, 0.3]));
        registry.register_instance(fixed("clear", &[0.9]));

        let ocr = run_engines(&registry, &ids(&["faint", "clear"]), &blank(), 0.5);
        assert_eq!(ocr.engine_results.len(), 1);
        assert_eq!(ocr.best_engine.as_deref(), Some("clear"));
    }

    #[test]
    fn high_threshold_can_silence_every_engine() {
        let mut registry = EngineRegistry::empty();
        registry.register_instance(fixed("a", &[0.9, 0.8]));

        let ocr = run_engines(&registry, &ids(&["a"]), &blank(), 0.95);
        assert!(ocr.best_engine.is_none());
    }
}
