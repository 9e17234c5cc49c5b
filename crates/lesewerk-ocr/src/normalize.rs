// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw detection → OCR item normalization.

use lesewerk_core::types::{BoundingBox, OcrItem, RawDetection};
use tracing::warn;

/// Normalize raw engine detections into overlay-ready items.
///
/// A detection survives when its confidence meets the threshold and its text
/// is non-empty after trimming. The detection quad is reduced to an
/// axis-aligned bounding box; detections with non-finite coordinates are
/// dropped rather than propagated into overlay geometry.
pub fn normalize_detections(detections: Vec<RawDetection>, threshold: f32) -> Vec<OcrItem> {
    detections
        .into_iter()
        .filter_map(|det| {
            if det.confidence < threshold {
                return None;
            }
            if det.text.trim().is_empty() {
                return None;
            }
            if det.quad.iter().flatten().any(|c| !c.is_finite()) {
                warn!(text = %det.text, "dropping detection with non-finite coordinates");
                return None;
            }
            Some(OcrItem {
                bbox: BoundingBox::from_quad(&det.quad),
                text: det.text,
                confidence: det.confidence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(text: &str, confidence: f32) -> RawDetection {
        RawDetection {
            quad: [[0.0, 0.0], [10.0, 0.0], [10.0, 4.0], [0.0, 4.0]],
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn filters_below_threshold() {
        let items = normalize_detections(
            vec![detection("keep", 0.8), detection("drop", 0.3)],
            0.5,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "keep");
    }

    #[test]
    fn threshold_is_inclusive() {
        let items = normalize_detections(vec![detection("edge", 0.5)], 0.5);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn zero_threshold_keeps_everything_with_text() {
        let items = normalize_detections(
            vec![detection("a", 0.0), detection("b", 0.01)],
            0.0,
        );
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn drops_whitespace_only_text() {
        let items = normalize_detections(
            vec![detection("   ", 0.9), detection("", 0.9), detection("ok", 0.9)],
            0.5,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "ok");
    }

    #[test]
    fn drops_non_finite_coordinates() {
        let mut bad = detection("garbled", 0.9);
        bad.quad[2][0] = f32::NAN;
        let items = normalize_detections(vec![bad, detection("fine", 0.9)], 0.5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "fine");
    }

    #[test]
    fn reduces_quad_to_bbox() {
        let rotated = RawDetection {
            quad: [[12.0, 3.0], [40.0, 7.0], [38.0, 19.0], [10.0, 15.0]],
            text: "tilted".into(),
            confidence: 0.9,
        };
        let items = normalize_detections(vec![rotated], 0.5);
        let bbox = items[0].bbox;
        assert_eq!(bbox.x1, 10.0);
        assert_eq!(bbox.y1, 3.0);
        assert_eq!(bbox.x2, 40.0);
        assert_eq!(bbox.y2, 19.0);
    }
}
