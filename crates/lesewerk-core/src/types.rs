// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Lesewerk conversion engine.
//
// Pixel-space shapes flow adapter → normalizer → selector; point-space
// conversion happens only in the overlay composer. Page indices are 0-based
// everywhere.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LesewerkError;

/// One raw recognition result from an OCR engine, in pixel space.
///
/// Every engine adapter translates its native result shape into this form
/// before anything downstream sees it. The quad is the detected region's
/// four corners in order; it is not assumed to be axis-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    /// Four corner points, `[x, y]` each, in image pixel coordinates.
    pub quad: [[f32; 2]; 4],
    /// Recognised text for this region.
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Axis-aligned bounding box, `(x1, y1)` top-left to `(x2, y2)` bottom-right
/// in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Reduce a detection quad to its axis-aligned bounding box.
    pub fn from_quad(quad: &[[f32; 2]; 4]) -> Self {
        let mut x1 = f32::INFINITY;
        let mut y1 = f32::INFINITY;
        let mut x2 = f32::NEG_INFINITY;
        let mut y2 = f32::NEG_INFINITY;
        for [x, y] in quad {
            x1 = x1.min(*x);
            y1 = y1.min(*y);
            x2 = x2.max(*x);
            y2 = y2.max(*y);
        }
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// A normalized recognition item: confidence-filtered, non-empty text,
/// quad reduced to a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrItem {
    pub text: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// Result of one engine on one page, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEngineResult {
    /// Surviving items, in the order the engine reported them.
    pub items: Vec<OcrItem>,
    /// Arithmetic mean of the surviving items' confidences.
    pub avg_confidence: f32,
    /// Number of surviving items.
    pub count: usize,
}

impl PageEngineResult {
    pub fn from_items(items: Vec<OcrItem>) -> Self {
        let count = items.len();
        let avg_confidence = if count == 0 {
            0.0
        } else {
            items.iter().map(|i| i.confidence).sum::<f32>() / count as f32
        };
        Self {
            items,
            avg_confidence,
            count,
        }
    }
}

/// Per-page outcome of running the configured engines.
///
/// Engines that produced no surviving items do not appear in
/// `engine_results`. `best_engine` is `None` when no engine produced items —
/// that page gets no overlay.
#[derive(Debug, Clone, Default)]
pub struct PageOcr {
    pub engine_results: BTreeMap<String, PageEngineResult>,
    pub best_engine: Option<String>,
    pub best_confidence: f32,
}

impl PageOcr {
    /// Items of the winning engine, if any engine produced items.
    pub fn best_items(&self) -> Option<&[OcrItem]> {
        let engine = self.best_engine.as_deref()?;
        self.engine_results.get(engine).map(|r| r.items.as_slice())
    }
}

/// Serializable per-engine summary for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub avg_confidence: f32,
    pub count: usize,
}

/// Serializable per-page detail included in the conversion report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 0-based page index.
    pub page_index: usize,
    pub engines: BTreeMap<String, EngineSummary>,
    pub best_engine: Option<String>,
    pub best_confidence: f32,
    /// Whether an invisible text layer was merged onto this page.
    pub has_overlay: bool,
}

impl PageReport {
    /// Build the report row for a page from its OCR outcome.
    pub fn from_ocr(page_index: usize, ocr: &PageOcr, has_overlay: bool) -> Self {
        let engines = ocr
            .engine_results
            .iter()
            .map(|(name, r)| {
                (
                    name.clone(),
                    EngineSummary {
                        avg_confidence: r.avg_confidence,
                        count: r.count,
                    },
                )
            })
            .collect();
        Self {
            page_index,
            engines,
            best_engine: ocr.best_engine.clone(),
            best_confidence: ocr.best_confidence,
            has_overlay,
        }
    }

    /// Report row for a page that failed before OCR ran.
    pub fn empty(page_index: usize) -> Self {
        Self {
            page_index,
            engines: BTreeMap::new(),
            best_engine: None,
            best_confidence: 0.0,
            has_overlay: false,
        }
    }
}

/// Aggregated accuracy of one engine across the document.
///
/// Only pages where the engine produced at least one item contribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineAccuracy {
    pub avg_confidence: f32,
    pub total_text_count: usize,
    pub pages_processed: usize,
}

/// Successful conversion outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub pages_processed: usize,
    pub accuracy_summary: BTreeMap<String, EngineAccuracy>,
    pub pages: Vec<PageReport>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Aggregate per-engine accuracy over a document's page reports.
pub fn aggregate_accuracy(pages: &[PageReport]) -> BTreeMap<String, EngineAccuracy> {
    let mut summary: BTreeMap<String, EngineAccuracy> = BTreeMap::new();
    for page in pages {
        for (engine, s) in &page.engines {
            let entry = summary.entry(engine.clone()).or_insert(EngineAccuracy {
                avg_confidence: 0.0,
                total_text_count: 0,
                pages_processed: 0,
            });
            // avg_confidence accumulates a sum here; divided once below.
            entry.avg_confidence += s.avg_confidence;
            entry.total_text_count += s.count;
            entry.pages_processed += 1;
        }
    }
    for acc in summary.values_mut() {
        acc.avg_confidence /= acc.pages_processed as f32;
    }
    summary
}

/// Boundary-facing response shape for the (external) request layer.
///
/// Collapses `Result<ConversionReport, LesewerkError>` into the flat
/// success/error form the caller serializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_summary: Option<BTreeMap<String, EngineAccuracy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<PageReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<std::result::Result<ConversionReport, LesewerkError>> for ConversionResponse {
    fn from(result: std::result::Result<ConversionReport, LesewerkError>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                pages_processed: Some(report.pages_processed),
                accuracy_summary: Some(report.accuracy_summary),
                pages: Some(report.pages),
                error: None,
            },
            Err(err) => Self {
                success: false,
                pages_processed: None,
                accuracy_summary: None,
                pages: None,
                error: Some(err.to_string()),
            },
        }
    }
}
