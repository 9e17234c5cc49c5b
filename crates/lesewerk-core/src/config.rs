// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion request configuration.

use serde::{Deserialize, Serialize};

use crate::error::{LesewerkError, Result};

/// Default rasterization resolution in dots per inch.
pub const DEFAULT_DPI: u32 = 300;

/// Default minimum per-item recognition confidence.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Settings for one conversion request.
///
/// Engine order is significant: when two engines tie on mean confidence the
/// earlier-configured one wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Rasterization resolution for OCR input images.
    pub dpi: u32,
    /// Items below this confidence are dropped during normalization.
    pub confidence_threshold: f32,
    /// Ordered list of engine identifiers to run per page.
    pub engines: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            engines: vec!["ocrs".to_string()],
        }
    }
}

impl ConversionConfig {
    /// Check the request parameters before any page work starts.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(LesewerkError::InvalidConfig("dpi must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(LesewerkError::InvalidConfig(format!(
                "confidence_threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.engines.is_empty() {
            return Err(LesewerkError::InvalidConfig(
                "at least one OCR engine must be configured".into(),
            ));
        }
        Ok(())
    }
}
