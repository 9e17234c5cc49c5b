// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition preprocessing — grayscale conversion and adaptive binarization
// for noisy scans before text recognition.

use image::DynamicImage;
use imageproc::contrast::adaptive_threshold;
use tracing::{debug, instrument};

/// Neighbourhood radius for local-mean thresholding.
const BLOCK_RADIUS: u32 = 15;

/// Prepare a rendered page image for recognition.
///
/// Converts to grayscale and applies local-mean adaptive thresholding, which
/// evens out uneven illumination in scanned pages. Images too small for the
/// thresholding window are returned as plain grayscale.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn prepare_for_recognition(image: &DynamicImage) -> DynamicImage {
    let gray = image.to_luma8();
    if gray.width() <= BLOCK_RADIUS * 2 || gray.height() <= BLOCK_RADIUS * 2 {
        debug!("image too small for adaptive thresholding, keeping grayscale");
        return DynamicImage::ImageLuma8(gray);
    }

    let binarized = adaptive_threshold(&gray, BLOCK_RADIUS);
    debug!("adaptive binarization complete");
    DynamicImage::ImageLuma8(binarized)
}
