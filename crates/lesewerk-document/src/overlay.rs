// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Invisible text overlay synthesis.
//
// Produces a PDF content stream that paints each recognized item in text
// rendering mode 3 (invisible) at its page-space position, so the merged
// document becomes searchable without changing its appearance.

use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::OcrItem;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, StringFormat, dictionary};
use tracing::{debug, instrument};

/// Resource key under which the overlay font is registered on each page.
/// Shared with the composer; chosen to be unlikely to collide with fonts
/// already present in scanned documents.
pub const OVERLAY_FONT_KEY: &str = "LwOcr";

/// Smallest font size used for overlay text, in points.
pub const MIN_FONT_SIZE_PT: f32 = 6.0;

/// Overlay text is sized to this fraction of the detected region height, so
/// glyph extents stay inside the region.
const FONT_HEIGHT_FRACTION: f32 = 0.9;

/// Font dictionary for overlay text: built-in Helvetica with WinAnsi
/// encoding, which needs no embedded font program.
pub(crate) fn overlay_font_dictionary() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Build the invisible-text content stream for one page.
///
/// Item bounding boxes are in image pixel space with a top-left origin;
/// the produced operations are in page point space with PDF's bottom-left
/// origin. Each item's baseline sits at the bottom edge of its scaled box.
#[instrument(skip_all, fields(items = items.len()))]
pub fn synthesize_overlay(
    items: &[OcrItem],
    image_width_px: u32,
    image_height_px: u32,
    page_width_pt: f32,
    page_height_pt: f32,
) -> Result<Vec<u8>> {
    if image_width_px == 0 || image_height_px == 0 {
        return Err(LesewerkError::Overlay(format!(
            "rendered image has degenerate dimensions {image_width_px}x{image_height_px}"
        )));
    }

    let scale_x = page_width_pt / image_width_px as f32;
    let scale_y = page_height_pt / image_height_px as f32;

    let mut operations = Vec::with_capacity(items.len() * 6);
    for item in items {
        let x_pt = item.bbox.x1 * scale_x;
        let y1_pt = item.bbox.y1 * scale_y;
        let y2_pt = item.bbox.y2 * scale_y;

        let font_size = ((y2_pt - y1_pt) * FONT_HEIGHT_FRACTION).max(MIN_FONT_SIZE_PT);
        let baseline_y = page_height_pt - y2_pt;

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(OVERLAY_FONT_KEY.into()), font_size.into()],
        ));
        // Rendering mode 3: neither filled nor stroked.
        operations.push(Operation::new("Tr", vec![3.into()]));
        operations.push(Operation::new("Td", vec![x_pt.into(), baseline_y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(&item.text),
                StringFormat::Literal,
            )],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let encoded = Content { operations }
        .encode()
        .map_err(|err| LesewerkError::Overlay(format!("content stream encoding: {err}")))?;

    debug!(bytes = encoded.len(), "overlay content synthesized");
    Ok(encoded)
}

/// Encode text as WinAnsi (CP1252) bytes.
///
/// ASCII and Latin-1 characters map directly; the CP1252-specific
/// typographic characters get their codepage positions. Anything else is
/// replaced with `?` — the text stays searchable even if a rare glyph is
/// approximated.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u8,
            '\u{20ac}' => 0x80, // €
            '\u{201a}' => 0x82,
            '\u{192}' => 0x83,
            '\u{201e}' => 0x84,
            '\u{2026}' => 0x85, // …
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{2c6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{160}' => 0x8a,
            '\u{2039}' => 0x8b,
            '\u{152}' => 0x8c,
            '\u{17d}' => 0x8e,
            '\u{2018}' => 0x91, // ‘
            '\u{2019}' => 0x92, // ’
            '\u{201c}' => 0x93, // “
            '\u{201d}' => 0x94, // ”
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96, // –
            '\u{2014}' => 0x97, // —
            '\u{2dc}' => 0x98,
            '\u{2122}' => 0x99, // ™
            '\u{161}' => 0x9a,
            '\u{203a}' => 0x9b,
            '\u{153}' => 0x9c,
            '\u{17e}' => 0x9e,
            '\u{178}' => 0x9f,
            _ => b'?',
        })
        .collect()
}
