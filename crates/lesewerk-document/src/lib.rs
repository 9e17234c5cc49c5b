// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-document — PDF handling for the Lesewerk conversion engine.
//
// Three concerns live here: rasterizing source pages for recognition
// (`render`, via pdfium), synthesizing invisible text-layer content streams
// from recognition items (`overlay`, via lopdf), and merging those streams
// onto the original document (`compose`, via lopdf).

pub mod compose;
pub mod overlay;
pub mod render;

pub use compose::DocumentComposer;
pub use overlay::synthesize_overlay;
pub use render::{PageRenderer, PdfiumRenderer, RenderedPage};
