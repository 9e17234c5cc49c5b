// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization via pdfium.

use image::DynamicImage;
use lesewerk_core::error::{LesewerkError, Result};
use pdfium_render::prelude::*;
use tracing::{debug, instrument};

/// One rasterized page plus the geometry needed to map recognition results
/// back into page space.
pub struct RenderedPage {
    /// The rendered page image at the requested DPI.
    pub image: DynamicImage,
    /// Page width in PDF points (1/72 inch).
    pub page_width_pt: f32,
    /// Page height in PDF points.
    pub page_height_pt: f32,
}

impl RenderedPage {
    pub fn width_px(&self) -> u32 {
        self.image.width()
    }

    pub fn height_px(&self) -> u32 {
        self.image.height()
    }
}

/// Rasterizes pages of a PDF held in memory.
///
/// Kept as a trait so the conversion pipeline can run against any rasterizer
/// backend; [`PdfiumRenderer`] is the production implementation.
pub trait PageRenderer {
    /// Number of pages in the document.
    fn page_count(&self, pdf: &[u8]) -> Result<usize>;

    /// Render one page (0-based index) at the given DPI.
    fn render_page(&self, pdf: &[u8], page_index: usize, dpi: u32) -> Result<RenderedPage>;
}

/// Pixel dimensions for a page at the given DPI. PDF points are 72 per inch;
/// a degenerate page still renders at least one pixel on each axis.
fn pixel_dimensions(width_pt: f32, height_pt: f32, dpi: u32) -> (i32, i32) {
    let scale = dpi as f32 / 72.0;
    let width = (width_pt * scale) as i32;
    let height = (height_pt * scale) as i32;
    (width.max(1), height.max(1))
}

/// Production renderer backed by the pdfium library.
///
/// Not `Sync`: pdfium bindings are single-threaded, so each pipeline owns
/// its renderer instead of sharing one.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

impl PdfiumRenderer {
    /// Bind to the pdfium library, preferring a copy next to the executable
    /// and falling back to the system library.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                LesewerkError::Render(format!("failed to bind pdfium library: {err}"))
            })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    fn load<'a>(&'a self, pdf: &'a [u8]) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| LesewerkError::Render(format!("failed to load PDF: {err}")))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn page_count(&self, pdf: &[u8]) -> Result<usize> {
        Ok(self.load(pdf)?.pages().len() as usize)
    }

    #[instrument(skip_all, fields(page_index, dpi))]
    fn render_page(&self, pdf: &[u8], page_index: usize, dpi: u32) -> Result<RenderedPage> {
        let document = self.load(pdf)?;
        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(|err| LesewerkError::Render(format!("page {page_index}: {err}")))?;

        let page_width_pt = page.width().value;
        let page_height_pt = page.height().value;
        let (pixel_width, pixel_height) = pixel_dimensions(page_width_pt, page_height_pt, dpi);

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(pixel_width)
                    .set_target_height(pixel_height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|err| {
                LesewerkError::Render(format!("failed to render page {page_index}: {err}"))
            })?;

        debug!(
            page_index,
            pixel_width, pixel_height, page_width_pt, page_height_pt, "page rendered"
        );

        Ok(RenderedPage {
            image: bitmap.as_image(),
            page_width_pt,
            page_height_pt,
        })
    }
}
