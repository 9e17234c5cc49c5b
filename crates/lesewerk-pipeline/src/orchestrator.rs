// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The conversion orchestrator.
//
// Pages are processed strictly in order. Render and overlay failures are
// absorbed per page (the page passes through without a text layer);
// configuration and composition failures abort the conversion. The output
// document is written once, after every page has been processed.

use std::path::Path;

use chrono::Utc;
use lesewerk_core::config::ConversionConfig;
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::types::{ConversionReport, PageOcr, PageReport, aggregate_accuracy};
use lesewerk_document::compose::DocumentComposer;
use lesewerk_document::overlay::synthesize_overlay;
use lesewerk_document::render::PageRenderer;
use lesewerk_ocr::registry::EngineRegistry;
use lesewerk_ocr::select::run_engines;
use tracing::{info, instrument, warn};

/// Progress callback: `(current_page, total_pages, message)`. Called once
/// per page before its work starts and once after composition.
pub type ProgressFn<'a> = dyn FnMut(usize, usize, &str) + 'a;

/// Converts scanned PDFs into searchable ones.
///
/// Owns its renderer (pdfium bindings are single-threaded) and borrows the
/// engine registry, which is shared across pipelines so engines load once.
pub struct Pipeline<'r, R: PageRenderer> {
    renderer: R,
    registry: &'r EngineRegistry,
}

impl<'r, R: PageRenderer> Pipeline<'r, R> {
    pub fn new(renderer: R, registry: &'r EngineRegistry) -> Self {
        Self { renderer, registry }
    }

    /// Convert a PDF file on disk, writing the searchable result to `output`.
    #[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        config: &ConversionConfig,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<ConversionReport> {
        let pdf = std::fs::read(input)?;
        let (composed, report) = self.convert_bytes(&pdf, config, progress)?;
        std::fs::write(output, composed)?;
        Ok(report)
    }

    /// Convert an in-memory PDF, returning the composed document and report.
    #[instrument(skip_all, fields(bytes = pdf.len()))]
    pub fn convert_bytes(
        &self,
        pdf: &[u8],
        config: &ConversionConfig,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<(Vec<u8>, ConversionReport)> {
        let started_at = Utc::now();

        config.validate()?;
        self.registry.ensure_supported(&config.engines)?;

        let total = self.renderer.page_count(pdf)?;
        let composer = DocumentComposer::from_bytes(pdf)?;
        if composer.page_count() != total {
            return Err(LesewerkError::Composition(format!(
                "rasterizer sees {} pages but document structure has {}",
                total,
                composer.page_count()
            )));
        }

        info!(pages = total, engines = ?config.engines, "conversion started");

        let mut overlays: Vec<Option<Vec<u8>>> = Vec::with_capacity(total);
        let mut pages: Vec<PageReport> = Vec::with_capacity(total);

        for index in 0..total {
            if let Some(cb) = progress.as_deref_mut() {
                cb(index + 1, total, &format!("processing page {}", index + 1));
            }

            let rendered = match self.renderer.render_page(pdf, index, config.dpi) {
                Ok(page) => page,
                Err(err) if err.is_page_scoped() => {
                    warn!(page = index, %err, "page skipped");
                    pages.push(PageReport::empty(index));
                    overlays.push(None);
                    continue;
                }
                Err(err) => return Err(err),
            };

            // Engines receive the rendered page as-is; any preprocessing
            // (binarization, contrast) is the engine's own concern.
            let ocr: PageOcr = run_engines(
                self.registry,
                &config.engines,
                &rendered.image,
                config.confidence_threshold,
            );

            let overlay = match ocr.best_items() {
                Some(items) => match synthesize_overlay(
                    items,
                    rendered.width_px(),
                    rendered.height_px(),
                    rendered.page_width_pt,
                    rendered.page_height_pt,
                ) {
                    Ok(content) => Some(content),
                    Err(err) if err.is_page_scoped() => {
                        warn!(page = index, %err, "overlay skipped");
                        None
                    }
                    Err(err) => return Err(err),
                },
                None => None,
            };

            pages.push(PageReport::from_ocr(index, &ocr, overlay.is_some()));
            overlays.push(overlay);
        }

        let composed = composer.compose(&overlays)?;
        let accuracy_summary = aggregate_accuracy(&pages);

        if let Some(cb) = progress.as_deref_mut() {
            cb(total, total, "conversion complete");
        }

        let report = ConversionReport {
            pages_processed: total,
            accuracy_summary,
            pages,
            started_at,
            completed_at: Utc::now(),
        };
        info!(
            pages = report.pages_processed,
            overlaid = report.pages.iter().filter(|p| p.has_overlay).count(),
            "conversion finished"
        );
        Ok((composed, report))
    }
}
