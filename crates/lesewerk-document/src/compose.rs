// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merges synthesized text overlays onto the original document.
//
// The original bytes are loaded once; each overlaid page has its existing
// content wrapped in `q`/`Q` so leaked graphics state cannot affect the
// appended overlay stream, and the overlay font is registered in that page's
// resources. Pages without an overlay pass through untouched.

use lesewerk_core::error::{LesewerkError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, instrument};

use crate::overlay::{OVERLAY_FONT_KEY, overlay_font_dictionary};

/// Applies per-page text overlays to a PDF held in memory.
pub struct DocumentComposer {
    document: Document,
    /// Page object ids in document order.
    page_ids: Vec<ObjectId>,
}

impl DocumentComposer {
    /// Load the original document from bytes.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            LesewerkError::Composition(format!("failed to load original PDF: {err}"))
        })?;

        // get_pages is keyed by 1-indexed page number; BTreeMap iteration
        // yields document order.
        let page_ids: Vec<ObjectId> = document.get_pages().values().copied().collect();
        debug!(pages = page_ids.len(), "original document loaded");

        Ok(Self { document, page_ids })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Merge the overlays (one slot per page, `None` meaning no overlay) and
    /// serialize the composed document.
    #[instrument(skip_all, fields(pages = overlays.len()))]
    pub fn compose(mut self, overlays: &[Option<Vec<u8>>]) -> Result<Vec<u8>> {
        if overlays.len() != self.page_ids.len() {
            return Err(LesewerkError::Composition(format!(
                "{} overlay slots for a {} page document",
                overlays.len(),
                self.page_ids.len()
            )));
        }

        let page_ids = self.page_ids.clone();
        let mut overlaid = 0usize;
        for (page_id, overlay) in page_ids.into_iter().zip(overlays) {
            if let Some(content) = overlay {
                self.apply_overlay(page_id, content)?;
                overlaid += 1;
            }
        }

        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            LesewerkError::Composition(format!("failed to serialize composed PDF: {err}"))
        })?;

        info!(overlaid, bytes = output.len(), "document composed");
        Ok(output)
    }

    fn apply_overlay(&mut self, page_id: ObjectId, content: &[u8]) -> Result<()> {
        self.attach_overlay_font(page_id)?;

        let existing: Vec<Object> = match self.page_dict(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            Ok(Object::Array(refs)) => refs.clone(),
            _ => Vec::new(),
        };

        let open = self
            .document
            .add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let close = self
            .document
            .add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
        let overlay = self
            .document
            .add_object(Stream::new(dictionary! {}, content.to_vec()));

        let mut contents = Vec::with_capacity(existing.len() + 3);
        contents.push(Object::Reference(open));
        contents.extend(existing);
        contents.push(Object::Reference(close));
        contents.push(Object::Reference(overlay));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Register the overlay font under [`OVERLAY_FONT_KEY`] in the page's own
    /// resources, materializing inherited resources onto the page first.
    fn attach_overlay_font(&mut self, page_id: ObjectId) -> Result<()> {
        let mut resources = self.resolved_resources(page_id)?;

        let mut fonts = match resources.get(b"Font") {
            Ok(Object::Reference(id)) => self.dict_at(*id)?.clone(),
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        fonts.set(OVERLAY_FONT_KEY, Object::Dictionary(overlay_font_dictionary()));
        resources.set("Font", Object::Dictionary(fonts));

        self.page_dict_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    /// The page's effective resource dictionary: its own entry if present,
    /// otherwise the nearest one inherited through the `/Parent` chain.
    /// Referenced entries within the returned clone stay valid because they
    /// point into the same document.
    fn resolved_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut node = page_id;
        loop {
            let dict = self.page_dict(node)?;
            match dict.get(b"Resources") {
                Ok(Object::Reference(id)) => return Ok(self.dict_at(*id)?.clone()),
                Ok(Object::Dictionary(resources)) => return Ok(resources.clone()),
                _ => {}
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => node = *parent,
                _ => return Ok(Dictionary::new()),
            }
        }
    }

    fn dict_at(&self, id: ObjectId) -> Result<&Dictionary> {
        self.document
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|err| LesewerkError::Composition(format!("object {id:?}: {err}")))
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.document
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| LesewerkError::Composition(format!("page object {page_id:?}: {err}")))
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.document
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| LesewerkError::Composition(format!("page object {page_id:?}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::synthesize_overlay;
    use lesewerk_core::types::{BoundingBox, OcrItem};
    use lopdf::content::{Content, Operation};

    /// Build a minimal scanned-style PDF: pages with a bare content stream,
    /// resources inherited from the page tree root.
    fn minimal_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for _ in 0..page_count {
            let content = Content {
                operations: vec![
                    Operation::new("g", vec![0.5f32.into()]),
                    Operation::new(
                        "re",
                        vec![10.into(), 10.into(), 100.into(), 50.into()],
                    ),
                    Operation::new("f", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => dictionary! {},
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        doc.save_to(&mut output).unwrap();
        output
    }

    fn overlay_for(text: &str) -> Vec<u8> {
        let items = vec![OcrItem {
            text: text.to_string(),
            bbox: BoundingBox {
                x1: 100.0,
                y1: 100.0,
                x2: 400.0,
                y2: 140.0,
            },
            confidence: 0.9,
        }];
        synthesize_overlay(&items, 2550, 3300, 612.0, 792.0).unwrap()
    }

    #[test]
    fn overlaid_page_gains_wrapped_contents_and_font() {
        let original = minimal_pdf(1);
        let composer = DocumentComposer::from_bytes(&original).unwrap();
        let output = composer.compose(&[Some(overlay_for("searchable"))]).unwrap();

        let doc = Document::load_mem(&output).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();

        // q-wrapper, original stream, Q-wrapper, overlay stream.
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 4);

        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        let font = fonts
            .get(OVERLAY_FONT_KEY.as_bytes())
            .unwrap()
            .as_dict()
            .unwrap();
        assert_eq!(font.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    }

    #[test]
    fn pages_without_overlay_pass_through() {
        let original = minimal_pdf(2);
        let composer = DocumentComposer::from_bytes(&original).unwrap();
        let output = composer
            .compose(&[None, Some(overlay_for("page two"))])
            .unwrap();

        let doc = Document::load_mem(&output).unwrap();
        let pages = doc.get_pages();
        let first = doc
            .get_object(pages[&1])
            .unwrap()
            .as_dict()
            .unwrap();
        // Untouched page keeps its single content stream reference.
        assert!(matches!(
            first.get(b"Contents").unwrap(),
            Object::Reference(_)
        ));
        assert!(first.get(b"Resources").is_err());

        let second = doc.get_object(pages[&2]).unwrap().as_dict().unwrap();
        assert_eq!(second.get(b"Contents").unwrap().as_array().unwrap().len(), 4);
    }

    #[test]
    fn overlay_count_mismatch_is_fatal() {
        let original = minimal_pdf(2);
        let composer = DocumentComposer::from_bytes(&original).unwrap();
        let err = composer.compose(&[None]).unwrap_err();
        assert!(matches!(err, LesewerkError::Composition(_)));
        assert!(!err.is_page_scoped());
    }

    #[test]
    fn truncated_input_fails_to_load() {
        let mut original = minimal_pdf(1);
        original.truncate(40);
        assert!(matches!(
            DocumentComposer::from_bytes(&original),
            Err(LesewerkError::Composition(_))
        ));
    }

    #[test]
    fn composed_output_reloads_with_same_page_count() {
        let original = minimal_pdf(3);
        let composer = DocumentComposer::from_bytes(&original).unwrap();
        assert_eq!(composer.page_count(), 3);

        let output = composer
            .compose(&[
                Some(overlay_for("one")),
                None,
                Some(overlay_for("three")),
            ])
            .unwrap();
        let doc = Document::load_mem(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }
}
