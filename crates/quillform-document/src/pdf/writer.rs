// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — encodes an ordered list of page rasters as one multi-page
// PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::{RgbImage, RgbaImage};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use quillform_core::error::{QuillformError, Result};
use tracing::{debug, info, instrument};

/// Resolution handwriting pages are rendered at.
pub const DEFAULT_DPI: f32 = 300.0;

/// Places each page raster full-bleed on its own PDF page. Page size in
/// millimetres follows from the raster size and the resolution.
pub struct PdfAssembler {
    dpi: f32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl PdfAssembler {
    pub fn new(dpi: f32) -> Self {
        Self { dpi, title: None }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    fn px_to_mm(&self, px: u32) -> Mm {
        Mm(px as f32 / self.dpi * 25.4)
    }

    // -- Assembly -------------------------------------------------------------

    /// Composite RGBA pages onto white and encode them in order.
    #[instrument(skip(self, pages), fields(pages = pages.len(), dpi = self.dpi))]
    pub fn assemble(&self, pages: &[RgbaImage]) -> Result<Vec<u8>> {
        let flattened: Vec<RgbImage> = pages.iter().map(flatten_onto_white).collect();
        self.assemble_opaque(&flattened)
    }

    /// Encode pages that are already opaque.
    pub fn assemble_opaque(&self, pages: &[RgbImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(QuillformError::EmptyDocument);
        }
        if !(self.dpi > 0.0) {
            return Err(QuillformError::PdfError(format!(
                "resolution must be positive, got {}",
                self.dpi
            )));
        }

        let title = self.title.as_deref().unwrap_or("Quillform Document");
        let mut doc = PdfDocument::new(title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for page in pages {
            let raw = RawImage {
                pixels: RawImageData::U8(page.as_raw().clone()),
                width: page.width() as usize,
                height: page.height() as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(1.0),
                    scale_y: Some(1.0),
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];

            pdf_pages.push(PdfPage::new(
                self.px_to_mm(page.width()),
                self.px_to_mm(page.height()),
                ops,
            ));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);

        info!(pages = pages.len(), bytes = output.len(), "PDF assembled");
        debug!(warnings = warnings.len(), "printpdf warnings");
        Ok(output)
    }

    // -- File output convenience ----------------------------------------------

    pub fn write_to_file(&self, pages: &[RgbaImage], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.assemble(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }
}

/// Alpha-composite a page over opaque white.
pub fn flatten_onto_white(page: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(page.width(), page.height(), |x, y| {
        let [r, g, b, a] = page.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use image::Rgba;

    #[test]
    fn empty_page_list_is_rejected() {
        let err = PdfAssembler::default().assemble(&[]).unwrap_err();
        assert!(matches!(err, QuillformError::EmptyDocument));
    }

    #[test]
    fn every_page_survives_the_round_trip() {
        let pages: Vec<RgbaImage> = (0..3)
            .map(|i| RgbaImage::from_pixel(120, 170, Rgba([i * 40, 0, 0, 255])))
            .collect();
        let pdf = PdfAssembler::default().assemble(&pages).expect("assemble");
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(PdfReader::from_bytes(&pdf).expect("parse").page_count(), 3);
    }

    #[test]
    fn page_size_follows_resolution() {
        let page = RgbaImage::from_pixel(300, 600, Rgba([255, 255, 255, 255]));
        let pdf = PdfAssembler::new(300.0).assemble(&[page]).expect("assemble");
        let sizes = PdfReader::from_bytes(&pdf).expect("parse").page_sizes_pt();
        // One inch by two inches.
        let (w, h) = sizes[0];
        assert!((w - 72.0).abs() < 0.5, "width {w}");
        assert!((h - 144.0).abs() < 0.5, "height {h}");
    }

    #[test]
    fn transparency_composites_onto_white() {
        let mut page = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        page.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let flat = flatten_onto_white(&page);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [0, 0, 0]);
    }
}
