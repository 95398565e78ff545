// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Form renderer — draws the blank handwriting form: per section the four
// markers at their canonical centres and one box per slot, two sections to
// an A4 page, printed at the resolution where the canonical frame matches
// the paper exactly.

use image::{DynamicImage, Rgb, RgbImage, imageops};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use quillform_core::catalog::{CharacterCatalog, section_marker_ids};
use quillform_core::config::FormGeometry;
use quillform_core::error::Result;
use quillform_core::types::PaperSize;
use tracing::{debug, info, instrument};

use crate::pdf::writer::PdfAssembler;
use crate::scan::dictionary::render_marker;

const BOX_COLOR: Rgb<u8> = Rgb([170, 170, 170]);
const BOX_STROKE: u32 = 2;
const SECTIONS_PER_PAGE: usize = 2;

pub struct FormRenderer {
    geometry: FormGeometry,
}

impl FormRenderer {
    pub fn new(geometry: &FormGeometry) -> Self {
        Self {
            geometry: geometry.clone(),
        }
    }

    /// One section in the canonical frame, with boxes for its first
    /// `slots` cells.
    pub fn render_section(&self, section_id: u32, slots: usize) -> Result<RgbImage> {
        let g = &self.geometry;
        let mut canvas = RgbImage::from_pixel(g.canvas_width, g.canvas_height, Rgb([255, 255, 255]));

        let half = (g.marker_size / 2) as i64;
        for (id, (cx, cy)) in section_marker_ids(section_id)
            .into_iter()
            .zip(g.marker_centres())
        {
            let marker = DynamicImage::ImageLuma8(render_marker(id, g.marker_size)?).to_rgb8();
            imageops::overlay(&mut canvas, &marker, cx as i64 - half, cy as i64 - half);
        }

        let cells = slots.min(g.cells_per_section() as usize) as u32;
        for i in 0..cells {
            let (x, y) = g.cell_origin(i / g.cols, i % g.cols);
            for inset in 0..BOX_STROKE {
                let side = g.cell_size - 2 * inset;
                let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(side, side);
                draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
            }
        }

        debug!(section_id, cells, "form section rendered");
        Ok(canvas)
    }

    /// Every section the catalog needs, in order.
    pub fn render_sections(&self, catalog: &CharacterCatalog) -> Result<Vec<RgbImage>> {
        (0..catalog.section_count(&self.geometry))
            .map(|section_id| {
                let slots = catalog.section_range(section_id, &self.geometry).len();
                self.render_section(section_id, slots)
            })
            .collect()
    }

    /// Sections stacked two to an A4 page at the form's print resolution.
    pub fn render_pages(&self, catalog: &CharacterCatalog) -> Result<Vec<RgbImage>> {
        let (page_w, page_h) = PaperSize::A4.dimensions_px(self.geometry.print_dpi);
        let stacked = self.geometry.canvas_height * SECTIONS_PER_PAGE as u32;
        let top = page_h.saturating_sub(stacked) / 2;

        let sections = self.render_sections(catalog)?;
        let pages = sections
            .chunks(SECTIONS_PER_PAGE)
            .map(|pair| {
                let mut page = RgbImage::from_pixel(page_w, page_h, Rgb([255, 255, 255]));
                for (slot, section) in pair.iter().enumerate() {
                    let y = top + slot as u32 * self.geometry.canvas_height;
                    imageops::overlay(&mut page, section, 0, y as i64);
                }
                page
            })
            .collect();
        Ok(pages)
    }

    /// The printable form as a PDF.
    #[instrument(skip(self, catalog), fields(slots = catalog.len()))]
    pub fn render_pdf(&self, catalog: &CharacterCatalog) -> Result<Vec<u8>> {
        let pages = self.render_pages(catalog)?;
        let mut assembler = PdfAssembler::new(self.geometry.print_dpi);
        assembler.set_title("Quillform handwriting form");
        let pdf = assembler.assemble_opaque(&pages)?;
        info!(pages = pages.len(), bytes = pdf.len(), "form PDF rendered");
        Ok(pdf)
    }
}
