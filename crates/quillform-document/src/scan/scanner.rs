// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Section scanner — the full photo-to-glyphs pipeline for one form section:
// marker location, rectification, grid segmentation and glyph isolation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use image::RgbImage;
use quillform_core::catalog::CharacterCatalog;
use quillform_core::config::{FormGeometry, ScanConfig};
use quillform_core::error::{QuillformError, Result};
use quillform_core::glyph::GlyphImage;
use tracing::{debug, info, instrument};

use super::grid::GridSegmenter;
use super::isolate::GlyphIsolator;
use super::markers::MarkerLocator;
use super::rectify::Rectifier;

/// Glyphs extracted from one section. Empty cells are listed in `missing`
/// rather than failing the scan.
#[derive(Debug, Clone)]
pub struct SectionScan {
    pub section_id: u32,
    /// Slot name -> glyph, for every non-empty cell.
    pub glyphs: BTreeMap<String, GlyphImage>,
    pub detected: usize,
    /// Cells the section holds for this catalog.
    pub total: usize,
    /// Slot names of the empty cells, in grid order.
    pub missing: Vec<String>,
    pub scanned_at: DateTime<Utc>,
}

/// Runs the scan pipeline. Holds no per-scan state, so one scanner can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct SectionScanner {
    geometry: FormGeometry,
    locator: MarkerLocator,
    rectifier: Rectifier,
    segmenter: GridSegmenter,
    isolator: GlyphIsolator,
}

impl SectionScanner {
    pub fn new(form: &FormGeometry, scan: &ScanConfig) -> Self {
        Self {
            geometry: form.clone(),
            locator: MarkerLocator::new(scan),
            rectifier: Rectifier::new(form),
            segmenter: GridSegmenter::new(form, scan.cell_padding),
            isolator: GlyphIsolator::new(scan),
        }
    }

    /// Scan one photographed section. `forced_section` overrides the
    /// section id derived from the detected marker ids.
    #[instrument(skip(self, image, catalog), fields(width = image.width(), height = image.height()))]
    pub fn scan(
        &self,
        image: &RgbImage,
        catalog: &CharacterCatalog,
        forced_section: Option<u32>,
    ) -> Result<SectionScan> {
        let markers = self.locator.locate(image)?;
        let section_id = Rectifier::target_section(&markers, forced_section)?;

        let sections = catalog.section_count(&self.geometry);
        if section_id >= sections {
            return Err(QuillformError::SectionOutOfRange {
                section_id,
                sections,
            });
        }

        let rectified = self.rectifier.rectify(image, &markers, Some(section_id))?;
        self.extract(&rectified.image, section_id, catalog)
    }

    /// Segment and isolate an already rectified section.
    pub fn extract(
        &self,
        canonical: &RgbImage,
        section_id: u32,
        catalog: &CharacterCatalog,
    ) -> Result<SectionScan> {
        let cells = self.segmenter.cells(section_id, catalog.len())?;
        let mut glyphs = BTreeMap::new();
        let mut missing = Vec::new();

        for cell in &cells {
            let name = catalog.name(cell.index).ok_or_else(|| {
                QuillformError::Catalog(format!("no slot at index {}", cell.index))
            })?;
            let roi = self.segmenter.extract(canonical, cell);
            match self.isolator.isolate(&roi) {
                Some(glyph) => {
                    glyphs.insert(name.to_string(), glyph);
                }
                None => {
                    debug!(slot = name, position = %cell.position, "empty cell");
                    missing.push(name.to_string());
                }
            }
        }

        info!(
            section_id,
            detected = glyphs.len(),
            total = cells.len(),
            missing = missing.len(),
            "section extracted"
        );

        Ok(SectionScan {
            section_id,
            detected: glyphs.len(),
            total: cells.len(),
            glyphs,
            missing,
            scanned_at: Utc::now(),
        })
    }
}
