// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Grid segmenter — maps the canonical frame onto the cell grid and cuts out
// the padded region of interest of every cell a section holds.

use image::{RgbImage, imageops};
use quillform_core::catalog::slot_position;
use quillform_core::config::FormGeometry;
use quillform_core::error::Result;
use quillform_core::types::SlotPosition;

/// One cell's region of interest in canonical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRegion {
    /// Global slot index.
    pub index: usize,
    pub position: SlotPosition,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct GridSegmenter {
    geometry: FormGeometry,
    padding: u32,
}

impl GridSegmenter {
    pub fn new(geometry: &FormGeometry, padding: u32) -> Self {
        Self {
            geometry: geometry.clone(),
            padding,
        }
    }

    /// Cells of a section in row-major order, stopping at the end of the
    /// catalog.
    pub fn cells(&self, section_id: u32, catalog_len: usize) -> Result<Vec<CellRegion>> {
        let per_section = self.geometry.cells_per_section() as usize;
        let start = section_id as usize * per_section;
        // Padding never collapses a cell below one pixel.
        let pad = self.padding.min(self.geometry.cell_size.saturating_sub(1) / 2);
        let side = self.geometry.cell_size - 2 * pad;

        (start..start + per_section)
            .take_while(|index| *index < catalog_len)
            .map(|index| {
                let position = slot_position(index, &self.geometry)?;
                let (x, y) = self.geometry.cell_origin(position.row, position.col);
                Ok(CellRegion {
                    index,
                    position,
                    x: x + pad,
                    y: y + pad,
                    width: side,
                    height: side,
                })
            })
            .collect()
    }

    /// Copy a cell's region out of the canonical image.
    pub fn extract(&self, canonical: &RgbImage, cell: &CellRegion) -> RgbImage {
        imageops::crop_imm(canonical, cell.x, cell.y, cell.width, cell.height).to_image()
    }
}
