// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic "photographs" of filled-in form sections.

use image::{Rgb, RgbImage, imageops};
use imageproc::geometric_transformations::{
    Interpolation, Projection, rotate_about_center, warp_into,
};
use quillform_core::catalog::{CharacterCatalog, slot_position};
use quillform_core::config::FormGeometry;
use quillform_document::FormRenderer;

pub const PHOTO_WIDTH: u32 = 2500;
pub const PHOTO_HEIGHT: u32 = 1900;
const TABLE: Rgb<u8> = Rgb([96, 84, 72]);
const PEN: Rgb<u8> = Rgb([25, 30, 60]);
const STROKE: u32 = 8;

/// Ink extent drawn by [`ink_slot`].
pub const GLYPH_WIDTH: u32 = 40;
pub const GLYPH_HEIGHT: u32 = 70;

/// A blank section exactly as the form renderer prints it.
pub fn blank_section(geometry: &FormGeometry, catalog: &CharacterCatalog, section_id: u32) -> RgbImage {
    let slots = catalog.section_range(section_id, geometry).len();
    FormRenderer::new(geometry)
        .render_section(section_id, slots)
        .expect("render section")
}

/// Write an "L" in the cell holding global slot `index`.
pub fn ink_slot(section: &mut RgbImage, geometry: &FormGeometry, index: usize) {
    let position = slot_position(index, geometry).expect("slot position");
    let (x0, y0) = geometry.cell_origin(position.row, position.col);
    let cx = x0 + geometry.cell_size / 2;
    let cy = y0 + geometry.cell_size / 2;
    let left = cx - GLYPH_WIDTH / 2;
    let top = cy - GLYPH_HEIGHT / 2;

    for y in top..top + GLYPH_HEIGHT {
        for x in left..left + STROKE {
            section.put_pixel(x, y, PEN);
        }
    }
    for y in top + GLYPH_HEIGHT - STROKE..top + GLYPH_HEIGHT {
        for x in left..left + GLYPH_WIDTH {
            section.put_pixel(x, y, PEN);
        }
    }
}

/// Place the section on a table, seen from slightly off-axis.
pub fn photograph(section: &RgbImage) -> RgbImage {
    let (w, h) = (section.width() as f32, section.height() as f32);
    let paper = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
    let seen = [(180.0, 160.0), (2300.0, 220.0), (140.0, 1700.0), (2360.0, 1660.0)];
    let projection = Projection::from_control_points(paper, seen).expect("valid perspective");

    let mut photo = RgbImage::from_pixel(PHOTO_WIDTH, PHOTO_HEIGHT, TABLE);
    warp_into(section, &projection, Interpolation::Bilinear, TABLE, &mut photo);
    photo
}

/// Turn a photo by an arbitrary angle on a table large enough to keep every
/// corner in frame.
pub fn rotated(photo: &RgbImage, degrees: f32) -> RgbImage {
    let side = PHOTO_WIDTH.max(PHOTO_HEIGHT) * 13 / 10;
    let mut table = RgbImage::from_pixel(side, side, TABLE);
    let x = i64::from((side - photo.width()) / 2);
    let y = i64::from((side - photo.height()) / 2);
    imageops::overlay(&mut table, photo, x, y);
    rotate_about_center(&table, degrees.to_radians(), Interpolation::Bilinear, TABLE)
}

/// Squeeze every channel into `low..=high`, as in a dim, washed-out shot.
pub fn low_contrast(photo: &RgbImage, low: u8, high: u8) -> RgbImage {
    let span = f32::from(high - low) / 255.0;
    let mut out = photo.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = low + (f32::from(*channel) * span).round() as u8;
        }
    }
    out
}

/// Darken the photo from the left edge, scaling brightness linearly from
/// `left` to `right` across its width.
pub fn side_lit(photo: &RgbImage, left: f32, right: f32) -> RgbImage {
    let last = photo.width().saturating_sub(1).max(1) as f32;
    let mut out = photo.clone();
    for (x, _, pixel) in out.enumerate_pixels_mut() {
        let gain = left + (right - left) * x as f32 / last;
        for channel in pixel.0.iter_mut() {
            *channel = (f32::from(*channel) * gain).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
