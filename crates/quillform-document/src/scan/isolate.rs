// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph isolator — turns one cell's region of interest into a tight-cropped
// alpha glyph, or nothing when the cell was left blank.

use image::{GrayImage, Luma, RgbImage, imageops};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;
use quillform_core::config::ScanConfig;
use quillform_core::glyph::GlyphImage;
use tracing::trace;

use super::binarize::adaptive_ink_mask;

/// Pixel bounds of the ink in a mask, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl InkBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Binarize, denoise and tight-crop ink inside a cell.
#[derive(Debug, Clone)]
pub struct GlyphIsolator {
    blur_sigma: f32,
    block_radius: u32,
    constant: i32,
    opening_radius: u8,
    border_strip: u32,
    min_size: u32,
}

impl GlyphIsolator {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            blur_sigma: config.blur_sigma,
            block_radius: config.threshold_block_radius,
            constant: config.threshold_constant,
            opening_radius: config.opening_radius,
            border_strip: config.border_strip,
            min_size: config.min_glyph_size,
        }
    }

    /// Ink mask of a region (255 = ink), after denoising and border blanking.
    pub fn ink_mask(&self, roi: &RgbImage) -> GrayImage {
        let gray = imageops::grayscale(roi);
        if self.blur_sigma > 0.0 {
            self.threshold(&gaussian_blur_f32(&gray, self.blur_sigma))
        } else {
            self.threshold(&gray)
        }
    }

    fn threshold(&self, gray: &GrayImage) -> GrayImage {
        let mut mask = adaptive_ink_mask(gray, self.block_radius, self.constant);
        if self.opening_radius > 0 {
            mask = morphology::open(&mask, Norm::LInf, self.opening_radius);
        }
        blank_border(&mut mask, self.border_strip);
        mask
    }

    /// The glyph inside a cell, or `None` for an empty cell.
    ///
    /// The blur halo widens a blob by a pixel or two on each side, so ink
    /// must reach the minimum size in a mask thresholded from the unblurred
    /// region as well as in the smoothed one. The glyph itself is cut from
    /// the smoothed mask.
    pub fn isolate(&self, roi: &RgbImage) -> Option<GlyphImage> {
        let gray = imageops::grayscale(roi);
        let sharp = ink_bounds(&self.threshold(&gray));
        let mask = self.ink_mask(roi);
        let (Some(measured), Some(bounds)) = (sharp, ink_bounds(&mask)) else {
            trace!("no ink in cell");
            return None;
        };
        let width = measured.width().min(bounds.width());
        let height = measured.height().min(bounds.height());
        if width < self.min_size || height < self.min_size {
            trace!(width, height, "ink below minimum glyph size");
            return None;
        }

        let crop = imageops::crop_imm(
            &mask,
            bounds.min_x,
            bounds.min_y,
            bounds.width(),
            bounds.height(),
        )
        .to_image();
        Some(GlyphImage::from_mask(&crop))
    }
}

fn blank_border(mask: &mut GrayImage, strip: u32) {
    if strip == 0 {
        return;
    }
    let (w, h) = mask.dimensions();
    for y in 0..h {
        for x in 0..w {
            if x < strip || y < strip || x + strip >= w || y + strip >= h {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
    }
}

/// Bounding box of every non-zero pixel.
pub fn ink_bounds(mask: &GrayImage) -> Option<InkBounds> {
    let mut bounds: Option<InkBounds> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => InkBounds {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            },
            Some(b) => InkBounds {
                min_x: b.min_x.min(x),
                min_y: b.min_y.min(y),
                max_x: b.max_x.max(x),
                max_y: b.max_y.max(y),
            },
        });
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn cell_with_square(x0: u32, y0: u32, side: u32) -> RgbImage {
        let mut roi = RgbImage::from_pixel(120, 120, Rgb([245, 245, 240]));
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                roi.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        roi
    }

    #[test]
    fn solid_square_isolates_to_its_bounding_box() {
        let isolator = GlyphIsolator::new(&ScanConfig::default());
        let glyph = isolator
            .isolate(&cell_with_square(30, 40, 50))
            .expect("glyph");
        assert!((glyph.width() as i32 - 50).abs() <= 3, "width {}", glyph.width());
        assert!((glyph.height() as i32 - 50).abs() <= 3, "height {}", glyph.height());
        assert!(glyph.ink_pixels() > 0);
        // Colour is black, coverage lives in alpha.
        assert!(glyph.as_rgba().pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0));
    }

    #[test]
    fn blank_cell_is_empty() {
        let isolator = GlyphIsolator::new(&ScanConfig::default());
        let blank = RgbImage::from_pixel(120, 120, Rgb([250, 250, 250]));
        assert!(isolator.isolate(&blank).is_none());
    }

    #[test]
    fn specks_below_minimum_size_are_rejected() {
        let config = ScanConfig {
            opening_radius: 0,
            ..ScanConfig::default()
        };
        let isolator = GlyphIsolator::new(&config);
        assert!(isolator.isolate(&cell_with_square(60, 60, 3)).is_none());
    }

    #[test]
    fn blur_halo_does_not_lift_specks_over_the_minimum() {
        // Default opening (radius 1) keeps 3x3 and 4x4 blobs, and the blurred
        // mask grows them to 5x5 and 6x6.
        let isolator = GlyphIsolator::new(&ScanConfig::default());
        for side in [3, 4] {
            let blurred = ink_bounds(&isolator.ink_mask(&cell_with_square(60, 60, side)));
            assert!(blurred.is_some_and(|b| b.width() >= 5), "side {side}");
            assert!(isolator.isolate(&cell_with_square(60, 60, side)).is_none(), "side {side}");
        }
        let kept = isolator.isolate(&cell_with_square(60, 60, 6)).expect("6x6 is a glyph");
        assert!(kept.width() >= 6);
    }

    #[test]
    fn residual_frame_is_blanked() {
        let mut roi = RgbImage::from_pixel(120, 120, Rgb([250, 250, 250]));
        for i in 0..120 {
            roi.put_pixel(i, 0, Rgb([0, 0, 0]));
            roi.put_pixel(0, i, Rgb([0, 0, 0]));
        }
        let isolator = GlyphIsolator::new(&ScanConfig::default());
        assert!(isolator.isolate(&roi).is_none());
    }

    #[test]
    fn ink_bounds_cover_all_set_pixels() {
        let mut mask = GrayImage::new(10, 10);
        mask.put_pixel(2, 3, Luma([255]));
        mask.put_pixel(7, 5, Luma([255]));
        let bounds = ink_bounds(&mask).expect("bounds");
        assert_eq!((bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y), (2, 3, 7, 5));
        assert_eq!((bounds.width(), bounds.height()), (6, 3));
        assert!(ink_bounds(&GrayImage::new(4, 4)).is_none());
    }
}
