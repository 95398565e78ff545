// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph processor — prepares a scanned glyph for placement on a page: stroke
// weight, ink colour, size and rotation. Operates on in-memory RGBA images
// using the `image` and `imageproc` crates.

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};
use imageproc::distance_transform::Norm;
use imageproc::geometric_transformations::{self, Interpolation};
use imageproc::morphology;
use quillform_core::glyph::GlyphImage;
use rand::Rng;
use tracing::trace;

/// Largest per-channel deviation applied when recolouring ink.
pub const INK_DITHER: i32 = 5;

/// Transformation chain over a single glyph.
///
/// Each method consumes `self` and returns a new `GlyphProcessor` wrapping
/// the transformed image, enabling method chaining.
///
/// ```ignore
/// let placed = GlyphProcessor::from_glyph(&glyph)
///     .stroke_weight(1)
///     .recolor([0, 35, 102], 0.95, &mut rng)
///     .resize_to_height(140)
///     .rotate(0.4)
///     .into_rgba();
/// ```
pub struct GlyphProcessor {
    image: RgbaImage,
}

impl GlyphProcessor {
    // -- Construction ---------------------------------------------------------

    pub fn from_glyph(glyph: &GlyphImage) -> Self {
        Self {
            image: glyph.as_rgba().clone(),
        }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Thicken (positive) or thin (negative) strokes by dilating or eroding
    /// the alpha channel with a square kernel of radius `|delta|`.
    pub fn stroke_weight(self, delta: i32) -> Self {
        if delta == 0 {
            return self;
        }
        let k = delta.unsigned_abs().min(u8::MAX as u32) as u8;
        // Room for the dilated stroke to grow into.
        let image = if delta > 0 { pad(&self.image, k as u32) } else { self.image };

        let alpha = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y)[3]])
        });
        let alpha = if delta > 0 {
            morphology::dilate(&alpha, Norm::LInf, k)
        } else {
            morphology::erode(&alpha, Norm::LInf, k)
        };

        let weighted = RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            Rgba([r, g, b, alpha.get_pixel(x, y)[0]])
        });
        trace!(delta, "stroke weight applied");
        Self { image: weighted }
    }

    /// Paint every inked pixel with `ink`, dithered by up to
    /// [`INK_DITHER`] per channel, and scale alpha by `opacity`.
    pub fn recolor<R: Rng + ?Sized>(self, ink: [u8; 3], opacity: f32, rng: &mut R) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        let mut image = self.image;
        for pixel in image.pixels_mut() {
            let alpha = pixel[3];
            if alpha == 0 {
                continue;
            }
            let mut shade = |channel: u8| {
                (channel as i32 + rng.random_range(-INK_DITHER..=INK_DITHER)).clamp(0, 255) as u8
            };
            let rgb = [shade(ink[0]), shade(ink[1]), shade(ink[2])];
            *pixel = Rgba([rgb[0], rgb[1], rgb[2], (alpha as f32 * opacity).round() as u8]);
        }
        Self { image }
    }

    /// Scale to `height`, preserving aspect ratio, with Lanczos3 filtering.
    pub fn resize_to_height(self, height: u32) -> Self {
        let (w, h) = self.image.dimensions();
        if h == 0 || w == 0 || height == 0 || h == height {
            return self;
        }
        let width = ((w as f32 * height as f32 / h as f32).round() as u32).max(1);
        Self {
            image: imageops::resize(&self.image, width, height, imageops::FilterType::Lanczos3),
        }
    }

    /// Shrink proportionally so the glyph is no wider than `max_width`.
    pub fn fit_width(self, max_width: u32) -> Self {
        let (w, h) = self.image.dimensions();
        if w <= max_width || max_width == 0 {
            return self;
        }
        let height = ((h as f32 * max_width as f32 / w as f32).round() as u32).max(1);
        Self {
            image: imageops::resize(&self.image, max_width, height, imageops::FilterType::Lanczos3),
        }
    }

    /// Rotate by `degrees` (clockwise) about the centre. The canvas grows to
    /// the rotated bounding box so no ink is clipped.
    pub fn rotate(self, degrees: f32) -> Self {
        if degrees.abs() < 0.01 {
            return self;
        }
        let radians = degrees.to_radians();
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        let new_w = (w * cos + h * sin).ceil() as u32;
        let new_h = (w * sin + h * cos).ceil() as u32;

        let mut canvas = RgbaImage::new(new_w.max(1), new_h.max(1));
        let x = (canvas.width() as i64 - self.image.width() as i64) / 2;
        let y = (canvas.height() as i64 - self.image.height() as i64) / 2;
        imageops::overlay(&mut canvas, &self.image, x, y);

        let rotated = geometric_transformations::rotate_about_center(
            &canvas,
            radians,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
        );
        Self { image: rotated }
    }
}

fn pad(image: &RgbaImage, by: u32) -> RgbaImage {
    let mut canvas = RgbaImage::new(image.width() + 2 * by, image.height() + 2 * by);
    imageops::overlay(&mut canvas, image, by as i64, by as i64);
    canvas
}

// -- Tests --------------------------------------------------------------------
