// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarization primitives shared by marker detection and glyph isolation.
//
// Every mask produced here is inverted: ink (dark) pixels become 255 and
// paper becomes 0, which is what contour tracing and alpha extraction want.

use image::{GrayImage, Luma};
use imageproc::contrast::{equalize_histogram, otsu_level};
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use quillform_core::config::MarkerPreprocess;

/// Grayscale view of a photo under one preprocessing strategy.
pub enum Preprocessed {
    /// Still grayscale; needs local thresholding.
    Gray(GrayImage),
    /// Already an ink mask.
    Mask(GrayImage),
}

/// Apply one marker preprocessing strategy.
pub fn preprocess(gray: &GrayImage, variant: MarkerPreprocess) -> Preprocessed {
    match variant {
        MarkerPreprocess::Raw => Preprocessed::Gray(gray.clone()),
        MarkerPreprocess::Equalized => Preprocessed::Gray(equalize_histogram(gray)),
        MarkerPreprocess::FixedThreshold { level } => {
            Preprocessed::Mask(global_ink_mask(gray, level))
        }
        MarkerPreprocess::Otsu => {
            let equalized = equalize_histogram(gray);
            let level = otsu_threshold(&equalized);
            Preprocessed::Mask(global_ink_mask(&equalized, level))
        }
    }
}

/// Local-mean adaptive threshold. A pixel is ink when it is more than `c`
/// darker than the mean of its `(2r + 1)` square neighbourhood, clipped to
/// the image.
pub fn adaptive_ink_mask(gray: &GrayImage, block_radius: u32, c: i32) -> GrayImage {
    let sums = integral_image::<_, u64>(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let threshold = local_mean(&sums, x, y, block_radius) - f64::from(c);
        let ink = f64::from(gray.get_pixel(x, y).0[0]) < threshold;
        Luma([if ink { 255 } else { 0 }])
    })
}

/// Global threshold: pixels at or below `level` are ink.
pub fn global_ink_mask(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([if gray.get_pixel(x, y).0[0] <= level { 255 } else { 0 }])
    })
}

/// Otsu level of a grayscale image. Pixels at or below it form the dark
/// class.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    if gray.width() == 0 || gray.height() == 0 {
        return 128;
    }
    otsu_level(gray)
}

/// Mean of the square window around (x, y), read from a summed-area table
/// that is one pixel larger than the source in each direction.
fn local_mean(sums: &Image<Luma<u64>>, x: u32, y: u32, radius: u32) -> f64 {
    let right = (x + radius).min(sums.width() - 2);
    let bottom = (y + radius).min(sums.height() - 2);
    let left = x.saturating_sub(radius);
    let top = y.saturating_sub(radius);
    let area = u64::from(right - left + 1) * u64::from(bottom - top + 1);
    let [sum] = sum_image_pixels(sums, left, top, right, bottom);
    sum as f64 / area as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dark square on light paper with a brightness ramp across the image.
    fn uneven_page() -> GrayImage {
        let mut img = GrayImage::from_fn(120, 60, |x, _| Luma([150 + (x / 2) as u8]));
        for y in 20..40 {
            for x in 70..90 {
                img.put_pixel(x, y, Luma([90]));
            }
        }
        img
    }

    #[test]
    fn local_mean_clips_the_window_at_edges() {
        let img = GrayImage::from_fn(4, 4, |x, _| Luma([if x == 0 { 40 } else { 10 }]));
        let sums = integral_image::<_, u64>(&img);
        // Corner window covers columns 0..=1 of rows 0..=1.
        assert_eq!(local_mean(&sums, 0, 0, 1), 25.0);
        assert_eq!(local_mean(&sums, 3, 3, 1), 10.0);
        assert_eq!(local_mean(&sums, 2, 2, 10), 17.5);
    }

    #[test]
    fn empty_image_has_a_neutral_otsu_level() {
        assert_eq!(otsu_threshold(&GrayImage::new(0, 0)), 128);
    }

    #[test]
    fn adaptive_mask_marks_dark_edges_under_uneven_light() {
        let mask = adaptive_ink_mask(&uneven_page(), 8, 10);
        // Edge of the square is ink, far paper is not.
        assert_eq!(mask.get_pixel(70, 30).0[0], 255);
        assert_eq!(mask.get_pixel(10, 10).0[0], 0);
        assert_eq!(mask.get_pixel(115, 55).0[0], 0);
    }

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 30 } else { 220 }]));
        let t = otsu_threshold(&img);
        assert!((30..220).contains(&t), "threshold {t}");
        let mask = global_ink_mask(&img, t);
        assert_eq!(mask.get_pixel(0, 0).0[0], 255);
        assert_eq!(mask.get_pixel(9, 0).0[0], 0);
    }

    #[test]
    fn thresholded_variants_yield_masks() {
        let page = uneven_page();
        assert!(matches!(preprocess(&page, MarkerPreprocess::Raw), Preprocessed::Gray(_)));
        assert!(matches!(
            preprocess(&page, MarkerPreprocess::FixedThreshold { level: 128 }),
            Preprocessed::Mask(_)
        ));
        match preprocess(&page, MarkerPreprocess::Otsu) {
            Preprocessed::Mask(mask) => assert_eq!(mask.get_pixel(80, 30).0[0], 255),
            Preprocessed::Gray(_) => panic!("Otsu must produce a mask"),
        }
    }
}
