// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph bitmaps and the in-memory font asset they accumulate into.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;

use image::{GrayImage, ImageFormat, Rgba, RgbaImage};

use crate::catalog::base_name_of;
use crate::error::{QuillformError, Result};

/// Extracted ink for one slot. Colour channels are black; alpha carries
/// ink coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphImage {
    image: RgbaImage,
}

impl GlyphImage {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Build a glyph from an ink mask (255 = ink).
    pub fn from_mask(mask: &GrayImage) -> Self {
        let image = RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
            Rgba([0, 0, 0, mask.get_pixel(x, y)[0]])
        });
        Self { image }
    }

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

    /// Count of pixels with any ink.
    pub fn ink_pixels(&self) -> usize {
        self.image.pixels().filter(|p| p[3] > 0).count()
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|err| QuillformError::ImageError(format!("PNG encode failed: {err}")))?;
        Ok(buf.into_inner())
    }

    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|err| QuillformError::ImageError(format!("PNG decode failed: {err}")))?;
        Ok(Self {
            image: image.to_rgba8(),
        })
    }
}

// -- Font asset ----------------------------------------------------------------

/// Glyphs keyed by slot name and indexed by base name. Inserting an
/// existing slot name replaces its glyph, so merging a rescanned section
/// is idempotent.
#[derive(Debug, Clone, Default)]
pub struct FontAsset {
    glyphs: BTreeMap<String, GlyphImage>,
    by_base: BTreeMap<String, BTreeSet<String>>,
}

impl FontAsset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one slot, returning the glyph it displaced.
    pub fn insert(&mut self, slot_name: impl Into<String>, glyph: GlyphImage) -> Option<GlyphImage> {
        let slot_name = slot_name.into();
        self.by_base
            .entry(base_name_of(&slot_name).to_string())
            .or_default()
            .insert(slot_name.clone());
        self.glyphs.insert(slot_name, glyph)
    }

    /// Merge a batch of glyphs, last write wins per slot name.
    pub fn merge(&mut self, glyphs: impl IntoIterator<Item = (String, GlyphImage)>) -> usize {
        let mut merged = 0;
        for (slot, glyph) in glyphs {
            self.insert(slot, glyph);
            merged += 1;
        }
        merged
    }

    pub fn get(&self, slot_name: &str) -> Option<&GlyphImage> {
        self.glyphs.get(slot_name)
    }

    pub fn contains(&self, slot_name: &str) -> bool {
        self.glyphs.contains_key(slot_name)
    }

    /// Candidate glyphs for a base name, in slot-name order.
    pub fn variants(&self, base_name: &str) -> Vec<&GlyphImage> {
        self.by_base
            .get(base_name)
            .map(|slots| slots.iter().filter_map(|s| self.glyphs.get(s)).collect())
            .unwrap_or_default()
    }

    pub fn base_names(&self) -> impl Iterator<Item = &str> {
        self.by_base.keys().map(String::as_str)
    }

    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.glyphs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: u32, shade: u8) -> GlyphImage {
        GlyphImage::from_mask(&GrayImage::from_pixel(size, size, image::Luma([shade])))
    }

    #[test]
    fn mask_becomes_black_alpha_glyph() {
        let mut mask = GrayImage::new(4, 3);
        mask.put_pixel(1, 1, image::Luma([200]));
        let glyph = GlyphImage::from_mask(&mask);
        assert_eq!((glyph.width(), glyph.height()), (4, 3));
        assert_eq!(glyph.as_rgba().get_pixel(1, 1), &Rgba([0, 0, 0, 200]));
        assert_eq!(glyph.ink_pixels(), 1);
    }

    #[test]
    fn png_round_trip_preserves_alpha() {
        let glyph = square(6, 180);
        let bytes = glyph.to_png_bytes().expect("encode");
        let decoded = GlyphImage::from_png_bytes(&bytes).expect("decode");
        assert_eq!(decoded, glyph);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            GlyphImage::from_png_bytes(b"not a png"),
            Err(QuillformError::ImageError(_))
        ));
    }

    #[test]
    fn variants_group_by_base_name() {
        let mut asset = FontAsset::new();
        asset.insert("a_1", square(2, 255));
        asset.insert("a_2", square(3, 255));
        asset.insert("b_1", square(4, 255));
        assert_eq!(asset.variants("a").len(), 2);
        assert_eq!(asset.variants("b").len(), 1);
        assert!(asset.variants("c").is_empty());
        assert_eq!(asset.base_names().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn rescan_overwrites_slot_without_duplicating() {
        let mut asset = FontAsset::new();
        asset.insert("a_1", square(2, 255));
        let replaced = asset.insert("a_1", square(5, 255));
        assert!(replaced.is_some());
        assert_eq!(asset.len(), 1);
        assert_eq!(asset.variants("a").len(), 1);
        assert_eq!(asset.get("a_1").map(GlyphImage::width), Some(5));
    }

    #[test]
    fn merge_is_idempotent() {
        let batch = vec![
            ("a_1".to_string(), square(2, 255)),
            ("b_1".to_string(), square(3, 255)),
        ];
        let mut asset = FontAsset::new();
        asset.merge(batch.clone());
        asset.merge(batch);
        assert_eq!(asset.len(), 2);
        assert_eq!(asset.slot_names().collect::<Vec<_>>(), ["a_1", "b_1"]);
    }
}
