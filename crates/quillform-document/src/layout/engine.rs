// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout engine — lays text onto ruled pages one scanned glyph at a time,
// varying size, angle and baseline so repeated letters never look stamped.
//
// All per-glyph randomness comes from the generator the caller passes in.
// The per-line slope and offset are drawn from a generator seeded with the
// line index, so every page drifts the same way for a given style.

use image::{RgbaImage, imageops};
use quillform_core::catalog::CharacterCatalog;
use quillform_core::config::StyleConfig;
use quillform_core::error::Result;
use quillform_core::glyph::FontAsset;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, trace};

use crate::image::processor::GlyphProcessor;
use crate::layout::paper::Paginator;
use crate::layout::vertical::VerticalClass;

/// Estimated glyph advance as a share of the letter height, used to decide
/// whether a whole word still fits on the current line.
const WORD_WIDTH_ESTIMATE: f32 = 0.6;
/// Scale jitter per unit of `jitter`, as a fraction of the target height.
const SCALE_JITTER: f32 = 0.01;
/// Rotation jitter per unit of `jitter`, in degrees.
const ROTATION_JITTER: f32 = 0.2;
/// Vertical jitter per unit of `jitter`, in pixels.
const VERTICAL_JITTER: f32 = 0.5;
const MAX_GLYPH_GAP: u32 = 4;
const LINE_SEED_OFFSET: u64 = 555;
const SLOPE_STRENGTH: f32 = 0.0005;
const OFFSET_STRENGTH: f32 = 2.0;

/// Where one glyph ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub page: usize,
    pub line: u32,
    pub character: char,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Output of [`LayoutEngine::render`]. Every page has the style's
/// dimensions; there is always at least one page.
#[derive(Debug, Clone)]
pub struct RenderedText {
    pub pages: Vec<RgbaImage>,
    pub placements: Vec<Placement>,
}

/// Deterministic per-line baseline drift.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LineDrift {
    slope: f32,
    offset: f32,
}

impl LineDrift {
    fn for_line(line: u32, strength: f32) -> Self {
        let mut rng = StdRng::seed_from_u64(line as u64 + LINE_SEED_OFFSET);
        let slope = (rng.random::<f32>() - 0.5) * strength * SLOPE_STRENGTH;
        let offset = (rng.random::<f32>() - 0.5) * strength * OFFSET_STRENGTH;
        Self { slope, offset }
    }

    fn at(&self, dx: f32) -> f32 {
        self.offset + self.slope * dx
    }
}

struct Cursor {
    pages: Vec<RgbaImage>,
    page: RgbaImage,
    line: u32,
    x: u32,
    drift: LineDrift,
}

pub struct LayoutEngine<'a> {
    style: StyleConfig,
    catalog: &'a CharacterCatalog,
    font: &'a FontAsset,
    paginator: Paginator,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(style: &StyleConfig, catalog: &'a CharacterCatalog, font: &'a FontAsset) -> Result<Self> {
        style.validate()?;
        Ok(Self {
            style: style.clone(),
            catalog,
            font,
            paginator: Paginator::new(style)?,
        })
    }

    /// Lay `text` out across as many pages as it needs.
    ///
    /// Lines break on `\n` (a trailing `\r` is ignored); words break on
    /// spaces and tabs. Characters with no scanned glyph are skipped.
    #[instrument(skip(self, text, rng), fields(chars = text.chars().count()))]
    pub fn render<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> RenderedText {
        let s = &self.style;
        let mut cursor = Cursor {
            pages: Vec::new(),
            page: self.paginator.new_page(),
            line: 0,
            x: s.margin_left,
            drift: LineDrift::for_line(0, s.line_slope),
        };
        let mut placements = Vec::new();
        let estimate = WORD_WIDTH_ESTIMATE * s.target_letter_height as f32;

        for (i, paragraph) in text.split('\n').enumerate() {
            if i > 0 {
                self.newline(&mut cursor);
            }
            let paragraph = paragraph.trim_end_matches('\r');
            if paragraph.trim().is_empty() {
                continue;
            }

            for word in paragraph.split([' ', '\t']) {
                if !word.is_empty() {
                    let width = word.chars().count() as f32 * estimate;
                    if cursor.x as f32 + width > s.printable_right() as f32
                        && cursor.x > s.margin_left
                    {
                        self.newline(&mut cursor);
                    }
                    for ch in word.chars() {
                        if let Some(placement) = self.place(ch, &mut cursor, rng) {
                            placements.push(placement);
                        }
                    }
                }
                cursor.x += s.word_spacing;
            }
        }

        cursor.pages.push(cursor.page);
        info!(
            pages = cursor.pages.len(),
            glyphs = placements.len(),
            "text laid out"
        );
        RenderedText {
            pages: cursor.pages,
            placements,
        }
    }

    fn newline(&self, cursor: &mut Cursor) {
        cursor.line += 1;
        cursor.x = self.style.margin_left;
        if !self.paginator.fits(cursor.line) {
            let full = std::mem::replace(&mut cursor.page, self.paginator.new_page());
            cursor.pages.push(full);
            cursor.line = 0;
            debug!(pages = cursor.pages.len(), "page full, starting a new one");
        }
        cursor.drift = LineDrift::for_line(cursor.line, self.style.line_slope);
    }

    fn place<R: Rng + ?Sized>(&self, ch: char, cursor: &mut Cursor, rng: &mut R) -> Option<Placement> {
        let s = &self.style;
        let Some(base) = self.catalog.base_name(ch) else {
            trace!(%ch, "character not in catalog, skipped");
            return None;
        };
        let variants = self.font.variants(base);
        if variants.is_empty() {
            trace!(%ch, base, "no scanned glyph, skipped");
            return None;
        }
        let glyph = variants[rng.random_range(0..variants.len())];

        let class = VerticalClass::of(ch);
        let letter_height = s.target_letter_height as f32;
        let scale_noise = rng.random_range(-1.0f32..=1.0) * SCALE_JITTER * s.jitter;
        let height = (letter_height * class.scale() * (1.0 + scale_noise)).round().max(1.0) as u32;
        let angle = rng.random_range(-1.0f32..=1.0) * ROTATION_JITTER * s.jitter;

        let image = GlyphProcessor::from_glyph(glyph)
            .stroke_weight(s.stroke_weight_delta)
            .recolor(s.ink_color.rgb(), s.opacity, rng)
            .resize_to_height(height)
            .rotate(angle)
            .fit_width(s.printable_width())
            .into_rgba();
        let (width, height) = image.dimensions();

        if cursor.x + width > s.printable_right() && cursor.x > s.margin_left {
            self.newline(cursor);
        }

        let drift = cursor.drift.at((cursor.x - s.margin_left) as f32);
        let wobble = rng.random_range(-1.0f32..=1.0) * VERTICAL_JITTER * s.jitter;
        let bottom = s.baseline(cursor.line) + drift + wobble + class.baseline_shift(letter_height);
        let x = cursor.x as i64;
        let y = (bottom - height as f32).round() as i64;

        imageops::overlay(&mut cursor.page, &image, x, y);
        cursor.x += width + rng.random_range(0..=MAX_GLYPH_GAP);

        Some(Placement {
            page: cursor.pages.len(),
            line: cursor.line,
            character: ch,
            x,
            y,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use quillform_core::catalog::Alphabet;
    use quillform_core::glyph::GlyphImage;
    use quillform_core::types::PaperType;

    fn block(width: u32, height: u32) -> GlyphImage {
        GlyphImage::from_mask(&GrayImage::from_pixel(width, height, Luma([255])))
    }

    fn font_for(catalog: &CharacterCatalog, width: u32, height: u32) -> FontAsset {
        let mut font = FontAsset::new();
        for name in catalog.slot_names() {
            font.insert(name.clone(), block(width, height));
        }
        font
    }

    fn style() -> StyleConfig {
        StyleConfig {
            page_width: 1000,
            page_height: 700,
            margin_top: 150,
            margin_bottom: 100,
            margin_left: 50,
            margin_right: 50,
            target_letter_height: 100,
            line_spacing: 150,
            paper_type: PaperType::Blank,
            ..StyleConfig::default()
        }
    }

    #[test]
    fn long_word_wraps_inside_right_margin() {
        let catalog = CharacterCatalog::build(&Alphabet::new("x", "", "", ""), 1).expect("catalog");
        let font = font_for(&catalog, 60, 100);
        let style = style();
        let engine = LayoutEngine::new(&style, &catalog, &font).expect("engine");

        let mut rng = StdRng::seed_from_u64(1);
        let out = engine.render(&"x".repeat(40), &mut rng);

        assert_eq!(out.placements.len(), 40);
        let right = (style.page_width - style.margin_right) as i64;
        for p in &out.placements {
            assert!(p.x + p.width as i64 <= right, "glyph at {} width {}", p.x, p.width);
        }
        assert!(out.placements.iter().any(|p| p.line > 0));
    }

    #[test]
    fn overflowing_text_spills_onto_identical_pages() {
        let catalog = CharacterCatalog::build(&Alphabet::new("ab", "", "", ""), 2).expect("catalog");
        let font = font_for(&catalog, 40, 80);
        let style = style();
        let engine = LayoutEngine::new(&style, &catalog, &font).expect("engine");

        // Baselines 150, 300, 450, 600 fit: four lines per page.
        let text = vec!["ab ba"; 10].join("\n");
        let out = engine.render(&text, &mut StdRng::seed_from_u64(2));

        assert_eq!(out.pages.len(), 3);
        assert!(out.pages.iter().all(|p| p.dimensions() == (1000, 700)));
        assert_eq!(out.placements.last().map(|p| (p.page, p.line)), Some((2, 1)));
    }

    #[test]
    fn fixed_seed_reproduces_layout() {
        let catalog = CharacterCatalog::build(&Alphabet::default(), 3).expect("catalog");
        let font = font_for(&catalog, 50, 90);
        let style = style();
        let engine = LayoutEngine::new(&style, &catalog, &font).expect("engine");

        let a = engine.render("Merhaba dünya!", &mut StdRng::seed_from_u64(9));
        let b = engine.render("Merhaba dünya!", &mut StdRng::seed_from_u64(9));
        assert_eq!(a.placements, b.placements);
        assert_eq!(a.pages, b.pages);
    }

    #[test]
    fn missing_glyphs_and_blank_lines_place_nothing() {
        let catalog = CharacterCatalog::build(&Alphabet::new("ab", "", "", ""), 1).expect("catalog");
        let mut font = FontAsset::new();
        font.insert("a_1", block(40, 80));
        let engine = LayoutEngine::new(&style(), &catalog, &font).expect("engine");

        let out = engine.render("ab z\r\n\r\na", &mut StdRng::seed_from_u64(3));
        let placed: Vec<(char, u32)> = out.placements.iter().map(|p| (p.character, p.line)).collect();
        assert_eq!(placed, [('a', 0), ('a', 2)]);
    }

    #[test]
    fn descenders_hang_below_the_baseline() {
        let catalog = CharacterCatalog::build(&Alphabet::new("ag", "", "", ""), 1).expect("catalog");
        let font = font_for(&catalog, 40, 100);
        let style = StyleConfig {
            jitter: 0.0,
            line_slope: 0.0,
            ..style()
        };
        let engine = LayoutEngine::new(&style, &catalog, &font).expect("engine");

        let out = engine.render("ag", &mut StdRng::seed_from_u64(4));
        let bottom = |p: &Placement| p.y + p.height as i64;
        assert_eq!(bottom(&out.placements[0]), 150);
        assert_eq!(bottom(&out.placements[1]), 172);
    }

    #[test]
    fn invalid_style_is_rejected() {
        let catalog = CharacterCatalog::build(&Alphabet::new("a", "", "", ""), 1).expect("catalog");
        let font = FontAsset::new();
        let style = StyleConfig {
            line_spacing: 0,
            ..style()
        };
        assert!(LayoutEngine::new(&style, &catalog, &font).is_err());
    }

    #[test]
    fn empty_text_still_yields_one_page() {
        let catalog = CharacterCatalog::build(&Alphabet::new("a", "", "", ""), 1).expect("catalog");
        let font = FontAsset::new();
        let engine = LayoutEngine::new(&style(), &catalog, &font).expect("engine");
        let out = engine.render("", &mut StdRng::seed_from_u64(5));
        assert_eq!(out.pages.len(), 1);
        assert!(out.placements.is_empty());
    }
}
