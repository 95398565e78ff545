// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Configuration: handwriting style, printed form geometry, and the tunable
// constants of the scan pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Alphabet;
use crate::error::{QuillformError, Result};
use crate::types::{InkColor, PaperSize, PaperType};

// -- Style ---------------------------------------------------------------------

/// Caller-supplied options for one synthesis run. All lengths are pixels of
/// the output page raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub page_width: u32,
    pub page_height: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    /// Height of a full-height glyph (capitals, digits).
    pub target_letter_height: u32,
    /// Distance between consecutive baselines.
    pub line_spacing: u32,
    /// Horizontal advance after each word.
    pub word_spacing: u32,
    /// Intensity of per-glyph scale, rotation and vertical noise.
    pub jitter: f32,
    pub ink_color: InkColor,
    /// Multiplier applied to glyph alpha, in [0, 1].
    pub opacity: f32,
    /// Positive values thicken strokes, negative values thin them.
    pub stroke_weight_delta: i32,
    pub paper_type: PaperType,
    /// Strength of the per-line slope/offset drift.
    pub line_slope: f32,
    /// Image stretched over the whole page under the rules, in place of
    /// plain white paper.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<PathBuf>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let (page_width, page_height) = PaperSize::A4.dimensions_px(300.0);
        Self {
            page_width,
            page_height,
            margin_top: 200,
            margin_bottom: 200,
            margin_left: 150,
            margin_right: 150,
            target_letter_height: 140,
            line_spacing: 220,
            word_spacing: 55,
            jitter: 3.0,
            ink_color: InkColor::Ballpoint,
            opacity: 0.95,
            stroke_weight_delta: 0,
            paper_type: PaperType::Ruled,
            line_slope: 5.0,
            background_image: None,
        }
    }
}

impl StyleConfig {
    /// Default style on a different paper size at the given resolution.
    pub fn for_paper(paper: PaperSize, dpi: f32) -> Self {
        let (page_width, page_height) = paper.dimensions_px(dpi);
        Self {
            page_width,
            page_height,
            ..Self::default()
        }
    }

    /// Right edge of the printable area. No glyph extends past it.
    pub fn printable_right(&self) -> u32 {
        self.page_width.saturating_sub(self.margin_right)
    }

    /// Lowest baseline allowed on a page.
    pub fn printable_bottom(&self) -> u32 {
        self.page_height.saturating_sub(self.margin_bottom)
    }

    pub fn printable_width(&self) -> u32 {
        self.printable_right().saturating_sub(self.margin_left)
    }

    /// Baseline of the given line on a page, before drift and jitter.
    pub fn baseline(&self, line: u32) -> f32 {
        self.margin_top as f32 + line as f32 * self.line_spacing as f32
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_width == 0 || self.page_height == 0 {
            return Err(invalid("page dimensions must be non-zero"));
        }
        if self.target_letter_height == 0 || self.line_spacing == 0 {
            return Err(invalid("letter height and line spacing must be non-zero"));
        }
        if self.margin_left + self.margin_right >= self.page_width {
            return Err(invalid("horizontal margins leave no printable width"));
        }
        if self.margin_top > self.printable_bottom() {
            return Err(invalid("first baseline lies below the printable area"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(invalid(format!("opacity {} outside [0, 1]", self.opacity)));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(invalid("jitter must be a non-negative number"));
        }
        if !self.line_slope.is_finite() || self.line_slope < 0.0 {
            return Err(invalid("line slope must be a non-negative number"));
        }
        Ok(())
    }
}

// -- Form geometry -------------------------------------------------------------

/// Geometry shared by the printed form and the scan pipeline, expressed in
/// the canonical frame every section is warped into. The defaults describe
/// one half of an A4 page (A5 landscape) at 10 px/mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Distance from each canvas edge to the centre of the nearest marker.
    pub marker_margin: u32,
    /// Printed marker edge length.
    pub marker_size: u32,
    pub rows: u32,
    pub cols: u32,
    pub cell_size: u32,
    /// Explicit grid origin; the grid is centred on the canvas when unset.
    pub grid_offset_x: Option<u32>,
    pub grid_offset_y: Option<u32>,
    /// Resolution at which the canonical frame prints at physical size.
    pub print_dpi: f32,
}

impl Default for FormGeometry {
    fn default() -> Self {
        Self {
            canvas_width: 2100,
            canvas_height: 1480,
            marker_margin: 175,
            marker_size: 150,
            rows: 6,
            cols: 10,
            cell_size: 150,
            grid_offset_x: None,
            grid_offset_y: None,
            print_dpi: 254.0,
        }
    }
}

impl FormGeometry {
    pub fn cells_per_section(&self) -> u32 {
        self.rows * self.cols
    }

    /// Top-left corner of the cell grid.
    pub fn grid_origin(&self) -> (u32, u32) {
        let x = self.grid_offset_x.unwrap_or_else(|| {
            self.canvas_width.saturating_sub(self.cols * self.cell_size) / 2
        });
        let y = self.grid_offset_y.unwrap_or_else(|| {
            self.canvas_height.saturating_sub(self.rows * self.cell_size) / 2
        });
        (x, y)
    }

    /// Top-left corner of one cell.
    pub fn cell_origin(&self, row: u32, col: u32) -> (u32, u32) {
        let (gx, gy) = self.grid_origin();
        (gx + col * self.cell_size, gy + row * self.cell_size)
    }

    /// Canonical marker centres ordered top-left, top-right, bottom-left,
    /// bottom-right (the order of a section's marker id offsets).
    pub fn marker_centres(&self) -> [(f32, f32); 4] {
        let m = self.marker_margin as f32;
        let w = self.canvas_width as f32;
        let h = self.canvas_height as f32;
        [(m, m), (w - m, m), (m, h - m), (w - m, h - m)]
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 || self.cell_size == 0 {
            return Err(invalid("grid must have at least one cell"));
        }
        let (gx, gy) = self.grid_origin();
        if gx + self.cols * self.cell_size > self.canvas_width
            || gy + self.rows * self.cell_size > self.canvas_height
        {
            return Err(invalid("cell grid does not fit inside the canonical frame"));
        }
        let half = self.marker_size / 2;
        if self.marker_size == 0
            || self.marker_margin < half
            || 2 * self.marker_margin >= self.canvas_width.min(self.canvas_height)
        {
            return Err(invalid("markers do not fit inside the canonical frame"));
        }
        if !(self.print_dpi > 0.0) {
            return Err(invalid("print resolution must be positive"));
        }
        Ok(())
    }
}

// -- Scan tuning ---------------------------------------------------------------

/// One grayscale preprocessing strategy tried by the marker locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MarkerPreprocess {
    /// Grayscale as captured.
    Raw,
    /// Histogram-equalized grayscale.
    Equalized,
    /// Global binarization at a fixed level.
    FixedThreshold { level: u8 },
    /// Global binarization at the Otsu level.
    Otsu,
}

/// Recalibratable constants of the scan pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Inward padding applied to each cell to drop the printed box.
    pub cell_padding: u32,
    /// Width of the strip blanked along each ROI edge after thresholding.
    pub border_strip: u32,
    /// Gaussian blur sigma applied before thresholding; 0 disables it.
    pub blur_sigma: f32,
    /// Adaptive threshold block radius (block = 2r + 1).
    pub threshold_block_radius: u32,
    /// Amount a pixel must be darker than its local mean to count as ink.
    pub threshold_constant: i32,
    /// Morphological opening radius; 0 disables it.
    pub opening_radius: u8,
    /// Crops smaller than this in either dimension count as empty.
    pub min_glyph_size: u32,
    /// Preprocessing strategies, tried in order until 4 markers are found.
    pub marker_variants: Vec<MarkerPreprocess>,
    /// Adaptive threshold radii used to segment marker candidates.
    pub marker_threshold_radii: Vec<u32>,
    pub marker_threshold_constant: i32,
    /// Candidate perimeter bounds, relative to the larger image dimension.
    pub min_marker_perimeter_rate: f32,
    pub max_marker_perimeter_rate: f32,
    /// Allowed contour deviation from its fitted quad, relative to perimeter.
    pub polygon_accuracy_rate: f32,
    /// Border cells allowed to read white.
    pub max_border_errors: u32,
    /// Data bits the dictionary match may correct.
    pub max_correction_bits: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cell_padding: 15,
            border_strip: 3,
            blur_sigma: 0.8,
            threshold_block_radius: 12,
            threshold_constant: 12,
            opening_radius: 1,
            min_glyph_size: 5,
            marker_variants: vec![
                MarkerPreprocess::Raw,
                MarkerPreprocess::Equalized,
                MarkerPreprocess::FixedThreshold { level: 128 },
                MarkerPreprocess::Otsu,
            ],
            marker_threshold_radii: vec![7, 17, 37],
            marker_threshold_constant: 7,
            min_marker_perimeter_rate: 0.03,
            max_marker_perimeter_rate: 4.0,
            polygon_accuracy_rate: 0.05,
            max_border_errors: 1,
            max_correction_bits: 1,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.marker_variants.is_empty() {
            return Err(invalid("at least one marker preprocessing variant is required"));
        }
        if self.marker_threshold_radii.iter().any(|r| *r == 0) || self.marker_threshold_radii.is_empty() {
            return Err(invalid("marker threshold radii must be non-empty and non-zero"));
        }
        if self.threshold_block_radius == 0 {
            return Err(invalid("threshold block radius must be non-zero"));
        }
        if !(self.min_marker_perimeter_rate < self.max_marker_perimeter_rate) {
            return Err(invalid("marker perimeter bounds are inverted"));
        }
        Ok(())
    }
}

// -- Bundled configuration -----------------------------------------------------

/// Everything a session needs, persisted as pretty JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillformConfig {
    pub alphabet: Alphabet,
    /// Handwritten variants collected per character. Scanning and synthesis
    /// must agree on it for slot addressing to line up.
    pub variation_count: u32,
    pub style: StyleConfig,
    pub form: FormGeometry,
    pub scan: ScanConfig,
}

impl Default for QuillformConfig {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::default(),
            variation_count: 3,
            style: StyleConfig::default(),
            form: FormGeometry::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl QuillformConfig {
    /// Load a configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.variation_count == 0 {
            return Err(invalid("variation count must be at least 1"));
        }
        self.style.validate()?;
        self.form.validate()?;
        self.scan.validate()
    }
}

fn invalid(msg: impl Into<String>) -> QuillformError {
    QuillformError::InvalidConfig(msg.into())
}
