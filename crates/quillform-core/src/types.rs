// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by the scan pipeline and the synthesis engine.

use serde::{Deserialize, Serialize};

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Raster dimensions in pixels at the given resolution.
    pub fn dimensions_px(&self, dpi: f32) -> (u32, u32) {
        let (w_mm, h_mm) = self.dimensions_mm();
        let to_px = |mm: u32| (mm as f32 * dpi / 25.4).round() as u32;
        (to_px(w_mm), to_px(h_mm))
    }
}

/// Background printed behind synthesized handwriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    /// Plain white page.
    Blank,
    /// Horizontal rules at line-spacing pitch.
    #[default]
    Ruled,
    /// Rules plus vertical lines at the same pitch (squared paper).
    Grid,
}

/// Ink colour presets, named after the pens they imitate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InkColor {
    #[default]
    Ballpoint,
    BicBlue,
    PilotBlue,
    OldInk,
    Red,
    Navy,
    Custom { r: u8, g: u8, b: u8 },
}

impl InkColor {
    /// The base RGB value before per-pixel dithering.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Self::Ballpoint => [27, 27, 29],
            Self::BicBlue => [0, 35, 102],
            Self::PilotBlue => [0, 51, 153],
            Self::OldInk => [40, 60, 120],
            Self::Red => [180, 20, 20],
            Self::Navy => [24, 18, 110],
            Self::Custom { r, g, b } => [*r, *g, *b],
        }
    }
}

/// Catalog class of a source character. Catalog order follows declaration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    Symbol,
}

/// Where a slot lives on the printed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPosition {
    pub section_id: u32,
    pub row: u32,
    pub col: u32,
}

impl std::fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "section {} r{} c{}", self.section_id, self.row, self.col)
    }
}
