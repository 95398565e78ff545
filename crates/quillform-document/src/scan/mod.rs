// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — marker location, perspective rectification, grid
// segmentation and glyph isolation.

pub mod binarize;
pub mod dictionary;
pub mod grid;
pub mod isolate;
pub mod markers;
pub mod rectify;
pub mod scanner;

pub use dictionary::render_marker;
pub use grid::{CellRegion, GridSegmenter};
pub use isolate::GlyphIsolator;
pub use markers::{DetectedMarker, MarkerLocator};
pub use rectify::{RectifiedSection, Rectifier};
pub use scanner::{SectionScan, SectionScanner};
