// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quillform.

use thiserror::Error;

/// Top-level error type for all Quillform operations.
///
/// Per-cell gaps (an empty form cell) and per-character gaps (no glyph for a
/// character at synthesis time) are not errors: they are reported through
/// the scan result's missing list or skipped during layout.
#[derive(Debug, Error)]
pub enum QuillformError {
    // -- Scan errors --
    #[error("marker detection failed: found {found}/4 markers")]
    MarkerDetection { found: usize },

    #[error("section {section_id} is missing markers {missing:?} (expected {expected:?})")]
    IncompleteMarkerSet {
        section_id: u32,
        expected: [u32; 4],
        missing: Vec<u32>,
    },

    #[error("section {section_id} is outside the catalog ({sections} sections)")]
    SectionOutOfRange { section_id: u32, sections: u32 },

    #[error("perspective rectification failed: {0}")]
    Rectification(String),

    // -- Catalog / configuration --
    #[error("character catalog error: {0}")]
    Catalog(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Document errors --
    #[error("no pages to assemble")]
    EmptyDocument,

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("glyph store error: {0}")]
    GlyphStore(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuillformError>;
