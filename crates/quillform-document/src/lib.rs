// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quillform-document — Image and PDF work for Quillform.
//
// Provides the scan pipeline (marker location, rectification, grid
// segmentation, glyph isolation), the printable form, glyph preparation,
// text layout with pagination, and PDF assembly.

pub mod form;
pub mod image;
pub mod layout;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `quillform_document::LayoutEngine` etc.
pub use form::FormRenderer;
pub use crate::image::processor::GlyphProcessor;
pub use layout::{LayoutEngine, Paginator, Placement, RenderedText};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfAssembler;
pub use scan::{MarkerLocator, Rectifier, SectionScan, SectionScanner};
