// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quillform — core types, configuration, character catalog and glyph storage
// shared across all crates.

pub mod catalog;
pub mod config;
pub mod error;
pub mod glyph;
pub mod human_errors;
pub mod store;
pub mod types;

pub use catalog::{Alphabet, CharacterCatalog, CharacterSlot};
pub use config::{FormGeometry, QuillformConfig, ScanConfig, StyleConfig};
pub use error::QuillformError;
pub use glyph::{FontAsset, GlyphImage};
pub use store::{DirGlyphStore, GlyphStore};
pub use types::*;
