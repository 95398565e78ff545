// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph storage: a key(slot name) -> bitmap interface plus a directory-backed
// implementation that keeps one PNG per slot.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::error::{QuillformError, Result};
use crate::glyph::{FontAsset, GlyphImage};

/// Persistent home for extracted glyphs.
///
/// Scanning writes through `put`; synthesis reads a whole font back with
/// [`load_font_asset`].
pub trait GlyphStore {
    /// Store a glyph under its slot name, replacing any previous glyph.
    fn put(&mut self, slot_name: &str, glyph: &GlyphImage) -> Result<()>;

    /// Fetch a glyph. Returns Ok(None) if the slot has never been filled.
    fn get(&self, slot_name: &str) -> Result<Option<GlyphImage>>;

    /// Every slot name currently held, sorted.
    fn slot_names(&self) -> Result<Vec<String>>;
}

impl GlyphStore for FontAsset {
    fn put(&mut self, slot_name: &str, glyph: &GlyphImage) -> Result<()> {
        self.insert(slot_name, glyph.clone());
        Ok(())
    }

    fn get(&self, slot_name: &str) -> Result<Option<GlyphImage>> {
        Ok(FontAsset::get(self, slot_name).cloned())
    }

    fn slot_names(&self) -> Result<Vec<String>> {
        Ok(FontAsset::slot_names(self).map(str::to_string).collect())
    }
}

/// Read every glyph in a store into memory.
pub fn load_font_asset(store: &dyn GlyphStore) -> Result<FontAsset> {
    let mut asset = FontAsset::new();
    for slot in store.slot_names()? {
        if let Some(glyph) = store.get(&slot)? {
            asset.insert(slot, glyph);
        }
    }
    Ok(asset)
}

// -- Directory store -----------------------------------------------------------

const SECTIONS_FILE: &str = "sections.json";

/// `<dir>/<slot>.png` per glyph, plus `sections.json` listing the section
/// ids that have been scanned successfully.
#[derive(Debug, Clone)]
pub struct DirGlyphStore {
    root: PathBuf,
}

impl DirGlyphStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "glyph store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot_name: &str) -> Result<PathBuf> {
        let safe = !slot_name.is_empty()
            && slot_name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if !safe {
            return Err(QuillformError::GlyphStore(format!(
                "slot name {slot_name:?} is not a safe file name"
            )));
        }
        Ok(self.root.join(format!("{slot_name}.png")))
    }

    /// Completed section ids. An absent file means none.
    pub fn completed_sections(&self) -> Result<BTreeSet<u32>> {
        let path = self.root.join(SECTIONS_FILE);
        if !path.exists() {
            return Ok(BTreeSet::new());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write a scanned section's glyphs and mark it complete, all or
    /// nothing: every glyph is encoded to a staging file first, staged files
    /// are renamed into place, and `sections.json` is updated last. A
    /// failure before the renames leaves the store untouched.
    #[instrument(skip(self, glyphs))]
    pub fn commit_section<'a>(
        &mut self,
        section_id: u32,
        glyphs: impl IntoIterator<Item = (&'a String, &'a GlyphImage)>,
    ) -> Result<()> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::new();
        let staging = glyphs.into_iter().try_for_each(|(slot, glyph)| {
            let target = self.slot_path(slot)?;
            let temp = target.with_extension("png.staged");
            std::fs::write(&temp, glyph.to_png_bytes()?)?;
            staged.push((temp, target));
            Ok::<(), QuillformError>(())
        });
        if let Err(e) = staging {
            for (temp, _) in &staged {
                let _ = std::fs::remove_file(temp);
            }
            warn!(section_id, error = %e, "section not committed");
            return Err(e);
        }

        for (temp, target) in &staged {
            std::fs::rename(temp, target)?;
        }
        self.record_sections([section_id])
    }

    /// Union `sections` into the persisted completed set.
    #[instrument(skip(self, sections))]
    pub fn record_sections(&self, sections: impl IntoIterator<Item = u32>) -> Result<()> {
        let mut completed = self.completed_sections()?;
        completed.extend(sections);
        let json = serde_json::to_string_pretty(&completed)?;
        std::fs::write(self.root.join(SECTIONS_FILE), json)?;
        debug!(completed = completed.len(), "completed sections recorded");
        Ok(())
    }
}

impl GlyphStore for DirGlyphStore {
    fn put(&mut self, slot_name: &str, glyph: &GlyphImage) -> Result<()> {
        let path = self.slot_path(slot_name)?;
        std::fs::write(path, glyph.to_png_bytes()?)?;
        Ok(())
    }

    fn get(&self, slot_name: &str) -> Result<Option<GlyphImage>> {
        let path = self.slot_path(slot_name)?;
        match std::fs::read(&path) {
            Ok(bytes) => GlyphImage::from_png_bytes(&bytes).map(Some),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn slot_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => names.push(stem.to_string()),
                None => warn!(path = %path.display(), "skipping non UTF-8 glyph file"),
            }
        }
        names.sort();
        Ok(names)
    }
}
