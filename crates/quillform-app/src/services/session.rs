// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session — owns the configuration, the character catalog and the growing
// glyph collection, and runs scans and synthesis against them.
//
// Scanning is CPU-bound and independent per section, so batches are scanned
// in parallel on the rayon pool. Merging into the font and the glyph store
// happens afterwards on the calling thread, in input order, so the last
// photo of a slot always wins.

use std::collections::BTreeSet;

use image::RgbImage;
use quillform_core::catalog::CharacterCatalog;
use quillform_core::config::QuillformConfig;
use quillform_core::error::Result;
use quillform_core::glyph::FontAsset;
use quillform_core::store::{DirGlyphStore, load_font_asset};
use quillform_document::layout::RenderedText;
use quillform_document::{FormRenderer, LayoutEngine, PdfAssembler, SectionScan, SectionScanner};
use rand::Rng;
use rayon::prelude::*;
use tracing::{error, info, instrument, warn};

pub struct Session {
    config: QuillformConfig,
    catalog: CharacterCatalog,
    scanner: SectionScanner,
    font: FontAsset,
    completed: BTreeSet<u32>,
    store: Option<DirGlyphStore>,
}

impl Session {
    /// In-memory session with no glyphs yet.
    pub fn new(config: QuillformConfig) -> Result<Self> {
        config.validate()?;
        let catalog = CharacterCatalog::build(&config.alphabet, config.variation_count)?;
        let scanner = SectionScanner::new(&config.form, &config.scan);
        info!(
            slots = catalog.len(),
            sections = catalog.section_count(&config.form),
            "session ready"
        );
        Ok(Self {
            config,
            catalog,
            scanner,
            font: FontAsset::new(),
            completed: BTreeSet::new(),
            store: None,
        })
    }

    /// Session backed by a glyph directory: existing glyphs and completed
    /// sections are loaded, and every later scan is written back.
    pub fn with_store(config: QuillformConfig, store: DirGlyphStore) -> Result<Self> {
        let mut session = Self::new(config)?;
        session.font = load_font_asset(&store)?;
        session.completed = store.completed_sections()?;
        let unknown = session
            .font
            .slot_names()
            .filter(|name| session.catalog.index_of(name).is_none())
            .count();
        if unknown > 0 {
            warn!(unknown, "store holds glyphs this catalog does not address");
        }
        info!(
            glyphs = session.font.len(),
            completed = session.completed.len(),
            root = %store.root().display(),
            "glyph store loaded"
        );
        session.store = Some(store);
        Ok(session)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn config(&self) -> &QuillformConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CharacterCatalog {
        &self.catalog
    }

    pub fn font(&self) -> &FontAsset {
        &self.font
    }

    pub fn completed_sections(&self) -> &BTreeSet<u32> {
        &self.completed
    }

    /// (completed, total) section counts.
    pub fn progress(&self) -> (usize, u32) {
        (self.completed.len(), self.catalog.section_count(&self.config.form))
    }

    // -- Scanning -------------------------------------------------------------

    /// Scan one photographed section and merge its glyphs.
    pub fn ingest(&mut self, image: &RgbImage, forced_section: Option<u32>) -> Result<SectionScan> {
        let scan = self.scanner.scan(image, &self.catalog, forced_section)?;
        self.merge(&scan)?;
        Ok(scan)
    }

    /// Scan many photos in parallel. Results come back in input order; a
    /// failed photo is reported in its slot and does not stop the others.
    #[instrument(skip(self, images), fields(photos = images.len()))]
    pub fn ingest_batch(
        &mut self,
        images: &[RgbImage],
        forced_section: Option<u32>,
    ) -> Vec<Result<SectionScan>> {
        let scanner = &self.scanner;
        let catalog = &self.catalog;
        let scans: Vec<Result<SectionScan>> = images
            .par_iter()
            .map(|image| scanner.scan(image, catalog, forced_section))
            .collect();

        let mut results = Vec::with_capacity(scans.len());
        for scan in scans {
            let merged = scan.and_then(|scan| self.merge(&scan).map(|()| scan));
            if let Err(ref e) = merged {
                error!(error = %e, "section scan failed");
            }
            results.push(merged);
        }
        results
    }

    /// Persist first, then update memory, so a failed write leaves both
    /// the store and the session as they were.
    fn merge(&mut self, scan: &SectionScan) -> Result<()> {
        if let Some(store) = self.store.as_mut() {
            store.commit_section(scan.section_id, &scan.glyphs)?;
        }
        let merged = self.font.merge(scan.glyphs.clone());
        self.completed.insert(scan.section_id);
        info!(
            section_id = scan.section_id,
            merged,
            glyphs = self.font.len(),
            "section merged"
        );
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// The printable form for this catalog.
    pub fn form_pdf(&self) -> Result<Vec<u8>> {
        FormRenderer::new(&self.config.form).render_pdf(&self.catalog)
    }

    pub fn synthesize<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Result<RenderedText> {
        let engine = LayoutEngine::new(&self.config.style, &self.catalog, &self.font)?;
        Ok(engine.render(text, rng))
    }

    pub fn synthesize_pdf<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Result<Vec<u8>> {
        let rendered = self.synthesize(text, rng)?;
        let mut assembler = PdfAssembler::default();
        assembler.set_title("Quillform handwriting");
        assembler.assemble(&rendered.pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, imageops};
    use quillform_core::catalog::Alphabet;
    use quillform_core::config::FormGeometry;
    use quillform_core::error::QuillformError;
    use quillform_document::PdfReader;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config() -> QuillformConfig {
        QuillformConfig {
            alphabet: Alphabet::new("abcdefghij", "", "", ""),
            variation_count: 3,
            ..QuillformConfig::default()
        }
    }

    /// A printed section with an "L" in each of the given slots, pasted on a
    /// grey border as if photographed head-on.
    fn photo(session: &Session, section_id: u32, inked: &[usize]) -> RgbImage {
        let form = &session.config().form;
        let slots = session.catalog().section_range(section_id, form).len();
        let mut section = FormRenderer::new(form)
            .render_section(section_id, slots)
            .expect("render");
        for &index in inked {
            let local = index % form.cells_per_section() as usize;
            let (x0, y0) = form.cell_origin(local as u32 / form.cols, local as u32 % form.cols);
            for y in y0 + 40..y0 + 110 {
                for x in x0 + 55..x0 + 63 {
                    section.put_pixel(x, y, Rgb([20, 20, 40]));
                }
            }
            for y in y0 + 102..y0 + 110 {
                for x in x0 + 55..x0 + 95 {
                    section.put_pixel(x, y, Rgb([20, 20, 40]));
                }
            }
        }
        let mut photo = RgbImage::from_pixel(2300, 1680, Rgb([90, 90, 90]));
        imageops::overlay(&mut photo, &section, 100, 100);
        photo
    }

    #[test]
    fn ingest_merges_glyphs_and_marks_section_complete() {
        let mut session = Session::new(config()).expect("session");
        assert_eq!(session.progress(), (0, 1));

        let scan = session.ingest(&photo(&session, 0, &[0, 4]), None).expect("ingest");
        assert_eq!(scan.detected, 2);
        assert!(session.font().contains("a_1"));
        assert!(session.font().contains("b_2"));
        assert_eq!(session.progress(), (1, 1));
    }

    #[test]
    fn batch_keeps_input_order_and_isolates_failures() {
        let mut session = Session::new(config()).expect("session");
        let blank = RgbImage::from_pixel(640, 480, Rgb([255, 255, 255]));
        let first = photo(&session, 0, &[0]);
        let second = photo(&session, 0, &[1]);

        let results = session.ingest_batch(&[first, blank, second], None);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(QuillformError::MarkerDetection { .. })
        ));
        assert!(results[2].is_ok());
        assert!(session.font().contains("a_1"));
        assert!(session.font().contains("a_2"));
        assert_eq!(session.completed_sections().len(), 1);
    }

    #[test]
    fn store_round_trips_between_sessions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirGlyphStore::open(dir.path()).expect("store");
        let mut session = Session::with_store(config(), store).expect("session");
        session
            .ingest(&photo(&session, 0, &[3, 9]), None)
            .expect("ingest");

        let reopened = DirGlyphStore::open(dir.path()).expect("store");
        let session = Session::with_store(config(), reopened).expect("session");
        assert_eq!(session.font().len(), 2);
        assert!(session.font().contains("b_1"));
        assert!(session.font().contains("d_1"));
        assert_eq!(session.completed_sections().iter().copied().collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn failed_store_write_changes_neither_store_nor_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirGlyphStore::open(dir.path()).expect("store");
        let mut session = Session::with_store(config(), store).expect("session");
        let mut scan = session
            .scanner
            .scan(&photo(&session, 0, &[0, 4]), &session.catalog, None)
            .expect("scan");
        let glyph = scan.glyphs["a_1"].clone();
        scan.glyphs.insert("not/a slot".into(), glyph);

        assert!(matches!(
            session.merge(&scan),
            Err(QuillformError::GlyphStore(_))
        ));
        assert!(session.font().is_empty());
        assert!(session.completed_sections().is_empty());

        let reopened = DirGlyphStore::open(dir.path()).expect("store");
        let session = Session::with_store(config(), reopened).expect("session");
        assert!(session.font().is_empty());
        assert!(session.completed_sections().is_empty());
    }

    #[test]
    fn synthesized_pdf_has_a_page_per_rendered_page() {
        let mut session = Session::new(config()).expect("session");
        let all: Vec<usize> = (0..30).collect();
        session.ingest(&photo(&session, 0, &all), None).expect("ingest");

        let mut rng = StdRng::seed_from_u64(21);
        let rendered = session.synthesize("bad cafe", &mut rng).expect("render");
        assert_eq!(rendered.placements.len(), 7);

        let pdf = session
            .synthesize_pdf("bad cafe", &mut StdRng::seed_from_u64(21))
            .expect("pdf");
        assert_eq!(PdfReader::from_bytes(&pdf).expect("parse").page_count(), 1);
    }

    #[test]
    fn form_pdf_covers_every_section() {
        let config = QuillformConfig {
            variation_count: 9,
            form: FormGeometry::default(),
            ..config()
        };
        let session = Session::new(config).expect("session");
        // 90 slots need two sections, which share one page.
        assert_eq!(session.progress(), (0, 2));
        let pdf = session.form_pdf().expect("form");
        assert_eq!(PdfReader::from_bytes(&pdf).expect("parse").page_count(), 1);
    }

    #[test]
    fn zero_variations_is_rejected() {
        let config = QuillformConfig {
            variation_count: 0,
            ..config()
        };
        assert!(matches!(
            Session::new(config),
            Err(QuillformError::InvalidConfig(_))
        ));
    }
}
