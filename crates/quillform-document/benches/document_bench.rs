// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the quillform-document crate: isolating a glyph
// from one form cell, and laying a paragraph out onto pages.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma, Rgb, RgbImage};
use rand::SeedableRng;
use rand::rngs::StdRng;

use quillform_core::catalog::{Alphabet, CharacterCatalog};
use quillform_core::config::{ScanConfig, StyleConfig};
use quillform_core::glyph::{FontAsset, GlyphImage};
use quillform_document::LayoutEngine;
use quillform_document::scan::GlyphIsolator;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Isolate an "L" stroke from a padded 120x120 cell, the size every slot is
/// cropped to with the default form geometry.
fn bench_glyph_isolation(c: &mut Criterion) {
    let mut cell = RgbImage::from_pixel(120, 120, Rgb([245, 242, 238]));
    for y in 25..95 {
        for x in 40..48 {
            cell.put_pixel(x, y, Rgb([30, 30, 60]));
        }
    }
    for y in 87..95 {
        for x in 40..80 {
            cell.put_pixel(x, y, Rgb([30, 30, 60]));
        }
    }
    let isolator = GlyphIsolator::new(&ScanConfig::default());

    c.bench_function("glyph_isolation (120x120)", |b| {
        b.iter(|| black_box(isolator.isolate(black_box(&cell))));
    });
}

/// Lay a 60-word paragraph onto A4 pages at 300 DPI.
fn bench_layout(c: &mut Criterion) {
    let catalog = CharacterCatalog::build(&Alphabet::new("abcdefghij", "", "", ""), 3)
        .expect("catalog");
    let mut font = FontAsset::new();
    for name in catalog.slot_names() {
        let glyph = GlyphImage::from_mask(&GrayImage::from_pixel(70, 110, Luma([255])));
        font.insert(name.clone(), glyph);
    }
    let style = StyleConfig::default();
    let engine = LayoutEngine::new(&style, &catalog, &font).expect("engine");
    let text = vec!["badge caged hide jab"; 20].join(" ");

    c.bench_function("layout (60 words, A4)", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            black_box(engine.render(black_box(&text), &mut rng));
        });
    });
}

criterion_group!(benches, bench_glyph_isolation, bench_layout);
criterion_main!(benches);
