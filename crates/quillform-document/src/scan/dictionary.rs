// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fiducial dictionary: 50 square 4x4-bit codes, each surrounded by a
// one-cell black border (6x6 cells in total).
//
// Bit 1 is a white cell. Cell (r, c) of the data area is bit 15 - (4r + c).
// Every pair of codes differs in at least 3 bits under all four rotations,
// and no code lies within 3 bits of its own rotations, so a single flipped
// cell is corrected and the id is recovered in any orientation.

use image::{GrayImage, Luma};
use quillform_core::catalog::MARKER_ID_COUNT;
use quillform_core::error::{QuillformError, Result};

/// Data cells per marker side.
pub const DATA_BITS: u32 = 4;
/// Cells per marker side including the border.
pub const MARKER_CELLS: u32 = DATA_BITS + 2;

const CODES: [u16; MARKER_ID_COUNT as usize] = [
    0xB63A, 0x74AB, 0xB3AC, 0x4626, 0x5123, 0x1A71, 0x3F6C, 0x7191, 0xEA5D, 0xCF31,
    0x4E18, 0xC23E, 0x56BC, 0xF2D2, 0xA751, 0xF49D, 0xB972, 0xC4DB, 0x9E6F, 0x0239,
    0x9EAE, 0x0B2B, 0x22C8, 0xD022, 0x1F2F, 0x740C, 0x4DE3, 0x38ED, 0x9168, 0x7BA2,
    0xDA99, 0xE539, 0x27A7, 0x4855, 0xD4FE, 0xD991, 0x5015, 0x39B8, 0x91AA, 0x9F7A,
    0x3F94, 0xBA8A, 0x364D, 0x7DC0, 0x0E49, 0x434C, 0x98DC, 0x2A8E, 0xADE0, 0xE2B9,
];

/// Code for a marker id, if it exists.
pub fn code(id: u32) -> Option<u16> {
    CODES.get(id as usize).copied()
}

/// Read data bit (row, col), true = white.
pub fn bit(code: u16, row: u32, col: u32) -> bool {
    (code >> (15 - (row * DATA_BITS + col))) & 1 == 1
}

/// Rotate a code a quarter turn clockwise.
pub fn rotate_cw(code: u16) -> u16 {
    let mut out = 0u16;
    for r in 0..DATA_BITS {
        for c in 0..DATA_BITS {
            if bit(code, DATA_BITS - 1 - c, r) {
                out |= 1 << (15 - (r * DATA_BITS + c));
            }
        }
    }
    out
}

/// Result of matching observed bits against the dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeMatch {
    pub id: u32,
    /// Quarter turns clockwise that bring the observed bits upright.
    pub rotation: u8,
    /// Bits corrected to reach the dictionary code.
    pub distance: u32,
}

/// Find the dictionary code nearest to `observed` under any rotation,
/// accepting it when at most `max_correction` bits differ.
pub fn identify(observed: u16, max_correction: u32) -> Option<CodeMatch> {
    let mut best: Option<CodeMatch> = None;
    let mut candidate = observed;
    for rotation in 0..4u8 {
        for (id, code) in CODES.iter().enumerate() {
            let distance = (candidate ^ code).count_ones();
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(CodeMatch {
                    id: id as u32,
                    rotation,
                    distance,
                });
            }
        }
        candidate = rotate_cw(candidate);
    }
    best.filter(|m| m.distance <= max_correction)
}

/// Draw a marker as a `size` x `size` grayscale image.
pub fn render_marker(id: u32, size: u32) -> Result<GrayImage> {
    let code = code(id).ok_or_else(|| {
        QuillformError::InvalidConfig(format!(
            "marker id {id} is outside the {MARKER_ID_COUNT}-id dictionary"
        ))
    })?;
    if size < MARKER_CELLS {
        return Err(QuillformError::InvalidConfig(format!(
            "marker size {size}px is smaller than {MARKER_CELLS} cells"
        )));
    }

    Ok(GrayImage::from_fn(size, size, |x, y| {
        let col = x * MARKER_CELLS / size;
        let row = y * MARKER_CELLS / size;
        let border = row == 0 || col == 0 || row == MARKER_CELLS - 1 || col == MARKER_CELLS - 1;
        let white = !border && bit(code, row - 1, col - 1);
        Luma([if white { 255 } else { 0 }])
    }))
}
