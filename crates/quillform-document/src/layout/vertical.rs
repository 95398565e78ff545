// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vertical classes — how tall a character is drawn relative to the target
// letter height and how far it hangs below the baseline.

const PUNCTUATION: &str = ".,:;'";
const TALL: &str = "!?()[]{}/\\|@$€₺&";
const DESCENDERS: &str = "gjpyqğ_";
const ASCENDERS: &str = "bdfhklt";
const BODY_SYMBOLS: &str = "-+*=<>%^#~\"";

/// Share of the letter height a descender tail drops below the baseline.
const DESCENDER_SHIFT: f32 = 0.22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalClass {
    /// Small marks sitting on the baseline.
    Punctuation,
    Tall,
    Descender,
    Ascender,
    /// Lowercase body height.
    Body,
    /// Capitals, digits and anything unclassified.
    Full,
}

impl VerticalClass {
    pub fn of(ch: char) -> Self {
        if PUNCTUATION.contains(ch) {
            Self::Punctuation
        } else if TALL.contains(ch) {
            Self::Tall
        } else if DESCENDERS.contains(ch) {
            Self::Descender
        } else if ASCENDERS.contains(ch) {
            Self::Ascender
        } else if ch.is_lowercase() || BODY_SYMBOLS.contains(ch) {
            Self::Body
        } else {
            Self::Full
        }
    }

    /// Fraction of the target letter height.
    pub fn scale(self) -> f32 {
        match self {
            Self::Punctuation => 0.28,
            Self::Tall => 0.90,
            Self::Descender | Self::Body => 0.72,
            Self::Ascender => 0.95,
            Self::Full => 1.0,
        }
    }

    /// Downward baseline shift in pixels for a given letter height.
    pub fn baseline_shift(self, letter_height: f32) -> f32 {
        match self {
            Self::Descender => DESCENDER_SHIFT * letter_height,
            _ => 0.0,
        }
    }
}
