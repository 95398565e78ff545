// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Character catalog: deterministic alphabet -> slot name -> form position
// mapping shared by the scan pipeline and the synthesis engine.
//
// Slot names are ASCII-safe: lowercase letters keep their own name ("a"),
// capitals are prefixed ("upper_a"), digits become "digit_N" and symbols
// use a fixed English table ("period", "paren_open", ...). Every name is
// suffixed with a 1-based variation index, so V = 2 produces "a_1", "a_2".

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FormGeometry;
use crate::error::{QuillformError, Result};
use crate::types::{CharClass, SlotPosition};

/// Number of distinct ids in the fiducial dictionary.
pub const MARKER_ID_COUNT: u32 = 50;

/// The four marker ids printed around a section, ordered top-left,
/// top-right, bottom-left, bottom-right. Ids recycle modulo the dictionary
/// size once section 12 is reached.
pub fn section_marker_ids(section_id: u32) -> [u32; 4] {
    let base = (section_id % MARKER_ID_COUNT) * 4;
    [0, 1, 2, 3].map(|k| (base + k) % MARKER_ID_COUNT)
}

/// Strip the trailing `_N` variation suffix from a slot name.
pub fn base_name_of(slot_name: &str) -> &str {
    match slot_name.rsplit_once('_') {
        Some((base, suffix))
            if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => slot_name,
    }
}

// -- Alphabet ------------------------------------------------------------------

/// The characters collected on the form, grouped by class. Whitespace is
/// ignored and repeated characters keep their first position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alphabet {
    pub lower: String,
    pub upper: String,
    pub digits: String,
    pub symbols: String,
}

impl Default for Alphabet {
    /// Turkish + English letters, decimal digits and common punctuation.
    fn default() -> Self {
        Self {
            lower: "abcçdefgğhıijklmnoöpqrsştuüvwxyz".into(),
            upper: "ABCÇDEFGĞHIİJKLMNOÖPQRSŞTUÜVWXYZ".into(),
            digits: "0123456789".into(),
            symbols: ".,:;?!-_\"'()[]{}/\\|+*=<>%^~@$€₺&#".into(),
        }
    }
}

impl Alphabet {
    pub fn new(
        lower: impl Into<String>,
        upper: impl Into<String>,
        digits: impl Into<String>,
        symbols: impl Into<String>,
    ) -> Self {
        Self {
            lower: lower.into(),
            upper: upper.into(),
            digits: digits.into(),
            symbols: symbols.into(),
        }
    }

    /// Sort loose characters into classes by their Unicode properties.
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        let mut alphabet = Self::new("", "", "", "");
        for ch in chars {
            match classify(ch) {
                CharClass::Lower => alphabet.lower.push(ch),
                CharClass::Upper => alphabet.upper.push(ch),
                CharClass::Digit => alphabet.digits.push(ch),
                CharClass::Symbol => alphabet.symbols.push(ch),
            }
        }
        alphabet
    }

    /// Unique, non-whitespace characters in catalog order.
    pub fn characters(&self) -> Vec<(CharClass, char)> {
        let mut seen = HashSet::new();
        [
            (CharClass::Lower, &self.lower),
            (CharClass::Upper, &self.upper),
            (CharClass::Digit, &self.digits),
            (CharClass::Symbol, &self.symbols),
        ]
        .into_iter()
        .flat_map(|(class, chars)| chars.chars().map(move |ch| (class, ch)))
        .filter(|(_, ch)| !ch.is_whitespace() && seen.insert(*ch))
        .collect()
    }
}

fn classify(ch: char) -> CharClass {
    if ch.is_lowercase() {
        CharClass::Lower
    } else if ch.is_uppercase() {
        CharClass::Upper
    } else if ch.is_ascii_digit() {
        CharClass::Digit
    } else {
        CharClass::Symbol
    }
}

// -- Name normalization --------------------------------------------------------

fn transliterate(ch: char) -> Option<&'static str> {
    let name = match ch {
        'ç' => "c_cedilla",
        'ğ' => "g_breve",
        'ı' => "dotless_i",
        'ö' => "o_umlaut",
        'ş' => "s_cedilla",
        'ü' => "u_umlaut",
        'ä' => "a_umlaut",
        'ë' => "e_umlaut",
        'ï' => "i_umlaut",
        'ß' => "sharp_s",
        'á' => "a_acute",
        'à' => "a_grave",
        'â' => "a_circumflex",
        'å' => "a_ring",
        'æ' => "ae",
        'é' => "e_acute",
        'è' => "e_grave",
        'ê' => "e_circumflex",
        'í' => "i_acute",
        'î' => "i_circumflex",
        'ñ' => "n_tilde",
        'ó' => "o_acute",
        'ô' => "o_circumflex",
        'ø' => "o_stroke",
        'ú' => "u_acute",
        'û' => "u_circumflex",
        _ => return None,
    };
    Some(name)
}

fn symbol_name(ch: char) -> Option<&'static str> {
    let name = match ch {
        '.' => "period",
        ',' => "comma",
        ':' => "colon",
        ';' => "semicolon",
        '?' => "question",
        '!' => "exclamation",
        '-' => "hyphen",
        '_' => "underscore",
        '"' => "double_quote",
        '\'' => "single_quote",
        '(' => "paren_open",
        ')' => "paren_close",
        '[' => "bracket_open",
        ']' => "bracket_close",
        '{' => "brace_open",
        '}' => "brace_close",
        '/' => "slash",
        '\\' => "backslash",
        '|' => "pipe",
        '+' => "plus",
        '*' => "asterisk",
        '=' => "equals",
        '<' => "less_than",
        '>' => "greater_than",
        '%' => "percent",
        '^' => "caret",
        '~' => "tilde",
        '@' => "at",
        '$' => "dollar",
        '€' => "euro",
        '₺' => "lira",
        '&' => "ampersand",
        '#' => "hash",
        _ => return None,
    };
    Some(name)
}

fn letter_name(ch: char) -> String {
    if ch.is_ascii_alphanumeric() {
        return ch.to_ascii_lowercase().to_string();
    }
    transliterate(ch)
        .map(str::to_string)
        .unwrap_or_else(|| format!("u{:04x}", ch as u32))
}

/// ASCII-safe base name of a character within its class.
pub fn normalize_name(class: CharClass, ch: char) -> String {
    match class {
        CharClass::Lower => letter_name(ch),
        CharClass::Upper => {
            // Dotted capital I has no single-char lowercase mapping.
            if ch == 'İ' {
                return "upper_i_dot".into();
            }
            let lower = ch.to_lowercase().next().unwrap_or(ch);
            format!("upper_{}", letter_name(lower))
        }
        CharClass::Digit => format!("digit_{}", letter_name(ch)),
        CharClass::Symbol => symbol_name(ch)
            .map(str::to_string)
            .unwrap_or_else(|| format!("sym_u{:04x}", ch as u32)),
    }
}

// -- Catalog -------------------------------------------------------------------

/// One (class, character, variation) triple, the atomic catalog unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSlot {
    pub class: CharClass,
    pub character: char,
    pub base_name: String,
    /// 1-based.
    pub variation: u32,
}

impl CharacterSlot {
    pub fn name(&self) -> String {
        format!("{}_{}", self.base_name, self.variation)
    }
}

/// Ordered slot list for one (alphabet, variation count) pair.
#[derive(Debug, Clone)]
pub struct CharacterCatalog {
    slots: Vec<CharacterSlot>,
    names: Vec<String>,
    index: HashMap<String, usize>,
    bases: HashMap<char, String>,
    variation_count: u32,
}

impl CharacterCatalog {
    /// Build the catalog. Slots follow class order (lower, upper, digit,
    /// symbol), then character order, then variation.
    pub fn build(alphabet: &Alphabet, variation_count: u32) -> Result<Self> {
        if variation_count == 0 {
            return Err(QuillformError::Catalog(
                "variation count must be at least 1".into(),
            ));
        }

        let characters = alphabet.characters();
        let mut bases = HashMap::with_capacity(characters.len());
        let mut owners: HashMap<String, char> = HashMap::with_capacity(characters.len());
        let mut slots = Vec::with_capacity(characters.len() * variation_count as usize);

        for (class, ch) in characters {
            let base_name = normalize_name(class, ch);
            if let Some(other) = owners.insert(base_name.clone(), ch) {
                return Err(QuillformError::Catalog(format!(
                    "characters {other:?} and {ch:?} both normalize to \"{base_name}\""
                )));
            }
            bases.insert(ch, base_name.clone());
            slots.extend((1..=variation_count).map(|variation| CharacterSlot {
                class,
                character: ch,
                base_name: base_name.clone(),
                variation,
            }));
        }

        let names: Vec<String> = slots.iter().map(CharacterSlot::name).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        debug!(
            characters = bases.len(),
            variation_count,
            slots = slots.len(),
            "character catalog built"
        );

        Ok(Self {
            slots,
            names,
            index,
            bases,
            variation_count,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn variation_count(&self) -> u32 {
        self.variation_count
    }

    /// Slot names in global index order.
    pub fn slot_names(&self) -> &[String] {
        &self.names
    }

    pub fn slot(&self, index: usize) -> Option<&CharacterSlot> {
        self.slots.get(index)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, slot_name: &str) -> Option<usize> {
        self.index.get(slot_name).copied()
    }

    /// Symbolic base name used to look up glyph variants at synthesis time.
    pub fn base_name(&self, ch: char) -> Option<&str> {
        self.bases.get(&ch).map(String::as_str)
    }

    /// Number of form sections needed to hold every slot.
    pub fn section_count(&self, geometry: &FormGeometry) -> u32 {
        let per_section = geometry.cells_per_section() as usize;
        if per_section == 0 {
            return 0;
        }
        self.slots.len().div_ceil(per_section) as u32
    }

    /// Global indices held by a section, clipped to the catalog length.
    pub fn section_range(&self, section_id: u32, geometry: &FormGeometry) -> Range<usize> {
        let per_section = geometry.cells_per_section() as usize;
        let start = (section_id as usize * per_section).min(self.slots.len());
        let end = (start + per_section).min(self.slots.len());
        start..end
    }
}

/// Form position of a global slot index. A grid with no rows or columns
/// addresses nothing.
pub fn slot_position(index: usize, geometry: &FormGeometry) -> Result<SlotPosition> {
    let per_section = geometry.cells_per_section() as usize;
    if per_section == 0 {
        return Err(QuillformError::InvalidConfig(format!(
            "form grid {}x{} has no cells",
            geometry.rows, geometry.cols
        )));
    }
    let local = index % per_section;
    Ok(SlotPosition {
        section_id: (index / per_section) as u32,
        row: (local / geometry.cols as usize) as u32,
        col: (local % geometry.cols as usize) as u32,
    })
}

/// Global slot index of a form position.
pub fn slot_index(position: SlotPosition, geometry: &FormGeometry) -> usize {
    position.section_id as usize * geometry.cells_per_section() as usize
        + position.row as usize * geometry.cols as usize
        + position.col as usize
}
