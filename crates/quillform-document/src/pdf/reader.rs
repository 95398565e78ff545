// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — inspects assembled documents with the `lopdf` crate so the
// command line can report what it wrote and tests can verify page output.

use std::path::Path;

use lopdf::{Document, Object};
use quillform_core::error::{QuillformError, Result};
use tracing::{debug, instrument};

/// Page-level view of an existing PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let document = Document::load(path_ref).map_err(|err| {
            QuillformError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            QuillformError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height of every page in points, from its /MediaBox. Pages
    /// without a readable box report (0, 0).
    pub fn page_sizes_pt(&self) -> Vec<(f64, f64)> {
        self.document
            .get_pages()
            .values()
            .map(|page_id| {
                self.document
                    .get_object(*page_id)
                    .ok()
                    .and_then(|obj| match obj {
                        Object::Dictionary(dict) => dict.get(b"MediaBox").ok(),
                        _ => None,
                    })
                    .and_then(|media_box| match media_box {
                        Object::Array(values) if values.len() == 4 => {
                            let n: Vec<f64> = values.iter().filter_map(number).collect();
                            (n.len() == 4).then(|| (n[2] - n[0], n[3] - n[1]))
                        }
                        _ => None,
                    })
                    .unwrap_or((0.0, 0.0))
            })
            .collect()
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"definitely not a pdf"),
            Err(QuillformError::PdfError(_))
        ));
    }

    #[test]
    fn numbers_accept_integers_and_reals() {
        assert_eq!(number(&Object::Integer(612)), Some(612.0));
        assert_eq!(number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(number(&Object::Null), None);
    }
}
