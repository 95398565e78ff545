// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people filling in and photographing
// forms.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The taxonomy uses three severity levels that drive presentation.

use crate::error::QuillformError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retrying (usually with a better photo) is likely to work.
    Transient,
    /// User must do something (rescan a section, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying: corrupt file, invalid input.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether retrying the same operation may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `QuillformError` into a `HumanError`.
pub fn humanize_error(err: &QuillformError) -> HumanError {
    match err {
        // -- Scan errors --
        QuillformError::MarkerDetection { found } => HumanError {
            message: format!("Only {found} of the 4 corner squares were found in the photo."),
            suggestion: "Photograph the section again from straight above, in even light, with all four black corner squares fully in the frame.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuillformError::IncompleteMarkerSet {
            section_id,
            missing,
            ..
        } => HumanError {
            message: format!("Part {} of the form is missing corner squares {missing:?}.", section_id + 1),
            suggestion: "Make sure the whole section is visible and no corner is covered, or check that the photo shows the section you meant to scan.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        QuillformError::SectionOutOfRange { section_id, sections } => HumanError {
            message: format!("This photo shows part {} but the form only has {sections} parts.", section_id + 1),
            suggestion: "The form was probably printed with a different number of variations per letter. Use the same setting for printing and scanning.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuillformError::Rectification(_) => HumanError {
            message: "The photo couldn't be straightened.".into(),
            suggestion: "The corner squares look too distorted. Take the photo again with the page flat and the camera parallel to it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Catalog / configuration --
        QuillformError::Catalog(detail) => HumanError {
            message: "The character list can't be used.".into(),
            suggestion: format!("Check the alphabet and variation settings. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuillformError::InvalidConfig(detail) => HumanError {
            message: "A setting is out of range.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Document errors --
        QuillformError::EmptyDocument => HumanError {
            message: "There was nothing to write.".into(),
            suggestion: "Give some text to write, and make sure at least one section of your handwriting has been scanned.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuillformError::PdfError(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuillformError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Storage / persistence --
        QuillformError::GlyphStore(detail) => HumanError {
            message: "Your saved handwriting couldn't be read or written.".into(),
            suggestion: format!("Check the handwriting folder. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuillformError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Quillform doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or choose a different location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        QuillformError::Serialization(_) => HumanError {
            message: "A saved settings file is damaged.".into(),
            suggestion: "Check the JSON file for typos, or delete it to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_markers_is_transient() {
        let human = humanize_error(&QuillformError::MarkerDetection { found: 2 });
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
        assert!(human.message.contains("2 of the 4"));
    }

    #[test]
    fn incomplete_set_names_missing_markers() {
        let err = QuillformError::IncompleteMarkerSet {
            section_id: 1,
            expected: [4, 5, 6, 7],
            missing: vec![6],
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("[6]"));
    }

    #[test]
    fn empty_document_is_action_required() {
        let human = humanize_error(&QuillformError::EmptyDocument);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = QuillformError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn damaged_image_is_permanent() {
        let human = humanize_error(&QuillformError::ImageError("truncated".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }
}
