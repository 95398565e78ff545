// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectifier — perspective-warps one form section into the canonical frame
// using the centres of its four markers.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use quillform_core::catalog::section_marker_ids;
use quillform_core::config::FormGeometry;
use quillform_core::error::{QuillformError, Result};
use tracing::{debug, info, instrument};

use super::markers::DetectedMarker;

/// A section warped into the canonical frame.
#[derive(Debug, Clone)]
pub struct RectifiedSection {
    pub section_id: u32,
    pub image: RgbImage,
}

#[derive(Debug, Clone)]
pub struct Rectifier {
    geometry: FormGeometry,
}

impl Rectifier {
    pub fn new(geometry: &FormGeometry) -> Self {
        Self {
            geometry: geometry.clone(),
        }
    }

    /// Section to rectify: the forced id, or the smallest detected id / 4.
    pub fn target_section(markers: &[DetectedMarker], forced: Option<u32>) -> Result<u32> {
        if let Some(section_id) = forced {
            return Ok(section_id);
        }
        markers
            .iter()
            .map(|m| m.id)
            .min()
            .map(|id| id / 4)
            .ok_or(QuillformError::MarkerDetection { found: 0 })
    }

    /// Marker centres for the section, in top-left, top-right, bottom-left,
    /// bottom-right order. Fails naming every expected id that was not seen.
    pub fn control_points(
        markers: &[DetectedMarker],
        section_id: u32,
    ) -> Result<[(f32, f32); 4]> {
        let expected = section_marker_ids(section_id);
        let found: Vec<Option<(f32, f32)>> = expected
            .iter()
            .map(|id| markers.iter().find(|m| m.id == *id).map(|m| m.center))
            .collect();

        let missing: Vec<u32> = expected
            .iter()
            .zip(&found)
            .filter(|(_, centre)| centre.is_none())
            .map(|(id, _)| *id)
            .collect();
        if !missing.is_empty() {
            return Err(QuillformError::IncompleteMarkerSet {
                section_id,
                expected,
                missing,
            });
        }

        let mut points = [(0.0, 0.0); 4];
        for (slot, centre) in points.iter_mut().zip(found.into_iter().flatten()) {
            *slot = centre;
        }
        Ok(points)
    }

    /// Projection taking photo coordinates of the four marker centres to
    /// their canonical positions.
    pub fn projection(&self, centres: [(f32, f32); 4]) -> Result<Projection> {
        Projection::from_control_points(centres, self.geometry.marker_centres()).ok_or_else(|| {
            QuillformError::Rectification(format!(
                "marker centres {centres:?} do not define a perspective transform"
            ))
        })
    }

    #[instrument(skip(self, image, markers), fields(markers = markers.len(), ?forced))]
    pub fn rectify(
        &self,
        image: &RgbImage,
        markers: &[DetectedMarker],
        forced: Option<u32>,
    ) -> Result<RectifiedSection> {
        let section_id = Self::target_section(markers, forced)?;
        let centres = Self::control_points(markers, section_id)?;
        debug!(section_id, ?centres, "control points resolved");

        let projection = self.projection(centres)?;
        let mut canonical =
            RgbImage::new(self.geometry.canvas_width, self.geometry.canvas_height);
        warp_into(
            image,
            &projection,
            Interpolation::Bilinear,
            Rgb([255, 255, 255]),
            &mut canonical,
        );

        info!(
            section_id,
            width = canonical.width(),
            height = canonical.height(),
            "section rectified"
        );
        Ok(RectifiedSection {
            section_id,
            image: canonical,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: u32, center: (f32, f32)) -> DetectedMarker {
        DetectedMarker {
            id,
            center,
            corners: [center; 4],
        }
    }

    fn skewed_markers(section: u32) -> Vec<DetectedMarker> {
        let ids = section_marker_ids(section);
        vec![
            marker(ids[0], (412.0, 233.0)),
            marker(ids[1], (2710.0, 401.0)),
            marker(ids[2], (300.0, 1822.0)),
            marker(ids[3], (2803.0, 1705.0)),
        ]
    }

    #[test]
    fn section_derives_from_smallest_id() {
        let markers = skewed_markers(3);
        assert_eq!(Rectifier::target_section(&markers, None).expect("target"), 3);
        assert_eq!(Rectifier::target_section(&markers, Some(7)).expect("target"), 7);
        assert!(Rectifier::target_section(&[], None).is_err());
    }

    #[test]
    fn marker_centres_map_to_canonical_corners() {
        let geometry = FormGeometry::default();
        let rectifier = Rectifier::new(&geometry);
        let markers = skewed_markers(0);
        let centres = Rectifier::control_points(&markers, 0).expect("control points");
        let projection = rectifier.projection(centres).expect("projection");

        for (photo, canonical) in centres.iter().zip(geometry.marker_centres()) {
            let (x, y) = projection * *photo;
            assert!((x - canonical.0).abs() < 0.5, "x {x} vs {}", canonical.0);
            assert!((y - canonical.1).abs() < 0.5, "y {y} vs {}", canonical.1);
        }
    }

    #[test]
    fn corner_roles_follow_id_offsets_not_list_order() {
        let mut markers = skewed_markers(0);
        markers.reverse();
        let centres = Rectifier::control_points(&markers, 0).expect("control points");
        assert_eq!(centres[0], (412.0, 233.0));
        assert_eq!(centres[3], (2803.0, 1705.0));
    }

    #[test]
    fn withheld_marker_is_named() {
        for withheld in 0..4 {
            let mut markers = skewed_markers(2);
            let id = markers.remove(withheld).id;
            let err = Rectifier::control_points(&markers, 2).unwrap_err();
            match err {
                QuillformError::IncompleteMarkerSet {
                    section_id,
                    expected,
                    missing,
                } => {
                    assert_eq!(section_id, 2);
                    assert_eq!(expected, [8, 9, 10, 11]);
                    assert_eq!(missing, vec![id]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
        assert!(Rectifier::control_points(&skewed_markers(2), 2).is_ok());
    }

    #[test]
    fn recycled_ids_need_a_forced_section() {
        let markers = skewed_markers(12);
        // Ids 48, 49, 0, 1: the smallest id points at section 0.
        assert!(Rectifier::control_points(&markers, 0).is_err());
        let section = Rectifier::target_section(&markers, Some(12)).expect("target");
        assert!(Rectifier::control_points(&markers, section).is_ok());
    }

    #[test]
    fn rectify_produces_canonical_frame() {
        let geometry = FormGeometry::default();
        let rectifier = Rectifier::new(&geometry);
        let photo = RgbImage::from_pixel(3000, 2000, Rgb([200, 200, 200]));
        let section = rectifier
            .rectify(&photo, &skewed_markers(1), None)
            .expect("rectify");
        assert_eq!(section.section_id, 1);
        assert_eq!(section.image.dimensions(), (2100, 1480));
    }
}
