// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Marker locator — finds fiducial markers in a photographed form.
//
// Each preprocessing variant yields one or more ink masks. Outer contours of
// plausible size are fitted to convex quadrilaterals, each quad is warped to
// a square patch, sampled per cell, border-checked and matched against the
// dictionary. Variants are tried in order and the best one wins; the search
// stops as soon as a variant yields a full set of four.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::arc_length;
use imageproc::point::Point;
use quillform_core::config::{MarkerPreprocess, ScanConfig};
use quillform_core::error::{QuillformError, Result};
use tracing::{debug, info, instrument, trace, warn};

use super::binarize::{Preprocessed, adaptive_ink_mask, otsu_threshold, preprocess};
use super::dictionary::{DATA_BITS, MARKER_CELLS, identify};

/// Side of one sampled cell in the decode patch.
const CELL_PX: u32 = 8;
/// Contours shorter than this are never markers, whatever the image size.
const MIN_CONTOUR_POINTS: f32 = 24.0;
/// Darkest and brightest cell means must differ by at least this much.
const MIN_CELL_CONTRAST: f32 = 20.0;

/// One decoded marker. Corners run clockwise from the marker's own
/// top-left, whatever its orientation in the photo.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedMarker {
    pub id: u32,
    pub center: (f32, f32),
    pub corners: [(f32, f32); 4],
}

/// Locates dictionary markers under varying contrast.
#[derive(Debug, Clone)]
pub struct MarkerLocator {
    config: ScanConfig,
}

impl MarkerLocator {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Find at least four markers, trying each preprocessing variant in turn.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn locate(&self, image: &RgbImage) -> Result<Vec<DetectedMarker>> {
        let gray = image::imageops::grayscale(image);
        let mut best: Vec<DetectedMarker> = Vec::new();

        for variant in &self.config.marker_variants {
            let found = self.detect(&gray, *variant);
            debug!(?variant, found = found.len(), "marker variant tried");
            if found.len() > best.len() {
                best = found;
            }
            if best.len() >= 4 {
                break;
            }
        }

        if best.len() < 4 {
            warn!(found = best.len(), "too few markers after all variants");
            return Err(QuillformError::MarkerDetection { found: best.len() });
        }

        let ids: Vec<u32> = best.iter().map(|m| m.id).collect();
        info!(?ids, "markers located");
        Ok(best)
    }

    /// Every marker visible under a single preprocessing variant. Duplicate
    /// ids keep the first detection.
    pub fn detect(&self, gray: &GrayImage, variant: MarkerPreprocess) -> Vec<DetectedMarker> {
        let masks: Vec<GrayImage> = match preprocess(gray, variant) {
            Preprocessed::Gray(prepared) => self
                .config
                .marker_threshold_radii
                .iter()
                .map(|radius| {
                    adaptive_ink_mask(&prepared, *radius, self.config.marker_threshold_constant)
                })
                .collect(),
            Preprocessed::Mask(mask) => vec![mask],
        };

        let mut markers: Vec<DetectedMarker> = Vec::new();
        for mask in &masks {
            for quad in self.candidate_quads(mask) {
                let Some(marker) = self.decode(gray, quad) else {
                    continue;
                };
                if markers.iter().all(|m| m.id != marker.id) {
                    trace!(id = marker.id, center = ?marker.center, "marker decoded");
                    markers.push(marker);
                }
            }
        }
        markers
    }

    // -- Candidate search -----------------------------------------------------

    fn candidate_quads(&self, mask: &GrayImage) -> Vec<[(f32, f32); 4]> {
        let max_dim = mask.width().max(mask.height()) as f32;
        let min_len = (self.config.min_marker_perimeter_rate * max_dim).max(MIN_CONTOUR_POINTS);
        let max_len = self.config.max_marker_perimeter_rate * max_dim;

        find_contours::<i32>(mask)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer)
            .filter(|contour| {
                let len = contour.points.len() as f32;
                len >= min_len && len <= max_len
            })
            .filter_map(|contour| fit_quad(&contour.points, self.config.polygon_accuracy_rate))
            .collect()
    }

    // -- Decoding -------------------------------------------------------------

    fn decode(&self, gray: &GrayImage, quad: [(f32, f32); 4]) -> Option<DetectedMarker> {
        let side = MARKER_CELLS * CELL_PX;
        let far = (side - 1) as f32;
        let projection =
            Projection::from_control_points(quad, [(0.0, 0.0), (far, 0.0), (far, far), (0.0, far)])?;
        let mut patch = GrayImage::new(side, side);
        warp_into(gray, &projection, Interpolation::Bilinear, Luma([255]), &mut patch);

        let means = cell_means(&patch);
        let (lo, hi) = means
            .iter()
            .flatten()
            .fold((f32::MAX, f32::MIN), |(lo, hi), m| (lo.min(*m), hi.max(*m)));
        if hi - lo < MIN_CELL_CONTRAST {
            return None;
        }
        let threshold = otsu_threshold(&patch) as f32;
        let white = |r: usize, c: usize| means[r][c] > threshold;

        let last = MARKER_CELLS as usize - 1;
        let border_errors = (0..=last)
            .flat_map(|r| (0..=last).map(move |c| (r, c)))
            .filter(|&(r, c)| r == 0 || c == 0 || r == last || c == last)
            .filter(|&(r, c)| white(r, c))
            .count() as u32;
        if border_errors > self.config.max_border_errors {
            return None;
        }

        let mut observed = 0u16;
        for r in 0..DATA_BITS {
            for c in 0..DATA_BITS {
                if white(r as usize + 1, c as usize + 1) {
                    observed |= 1 << (15 - (r * DATA_BITS + c));
                }
            }
        }

        let found = identify(observed, self.config.max_correction_bits)?;
        // Quad runs clockwise from the patch's top-left; turn it upright.
        let k = found.rotation as usize;
        let corners = [0, 1, 2, 3].map(|i| quad[(i + 4 - k) % 4]);
        let center = diagonal_intersection(&corners);

        Some(DetectedMarker {
            id: found.id,
            center,
            corners,
        })
    }
}

/// Mean of the inner half of every cell, skipping pixels near cell edges.
fn cell_means(patch: &GrayImage) -> Vec<Vec<f32>> {
    let inset = CELL_PX / 4;
    (0..MARKER_CELLS)
        .map(|r| {
            (0..MARKER_CELLS)
                .map(|c| {
                    let mut sum = 0u32;
                    let mut count = 0u32;
                    for y in r * CELL_PX + inset..(r + 1) * CELL_PX - inset {
                        for x in c * CELL_PX + inset..(c + 1) * CELL_PX - inset {
                            sum += patch.get_pixel(x, y).0[0] as u32;
                            count += 1;
                        }
                    }
                    sum as f32 / count.max(1) as f32
                })
                .collect()
        })
        .collect()
}

// -- Geometry helpers ---------------------------------------------------------

/// Fit a closed contour with a convex quadrilateral, ordered clockwise in
/// image coordinates. Returns `None` when any contour point strays more than
/// `accuracy_rate * perimeter` from the quad outline.
fn fit_quad(points: &[Point<i32>], accuracy_rate: f32) -> Option<[(f32, f32); 4]> {
    let pts: Vec<(f32, f32)> = points.iter().map(|p| (p.x as f32, p.y as f32)).collect();
    let n = pts.len();
    if n < 8 {
        return None;
    }
    let perimeter = arc_length(points, true) as f32;

    let ia = farthest_index(&pts, 0..n, |p| dist(p, pts[0]))?;
    let ib = farthest_index(&pts, 0..n, |p| dist(p, pts[ia]))?;
    let (a, b) = (pts[ia], pts[ib]);

    let forward = |from: usize, to: usize| {
        let span = (to + n - from) % n;
        (0..=span).map(move |k| (from + k) % n)
    };
    let ic = farthest_index(&pts, forward(ia, ib), |p| line_dist(p, a, b))?;
    let id = farthest_index(&pts, forward(ib, ia), |p| line_dist(p, a, b))?;

    let min_side = (perimeter * 0.1).max(MARKER_CELLS as f32);
    let mut quad = [a, pts[ic], b, pts[id]];
    for i in 0..4 {
        if dist(quad[i], quad[(i + 1) % 4]) < min_side {
            return None;
        }
    }

    let tolerance = (accuracy_rate * perimeter).max(2.0);
    let off_outline = pts.iter().any(|p| {
        (0..4)
            .map(|i| segment_dist(*p, quad[i], quad[(i + 1) % 4]))
            .fold(f32::MAX, f32::min)
            > tolerance
    });
    if off_outline || !is_convex(&quad) {
        return None;
    }

    // y points down, so a positive cross product is clockwise on screen.
    if cross(quad[0], quad[1], quad[2]) < 0.0 {
        quad.swap(1, 3);
    }
    Some(quad)
}

fn farthest_index(
    pts: &[(f32, f32)],
    indices: impl Iterator<Item = usize>,
    metric: impl Fn((f32, f32)) -> f32,
) -> Option<usize> {
    indices
        .map(|i| (i, metric(pts[i])))
        .max_by(|x, y| x.1.total_cmp(&y.1))
        .map(|(i, _)| i)
}

fn dist(p: (f32, f32), q: (f32, f32)) -> f32 {
    ((p.0 - q.0).powi(2) + (p.1 - q.1).powi(2)).sqrt()
}

/// Cross product of (b - a) x (c - a).
fn cross(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Distance from `p` to the infinite line through `a` and `b`.
fn line_dist(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let len = dist(a, b);
    if len == 0.0 {
        return dist(p, a);
    }
    cross(a, b, p).abs() / len
}

fn segment_dist(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return dist(p, a);
    }
    let t = (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0);
    dist(p, (a.0 + t * dx, a.1 + t * dy))
}

fn is_convex(quad: &[(f32, f32); 4]) -> bool {
    let signs: Vec<bool> = (0..4)
        .map(|i| cross(quad[i], quad[(i + 1) % 4], quad[(i + 2) % 4]) > 0.0)
        .collect();
    signs.iter().all(|s| *s) || signs.iter().all(|s| !*s)
}

/// Intersection of the quad's diagonals; the corner mean if they are
/// parallel.
fn diagonal_intersection(c: &[(f32, f32); 4]) -> (f32, f32) {
    let (p, r) = (c[0], (c[2].0 - c[0].0, c[2].1 - c[0].1));
    let (q, s) = (c[1], (c[3].0 - c[1].0, c[3].1 - c[1].1));
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < 1e-6 {
        let sum = c.iter().fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        return (sum.0 / 4.0, sum.1 / 4.0);
    }
    let t = ((q.0 - p.0) * s.1 - (q.1 - p.1) * s.0) / denom;
    (p.0 + t * r.0, p.1 + t * r.1)
}
