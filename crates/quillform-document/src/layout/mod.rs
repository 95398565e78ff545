// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — text to handwritten page rasters.

pub mod engine;
pub mod paper;
pub mod vertical;

pub use engine::{LayoutEngine, Placement, RenderedText};
pub use paper::Paginator;
pub use vertical::VerticalClass;
