// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paginator — paper backgrounds and the page overflow rule.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_rect_mut};
use imageproc::rect::Rect;
use quillform_core::config::StyleConfig;
use quillform_core::error::{QuillformError, Result};
use quillform_core::types::PaperType;
use tracing::{debug, info};

/// Light blue at low alpha, like printed exercise-book rules.
pub const RULE_COLOR: Rgba<u8> = Rgba([135, 206, 250, 100]);
pub const RULE_WIDTH: u32 = 3;

pub struct Paginator {
    style: StyleConfig,
    /// Paper every page starts from, before rules.
    sheet: RgbaImage,
}

impl Paginator {
    /// Fails only when a configured background image cannot be read.
    pub fn new(style: &StyleConfig) -> Result<Self> {
        let sheet = match &style.background_image {
            Some(path) => {
                let img = image::open(path).map_err(|e| {
                    QuillformError::ImageError(format!("background {}: {e}", path.display()))
                })?;
                info!(
                    path = %path.display(),
                    width = img.width(),
                    height = img.height(),
                    "page background loaded"
                );
                imageops::resize(
                    &img.to_rgba8(),
                    style.page_width,
                    style.page_height,
                    FilterType::Lanczos3,
                )
            }
            None => RgbaImage::from_pixel(
                style.page_width,
                style.page_height,
                Rgba([255, 255, 255, 255]),
            ),
        };
        Ok(Self {
            style: style.clone(),
            sheet,
        })
    }

    /// Whether `line` still has its baseline inside the printable area.
    pub fn fits(&self, line: u32) -> bool {
        self.style.baseline(line) <= self.style.printable_bottom() as f32
    }

    /// Lines that fit on one page.
    pub fn lines_per_page(&self) -> u32 {
        if self.style.line_spacing == 0 {
            return 0;
        }
        let mut lines = 0;
        while self.fits(lines) {
            lines += 1;
        }
        lines
    }

    /// A fresh page: the background image (or white) with the configured
    /// rules drawn over it.
    pub fn new_page(&self) -> RgbaImage {
        let s = &self.style;
        let page = self.sheet.clone();
        if s.paper_type == PaperType::Blank {
            return page;
        }

        let mut canvas = Blend(page);
        let pitch = s.line_spacing.max(1);
        let half = (RULE_WIDTH / 2) as i32;

        let mut rules = 0;
        let mut y = s.margin_top;
        while y <= s.printable_bottom() {
            let rect = Rect::at(0, y as i32 - half).of_size(s.page_width, RULE_WIDTH);
            draw_filled_rect_mut(&mut canvas, rect, RULE_COLOR);
            rules += 1;
            y += pitch;
        }

        if s.paper_type == PaperType::Grid {
            let left = s.margin_left % pitch;
            let mut x = left;
            while x < s.page_width {
                let rect = Rect::at(x as i32 - half, 0).of_size(RULE_WIDTH, s.page_height);
                draw_filled_rect_mut(&mut canvas, rect, RULE_COLOR);
                x += pitch;
            }
        }

        debug!(paper = ?s.paper_type, rules, "page background drawn");
        canvas.0
    }
}
