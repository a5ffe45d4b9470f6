// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coverage rasterizer implementation using Vello CPU.

use alloc::vec::Vec;

use vello_cpu::{Pixmap, RenderContext, color::palette::css::BLACK};

use crate::kurbo::{Affine, BezPath};
use crate::peniko::Fill;
use crate::raster::CoverageRasterizer;

/// A [`CoverageRasterizer`] rendering with a single-threaded Vello CPU context.
#[derive(Copy, Clone, Debug, Default)]
pub struct VelloCpuRasterizer;

impl VelloCpuRasterizer {
    /// Creates a rasterizer.
    pub fn new() -> Self {
        Self
    }
}

impl CoverageRasterizer for VelloCpuRasterizer {
    fn rasterize_coverage(
        &mut self,
        path: &BezPath,
        fill: Fill,
        transform: Affine,
        width: u16,
        height: u16,
    ) -> Option<Vec<u8>> {
        if width == 0 || height == 0 {
            return None;
        }

        let mut ctx = RenderContext::new(width, height);
        ctx.set_transform(transform);
        ctx.set_fill_rule(fill);
        ctx.set_paint(BLACK);
        ctx.fill_path(path);
        ctx.flush();

        let mut pixmap = Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);

        // Black is premultiplied to zero color, so alpha is the coverage.
        Some(
            pixmap
                .data_as_u8_slice()
                .chunks_exact(4)
                .map(|pixel| pixel[3])
                .collect(),
        )
    }
}
