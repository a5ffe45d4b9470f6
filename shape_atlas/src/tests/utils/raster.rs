// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec;
use alloc::vec::Vec;

use crate::CoverageRasterizer;
use crate::kurbo::{Affine, BezPath};
use crate::peniko::Fill;

/// Covers the whole buffer except a one texel border, and records what it was asked for.
#[derive(Debug, Default)]
pub(crate) struct FillRasterizer {
    pub(crate) fail: bool,
    pub(crate) calls: Vec<(Affine, u16, u16)>,
}

impl CoverageRasterizer for FillRasterizer {
    fn rasterize_coverage(
        &mut self,
        _path: &BezPath,
        _fill: Fill,
        transform: Affine,
        width: u16,
        height: u16,
    ) -> Option<Vec<u8>> {
        self.calls.push((transform, width, height));
        if self.fail {
            return None;
        }
        let (w, h) = (usize::from(width), usize::from(height));
        let mut coverage = vec![0; w * h];
        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                coverage[y * w + x] = 255;
            }
        }
        Some(coverage)
    }
}
