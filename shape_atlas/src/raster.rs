// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterizer and distance field generator contracts.

use alloc::vec::Vec;

use crate::kurbo::{Affine, BezPath};
use crate::peniko::Fill;

/// Turns a path into an 8-bit antialiased coverage buffer.
pub trait CoverageRasterizer {
    /// Rasterizes `path` transformed by `transform` into a `width` × `height` buffer of coverage
    /// values, row major without padding. The buffer's origin is at device `(0, 0)`.
    ///
    /// Returns `None` if the buffer couldn't be produced.
    fn rasterize_coverage(
        &mut self,
        path: &BezPath,
        fill: Fill,
        transform: Affine,
        width: u16,
        height: u16,
    ) -> Option<Vec<u8>>;
}

/// Produces 8-bit signed distance fields.
///
/// Field buffers are padded by [`DISTANCE_FIELD_PAD`](crate::DISTANCE_FIELD_PAD) texels on every
/// side of the `width` × `height` area they describe.
pub trait DistanceFieldGenerator {
    /// Derives a distance field from a `width` × `height` coverage buffer.
    fn from_coverage(&mut self, coverage: &[u8], width: usize, height: usize) -> Vec<u8>;

    /// Generates a distance field directly from geometry.
    ///
    /// `transform` maps the path into the unpadded `width` × `height` area. Returns `None` when
    /// this generator doesn't support direct generation, in which case the caller rasterizes
    /// coverage first and uses [`from_coverage`](Self::from_coverage).
    fn from_geometry(
        &mut self,
        path: &BezPath,
        fill: Fill,
        transform: Affine,
        width: usize,
        height: usize,
    ) -> Option<Vec<u8>> {
        let _ = (path, fill, transform, width, height);
        None
    }
}
