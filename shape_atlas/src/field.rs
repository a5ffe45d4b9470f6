// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Signed distance field generation from coverage buffers.
//!
//! Edges are located where coverage crosses 50% (or between two partially covered texels), their
//! sub-texel distance is estimated from the coverage value and the local gradient (Gustavson
//! 2011), and distances are then propagated with Danielsson's 8SSEDT.

use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::SQRT_2;

use crate::raster::DistanceFieldGenerator;

#[cfg(not(feature = "std"))]
use crate::kurbo::common::FloatFuncs as _;

/// Texels of padding a distance field has around the area it describes.
///
/// This is the largest distance, in texels, that a field encodes.
pub const DISTANCE_FIELD_PAD: u16 = 4;

/// Distances are clamped to `(-MAGNITUDE, MAGNITUDE]` texels.
const MAGNITUDE: f32 = 4.0;

/// Squared distance standing for "no edge found yet".
const FAR_DIST_SQ: f32 = 2_000_000.0;

/// A [`DistanceFieldGenerator`] that derives fields from coverage.
///
/// Direct generation from geometry is not supported.
#[derive(Copy, Clone, Debug, Default)]
pub struct CoverageDistanceField;

impl DistanceFieldGenerator for CoverageDistanceField {
    fn from_coverage(&mut self, coverage: &[u8], width: usize, height: usize) -> Vec<u8> {
        distance_field_from_coverage(coverage, width, height)
    }
}

#[derive(Copy, Clone, Debug)]
struct Texel {
    alpha: f32,
    dist_sq: f32,
    /// Vector from this texel to the nearest edge found so far.
    dist_x: f32,
    dist_y: f32,
}

impl Default for Texel {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            dist_sq: FAR_DIST_SQ,
            dist_x: 1000.0,
            dist_y: 1000.0,
        }
    }
}

struct Grid {
    texels: Vec<Texel>,
    edges: Vec<bool>,
    width: usize,
    height: usize,
}

impl Grid {
    #[inline]
    fn at(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    fn alpha(&self, x: usize, y: usize) -> f32 {
        self.texels[self.at(x, y)].alpha
    }

    /// Tries to improve the texel at `(x, y)` with the nearest edge of its neighbor at `offset`.
    #[inline]
    fn relax(&mut self, x: usize, y: usize, offset: (isize, isize)) {
        let nx = x.wrapping_add_signed(offset.0);
        let ny = y.wrapping_add_signed(offset.1);
        let neighbor = self.texels[self.at(nx, ny)];
        let (ox, oy) = (offset.0 as f32, offset.1 as f32);
        let dist_sq = neighbor.dist_sq
            + 2.0 * (neighbor.dist_x * ox + neighbor.dist_y * oy)
            + ox * ox
            + oy * oy;
        let idx = self.at(x, y);
        let current = &mut self.texels[idx];
        if dist_sq < current.dist_sq {
            current.dist_sq = dist_sq;
            current.dist_x = neighbor.dist_x + ox;
            current.dist_y = neighbor.dist_y + oy;
        }
    }
}

/// Derives a distance field of `(width + 2·pad) × (height + 2·pad)` texels from a `width` ×
/// `height` coverage buffer.
///
/// The zero distance is encoded as 128, values above it are inside the shape.
pub(crate) fn distance_field_from_coverage(coverage: &[u8], width: usize, height: usize) -> Vec<u8> {
    let pad = usize::from(DISTANCE_FIELD_PAD);
    let out_width = width + 2 * pad;
    let out_height = height + 2 * pad;
    if coverage.len() < width * height {
        log::warn!("coverage buffer too small for {width}x{height}");
        return vec![0; out_width * out_height];
    }

    // One extra texel on each side, always far away, keeps neighbor access in bounds.
    let mut grid = Grid {
        texels: vec![Texel::default(); (out_width + 2) * (out_height + 2)],
        edges: vec![false; (out_width + 2) * (out_height + 2)],
        width: out_width + 2,
        height: out_height + 2,
    };
    let origin = pad + 1;
    for (y, row) in coverage.chunks_exact(width.max(1)).take(height).enumerate() {
        for (x, &value) in row.iter().enumerate() {
            let idx = grid.at(x + origin, y + origin);
            grid.texels[idx].alpha = if value == 255 {
                1.0
            } else {
                f32::from(value) / 255.0
            };
        }
    }

    find_edges(&mut grid, coverage, width, height, origin);
    init_edge_distances(&mut grid);
    propagate(&mut grid);

    let mut field = Vec::with_capacity(out_width * out_height);
    for y in 1..grid.height - 1 {
        for x in 1..grid.width - 1 {
            let texel = grid.texels[grid.at(x, y)];
            let dist = texel.dist_sq.sqrt();
            let dist = if texel.alpha > 0.5 { -dist } else { dist };
            field.push(pack_distance(dist));
        }
    }
    field
}

/// Marks texels where coverage crosses from `>= 128` to `< 128`, or where two partially covered
/// texels meet.
fn find_edges(grid: &mut Grid, coverage: &[u8], width: usize, height: usize, origin: usize) {
    // Coverage is zero outside the source buffer, so only texels within one texel of it can be
    // edges.
    let sample = |x: usize, y: usize| -> u8 {
        let (Some(cx), Some(cy)) = (x.checked_sub(origin), y.checked_sub(origin)) else {
            return 0;
        };
        if cx < width && cy < height {
            coverage[cy * width + cx]
        } else {
            0
        }
    };

    for y in origin - 1..origin + height + 1 {
        for x in origin - 1..origin + width + 1 {
            let current = sample(x, y);
            let current_inside = current >> 7;
            let is_edge = NEIGHBORS.iter().any(|&(dx, dy)| {
                let neighbor = sample(x.wrapping_add_signed(dx), y.wrapping_add_signed(dy));
                let neighbor_inside = neighbor >> 7;
                current_inside != neighbor_inside
                    || (current_inside == 0 && current != 0 && neighbor != 0)
            });
            if is_edge {
                let idx = grid.at(x, y);
                grid.edges[idx] = true;
            }
        }
    }
}

const NEIGHBORS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Seeds edge texels with their estimated sub-texel distance to the edge.
fn init_edge_distances(grid: &mut Grid) {
    for y in 1..grid.height - 1 {
        for x in 1..grid.width - 1 {
            let idx = grid.at(x, y);
            if !grid.edges[idx] {
                continue;
            }
            // The gradient points from low to high coverage, +y is down.
            let mut gx = grid.alpha(x + 1, y - 1) - grid.alpha(x - 1, y - 1)
                + (grid.alpha(x + 1, y) - grid.alpha(x - 1, y)) * SQRT_2
                + grid.alpha(x + 1, y + 1)
                - grid.alpha(x - 1, y + 1);
            let mut gy = grid.alpha(x - 1, y + 1) - grid.alpha(x - 1, y - 1)
                + (grid.alpha(x, y + 1) - grid.alpha(x, y - 1)) * SQRT_2
                + grid.alpha(x + 1, y + 1)
                - grid.alpha(x + 1, y - 1);
            let length = (gx * gx + gy * gy).sqrt();
            if length > 0.0 {
                gx /= length;
                gy /= length;
            }

            let texel = &mut grid.texels[idx];
            let dist = edge_distance(gx, gy, texel.alpha);
            texel.dist_x = gx * dist;
            texel.dist_y = gy * dist;
            texel.dist_sq = dist * dist;
        }
    }
}

/// Distance to an edge crossing a texel, given the normalized edge normal and the coverage.
fn edge_distance(dx: f32, dy: f32, alpha: f32) -> f32 {
    if dx.abs() < f32::EPSILON || dy.abs() < f32::EPSILON {
        return 0.5 - alpha;
    }

    // Treat the direction as being in the first octant; the others are symmetrical.
    let (dx, dy) = (dx.abs(), dy.abs());
    let (dx, dy) = if dx < dy { (dy, dx) } else { (dx, dy) };

    // a1 = 0.5·dy/dx is the smaller area chopped off by the edge; compare numerators only.
    let a1_num = 0.5 * dy;
    if alpha * dx < a1_num {
        0.5 * (dx + dy) - (2.0 * dx * dy * alpha).sqrt()
    } else if alpha * dx < dx - a1_num {
        (0.5 - alpha) * dx
    } else {
        -0.5 * (dx + dy) + (2.0 * dx * dy * (1.0 - alpha)).sqrt()
    }
}

/// Danielsson's 8SSEDT: a forward and a backward sweep in y, each with a forward and a
/// backward scan in x. Edge texels keep their seeded distance.
fn propagate(grid: &mut Grid) {
    let (w, h) = (grid.width, grid.height);

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if !grid.edges[grid.at(x, y)] {
                for offset in [(-1, -1), (0, -1), (1, -1), (-1, 0)] {
                    grid.relax(x, y, offset);
                }
            }
        }
        for x in (1..w - 1).rev() {
            if !grid.edges[grid.at(x, y)] {
                grid.relax(x, y, (1, 0));
            }
        }
    }

    for y in (1..h - 1).rev() {
        for x in 1..w - 1 {
            if !grid.edges[grid.at(x, y)] {
                grid.relax(x, y, (-1, 0));
            }
        }
        for x in (1..w - 1).rev() {
            if !grid.edges[grid.at(x, y)] {
                for offset in [(1, 0), (-1, 1), (0, 1), (1, 1)] {
                    grid.relax(x, y, offset);
                }
            }
        }
    }
}

/// Encodes a signed distance (negative inside) as a byte with zero at 128.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is clamped to [0, 255] before the cast"
)]
fn pack_distance(dist: f32) -> u8 {
    // 128 values below zero but only 127 above, so the upper range is scaled by 127/128.
    let dist = (-dist).clamp(-MAGNITUDE, MAGNITUDE * 127.0 / 128.0);
    let dist = dist + MAGNITUDE;
    (dist / (2.0 * MAGNITUDE) * 256.0).round().clamp(0.0, 255.0) as u8
}
