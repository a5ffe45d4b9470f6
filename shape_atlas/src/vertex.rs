// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertex layout and quad packing.

use bytemuck::{Pod, Zeroable};

use crate::cache::TextureRect;
use crate::color::{AlphaColor, Srgb};
use crate::kurbo::{Affine, Point, Rect, Vec2};

/// Vertices emitted per shape instance.
pub const VERTICES_PER_INSTANCE: u32 = 4;

/// Indices per shape instance, two triangles.
pub const INDICES_PER_INSTANCE: u32 = 6;

/// Index pattern of one quad, relative to its first vertex.
pub const QUAD_INDICES: [u16; INDICES_PER_INSTANCE as usize] = [0, 1, 2, 0, 2, 3];

/// One corner of a shape quad.
#[derive(Copy, Clone, PartialEq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct ShapeVertex {
    /// Device position, or shape-space position for distance fields whose paint reads local
    /// coordinates. The view transform is then carried by the draw call.
    pub position: [f32; 2],
    /// Premultiplied RGBA8 color, packed as by `PremulRgba8::to_u32`.
    pub color: u32,
    /// Texel coordinate in the shared texture.
    pub tex_coord: [u16; 2],
}

// Positions and colors are read as raw bytes by the GPU.
const _: () = assert!(size_of::<ShapeVertex>() == 16);

/// Packs a color into the vertex color format.
#[inline]
pub(crate) fn pack_color(color: AlphaColor<Srgb>) -> u32 {
    color.premultiply().to_rgba8().to_u32()
}

/// Corners in emission order: (left, top), (left, bottom), (right, bottom), (right, top).
#[inline]
fn corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x0, rect.y1),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x1, rect.y0),
    ]
}

#[inline]
fn tex_corners(rect: &TextureRect) -> [[u16; 2]; 4] {
    [
        [rect.left, rect.top],
        [rect.left, rect.bottom],
        [rect.right, rect.bottom],
        [rect.right, rect.top],
    ]
}

#[inline]
#[expect(
    clippy::cast_possible_truncation,
    reason = "vertex positions are submitted in single precision"
)]
fn emit(out: &mut [ShapeVertex], positions: [Point; 4], color: u32, tex: &TextureRect) {
    for ((vertex, position), tex_coord) in out.iter_mut().zip(positions).zip(tex_corners(tex)) {
        *vertex = ShapeVertex {
            position: [position.x as f32, position.y as f32],
            color,
            tex_coord,
        };
    }
}

/// Writes the quad of a bitmap rendition, offset by the integer translation stripped from its
/// transform.
pub(crate) fn write_bitmap_quad(
    out: &mut [ShapeVertex],
    local_bounds: Rect,
    translation: Vec2,
    color: u32,
    tex: &TextureRect,
) {
    emit(out, corners(local_bounds + translation), color, tex);
}

/// Writes the quad of a distance field rendition, each corner of the shape-space bounds mapped
/// through `transform`.
///
/// Pass the identity to keep the corners in shape space.
pub(crate) fn write_field_quad(
    out: &mut [ShapeVertex],
    local_bounds: Rect,
    transform: Affine,
    color: u32,
    tex: &TextureRect,
) {
    emit(out, corners(local_bounds).map(|p| transform * p), color, tex);
}
