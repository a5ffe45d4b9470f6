// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendition cache key.

use crate::kurbo::Affine;
use crate::math::canonical_bits;
use crate::shape::ShapeId;

/// Identifies a cached rendition.
///
/// Two draws with the same key can share the same cached rendition.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ShapeKey {
    /// A distance field. Fields are scale invariant, so only the resolution they were
    /// generated at is part of the key.
    Field {
        /// Content identity of the shape.
        shape: ShapeId,
        /// Largest dimension of the field, in texels.
        dimension: u32,
    },
    /// A coverage bitmap, exact for one transform.
    Bitmap {
        /// Content identity of the shape.
        shape: ShapeId,
        /// Coefficients of the transform (integer translation stripped) as bit patterns.
        matrix: [u64; 6],
    },
}

impl ShapeKey {
    /// Key for a distance field of `shape` at `dimension` texels.
    #[inline]
    pub fn field(shape: ShapeId, dimension: u32) -> Self {
        Self::Field { shape, dimension }
    }

    /// Key for a coverage bitmap of `shape` drawn with `transform`.
    pub fn bitmap(shape: ShapeId, transform: &Affine) -> Self {
        Self::Bitmap {
            shape,
            matrix: transform.as_coeffs().map(canonical_bits),
        }
    }

    /// The shape identity this key refers to.
    #[inline]
    pub fn shape(&self) -> ShapeId {
        match *self {
            Self::Field { shape, .. } | Self::Bitmap { shape, .. } => shape,
        }
    }
}
