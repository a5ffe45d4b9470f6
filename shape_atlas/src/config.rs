// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer configuration.

/// Configuration of a [`SmallShapeRenderer`](crate::SmallShapeRenderer).
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RendererConfig {
    /// Use distance fields for every shape, not only for large ones.
    ///
    /// Useful on platforms where atlas space is scarcer than fill rate.
    pub always_distance_field: bool,
    /// Whether distance field coverage is computed for a gamma-correct destination.
    pub gamma_correct: bool,
    /// Largest allowed dimension of a shape's untransformed bounds.
    pub max_dimension: f64,
    /// Smallest allowed transformed size of a shape's smaller side.
    pub min_size: f64,
    /// Largest allowed transformed size of a shape's larger side.
    pub max_size: f64,
    /// Field resolutions smaller than this are magnified before generation.
    pub ideal_min_field_size: f64,
    /// Largest field resolution, and the device size above which fields replace bitmaps.
    pub max_field_size: f64,
    /// Texels of padding around a rendition for antialiased edges.
    pub antialias_pad: u16,
}

impl RendererConfig {
    /// Largest dimension of a field, in texels.
    pub const MAX_FIELD_SIZE: f64 = 162.0;
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            always_distance_field: false,
            gamma_correct: false,
            max_dimension: 73.0,
            min_size: 0.5,
            max_size: 2.0 * Self::MAX_FIELD_SIZE,
            ideal_min_field_size: 12.0,
            max_field_size: Self::MAX_FIELD_SIZE,
            antialias_pad: 1,
        }
    }
}
