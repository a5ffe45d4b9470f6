// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deciding whether a draw can go through the shape atlas at all.

use crate::config::RendererConfig;
use crate::kurbo::Affine;
use crate::math::min_max_scales;
use crate::shape::Shape;

/// Antialiasing technique requested for a draw.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum AaType {
    /// No antialiasing.
    None,
    /// Analytic coverage-based antialiasing.
    Coverage,
    /// Multisampling.
    Msaa,
}

/// Everything [`can_draw`] looks at.
#[derive(Copy, Clone, Debug)]
pub struct CanDrawArgs<'a> {
    /// The shape to draw.
    pub shape: &'a Shape,
    /// The view transform.
    pub transform: Affine,
    /// Whether the view transform carries a perspective component that `transform` can't express.
    pub has_perspective: bool,
    /// The requested antialiasing.
    pub aa: AaType,
    /// Whether the device supports the shader derivatives distance fields need.
    pub shader_derivative_support: bool,
}

/// Whether the draw described by `args` is a candidate for cached rendering.
///
/// Accepts simple non-inverse fills with coverage antialiasing and an affine transform, of shapes
/// that have a content identity. The untransformed bounds must not exceed
/// [`max_dimension`](RendererConfig::max_dimension), and the transformed bounds must lie within
/// [`min_size`](RendererConfig::min_size) and [`max_size`](RendererConfig::max_size).
/// Below the band antialiasing quality doesn't matter; above it the atlas can't amortize the cost.
pub fn can_draw(args: &CanDrawArgs<'_>, config: &RendererConfig) -> bool {
    if !args.shader_derivative_support {
        return false;
    }
    // Without an identity there is no reuse.
    if args.shape.id().is_none() {
        return false;
    }
    if !args.shape.is_simple_fill() || args.shape.is_inverse_filled() {
        return false;
    }
    if args.aa != AaType::Coverage || args.has_perspective {
        return false;
    }

    let Some((min_scale, max_scale)) = min_max_scales(&args.transform) else {
        return false;
    };
    let bounds = args.shape.styled_bounds();
    let min_dim = bounds.width().min(bounds.height());
    let max_dim = bounds.width().max(bounds.height());
    let min_size = min_dim * min_scale;
    let max_size = max_dim * max_scale;

    max_dim <= config.max_dimension && config.min_size <= min_size && max_size <= config.max_size
}
