// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Producing renditions on cache misses.

use alloc::vec::Vec;

use crate::atlas::{AtlasAdapter, AtlasAllocation, DrawToken, ShapeAtlas};
use crate::batch::RenditionMode;
use crate::cache::{RenditionRecord, TextureRect};
use crate::config::RendererConfig;
use crate::field::DISTANCE_FIELD_PAD;
use crate::key::ShapeKey;
use crate::kurbo::{Affine, Rect, Vec2};
use crate::math::{FloatExt, max_scale, round_out};
use crate::raster::{CoverageRasterizer, DistanceFieldGenerator};
use crate::shape::Shape;

#[cfg(not(feature = "std"))]
use crate::kurbo::common::FloatFuncs as _;

/// Power of two scale a distance field is generated at for a transform with the given maximum
/// scale factor.
///
/// Scales above 1 round up to the next power of two, scales at or below ½ to the smallest power
/// of two not below them, and anything in between generates at scale 1. The result is never
/// smaller than `max_scale`. Degenerate scales yield 1.
pub fn mip_scale(max_scale: f64) -> f64 {
    if !(max_scale.is_finite() && max_scale > 0.0) {
        return 1.0;
    }
    if max_scale <= 0.5 {
        let mut mip = 0.5;
        while mip * 0.5 >= max_scale {
            mip *= 0.5;
        }
        mip
    } else if max_scale > 1.0 {
        let mut mip = 2.0;
        while mip < max_scale {
            mip *= 2.0;
        }
        mip
    } else {
        1.0
    }
}

/// The resolution a distance field is generated at.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct FieldResolution {
    /// Largest dimension of the field in texels, part of the cache key.
    pub dimension: u32,
    /// The working size before clamping to the maximum field size.
    pub mip_size: f64,
    /// Scale from shape space to field texels.
    pub scale: f64,
}

/// Chooses the field resolution for a shape whose largest untransformed dimension is `max_dim`,
/// drawn with a transform whose maximum scale factor is `max_scale`.
///
/// Small fields are magnified towards
/// [`ideal_min_field_size`](RendererConfig::ideal_min_field_size), but never beyond 4× the size
/// they would have at their power of two scale. The result is clamped to
/// [`max_field_size`](RendererConfig::max_field_size). Returns `None` for empty or non-finite
/// shapes.
pub fn field_resolution(
    max_scale: f64,
    max_dim: f64,
    config: &RendererConfig,
) -> Option<FieldResolution> {
    let max_dim = max_dim.abs();
    if !(max_dim.is_finite() && max_dim > 0.0) {
        return None;
    }

    let original = mip_scale(max_scale.abs()) * max_dim;
    let mut mip_size = original;
    if mip_size < config.ideal_min_field_size {
        let mut magnified = mip_size * 2.0;
        while magnified < config.ideal_min_field_size {
            magnified *= 2.0;
        }
        while magnified > 4.0 * original {
            magnified *= 0.25;
        }
        mip_size = magnified;
    }

    let desired = mip_size.min(config.max_field_size);
    Some(FieldResolution {
        dimension: texel_count(desired.ceil()).map(u32::from)?,
        mip_size,
        scale: desired / max_dim,
    })
}

/// A freshly generated buffer, ready to be copied into the atlas.
#[derive(Clone, Debug)]
pub(crate) struct Rendition {
    pub(crate) pixels: Vec<u8>,
    /// Size of `pixels`.
    pub(crate) width: u16,
    pub(crate) height: u16,
    /// Texels of padding around the area the quad samples.
    pub(crate) inset: u16,
    /// Size of the area the quad samples.
    pub(crate) content_width: u16,
    pub(crate) content_height: u16,
    pub(crate) local_bounds: Rect,
}

/// Converts a whole number of texels, rejecting sizes the atlas can't address.
#[expect(
    clippy::cast_possible_truncation,
    reason = "range is checked before the cast"
)]
fn texel_count(value: f64) -> Option<u16> {
    (value.is_finite() && value >= 1.0 && value <= f64::from(u16::MAX)).then(|| value as u16)
}

/// Generates the distance field of `shape` at `resolution`.
pub(crate) fn generate_field<R, G>(
    shape: &Shape,
    resolution: &FieldResolution,
    rasterizer: &mut R,
    generator: &mut G,
    config: &RendererConfig,
) -> Option<Rendition>
where
    R: CoverageRasterizer + ?Sized,
    G: DistanceFieldGenerator + ?Sized,
{
    let bounds = shape.bounds();
    let scale = resolution.scale;
    let scaled = Rect::new(
        bounds.x0 * scale,
        bounds.y0 * scale,
        bounds.x1 * scale,
        bounds.y1 * scale,
    );
    // The fractional part of the origin is burnt into the field.
    let origin = Vec2::new(scaled.x0.floor(), scaled.y0.floor());
    let device = round_out(scaled - origin);

    let pad = f64::from(config.antialias_pad);
    let width = texel_count(device.width() + 2.0 * pad)?;
    let height = texel_count(device.height() + 2.0 * pad)?;
    let translate = Vec2::new(pad, pad) - origin;
    let draw = Affine::translate(translate) * Affine::scale(scale);

    let field_pad = DISTANCE_FIELD_PAD;
    let field_width = width.checked_add(2 * field_pad)?;
    let field_height = height.checked_add(2 * field_pad)?;
    let expected_len = usize::from(field_width) * usize::from(field_height);

    let (w, h) = (usize::from(width), usize::from(height));
    let pixels = match generator.from_geometry(shape.path(), shape.fill(), draw, w, h) {
        Some(field) if field.len() == expected_len => field,
        direct => {
            if direct.is_some() {
                log::warn!("direct distance field has the wrong size, rasterizing coverage instead");
            }
            let coverage =
                rasterizer.rasterize_coverage(shape.path(), shape.fill(), draw, width, height)?;
            generator.from_coverage(&coverage, w, h)
        }
    };
    if pixels.len() != expected_len {
        log::warn!("distance field has the wrong size");
        return None;
    }

    let placed = Rect::new(0.0, 0.0, f64::from(width), f64::from(height)) - translate;
    let local_bounds = Rect::new(
        placed.x0 / scale,
        placed.y0 / scale,
        placed.x1 / scale,
        placed.y1 / scale,
    );

    Some(Rendition {
        pixels,
        width: field_width,
        height: field_height,
        inset: field_pad,
        content_width: width,
        content_height: height,
        local_bounds,
    })
}

/// Generates the coverage bitmap of `shape` drawn with `view_matrix`, whose integer translation
/// has already been stripped.
pub(crate) fn generate_bitmap<R>(
    shape: &Shape,
    view_matrix: &Affine,
    rasterizer: &mut R,
    config: &RendererConfig,
) -> Option<Rendition>
where
    R: CoverageRasterizer + ?Sized,
{
    let bounds = shape.bounds();
    if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
        return None;
    }

    let [a, b, c, d, e, f] = view_matrix.as_coeffs();
    let draw = Affine::new([a, b, c, d, e.positive_fract(), f.positive_fract()]);
    let device = draw.transform_rect_bbox(bounds);
    let origin = Vec2::new(device.x0.floor(), device.y0.floor());
    let device = round_out(device);

    let pad = f64::from(config.antialias_pad);
    let width = texel_count(device.width() + 2.0 * pad)?;
    let height = texel_count(device.height() + 2.0 * pad)?;
    let translate = Vec2::new(pad, pad) - origin;
    let draw = Affine::translate(translate) * draw;

    let pixels = rasterizer.rasterize_coverage(shape.path(), shape.fill(), draw, width, height)?;
    if pixels.len() != usize::from(width) * usize::from(height) {
        log::warn!("coverage buffer has the wrong size");
        return None;
    }

    Some(Rendition {
        pixels,
        width,
        height,
        inset: 0,
        content_width: width,
        content_height: height,
        local_bounds: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)) - translate,
    })
}

/// The batch currently being prepared, as seen by the producer.
pub(crate) trait InFlightBatch {
    /// Submits every instance resolved so far, so that the atlas may reuse their regions.
    fn flush(&mut self);

    /// Token of the next draw.
    fn next_draw_token(&self) -> DrawToken;
}

/// Everything needed to resolve a draw to a cached rendition.
pub(crate) struct RenditionProducer<'a, A, R: ?Sized, G: ?Sized> {
    pub(crate) adapter: &'a mut AtlasAdapter<A>,
    pub(crate) rasterizer: &'a mut R,
    pub(crate) generator: &'a mut G,
    pub(crate) config: &'a RendererConfig,
}

impl<A, R, G> RenditionProducer<'_, A, R, G>
where
    A: ShapeAtlas,
    R: CoverageRasterizer + ?Sized,
    G: DistanceFieldGenerator + ?Sized,
{
    /// Resolves `shape` to a rendition, generating and caching one on a miss.
    ///
    /// `transform` is the full view transform in distance field mode, and the view transform
    /// without its integer translation in bitmap mode. Returns `None` if the shape must be
    /// skipped.
    pub(crate) fn find_or_create(
        &mut self,
        shape: &Shape,
        mode: RenditionMode,
        transform: &Affine,
        in_flight: &mut dyn InFlightBatch,
    ) -> Option<RenditionRecord> {
        let id = shape.id()?;
        let (key, resolution) = match mode {
            RenditionMode::DistanceField => {
                let bounds = shape.bounds();
                let max_dim = bounds.width().max(bounds.height());
                let resolution = field_resolution(max_scale(transform)?, max_dim, self.config)?;
                (ShapeKey::field(id, resolution.dimension), Some(resolution))
            }
            RenditionMode::Bitmap => (ShapeKey::bitmap(id, transform), None),
        };

        let record = match self.adapter.lookup(&key) {
            Some(record) => record,
            None => {
                log::debug!("cache miss for {key:?}");
                let rendition = match &resolution {
                    Some(resolution) => generate_field(
                        shape,
                        resolution,
                        self.rasterizer,
                        self.generator,
                        self.config,
                    ),
                    None => generate_bitmap(shape, transform, self.rasterizer, self.config),
                }?;
                let allocation = self.allocate_with_retry(&rendition, in_flight)?;
                let record = RenditionRecord {
                    key,
                    region: allocation.region,
                    local_bounds: rendition.local_bounds,
                    texture_rect: texture_rect(&allocation, &rendition)?,
                };
                self.adapter.register(record);
                record
            }
        };

        self.adapter.touch(&record, in_flight.next_draw_token());
        Some(record)
    }

    /// Copies `rendition` into the atlas. When the atlas is full, flushes the in-flight batch
    /// and tries exactly once more.
    fn allocate_with_retry(
        &mut self,
        rendition: &Rendition,
        in_flight: &mut dyn InFlightBatch,
    ) -> Option<AtlasAllocation> {
        let (width, height) = (rendition.width, rendition.height);
        if let Some(allocation) = self.adapter.allocate(width, height, &rendition.pixels) {
            return Some(allocation);
        }

        log::debug!("atlas full for {width}x{height}, flushing before retrying");
        in_flight.flush();
        let allocation = self.adapter.allocate(width, height, &rendition.pixels);
        if allocation.is_none() {
            log::debug!("atlas still full for {width}x{height}, skipping shape");
        }
        allocation
    }
}

fn texture_rect(allocation: &AtlasAllocation, rendition: &Rendition) -> Option<TextureRect> {
    let left = allocation.x.checked_add(rendition.inset)?;
    let top = allocation.y.checked_add(rendition.inset)?;
    Some(TextureRect {
        left,
        top,
        right: left.checked_add(rendition.content_width)?,
        bottom: top.checked_add(rendition.content_height)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_scale_rounds_to_powers_of_two() {
        assert_eq!(mip_scale(1.0), 1.0);
        assert_eq!(mip_scale(0.75), 1.0);
        assert_eq!(mip_scale(1.5), 2.0);
        assert_eq!(mip_scale(2.0), 2.0);
        assert_eq!(mip_scale(5.0), 8.0);
        assert_eq!(mip_scale(0.5), 0.5);
        assert_eq!(mip_scale(0.3), 0.5);
        assert_eq!(mip_scale(0.25), 0.25);
        assert_eq!(mip_scale(0.1), 0.125);
        assert_eq!(mip_scale(0.0), 1.0);
        assert_eq!(mip_scale(f64::NAN), 1.0);
    }

    #[test]
    fn mip_scale_never_below_scale() {
        let mut scale = 0.01;
        while scale < 300.0 {
            assert!(mip_scale(scale) >= scale, "mip scale below {scale}");
            scale *= 1.1;
        }
    }

    #[test]
    fn resolution_is_monotonic_and_clamped() {
        let config = RendererConfig::default();
        for max_dim in [1.0, 5.0, 20.0, 73.0] {
            let mut previous = 0;
            let mut scale = 1.01;
            while scale < 40.0 {
                let resolution = field_resolution(scale, max_dim, &config).unwrap();
                assert!(resolution.dimension >= previous, "not monotonic at {scale}");
                assert!(resolution.dimension <= 162, "not clamped at {scale}");
                previous = resolution.dimension;
                scale *= 1.07;
            }
        }
    }

    #[test]
    fn magnification_is_bounded() {
        let config = RendererConfig::default();
        let mut max_dim = 0.05;
        while max_dim < 73.0 {
            for scale in [0.2, 0.5, 1.0, 3.0] {
                let resolution = field_resolution(scale, max_dim, &config).unwrap();
                let original = mip_scale(scale) * max_dim;
                assert!(
                    resolution.mip_size / original <= 4.0,
                    "magnified {} by more than 4",
                    original
                );
                assert!(resolution.mip_size >= original, "mip size shrank");
            }
            max_dim *= 1.3;
        }
    }

    #[test]
    fn small_fields_are_magnified() {
        let config = RendererConfig::default();
        // 5 → 10 → 20, which is within 4× of 5.
        let resolution = field_resolution(1.0, 5.0, &config).unwrap();
        assert_eq!(resolution.mip_size, 20.0);
        assert_eq!(resolution.dimension, 20);
        assert_eq!(resolution.scale, 4.0);
        // 2 → 16, quartered back to 4 to stay within 4×.
        let resolution = field_resolution(1.0, 2.0, &config).unwrap();
        assert_eq!(resolution.mip_size, 4.0);
        // Large enough already.
        let resolution = field_resolution(1.0, 30.0, &config).unwrap();
        assert_eq!(resolution.dimension, 30);
        // Clamped.
        let resolution = field_resolution(4.0, 70.0, &config).unwrap();
        assert_eq!(resolution.dimension, 162);
        assert_eq!(resolution.mip_size, 280.0);
    }

    #[test]
    fn degenerate_shapes_have_no_resolution() {
        let config = RendererConfig::default();
        assert!(field_resolution(1.0, 0.0, &config).is_none());
        assert!(field_resolution(1.0, f64::INFINITY, &config).is_none());
    }
}
