// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulating draw requests into batches and submitting them.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use smallvec::SmallVec;

use crate::atlas::{AtlasAdapter, DrawToken, ShapeAtlas};
use crate::cache::RenditionRecord;
use crate::color::{AlphaColor, Srgb};
use crate::config::RendererConfig;
use crate::gpu::{
    DistanceFieldFlags, DrawCall, DrawTarget, GeometryProcessor, PipelineState, QuadIndexBuffer,
    VertexSpace,
};
use crate::kurbo::{Affine, Rect, Vec2};
use crate::math::{FloatExt, is_scale_translate, is_similarity};
use crate::producer::{InFlightBatch, RenditionProducer};
use crate::raster::{CoverageRasterizer, DistanceFieldGenerator};
use crate::shape::Shape;
use crate::vertex::{
    INDICES_PER_INSTANCE, ShapeVertex, VERTICES_PER_INSTANCE, pack_color, write_bitmap_quad,
    write_field_quad,
};

#[cfg(not(feature = "std"))]
use crate::kurbo::common::FloatFuncs as _;

/// How the shapes of a batch are cached and drawn.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RenditionMode {
    /// A coverage bitmap exact for one transform, drawn pixel-aligned.
    Bitmap,
    /// A signed distance field, reusable across transforms.
    DistanceField,
}

/// One shape draw.
#[derive(Clone, Debug)]
pub struct BatchedDrawRequest {
    /// Paint color.
    pub color: AlphaColor<Srgb>,
    /// The shape.
    pub shape: Arc<Shape>,
    /// View transform.
    pub transform: Affine,
    /// Fixed-function state.
    pub pipeline: PipelineState,
}

#[derive(Clone, Debug)]
struct Instance {
    color: u32,
    shape: Arc<Shape>,
    transform: Affine,
    /// Integer translation split out of the transform, bitmap mode only.
    translate: Vec2,
}

/// A group of draw requests submitted together.
///
/// A batch is created from a single request and grows by [combining](Self::combine) with
/// compatible batches. It is consumed by [`prepare`](Self::prepare).
#[derive(Clone, Debug)]
pub struct ShapeBatch {
    mode: RenditionMode,
    pipeline: PipelineState,
    /// The first request's transform, without its integer translation in bitmap mode.
    view_matrix: Affine,
    bounds: Rect,
    config: RendererConfig,
    instances: SmallVec<[Instance; 1]>,
}

impl ShapeBatch {
    /// Creates a batch holding `request`.
    ///
    /// Shapes whose device bounds exceed [`max_field_size`](RendererConfig::max_field_size)
    /// are drawn with distance fields, everything else with bitmaps unless
    /// [`always_distance_field`](RendererConfig::always_distance_field) is set.
    pub fn new(request: BatchedDrawRequest, config: &RendererConfig) -> Self {
        let BatchedDrawRequest {
            color,
            shape,
            transform,
            pipeline,
        } = request;

        // Antialiasing may touch half a pixel outside the geometry.
        let bounds = transform.transform_rect_bbox(shape.bounds()).inflate(0.5, 0.5);
        let mode = if config.always_distance_field
            || bounds.width() > config.max_field_size
            || bounds.height() > config.max_field_size
        {
            RenditionMode::DistanceField
        } else {
            RenditionMode::Bitmap
        };

        let (view_matrix, translate) = match mode {
            RenditionMode::DistanceField => (transform, Vec2::ZERO),
            RenditionMode::Bitmap => {
                let [a, b, c, d, e, f] = transform.as_coeffs();
                let translate = Vec2::new(e.floor(), f.floor());
                (
                    Affine::new([a, b, c, d, e - translate.x, f - translate.y]),
                    translate,
                )
            }
        };

        let mut instances = SmallVec::new();
        instances.push(Instance {
            color: pack_color(color),
            shape,
            transform,
            translate,
        });

        Self {
            mode,
            pipeline,
            view_matrix,
            bounds,
            config: *config,
            instances,
        }
    }

    /// Whether the batch draws fields or bitmaps.
    #[inline]
    pub fn mode(&self) -> RenditionMode {
        self.mode
    }

    /// Union of the device bounds of all instances.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Number of queued shape instances.
    #[inline]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Whether the instances of `other` can be drawn by this batch.
    ///
    /// Both must use the same rendition mode and pipeline state. Bitmaps are rasterized for one
    /// transform, so bitmap batches must also share it up to the integer translation, and the
    /// translation itself when local coordinates are used. Field quads are positioned per
    /// instance and combine regardless of transform, unless local coordinates are used: the
    /// quads are then in shape space and the draw carries a single view matrix.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        if self.mode != other.mode || self.pipeline != other.pipeline {
            return false;
        }
        match self.mode {
            RenditionMode::DistanceField => {
                !self.pipeline.uses_local_coords || self.view_matrix == other.view_matrix
            }
            RenditionMode::Bitmap => {
                if self.view_matrix != other.view_matrix {
                    return false;
                }
                !self.pipeline.uses_local_coords
                    || (self.instances[0].translate - other.instances[0].translate)
                        .hypot()
                        .is_nearly_zero()
            }
        }
    }

    /// Appends the instances of `other` if it's compatible.
    ///
    /// Returns `other` back if it isn't.
    pub fn combine(&mut self, other: Self) -> Option<Self> {
        if !self.is_compatible_with(&other) {
            return Some(other);
        }
        self.bounds = self.bounds.union(other.bounds);
        self.instances.extend(other.instances);
        None
    }

    /// Resolves every instance to a cached rendition and submits the batch to `target`.
    ///
    /// Instances are drawn in the order they were queued. A shape whose rendition can't be
    /// produced or placed in the atlas is skipped. If the atlas runs out of space midway, the
    /// instances resolved so far are submitted early so that their regions can be reused.
    pub fn prepare<A, R, G, T>(
        self,
        adapter: &mut AtlasAdapter<A>,
        rasterizer: &mut R,
        generator: &mut G,
        target: &mut T,
    ) -> Result<FlushReport, FlushError>
    where
        A: ShapeAtlas,
        R: CoverageRasterizer + ?Sized,
        G: DistanceFieldGenerator + ?Sized,
        T: DrawTarget + ?Sized,
    {
        let processor = self.geometry_processor()?;

        let vertex_count = u32::try_from(self.instances.len())
            .ok()
            .and_then(|n| n.checked_mul(VERTICES_PER_INSTANCE))
            .ok_or(FlushError::VertexAllocation)?;
        let Some(space) = target.allocate_vertices(vertex_count) else {
            log::warn!("could not allocate {vertex_count} vertices");
            return Err(FlushError::VertexAllocation);
        };
        let index_buffer = match target.quad_index_buffer() {
            Some(buffer) if buffer.max_instances() > 0 => buffer,
            _ => {
                log::warn!("quad index buffer unavailable");
                return Err(FlushError::IndexBuffer);
            }
        };

        let mut flusher = Flusher {
            target,
            processor,
            pipeline: self.pipeline,
            space,
            index_buffer,
            flushed_vertices: 0,
            staged: Vec::with_capacity(self.instances.len() * VERTICES_PER_INSTANCE as usize),
            report: FlushReport::default(),
        };
        let mut producer = RenditionProducer {
            adapter,
            rasterizer,
            generator,
            config: &self.config,
        };

        for instance in &self.instances {
            let transform = match self.mode {
                RenditionMode::DistanceField => &instance.transform,
                RenditionMode::Bitmap => &self.view_matrix,
            };
            let Some(record) =
                producer.find_or_create(&instance.shape, self.mode, transform, &mut flusher)
            else {
                flusher.report.skipped += 1;
                continue;
            };
            flusher.stage(self.mode, instance, &record);
        }

        flusher.flush();
        Ok(flusher.report)
    }

    fn geometry_processor(&self) -> Result<GeometryProcessor, FlushError> {
        match self.mode {
            RenditionMode::DistanceField => {
                let transforms = || self.instances.iter().map(|i| &i.transform);
                Ok(GeometryProcessor::DistanceField {
                    flags: DistanceFieldFlags {
                        scale_only: transforms().all(is_scale_translate),
                        similarity: transforms().all(is_similarity),
                        gamma_correct: self.config.gamma_correct,
                    },
                    view_matrix: self.pipeline.uses_local_coords.then_some(self.view_matrix),
                })
            }
            RenditionMode::Bitmap => {
                if !self.pipeline.uses_local_coords {
                    return Ok(GeometryProcessor::Bitmap { local_matrix: None });
                }
                if self.view_matrix.determinant().is_nearly_zero() {
                    log::warn!("could not invert view matrix {:?}", self.view_matrix);
                    return Err(FlushError::NonInvertibleMatrix);
                }
                // Add back the translation that was stripped from the stored view matrix.
                let local = self.view_matrix.inverse()
                    * Affine::translate(-self.instances[0].translate);
                Ok(GeometryProcessor::Bitmap {
                    local_matrix: Some(local),
                })
            }
        }
    }
}

/// Writes vertices of resolved instances and submits them in chunks.
struct Flusher<'a, T: ?Sized> {
    target: &'a mut T,
    processor: GeometryProcessor,
    pipeline: PipelineState,
    space: VertexSpace,
    index_buffer: QuadIndexBuffer,
    /// Vertices of `space` already submitted.
    flushed_vertices: u32,
    staged: Vec<ShapeVertex>,
    report: FlushReport,
}

impl<T: DrawTarget + ?Sized> Flusher<'_, T> {
    fn stage(&mut self, mode: RenditionMode, instance: &Instance, record: &RenditionRecord) {
        let start = self.staged.len();
        self.staged
            .resize(start + VERTICES_PER_INSTANCE as usize, ShapeVertex::default());
        let out = &mut self.staged[start..];
        match mode {
            RenditionMode::DistanceField => write_field_quad(
                out,
                record.local_bounds,
                if self.pipeline.uses_local_coords {
                    Affine::IDENTITY
                } else {
                    instance.transform
                },
                instance.color,
                &record.texture_rect,
            ),
            RenditionMode::Bitmap => write_bitmap_quad(
                out,
                record.local_bounds,
                instance.translate,
                instance.color,
                &record.texture_rect,
            ),
        }
    }
}

impl<T: DrawTarget + ?Sized> InFlightBatch for Flusher<'_, T> {
    fn flush(&mut self) {
        if self.staged.is_empty() {
            return;
        }
        let max_instances = self.index_buffer.max_instances() as usize;
        let chunk_vertices = max_instances * VERTICES_PER_INSTANCE as usize;
        for chunk in self.staged.chunks(chunk_vertices) {
            // Chunks are bounded by the index buffer, which is addressed with u32.
            let vertex_count = u32::try_from(chunk.len()).unwrap_or(u32::MAX);
            let instance_count = vertex_count / VERTICES_PER_INSTANCE;
            log::trace!(
                "drawing {instance_count} shapes from vertex {}",
                self.space.first_vertex + self.flushed_vertices
            );
            self.target.draw(DrawCall {
                processor: self.processor,
                pipeline: self.pipeline,
                vertex_buffer: self.space.buffer,
                base_vertex: self.space.first_vertex + self.flushed_vertices,
                index_buffer: self.index_buffer.id,
                instance_count,
                indices_per_instance: INDICES_PER_INSTANCE,
                vertices_per_instance: VERTICES_PER_INSTANCE,
                vertices: chunk,
            });
            self.flushed_vertices += vertex_count;
            self.report.drawn += instance_count as usize;
            self.report.draw_calls += 1;
        }
        self.staged.clear();
    }

    fn next_draw_token(&self) -> DrawToken {
        self.target.next_draw_token()
    }
}

/// Outcome of preparing a batch.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct FlushReport {
    /// Instances drawn.
    pub drawn: usize,
    /// Instances skipped because no rendition could be produced or placed.
    pub skipped: usize,
    /// Draw calls submitted.
    pub draw_calls: usize,
}

/// Why preparing a batch was aborted.
///
/// Nothing is drawn when these occur, and no cache state is changed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FlushError {
    /// The vertex buffer couldn't be allocated.
    VertexAllocation,
    /// The quad index buffer is unavailable.
    IndexBuffer,
    /// The view matrix of a bitmap batch using local coordinates can't be inverted.
    NonInvertibleMatrix,
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VertexAllocation => f.write_str("could not allocate vertices"),
            Self::IndexBuffer => f.write_str("quad index buffer unavailable"),
            Self::NonInvertibleMatrix => f.write_str("view matrix is not invertible"),
        }
    }
}

impl core::error::Error for FlushError {}
