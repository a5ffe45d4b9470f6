// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The GPU submission contract: buffers, pipeline state and draw calls.

use crate::atlas::DrawToken;
use crate::kurbo::Affine;
use crate::vertex::ShapeVertex;

/// Opaque handle of a vertex buffer owned by the [`DrawTarget`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct VertexBufferId(pub u32);

/// Opaque handle of an index buffer owned by the [`DrawTarget`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct IndexBufferId(pub u32);

/// Space reserved in a vertex buffer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct VertexSpace {
    /// The buffer the space lives in.
    pub buffer: VertexBufferId,
    /// Index of the first reserved vertex.
    pub first_vertex: u32,
}

/// A shared index buffer repeating [`QUAD_INDICES`](crate::QUAD_INDICES) for consecutive quads.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct QuadIndexBuffer {
    /// The buffer.
    pub id: IndexBufferId,
    /// Total number of indices it holds. Bounds how many instances a single draw call can have.
    pub index_count: u32,
}

impl QuadIndexBuffer {
    /// Maximum number of quads a draw call using this buffer can draw.
    #[inline]
    pub fn max_instances(&self) -> u32 {
        self.index_count / crate::INDICES_PER_INSTANCE
    }
}

/// Stencil test and write settings.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct StencilSettings {
    /// Reference value.
    pub reference: u8,
    /// Mask applied when testing.
    pub read_mask: u8,
    /// Mask applied when writing.
    pub write_mask: u8,
}

/// Fixed-function state shared by every instance of a draw call.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct PipelineState {
    /// Stencil settings, if stenciling is enabled.
    pub stencil: Option<StencilSettings>,
    /// Whether the paint reads local (shape space) coordinates.
    pub uses_local_coords: bool,
}

/// Properties of the view transforms of a distance field draw, letting the shader take cheaper
/// paths.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct DistanceFieldFlags {
    /// Every transform only scales and translates.
    pub scale_only: bool,
    /// Every transform preserves angles.
    pub similarity: bool,
    /// Coverage should be computed for a gamma-correct destination.
    pub gamma_correct: bool,
}

/// The shader selection of a draw call.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum GeometryProcessor {
    /// Sample an 8-bit distance field and derive coverage from it.
    DistanceField {
        /// Transform properties of the batch.
        flags: DistanceFieldFlags,
        /// The view transform of every instance, when the paint needs local coordinates.
        ///
        /// Vertex positions are then in shape space and the shader applies this transform.
        /// Otherwise positions are already in device space.
        view_matrix: Option<Affine>,
    },
    /// Sample an 8-bit coverage bitmap directly.
    Bitmap {
        /// Maps device positions back to shape space, when the paint needs local coordinates.
        local_matrix: Option<Affine>,
    },
}

/// One draw call, covering a chunk of the instances of a batch.
#[derive(Copy, Clone, Debug)]
pub struct DrawCall<'a> {
    /// Shader selection.
    pub processor: GeometryProcessor,
    /// Fixed-function state.
    pub pipeline: PipelineState,
    /// Buffer holding the vertices.
    pub vertex_buffer: VertexBufferId,
    /// Index of the first vertex of this chunk within `vertex_buffer`.
    pub base_vertex: u32,
    /// Buffer holding the quad indices.
    pub index_buffer: IndexBufferId,
    /// Number of quads drawn.
    pub instance_count: u32,
    /// Always [`INDICES_PER_INSTANCE`](crate::INDICES_PER_INSTANCE).
    pub indices_per_instance: u32,
    /// Always [`VERTICES_PER_INSTANCE`](crate::VERTICES_PER_INSTANCE).
    pub vertices_per_instance: u32,
    /// Vertex data of this chunk, to be written at `base_vertex`.
    pub vertices: &'a [ShapeVertex],
}

/// Where batches submit their work.
pub trait DrawTarget {
    /// Reserves room for `count` vertices.
    ///
    /// Returns `None` if the buffer can't be allocated, which aborts the flush requesting it.
    fn allocate_vertices(&mut self, count: u32) -> Option<VertexSpace>;

    /// The shared quad index buffer, `None` if it's unavailable.
    fn quad_index_buffer(&mut self) -> Option<QuadIndexBuffer>;

    /// Token of the next draw that will be submitted. Atlas regions touched with it stay
    /// resident until that draw has executed.
    fn next_draw_token(&self) -> DrawToken;

    /// Records a draw call.
    fn draw(&mut self, call: DrawCall<'_>);
}
