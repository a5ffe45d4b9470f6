// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::{
    DrawCall, DrawTarget, DrawToken, GeometryProcessor, IndexBufferId, PipelineState,
    QuadIndexBuffer, ShapeVertex, VertexBufferId, VertexSpace,
};

/// An owned copy of a [`DrawCall`].
#[derive(Clone, Debug)]
pub(crate) struct RecordedDraw {
    pub(crate) processor: GeometryProcessor,
    pub(crate) pipeline: PipelineState,
    pub(crate) base_vertex: u32,
    pub(crate) instance_count: u32,
    pub(crate) vertices: Vec<ShapeVertex>,
}

/// A draw target that hands out consecutive vertex space and records draws.
#[derive(Debug)]
pub(crate) struct RecordingTarget {
    pub(crate) draws: Vec<RecordedDraw>,
    /// Capacity of the quad index buffer, `None` if it's unavailable.
    pub(crate) index_count: Option<u32>,
    pub(crate) fail_vertices: bool,
    next_vertex: u32,
    token: DrawToken,
    drawn: Rc<Cell<DrawToken>>,
}

impl RecordingTarget {
    pub(crate) fn new() -> Self {
        Self {
            draws: Vec::new(),
            index_count: Some(6 * 1024),
            fail_vertices: false,
            next_vertex: 0,
            token: DrawToken(1),
            drawn: Rc::new(Cell::new(DrawToken(0))),
        }
    }

    /// A target whose draws hold at most `instances` quads.
    pub(crate) fn with_chunk_capacity(instances: u32) -> Self {
        Self {
            index_count: Some(instances * crate::INDICES_PER_INSTANCE),
            ..Self::new()
        }
    }

    /// The token of the last submitted draw, updated as draws are recorded.
    pub(crate) fn drawn(&self) -> Rc<Cell<DrawToken>> {
        self.drawn.clone()
    }

    /// All recorded vertices, in submission order.
    pub(crate) fn vertices(&self) -> Vec<ShapeVertex> {
        self.draws.iter().flat_map(|d| d.vertices.iter().copied()).collect()
    }
}

impl DrawTarget for RecordingTarget {
    fn allocate_vertices(&mut self, count: u32) -> Option<VertexSpace> {
        if self.fail_vertices {
            return None;
        }
        let first_vertex = self.next_vertex;
        self.next_vertex += count;
        Some(VertexSpace {
            buffer: VertexBufferId(0),
            first_vertex,
        })
    }

    fn quad_index_buffer(&mut self) -> Option<QuadIndexBuffer> {
        Some(QuadIndexBuffer {
            id: IndexBufferId(0),
            index_count: self.index_count?,
        })
    }

    fn next_draw_token(&self) -> DrawToken {
        self.token
    }

    fn draw(&mut self, call: DrawCall<'_>) {
        assert_eq!(call.indices_per_instance, 6, "quads have six indices");
        assert_eq!(call.vertices_per_instance, 4, "quads have four vertices");
        assert_eq!(
            call.vertices.len(),
            call.instance_count as usize * 4,
            "vertex data covers every instance"
        );
        self.draws.push(RecordedDraw {
            processor: call.processor,
            pipeline: call.pipeline,
            base_vertex: call.base_vertex,
            instance_count: call.instance_count,
            vertices: call.vertices.to_vec(),
        });
        self.drawn.set(self.token);
        self.token = self.token.next();
    }
}
