// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;

use super::{FakeAtlas, FillRasterizer, RecordingTarget};
use crate::color::palette::css::BLACK;
use crate::color::{AlphaColor, Srgb};
use crate::kurbo::{Affine, Rect, Shape as _};
use crate::{
    AtlasAdapter, BatchedDrawRequest, CoverageDistanceField, FlushError, FlushReport,
    PipelineState, RendererConfig, Shape, ShapeBatch, ShapeCache, SmallShapeRenderer,
};

/// A square shape at the origin.
pub(crate) fn square(size: f64) -> Arc<Shape> {
    square_at(0.0, 0.0, size)
}

/// A square shape with its top left corner at `(x, y)`.
pub(crate) fn square_at(x: f64, y: f64, size: f64) -> Arc<Shape> {
    Arc::new(Shape::new(Rect::new(x, y, x + size, y + size).to_path(0.1)))
}

/// A renderer over fakes, plus a target to draw into.
pub(crate) struct TestEnv {
    pub(crate) renderer: SmallShapeRenderer<FakeAtlas, FillRasterizer, CoverageDistanceField>,
    pub(crate) target: RecordingTarget,
}

impl TestEnv {
    pub(crate) fn new(atlas: FakeAtlas, config: RendererConfig) -> Self {
        Self::with_target(atlas, config, RecordingTarget::new())
    }

    pub(crate) fn with_target(
        mut atlas: FakeAtlas,
        config: RendererConfig,
        target: RecordingTarget,
    ) -> Self {
        atlas.follow_draws(target.drawn());
        let adapter = AtlasAdapter::with_cache(atlas, ShapeCache::with_tracking());
        Self {
            renderer: SmallShapeRenderer::with_adapter(
                adapter,
                FillRasterizer::default(),
                CoverageDistanceField,
                config,
            ),
            target,
        }
    }

    /// A configuration drawing everything with distance fields.
    pub(crate) fn field_config() -> RendererConfig {
        RendererConfig {
            always_distance_field: true,
            ..RendererConfig::default()
        }
    }

    pub(crate) fn batch(&self, shape: &Arc<Shape>, transform: Affine) -> ShapeBatch {
        self.batch_colored(shape, transform, BLACK)
    }

    pub(crate) fn batch_colored(
        &self,
        shape: &Arc<Shape>,
        transform: Affine,
        color: AlphaColor<Srgb>,
    ) -> ShapeBatch {
        self.renderer.batch(BatchedDrawRequest {
            color,
            shape: shape.clone(),
            transform,
            pipeline: PipelineState::default(),
        })
    }

    /// Combines `batches` into one, asserting they are all compatible.
    pub(crate) fn combined(batches: impl IntoIterator<Item = ShapeBatch>) -> ShapeBatch {
        let mut batches = batches.into_iter();
        let mut combined = batches.next().expect("at least one batch");
        for batch in batches {
            assert!(combined.combine(batch).is_none(), "batches must be compatible");
        }
        combined
    }

    pub(crate) fn prepare(&mut self, batch: ShapeBatch) -> Result<FlushReport, FlushError> {
        self.renderer.prepare(batch, &mut self.target)
    }

    pub(crate) fn atlas(&self) -> &FakeAtlas {
        self.renderer.adapter().atlas()
    }

    pub(crate) fn atlas_mut(&mut self) -> &mut FakeAtlas {
        self.renderer.adapter_mut().atlas_mut()
    }

    pub(crate) fn rasterizer_calls(&self) -> usize {
        self.renderer.rasterizer().calls.len()
    }
}
