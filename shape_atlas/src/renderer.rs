// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The renderer owning the atlas, the cache and the rendition backends.

use crate::atlas::{AtlasAdapter, ShapeAtlas};
use crate::batch::{BatchedDrawRequest, FlushError, FlushReport, ShapeBatch};
use crate::cache::ShapeCache;
use crate::config::RendererConfig;
use crate::eligibility::{CanDrawArgs, can_draw};
use crate::field::CoverageDistanceField;
use crate::gpu::DrawTarget;
use crate::raster::{CoverageRasterizer, DistanceFieldGenerator};

/// Draws small, repeatedly used shapes from renditions cached in a shared atlas.
///
/// Typical use per draw:
/// 1. Check [`can_draw`](Self::can_draw); fall back to another strategy if it's `false`.
/// 2. Create a [`ShapeBatch`] with [`batch`](Self::batch), and [combine](ShapeBatch::combine)
///    it with pending batches where possible.
/// 3. Submit each batch with [`prepare`](Self::prepare).
#[derive(Debug)]
pub struct SmallShapeRenderer<A, R, G = CoverageDistanceField> {
    adapter: AtlasAdapter<A>,
    rasterizer: R,
    generator: G,
    config: RendererConfig,
}

impl<A, R, G> SmallShapeRenderer<A, R, G>
where
    A: ShapeAtlas,
    R: CoverageRasterizer,
    G: DistanceFieldGenerator,
{
    /// Creates a renderer with an empty cache.
    pub fn new(atlas: A, rasterizer: R, generator: G, config: RendererConfig) -> Self {
        Self::with_adapter(AtlasAdapter::new(atlas), rasterizer, generator, config)
    }

    /// Creates a renderer around an existing adapter, e.g. one with a tracking cache.
    pub fn with_adapter(
        adapter: AtlasAdapter<A>,
        rasterizer: R,
        generator: G,
        config: RendererConfig,
    ) -> Self {
        Self {
            adapter,
            rasterizer,
            generator,
            config,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Whether the draw described by `args` can be drawn by this renderer.
    pub fn can_draw(&self, args: &CanDrawArgs<'_>) -> bool {
        can_draw(args, &self.config)
    }

    /// Starts a batch holding `request`.
    pub fn batch(&self, request: BatchedDrawRequest) -> ShapeBatch {
        ShapeBatch::new(request, &self.config)
    }

    /// Resolves the instances of `batch` and submits them to `target`.
    pub fn prepare<T>(
        &mut self,
        batch: ShapeBatch,
        target: &mut T,
    ) -> Result<FlushReport, FlushError>
    where
        T: DrawTarget + ?Sized,
    {
        batch.prepare(
            &mut self.adapter,
            &mut self.rasterizer,
            &mut self.generator,
            target,
        )
    }

    /// Drops every cached rendition. The atlas contents are left alone.
    pub fn clear(&mut self) {
        self.adapter.cache_mut().clear();
    }

    /// The rendition cache.
    pub fn cache(&self) -> &ShapeCache {
        self.adapter.cache()
    }

    /// The coverage rasterizer.
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Mutable access to the coverage rasterizer.
    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    /// The atlas and cache.
    pub fn adapter(&self) -> &AtlasAdapter<A> {
        &self.adapter
    }

    /// Mutable access to the atlas and cache.
    pub fn adapter_mut(&mut self) -> &mut AtlasAdapter<A> {
        &mut self.adapter
    }
}
