// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shape Atlas renders large numbers of small, repeatedly drawn filled shapes (glyphs, icons)
//! by caching one rasterized rendition per distinct shape in a shared texture atlas and drawing
//! every occurrence as a textured quad.
//!
//! The moving parts are:
//! - [`ShapeCache`]: a content-addressed cache of [`RenditionRecord`]s with a liveness list that
//!   allows invalidating every record bound to an evicted atlas region.
//! - [`AtlasAdapter`]: glue between the cache and a [`ShapeAtlas`] implementation. It forwards
//!   the atlas' eviction notifications into the cache.
//! - The rendition producer, which chooses between a direct coverage bitmap and a signed distance
//!   field and picks the working resolution of the field.
//! - [`ShapeBatch`]: merges compatible draw requests and emits packed [`ShapeVertex`] data in
//!   draw calls bounded by the index buffer capacity.
//!
//! ## Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc).
//! - `libm`: Use floating point implementations from [libm].
//! - `vello_cpu` (enabled by default): Provides [`VelloCpuRasterizer`](renderers::vello_cpu::VelloCpuRasterizer),
//!   a [`CoverageRasterizer`] backed by Vello CPU.
//! - `png`: Enables writing coverage and distance field buffers to PNG files for debugging.
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! [libm]: https://crates.io/crates/libm

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub use vello_common::{color, kurbo, peniko};

mod atlas;
mod batch;
mod cache;
mod config;
mod eligibility;
mod field;
mod gpu;
mod key;
mod math;
mod producer;
mod raster;
mod renderer;
mod shape;
mod vertex;

#[cfg(feature = "png")]
pub mod debug;
pub mod renderers;

#[cfg(test)]
mod tests;

pub use atlas::{AtlasAdapter, AtlasAllocation, DrawToken, EvictionHandler, RegionId, ShapeAtlas};
pub use batch::{BatchedDrawRequest, FlushError, FlushReport, RenditionMode, ShapeBatch};
pub use cache::{RenditionRecord, ShapeCache, ShapeTracking, TextureRect};
pub use config::RendererConfig;
pub use eligibility::{AaType, CanDrawArgs, can_draw};
pub use field::{CoverageDistanceField, DISTANCE_FIELD_PAD};
pub use gpu::{
    DistanceFieldFlags, DrawCall, DrawTarget, GeometryProcessor, IndexBufferId, PipelineState,
    QuadIndexBuffer, StencilSettings, VertexBufferId, VertexSpace,
};
pub use key::ShapeKey;
pub use producer::{FieldResolution, field_resolution, mip_scale};
pub use raster::{CoverageRasterizer, DistanceFieldGenerator};
pub use renderer::SmallShapeRenderer;
pub use shape::{Shape, ShapeId, ShapeStyle};
pub use vertex::{INDICES_PER_INSTANCE, QUAD_INDICES, ShapeVertex, VERTICES_PER_INSTANCE};
