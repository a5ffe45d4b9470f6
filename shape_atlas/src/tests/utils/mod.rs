// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod atlas;
mod env;
mod raster;
mod target;

pub(crate) use atlas::FakeAtlas;
pub(crate) use env::{TestEnv, square, square_at};
pub(crate) use raster::FillRasterizer;
pub(crate) use target::{RecordedDraw, RecordingTarget};
