// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterizer implementation backends.

#[cfg(feature = "vello_cpu")]
pub mod vello_cpu;
