// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writing 8-bit coverage and distance field buffers to PNG files.

use std::fs::File;
use std::io::{BufWriter, Error, ErrorKind};
use std::path::Path;

/// Saves a `width` × `height` single channel buffer, row major without padding, as a grayscale
/// PNG at `path`. Missing parent directories are created.
pub fn save_buffer_to_png(
    pixels: &[u8],
    width: u16,
    height: u16,
    path: &Path,
) -> std::io::Result<()> {
    if pixels.len() != usize::from(width) * usize::from(height) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "buffer size doesn't match its dimensions",
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, u32::from(width), u32::from(height));
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().map_err(Error::other)?;
    writer.write_image_data(pixels).map_err(Error::other)?;

    Ok(())
}
