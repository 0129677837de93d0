// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! PNG encoding of a finished grid, and the naming scheme for the
//! files the command line tool writes.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use image::png::PNGEncoder;
use image::ColorType;

use crate::config::RenderConfig;
use crate::grid::PixelGrid;

/// Encodes `grid` as an RGBA PNG into `writer`.
pub fn write_png_to<W: Write>(grid: &PixelGrid, writer: W) -> io::Result<()> {
    let encoder = PNGEncoder::new(writer);
    encoder.encode(
        &grid.to_rgba_bytes(),
        grid.width(),
        grid.height(),
        ColorType::RGBA(8),
    )
}

/// Encodes `grid` as an in-memory PNG.
pub fn encode_png(grid: &PixelGrid) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_png_to(grid, &mut bytes)?;
    Ok(bytes)
}

/// Writes `grid` as a PNG file at `path`.
pub fn write_png<P: AsRef<Path>>(grid: &PixelGrid, path: P) -> io::Result<()> {
    let mut output = BufWriter::new(File::create(path)?);
    write_png_to(grid, &mut output)?;
    output.flush()
}

/// A file name that records what was rendered and how long it took,
/// e.g. `mandelbrot_1920x1080_1000iter_2.41s.png`.
pub fn file_name(config: &RenderConfig, elapsed: Duration, mirrored: bool) -> String {
    format!(
        "mandelbrot_{}{}x{}_{}iter_{:.2}s.png",
        if mirrored { "mirrored_" } else { "" },
        config.width,
        config.height,
        config.max_iterations,
        elapsed.as_secs_f64()
    )
}
