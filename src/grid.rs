// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The assembled image: a dense, row-major block of colors.

use std::slice::Chunks;

use crate::escape::Color;
use crate::planes::Pixel;

/// A complete `width` x `height` image.  Rows are stored top to bottom
/// in a single allocation and addressed by absolute row number.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelGrid {
    pub(crate) fn from_raw(width: u32, height: u32, pixels: Vec<Color>) -> PixelGrid {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        PixelGrid {
            width,
            height,
            pixels,
        }
    }

    /// Columns per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The color at a pixel, or `None` outside the image.
    pub fn get(&self, pixel: Pixel) -> Option<Color> {
        if pixel.0 >= self.width || pixel.1 >= self.height {
            return None;
        }
        Some(self.pixels[pixel.1 as usize * self.width as usize + pixel.0 as usize])
    }

    /// One row of the image.
    ///
    /// # Panics
    ///
    /// If `row` is not below `height()`.
    pub fn row(&self, row: u32) -> &[Color] {
        let start = row as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    /// Every row, top to bottom.
    pub fn rows(&self) -> Chunks<'_, Color> {
        self.pixels.chunks(self.width as usize)
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Flattens the grid into interleaved RGBA bytes, ready for an
    /// encoder.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color.to_rgba());
        }
        bytes
    }

    /// The first pixel, in row-major order, at which two grids
    /// disagree.  Grids of different sizes disagree at the origin.
    pub fn first_difference(&self, other: &PixelGrid) -> Option<Pixel> {
        if self.width != other.width || self.height != other.height {
            return Some(Pixel(0, 0));
        }
        self.pixels
            .iter()
            .zip(other.pixels.iter())
            .position(|(a, b)| a != b)
            .map(|i| Pixel((i % self.width as usize) as u32, (i / self.width as usize) as u32))
    }
}
