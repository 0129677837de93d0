// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One unit of parallel work: every pixel of one band.  A worker reads
//! the shared configuration and writes only to a buffer it owns, so
//! workers never contend with each other.

use itertools::iproduct;

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::escape::{self, Color};
use crate::partition::Band;
use crate::planes::{Pixel, PlaneMapper};

/// The finished colors of a band, rows stored top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct RowBand {
    band: Band,
    width: u32,
    pixels: Vec<Color>,
}

impl RowBand {
    /// Wraps a buffer computed elsewhere, checking that it holds
    /// exactly `band.len()` rows of `width` pixels.
    pub fn new(band: Band, width: u32, pixels: Vec<Color>) -> Result<RowBand, RenderError> {
        if band.start > band.end {
            return Err(RenderError::MalformedBand {
                start: band.start,
                found: pixels.len(),
                expected: 0,
            });
        }
        let expected = band.len() as usize * width as usize;
        if pixels.len() != expected {
            return Err(RenderError::MalformedBand {
                start: band.start,
                found: pixels.len(),
                expected,
            });
        }
        Ok(RowBand {
            band,
            width,
            pixels,
        })
    }

    /// The rows this band covers.
    pub fn band(&self) -> Band {
        self.band
    }

    /// Columns per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The band's pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
}

/// Computes every pixel of `band` against the full image described by
/// `config`.  The band may cover only part of the image, as it does
/// for the mirrored renderer; the mapping always spans the whole plane.
pub fn run(band: Band, config: &RenderConfig) -> RowBand {
    debug_assert!(band.end <= config.height);
    let mapper = PlaneMapper::new(config.width, config.height, config.plane);
    let pixels = iproduct!(band.rows(), 0..config.width)
        .map(|(row, column)| {
            let point = mapper.pixel_to_point(&Pixel(column, row));
            escape::evaluate(point, config.max_iterations)
        })
        .collect();
    RowBand {
        band,
        width: config.width,
        pixels,
    }
}
