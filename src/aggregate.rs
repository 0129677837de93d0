// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reassembles bands that finish in any order into one ordered grid.
//!
//! Workers complete whenever they complete.  The aggregator never
//! looks at arrival order: a band's rows go wherever the band says
//! they start.  The grid is only handed out once every row has been
//! written exactly once.

use crossbeam::channel::Receiver;
use log::{debug, trace};

use crate::error::RenderError;
use crate::escape::Color;
use crate::grid::PixelGrid;
use crate::worker::RowBand;

/// Owns the grid while it is being assembled.
#[derive(Debug)]
pub struct Aggregator {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    written: Vec<bool>,
    merged: usize,
}

impl Aggregator {
    /// An empty grid of `width` x `height` waiting for bands.
    pub fn new(width: u32, height: u32) -> Aggregator {
        Aggregator {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
            written: vec![false; height as usize],
            merged: 0,
        }
    }

    /// Number of bands merged so far, empty ones included.
    pub fn merged(&self) -> usize {
        self.merged
    }

    /// Copies a band into place.  Row `k` of a band starting at `s`
    /// lands on grid row `s + k`.  An empty band writes nothing but
    /// still counts as merged.
    pub fn merge(&mut self, rows: RowBand) -> Result<(), RenderError> {
        let band = rows.band();
        if band.start > band.end || band.end > self.height {
            return Err(RenderError::BandOutOfRange {
                start: band.start,
                end: band.end,
                height: self.height,
            });
        }
        if rows.width() != self.width {
            return Err(RenderError::MalformedBand {
                start: band.start,
                found: rows.pixels().len(),
                expected: band.len() as usize * self.width as usize,
            });
        }
        if let Some(row) = band.rows().find(|row| self.written[*row as usize]) {
            return Err(RenderError::DuplicateRow(row));
        }

        let offset = band.start as usize * self.width as usize;
        self.pixels[offset..offset + rows.pixels().len()].copy_from_slice(rows.pixels());
        for row in band.rows() {
            self.written[row as usize] = true;
        }
        self.merged += 1;
        trace!(
            "merged band {} (rows {}..{}), {} so far",
            band.index,
            band.start,
            band.end,
            self.merged
        );
        Ok(())
    }

    /// Hands the grid over, provided every row has been written.
    pub fn finish(self) -> Result<PixelGrid, RenderError> {
        if let Some(row) = self.written.iter().position(|written| !written) {
            return Err(RenderError::IncompleteGrid(row as u32));
        }
        Ok(PixelGrid::from_raw(self.width, self.height, self.pixels))
    }

    /// Blocks until `band_count` bands have arrived on `receiver`,
    /// merges each, and returns the finished grid.  If every sender
    /// hangs up first, the shortfall is reported rather than waited on.
    pub fn collect(
        mut self,
        receiver: &Receiver<RowBand>,
        band_count: usize,
    ) -> Result<PixelGrid, RenderError> {
        let mut received = 0;
        for rows in receiver.iter().take(band_count) {
            self.merge(rows)?;
            received += 1;
        }
        if received < band_count {
            return Err(RenderError::MissingBands {
                received,
                expected: band_count,
            });
        }
        debug!(
            "assembled {} bands into a {}x{} grid",
            received, self.width, self.height
        );
        self.finish()
    }
}
