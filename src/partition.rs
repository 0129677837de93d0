// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Splits the rows of an image into one contiguous band per worker.

use std::ops::Range;

/// A half-open range of rows `[start, end)` assigned to one worker.
/// `index` is the band's position in the partition, used only for
/// logging; placement in the grid is driven by `start`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Band {
    /// Position of the band among its siblings.
    pub index: u32,
    /// First row of the band.
    pub start: u32,
    /// One past the last row of the band.
    pub end: u32,
}

impl Band {
    /// Number of rows in the band.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Bands can be empty when there are more workers than rows.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The rows of the band, in order.
    pub fn rows(&self) -> Range<u32> {
        self.start..self.end
    }
}

/// Divides `[0, height)` into `workers` bands of `height / workers`
/// rows each.  The last band is stretched to `height` so it absorbs
/// the rows lost to integer division.  When there are more workers
/// than rows, every band but the last is empty.
pub fn partition(height: u32, workers: u32) -> Vec<Band> {
    if workers == 0 {
        return Vec::new();
    }
    let rows_per_worker = height / workers;
    (0..workers)
        .map(|index| Band {
            index,
            start: index * rows_per_worker,
            end: if index == workers - 1 {
                height
            } else {
                (index + 1) * rows_per_worker
            },
        })
        .collect()
}
