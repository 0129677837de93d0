// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors raised while validating a render request or assembling its
//! result.  The evaluator and the plane mapper are total functions and
//! have no error paths of their own.

use failure::Fail;

/// Everything that can stop a render from producing a complete grid.
#[derive(Debug, Fail, PartialEq)]
pub enum RenderError {
    /// The image has no pixels in at least one direction.
    #[fail(display = "Image dimensions must be positive, got {}x{}", _0, _1)]
    EmptyImage(u32, u32),

    /// The real bounds are inverted, equal, or not finite.
    #[fail(display = "The left lower corner is not to the left of the right upper corner.")]
    InvertedReal,

    /// The imaginary bounds are inverted, equal, or not finite.
    #[fail(display = "The left lower corner is not lower than the right upper corner.")]
    InvertedImaginary,

    /// Zero iterations would paint every point as inside the set.
    #[fail(display = "Iteration count must be at least 1")]
    NoIterations,

    /// Nobody to do the work.
    #[fail(display = "Worker count must be at least 1")]
    NoWorkers,

    /// Mirroring only reproduces the set when the plane is centered on
    /// the real axis.
    #[fail(display = "Mirrored rendering needs ymin == -ymax, got [{}, {}]", _0, _1)]
    AsymmetricPlane(f64, f64),

    /// A band claims rows the grid does not have.
    #[fail(display = "Band [{}, {}) does not fit in an image {} rows high", start, end, height)]
    BandOutOfRange {
        /// First row of the band.
        start: u32,
        /// One past the last row of the band.
        end: u32,
        /// Height of the grid being assembled.
        height: u32,
    },

    /// A band's pixel buffer does not match its declared shape.
    #[fail(display = "Band starting at row {} carries {} pixels, expected {}", start, found, expected)]
    MalformedBand {
        /// First row of the band.
        start: u32,
        /// Pixels actually carried.
        found: usize,
        /// Rows times width.
        expected: usize,
    },

    /// Two bands overlapped.
    #[fail(display = "Row {} was written twice", _0)]
    DuplicateRow(u32),

    /// A row was never covered by any band.
    #[fail(display = "Row {} was never written", _0)]
    IncompleteGrid(u32),

    /// Every worker hung up before the expected number of bands arrived.
    #[fail(display = "Only {} of {} bands were delivered", received, expected)]
    MissingBands {
        /// Bands merged before the channel closed.
        received: usize,
        /// Bands the partitioner produced.
        expected: usize,
    },

    /// At least one worker thread panicked.
    #[fail(display = "A render worker panicked")]
    WorkerPanicked,
}
