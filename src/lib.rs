#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parallel Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which the orbit of `z <- z*z + c`, starting at zero, never runs
//! off to infinity.  We render it the classic escape-time way: every
//! pixel maps to a point, every point is iterated until it leaves a
//! disc of radius 2 or the iteration budget runs out, and the number of
//! iterations it survived picks the color.
//!
//! Every pixel is independent of every other, so the image is cut into
//! horizontal bands, one per worker thread.  Workers finish in whatever
//! order the scheduler pleases; the aggregator puts each band back at
//! the row it started from, so the final image is the same no matter
//! how many workers drew it or who finished first.
//!
//! ```no_run
//! use mandelbands::{render, output, RenderConfig};
//!
//! let grid = render(&RenderConfig::default()).unwrap();
//! output::write_png(&grid, "mandelbrot.png").unwrap();
//! ```

pub mod aggregate;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod escape;
pub mod grid;
pub mod output;
pub mod partition;
pub mod planes;
pub mod worker;

pub use crate::config::RenderConfig;
pub use crate::engine::{render, render_mirrored, RenderEngine};
pub use crate::error::RenderError;
pub use crate::escape::Color;
pub use crate::grid::PixelGrid;
pub use crate::planes::{ComplexPlane, Pixel};
