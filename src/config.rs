// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single description of a render request.  Everything the engine
//! needs travels in a `RenderConfig`; there are no global constants
//! behind it.

use num::Complex;

use crate::error::RenderError;
use crate::planes::ComplexPlane;

/// Left edge of the default view.
pub const DEFAULT_XMIN: f64 = -1.5 * 2.0;
/// Right edge of the default view.
pub const DEFAULT_XMAX: f64 = 1.5;
/// Bottom edge of the default view.  With the real bounds this frames
/// the set at 16:9.
pub const DEFAULT_YMIN: f64 = -1.5 * 0.843_75;
/// Top edge of the default view.
pub const DEFAULT_YMAX: f64 = 1.5 * 0.843_75;

/// Image size, complex region, iteration budget and degree of
/// parallelism for one render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Region of the complex plane covered by the image.
    pub plane: ComplexPlane,
    /// Iteration budget per pixel.
    pub max_iterations: u32,
    /// Number of row bands, and therefore of worker threads.
    pub workers: u32,
}

impl RenderConfig {
    /// Builds and validates a configuration.
    pub fn new(
        width: u32,
        height: u32,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
        max_iterations: u32,
        workers: u32,
    ) -> Result<RenderConfig, RenderError> {
        let config = RenderConfig {
            width,
            height,
            plane: ComplexPlane(leftlower, rightupper),
            max_iterations,
            workers,
        };
        config.validate()?;
        Ok(config)
    }

    /// The same request over a different region.
    pub fn with_plane(self, plane: ComplexPlane) -> RenderConfig {
        RenderConfig { plane, ..self }
    }

    /// The same request split across a different number of workers.
    pub fn with_workers(self, workers: u32) -> RenderConfig {
        RenderConfig { workers, ..self }
    }

    /// Checks every precondition of a render.  More workers than rows
    /// is allowed; the surplus bands are simply empty.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::EmptyImage(self.width, self.height));
        }
        self.plane.validate()?;
        if self.max_iterations == 0 {
            return Err(RenderError::NoIterations);
        }
        if self.workers == 0 {
            return Err(RenderError::NoWorkers);
        }
        Ok(())
    }

    /// Number of pixels in the finished image.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1920,
            height: 1080,
            plane: ComplexPlane::from_bounds(DEFAULT_XMIN, DEFAULT_XMAX, DEFAULT_YMIN, DEFAULT_YMAX),
            max_iterations: 1000,
            workers: num_cpus::get() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners() -> (Complex<f64>, Complex<f64>) {
        (Complex::new(-2.0, -1.5), Complex::new(1.0, 1.5))
    }

    #[test]
    fn default_config_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.plane.is_symmetric());
        assert_eq!(config.pixel_count(), 1920 * 1080);
    }

    #[test]
    fn rejects_empty_images() {
        let (ll, ru) = corners();
        assert_eq!(
            RenderConfig::new(0, 10, ll, ru, 10, 1),
            Err(RenderError::EmptyImage(0, 10))
        );
        assert_eq!(
            RenderConfig::new(10, 0, ll, ru, 10, 1),
            Err(RenderError::EmptyImage(10, 0))
        );
    }

    #[test]
    fn rejects_inverted_planes() {
        let (ll, ru) = corners();
        assert_eq!(
            RenderConfig::new(10, 10, ru, ll, 10, 1),
            Err(RenderError::InvertedReal)
        );
        let flipped = Complex::new(1.0, -1.5);
        assert_eq!(
            RenderConfig::new(10, 10, Complex::new(-2.0, 1.5), flipped, 10, 1),
            Err(RenderError::InvertedImaginary)
        );
    }

    #[test]
    fn rejects_zero_iterations_and_workers() {
        let (ll, ru) = corners();
        assert_eq!(
            RenderConfig::new(10, 10, ll, ru, 0, 1),
            Err(RenderError::NoIterations)
        );
        assert_eq!(
            RenderConfig::new(10, 10, ll, ru, 10, 0),
            Err(RenderError::NoWorkers)
        );
    }

    #[test]
    fn accepts_more_workers_than_rows() {
        let (ll, ru) = corners();
        assert!(RenderConfig::new(10, 5, ll, ru, 10, 64).is_ok());
    }

    #[test]
    fn builders_only_touch_their_field() {
        let (ll, ru) = corners();
        let config = RenderConfig::new(10, 5, ll, ru, 10, 2).unwrap();
        let moved = config.with_plane(ComplexPlane::from_bounds(-1.0, 0.0, -0.5, 0.5));
        assert_eq!(moved.width, 10);
        assert_eq!(moved.workers, 2);
        assert_eq!(moved.plane.0, Complex::new(-1.0, -0.5));
        assert_eq!(config.with_workers(7).workers, 7);
        assert_eq!(config.with_workers(7).plane, config.plane);
    }
}
