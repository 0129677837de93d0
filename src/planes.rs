// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining the leftlower and rightupper corners of that
//! plane.
use num::Complex;

use crate::error::RenderError;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.  All values are non-negative integers, so the
/// lower-left-hand corner is not included.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub u32, pub u32);

/// Describes the lower-left corner and upper-right corner of the
/// complex plane, treating the real part of each value as the
/// x-component and the imaginary part of each value as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

impl ComplexPlane {
    /// Builds a plane from the four scalar bounds.
    pub fn from_bounds(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> ComplexPlane {
        ComplexPlane(Complex::new(xmin, ymin), Complex::new(xmax, ymax))
    }

    /// Extent along the real axis.
    pub fn width(&self) -> f64 {
        self.1.re - self.0.re
    }

    /// Extent along the imaginary axis.
    pub fn height(&self) -> f64 {
        self.1.im - self.0.im
    }

    /// Rejects inverted, degenerate, and non-finite rectangles.  The
    /// negated comparisons also catch NaN.
    pub fn validate(&self) -> Result<(), RenderError> {
        let (ll, ru) = (self.0, self.1);
        if !(ll.re < ru.re) || !ll.re.is_finite() || !ru.re.is_finite() {
            return Err(RenderError::InvertedReal);
        }
        if !(ll.im < ru.im) || !ll.im.is_finite() || !ru.im.is_finite() {
            return Err(RenderError::InvertedImaginary);
        }
        Ok(())
    }

    /// True when the rectangle is centered on the real axis, so that
    /// the upper half of the set is the mirror of the lower half.
    pub fn is_symmetric(&self) -> bool {
        self.0.im == -self.1.im
    }
}

/// Describes the column, row of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub u32, pub u32);

/// Contains the definitions of two planes: an integral cartesian
/// plane, and a complex cartesian plane.  Maps pixels from the first
/// into points of the second.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The two coordinates defining the complex cartesian plane,
    /// left-lower and right-upper
    pub complex_plane: ComplexPlane,
    // Extent of the complex plane along each axis.
    spans: (f64, f64),
}

impl PlaneMapper {
    /// Takes the size of the integral plane and the rectangle of the
    /// complex plane it covers.  The caller is responsible for having
    /// validated both.
    pub fn new(width: u32, height: u32, complex_plane: ComplexPlane) -> PlaneMapper {
        PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane,
            spans: (complex_plane.width(), complex_plane.height()),
        }
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.integral_plane.0 as usize * self.integral_plane.1 as usize
    }

    /// Describes that the integral plane has no area.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a pixel on the integral cartesian plane, return the complex
    /// number at the same relative position on the complex plane.
    /// Column 0 lands exactly on xmin and row 0 exactly on ymin; the
    /// far edge is approached but never reached.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let origin = self.complex_plane.0;
        Complex::new(
            f64::from(pixel.0) / f64::from(self.integral_plane.0) * self.spans.0 + origin.re,
            f64::from(pixel.1) / f64::from(self.integral_plane.1) * self.spans.1 + origin.im,
        )
    }
}
