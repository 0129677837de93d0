// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time evaluator.  A point `c` belongs to the Mandelbrot
//! set when the orbit of `z <- z*z + c`, starting from zero, stays
//! within a radius of 2 forever.  We can only look so far, so a point
//! that survives the iteration budget is painted as inside, and every
//! other point is painted by how quickly it left.

use num::Complex;

/// Orbits whose squared magnitude exceeds this have escaped.  Comparing
/// squares saves a square root per iteration.
pub const BAILOUT_NORM_SQR: f64 = 4.0;

/// An RGBA pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Points that never escaped: opaque black.
    pub const INSIDE: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    /// Fully transparent.  The evaluator never produces it, so it marks
    /// pixels nobody has written yet.
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Maps an escape iteration onto a repeating gradient.  The three
    /// channels cycle with periods 32, 64 and 16.
    pub fn from_escape(n: u32) -> Color {
        Color {
            r: (255 - (n % 32) * 8) as u8,
            g: ((n % 64) * 4) as u8,
            b: (255 - (n % 16) * 16) as u8,
            a: 255,
        }
    }

    /// The channels in r, g, b, a order.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Returns the iteration at which the orbit of `c` escaped, or `None`
/// if it was still bounded after `max_iterations` steps.  The bailout
/// is tested after each step, so a point far outside the set escapes
/// at iteration 0.
#[inline]
pub fn escape_time(c: Complex<f64>, max_iterations: u32) -> Option<u32> {
    let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
    for n in 0..max_iterations {
        z = z * z + c;
        if z.norm_sqr() > BAILOUT_NORM_SQR {
            return Some(n);
        }
    }
    None
}

/// The color of a single point.
#[inline]
pub fn evaluate(c: Complex<f64>, max_iterations: u32) -> Color {
    match escape_time(c, max_iterations) {
        Some(n) => Color::from_escape(n),
        None => Color::INSIDE,
    }
}
