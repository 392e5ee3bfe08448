// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.


use num_traits::AsPrimitive;

use crate::{c64, constants::TAU, sc16};

/// Complex exponential. The argument is assumed to be purely imaginary.
///
/// This function doesn't actually use complex arithmetic; it just returns the
/// real and imag components from Euler's formula (i.e. e^{ix} = cos{x} + i
/// sin{x}).
///
/// # Examples
///
/// `assert_abs_diff_eq!(cexp(PI), c64::new(-1.0, 0.0));`
#[inline]
pub(crate) fn cexp(x: f64) -> c64 {
    let (im, re) = x.sin_cos();
    c64::new(re, im)
}

/// Promote a complex sample of any primitive numeric type to double precision.
#[inline]
pub(crate) fn to_c64<T: AsPrimitive<f64>>(c: num_complex::Complex<T>) -> c64 {
    c64::new(c.re.as_(), c.im.as_())
}

/// Round each component to the nearest integer (half away from zero) and
/// store it as a 16-bit sample. Out-of-range values saturate.
#[inline]
pub(crate) fn round_to_sc16(c: c64) -> sc16 {
    sc16::new(c.re.round() as i16, c.im.round() as i16)
}

/// Wrap a phase into (-π, π] \[radians\].
pub(crate) fn wrap_phase(phase: f64) -> f64 {
    wrap(phase, TAU)
}

/// Wrap an angle into (-180°, 180°] \[degrees\].
pub(crate) fn wrap_degrees(deg: f64) -> f64 {
    wrap(deg, 360.0)
}

fn wrap(x: f64, period: f64) -> f64 {
    let wrapped = x.rem_euclid(period);
    if wrapped > period / 2.0 {
        wrapped - period
    } else {
        wrapped
    }
}
