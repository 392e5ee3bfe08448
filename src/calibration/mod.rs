// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Estimation of inter-channel skew.
//!
//! Two quantities are estimated:
//!
//! - a coarse sample offset ([`compute_sample_offset`]), the latency between a
//!   timed capture starting and the first sample aligned with a transmitted
//!   reference, found by brute-force cross-correlation;
//!
//! - per-channel phase offsets ([`estimate_phase_offsets`]), found by averaging
//!   the conjugate product of each channel against a reference channel.
//!
//! Both are pure functions of their inputs. Phase offsets are stored negated,
//! so rotating a channel by its stored value cancels its skew.

mod error;
mod solutions;

pub use error::CalibrationError;
pub use error::{SolutionsReadError, SolutionsWriteError};
pub use solutions::CalibrationSolutions;
pub(crate) use solutions::{is_solutions_file, SOLUTION_EXTENSIONS};

use log::trace;
use ndarray::prelude::*;
use num_complex::Complex;
use num_traits::AsPrimitive;
use rayon::prelude::*;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    c64,
    math::{to_c64, wrap_degrees, wrap_phase},
};

/// Which side of the radio a phase calibration is for.
#[derive(Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSide {
    #[strum(to_string = "transmit", serialize = "tx")]
    Transmit,

    #[strum(to_string = "receive", serialize = "rx")]
    Receive,
}

/// Find where `reference` best aligns within `captured`.
///
/// For every offset `i` such that the reference fits inside the capture, the
/// magnitude of `Σ_j captured[i + j] conj(reference[j])` is computed; the
/// offset with the largest magnitude is returned. If several offsets share the
/// largest magnitude, the first one wins.
pub fn compute_sample_offset<T, U>(
    captured: &[Complex<T>],
    reference: &[Complex<U>],
) -> Result<usize, CalibrationError>
where
    T: AsPrimitive<f64> + Sync,
    U: AsPrimitive<f64> + Sync,
{
    if reference.is_empty() {
        return Err(CalibrationError::EmptyReference);
    }
    if captured.len() < reference.len() {
        return Err(CalibrationError::CaptureTooShort {
            captured: captured.len(),
            reference: reference.len(),
        });
    }

    let reference: Vec<c64> = reference.iter().map(|r| to_c64(*r).conj()).collect();
    let captured: Vec<c64> = captured.iter().map(|c| to_c64(*c)).collect();
    let num_offsets = captured.len() - reference.len() + 1;

    // The correlations are computed in parallel, but the scan for the maximum
    // is done serially so that ties resolve to the earliest offset.
    let magnitudes: Vec<f64> = (0..num_offsets)
        .into_par_iter()
        .map(|i| {
            captured[i..]
                .iter()
                .zip(reference.iter())
                .fold(c64::default(), |acc, (c, r)| acc + c * r)
                .norm_sqr()
        })
        .collect();

    let mut best = (0, f64::NEG_INFINITY);
    for (i, &mag) in magnitudes.iter().enumerate() {
        if mag > best.1 {
            best = (i, mag);
        }
    }
    trace!(
        "Cross-correlation peak at offset {} (magnitude {})",
        best.0,
        best.1.sqrt()
    );
    Ok(best.0)
}

/// Estimate the phase of each channel (row) of `captured` relative to
/// `reference_channel`, using the first `sample_count` samples.
///
/// For channel `ch`, the result is `-arg(Σ_i captured[ch][i]
/// conj(captured[ref][i]))` in (-π, π] \[radians\]; the reference channel's
/// entry is 0. This assumes every channel observed the same signal; no attempt
/// is made to verify that.
pub fn estimate_phase_offsets<T>(
    captured: ArrayView2<Complex<T>>,
    sample_count: usize,
    reference_channel: usize,
) -> Result<Vec<f64>, CalibrationError>
where
    T: AsPrimitive<f64> + Sync,
{
    let (num_channels, num_samples) = captured.dim();
    if reference_channel >= num_channels {
        return Err(CalibrationError::BadReferenceChannel {
            got: reference_channel,
            num_channels,
        });
    }
    if sample_count > num_samples {
        return Err(CalibrationError::TooFewSamples {
            requested: sample_count,
            available: num_samples,
        });
    }

    let reference = captured.slice(s![reference_channel, ..sample_count]);
    let phases = (0..num_channels)
        .into_par_iter()
        .map(|ch| {
            if ch == reference_channel {
                return 0.0;
            }
            let sum = captured
                .slice(s![ch, ..sample_count])
                .iter()
                .zip(reference.iter())
                .fold(c64::default(), |acc, (&c, &r)| {
                    acc + to_c64(c) * to_c64(r).conj()
                });
            wrap_phase(-sum.arg())
        })
        .collect::<Vec<_>>();
    trace!("Estimated phase offsets: {phases:?}");
    Ok(phases)
}

/// The phase of every sample of every channel relative to the same sample of
/// channel 0, in (-180°, 180°] \[degrees\]. The first row is always zero.
pub fn phase_differences_deg<T>(captured: ArrayView2<Complex<T>>) -> Array2<f64>
where
    T: AsPrimitive<f64>,
{
    let mut diffs = Array2::zeros(captured.dim());
    if captured.is_empty() {
        return diffs;
    }
    let reference = captured.row(0);
    for (mut row, channel) in diffs.outer_iter_mut().zip(captured.outer_iter()) {
        for ((diff, &c), &r) in row.iter_mut().zip(channel.iter()).zip(reference.iter()) {
            *diff = wrap_degrees((to_c64(c).arg() - to_c64(r).arg()).to_degrees());
        }
    }
    diffs
}
