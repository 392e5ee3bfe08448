// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Receive-side phase correction.

mod error;
#[cfg(test)]
mod tests;

pub use error::CorrectionError;

use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{
    math::{cexp, round_to_sc16, to_c64},
    sc16,
};

/// Rotate every sample of channel `n` (row `n` of `buffer`) by
/// `phase_offsets_rad[n]`. This is a true complex rotation; each component is
/// rounded to the nearest integer. Channels with a phase of exactly zero are
/// not touched at all.
pub fn apply_phase_correction(
    mut buffer: ArrayViewMut2<sc16>,
    phase_offsets_rad: &[f64],
) -> Result<(), CorrectionError> {
    if buffer.len_of(Axis(0)) != phase_offsets_rad.len() {
        return Err(CorrectionError::ChannelCountMismatch {
            channels: buffer.len_of(Axis(0)),
            phases: phase_offsets_rad.len(),
        });
    }

    buffer
        .outer_iter_mut()
        .into_par_iter()
        .zip(phase_offsets_rad.par_iter())
        .for_each(|(mut channel, &phase)| {
            if phase == 0.0 {
                return;
            }
            let rotator = cexp(phase);
            channel
                .iter_mut()
                .for_each(|s| *s = round_to_sc16(to_c64(*s) * rotator));
        });
    Ok(())
}
