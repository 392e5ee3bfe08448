// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Electronic beam steering.
//!
//! The array's elements are spaced by half a wavelength, so steering to an
//! angle θ requires a phase increment of `Δφ = -π sin(θ)` between adjacent
//! antennas. Antenna `n` is given an absolute phase of `Δφ n` plus its transmit
//! calibration phase.
//!
//! Note that the per-sample transform ([`apply_phase_to_iq`]) scales I by
//! `cos φ` and Q by `sin φ` independently; it is *not* a complex rotation. The
//! receive-side correction ([`crate::correction`]) *is* a complex rotation.
//! Both behaviours are relied upon.

mod error;

pub use error::SteeringError;

use log::{debug, trace};
use ndarray::prelude::*;

use crate::{chirp::ChirpTemplate, constants::PI, sc16};

/// Produces per-antenna steered copies of a chirp. The only state is the
/// transmit calibration vector (radians, one per antenna).
#[derive(Debug, Clone)]
pub struct BeamSteerer {
    calibrations: Vec<f64>,
}

impl BeamSteerer {
    /// Create a steerer for `num_antennas` antennas. All calibration phases
    /// start at zero.
    pub fn new(num_antennas: usize) -> BeamSteerer {
        BeamSteerer {
            calibrations: vec![0.0; num_antennas],
        }
    }

    pub fn num_antennas(&self) -> usize {
        self.calibrations.len()
    }

    /// The transmit calibration phases \[radians\].
    pub fn calibrations(&self) -> &[f64] {
        &self.calibrations
    }

    /// Replace the calibration vector wholesale. A vector with the wrong number
    /// of entries is ignored and the existing calibration is kept.
    pub fn apply_calibrations(&mut self, calibrations: &[f64]) {
        if calibrations.len() != self.calibrations.len() {
            debug!(
                "Ignoring {} calibration phases; expected {}",
                calibrations.len(),
                self.calibrations.len()
            );
            return;
        }
        self.calibrations.copy_from_slice(calibrations);
    }

    /// The absolute phase given to each antenna for a steering angle, including
    /// calibration \[degrees\]. These are not wrapped.
    pub fn steering_phases_deg(&self, angle_deg: f64) -> Vec<f64> {
        let delta_phi = -PI * angle_deg.to_radians().sin();
        self.calibrations
            .iter()
            .enumerate()
            .map(|(n, cal)| (delta_phi * n as f64 + cal).to_degrees())
            .collect()
    }

    /// Steer `chirp` to `angle_deg`, writing one copy per antenna into the rows
    /// of `out`. `out` must have exactly one row per antenna and every row must
    /// be at least as long as the chirp; samples beyond the chirp are silenced.
    /// Nothing is written if either condition is violated.
    pub fn steer(
        &self,
        angle_deg: f64,
        chirp: &ChirpTemplate,
        mut out: ArrayViewMut2<sc16>,
    ) -> Result<(), SteeringError> {
        let (num_rows, row_len) = out.dim();
        if num_rows != self.num_antennas() {
            return Err(SteeringError::ChannelCountMismatch {
                expected: self.num_antennas(),
                got: num_rows,
            });
        }
        if row_len < chirp.len() {
            return Err(SteeringError::OutputTooShort {
                input: chirp.len(),
                output: row_len,
            });
        }

        let phases = self.steering_phases_deg(angle_deg);
        trace!("Steering to {angle_deg}°; phases {phases:?}");
        for (phase, mut row) in phases.into_iter().zip(out.outer_iter_mut()) {
            apply_phase_to_iq(chirp.i(), chirp.q(), phase, row.view_mut())?;
            row.slice_mut(s![chirp.len()..]).fill(sc16::default());
        }
        Ok(())
    }

    /// Convenience wrapper around [`BeamSteerer::steer`] that allocates the
    /// output (one row per antenna, each as long as the chirp).
    pub fn steered(&self, angle_deg: f64, chirp: &ChirpTemplate) -> Array2<sc16> {
        let mut out = Array2::default((self.num_antennas(), chirp.len()));
        // The output was sized to satisfy every precondition.
        let phases = self.steering_phases_deg(angle_deg);
        for (phase, row) in phases.into_iter().zip(out.outer_iter_mut()) {
            iq_transform(chirp.i(), chirp.q(), phase, row);
        }
        out
    }
}

/// Scale the I samples by `cos φ` and the Q samples by `sin φ`, rounding each
/// result to the nearest integer, and write them into the start of `out`.
/// `phase_deg` is in degrees.
///
/// Fails without writing anything if `i` and `q` have different lengths or if
/// `out` is shorter than them.
pub fn apply_phase_to_iq(
    i: &[i16],
    q: &[i16],
    phase_deg: f64,
    out: ArrayViewMut1<sc16>,
) -> Result<(), SteeringError> {
    if i.len() != q.len() {
        return Err(SteeringError::IqLengthMismatch {
            i: i.len(),
            q: q.len(),
        });
    }
    if out.len() < i.len() {
        return Err(SteeringError::OutputTooShort {
            input: i.len(),
            output: out.len(),
        });
    }
    iq_transform(i, q, phase_deg, out);
    Ok(())
}

fn iq_transform(i: &[i16], q: &[i16], phase_deg: f64, mut out: ArrayViewMut1<sc16>) {
    let (sin, cos) = phase_deg.to_radians().sin_cos();
    out.iter_mut()
        .zip(i.iter().zip(q.iter()))
        .for_each(|(o, (&i, &q))| {
            *o = sc16::new(
                (i as f64 * cos).round() as i16,
                (q as f64 * sin).round() as i16,
            );
        });
}
