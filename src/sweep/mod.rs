// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sweeping the beam across a range of angles.
//!
//! For each angle, the controller steers the chirp, runs a frame and corrects
//! the captured frame for the receive skew before handing it to a consumer:
//!
//! `Idle → SteeringAngle(a) → FrameInFlight(a) → PhaseCorrecting(a) →
//! SteeringAngle(a + step) → ... → Idle`
//!
//! A failure to steer only costs that angle. Short frames are reported and the
//! sweep carries on.

mod error;
#[cfg(test)]
mod tests;

pub use error::SweepError;

use std::sync::Arc;

use crossbeam_utils::atomic::AtomicCell;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, error, trace};
use ndarray::prelude::*;

use crate::{
    chirp::ChirpTemplate,
    constants::{
        DEFAULT_SCHEDULE_LEAD_TIME, DEFAULT_SWEEP_END_DEG, DEFAULT_SWEEP_START_DEG,
        DEFAULT_SWEEP_STEP_DEG, MAX_SWEEP_ANGLES,
    },
    correction::apply_phase_correction,
    frame::{FrameOutcome, FrameScheduler},
    radio::Radio,
    sc16,
    steering::BeamSteerer,
    PROGRESS_BARS,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepState {
    Idle,
    SteeringAngle(f64),
    FrameInFlight(f64),
    PhaseCorrecting(f64),
}

/// The angles to sweep \[degrees\]. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    pub start_deg: f64,
    pub end_deg: f64,
    pub step_deg: f64,
}

impl Default for SweepRange {
    fn default() -> Self {
        SweepRange {
            start_deg: DEFAULT_SWEEP_START_DEG,
            end_deg: DEFAULT_SWEEP_END_DEG,
            step_deg: DEFAULT_SWEEP_STEP_DEG,
        }
    }
}

impl SweepRange {
    /// Every angle of the sweep, in order. Angles are computed as
    /// `start + i * step` rather than accumulated, so the end angle is hit
    /// exactly when the step divides the range. An empty list is returned if
    /// `start > end`.
    pub fn angles(&self) -> Result<Vec<f64>, SweepError> {
        if !(self.step_deg.is_finite() && self.step_deg > 0.0) {
            return Err(SweepError::BadStep(self.step_deg));
        }
        if !(self.start_deg.is_finite() && self.end_deg.is_finite()) {
            return Err(SweepError::BadRange {
                start: self.start_deg,
                end: self.end_deg,
            });
        }
        if self.start_deg > self.end_deg {
            return Ok(vec![]);
        }
        // Tolerate rounding in the division.
        let num_steps = ((self.end_deg - self.start_deg) / self.step_deg + 1e-9).floor();
        if !num_steps.is_finite() || num_steps >= MAX_SWEEP_ANGLES as f64 {
            return Err(SweepError::TooManyAngles {
                start: self.start_deg,
                end: self.end_deg,
                step: self.step_deg,
            });
        }
        let num_steps = num_steps as usize;
        Ok((0..=num_steps)
            .map(|i| self.start_deg + i as f64 * self.step_deg)
            .collect())
    }
}

/// What happened during a sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// The angles that made it through a frame, and how those frames went.
    pub frames: Vec<(f64, FrameOutcome)>,

    /// The angles that couldn't be steered.
    pub failed_angles: Vec<f64>,

    /// Was the sweep cancelled before the last angle?
    pub cancelled: bool,
}

impl SweepReport {
    /// The number of frames that were short on either path.
    pub fn num_short_frames(&self) -> usize {
        self.frames.iter().filter(|(_, o)| !o.is_complete()).count()
    }
}

/// Shared view into a running sweep. This can be used from another thread to
/// watch the sweep's progress or to cancel it.
#[derive(Debug)]
pub struct SweepHandle {
    state: AtomicCell<SweepState>,
    cancel: AtomicCell<bool>,
}

impl SweepHandle {
    pub fn state(&self) -> SweepState {
        self.state.load()
    }

    /// Ask the sweep to stop. The current angle is finished first.
    pub fn cancel(&self) {
        self.cancel.store(true);
    }
}

pub struct SweepController {
    radio: Arc<dyn Radio>,
    scheduler: FrameScheduler,

    /// One steered chirp per channel. Rewritten for every angle.
    steered: Array2<sc16>,

    /// One captured frame per channel. Rewritten for every angle.
    rx_buffer: Array2<sc16>,

    /// How far in the future each frame is scheduled \[seconds\].
    lead_time: f64,

    handle: Arc<SweepHandle>,
}

impl SweepController {
    /// Set up sweeps on `radio` with frames of `chirps_per_frame` chirps, each
    /// occupying `chirp_stride` transmit samples.
    pub fn new(
        radio: Arc<dyn Radio>,
        chirp_stride: usize,
        chirps_per_frame: usize,
    ) -> SweepController {
        let scheduler = FrameScheduler::new(Arc::clone(&radio), chirp_stride, chirps_per_frame);
        let num_channels = radio.num_channels();
        let rx_len = scheduler.geometry().rx_len();
        SweepController {
            radio,
            scheduler,
            steered: Array2::default((num_channels, chirp_stride)),
            rx_buffer: Array2::default((num_channels, rx_len)),
            lead_time: DEFAULT_SCHEDULE_LEAD_TIME,
            handle: Arc::new(SweepHandle {
                state: AtomicCell::new(SweepState::Idle),
                cancel: AtomicCell::new(false),
            }),
        }
    }

    pub fn with_lead_time(mut self, lead_time: f64) -> Self {
        self.lead_time = lead_time;
        self
    }

    pub fn state(&self) -> SweepState {
        self.handle.state()
    }

    pub fn handle(&self) -> Arc<SweepHandle> {
        Arc::clone(&self.handle)
    }

    /// Sweep `chirp` across `range`. After each frame is captured and corrected
    /// with `rx_calibration`, `consumer` is given the angle, the corrected
    /// frame (one row per channel) and the frame's outcome. `skip` samples are
    /// discarded from the start of every capture.
    ///
    /// The controller is back in [`SweepState::Idle`] when this returns, and
    /// can be run again.
    pub fn run<F>(
        &mut self,
        range: &SweepRange,
        steerer: &BeamSteerer,
        chirp: &ChirpTemplate,
        rx_calibration: &[f64],
        skip: usize,
        consumer: F,
    ) -> Result<SweepReport, SweepError>
    where
        F: FnMut(f64, ArrayView2<sc16>, &FrameOutcome),
    {
        let result = self.run_inner(range, steerer, chirp, rx_calibration, skip, consumer);
        self.set_state(SweepState::Idle);
        self.handle.cancel.store(false);
        result
    }

    fn run_inner<F>(
        &mut self,
        range: &SweepRange,
        steerer: &BeamSteerer,
        chirp: &ChirpTemplate,
        rx_calibration: &[f64],
        skip: usize,
        mut consumer: F,
    ) -> Result<SweepReport, SweepError>
    where
        F: FnMut(f64, ArrayView2<sc16>, &FrameOutcome),
    {
        let angles = range.angles()?;
        debug!(
            "Sweeping {} angles from {}° to {}°",
            angles.len(),
            range.start_deg,
            range.end_deg
        );

        let progress = ProgressBar::with_draw_target(
            Some(angles.len() as _),
            if PROGRESS_BARS.load() {
                ProgressDrawTarget::stdout()
            } else {
                ProgressDrawTarget::hidden()
            },
        )
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg}: [{wide_bar:.blue}] {pos:3}/{len:3} angles ({elapsed_precise}<{eta_precise})")
                .unwrap()
                .progress_chars("=> "),
        )
        .with_position(0)
        .with_message("Sweeping");

        let mut report = SweepReport::default();
        for angle in angles {
            if self.handle.cancel.load() {
                debug!("Sweep cancelled before {angle}°");
                report.cancelled = true;
                break;
            }

            self.set_state(SweepState::SteeringAngle(angle));
            if let Err(e) = steerer.steer(angle, chirp, self.steered.view_mut()) {
                error!("Couldn't steer to {angle}°: {e}");
                report.failed_angles.push(angle);
                progress.inc(1);
                continue;
            }

            self.set_state(SweepState::FrameInFlight(angle));
            let at = self.radio.future_time(self.lead_time);
            let outcome =
                self.scheduler
                    .run_frame(self.steered.view(), self.rx_buffer.view_mut(), skip, at)?;

            self.set_state(SweepState::PhaseCorrecting(angle));
            // Whatever a short capture didn't overwrite belongs to the
            // previous frame.
            let received = outcome.samples_received.min(self.rx_buffer.len_of(Axis(1)));
            self.rx_buffer
                .slice_mut(s![.., received..])
                .fill(sc16::default());
            apply_phase_correction(
                self.rx_buffer.slice_mut(s![.., ..received]),
                rx_calibration,
            )?;
            consumer(angle, self.rx_buffer.view(), &outcome);
            report.frames.push((angle, outcome));
            progress.inc(1);
        }
        progress.abandon_with_message("Sweep done");

        Ok(report)
    }

    fn set_state(&self, state: SweepState) {
        trace!("Sweep state: {state:?}");
        self.handle.state.store(state);
    }
}
