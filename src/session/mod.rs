// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A radar session: everything needed to sweep and calibrate one array.
//!
//! The session owns the calibration state. Calibration and sweeping are
//! separate phases; `&mut self` keeps them from overlapping.

mod error;

pub use error::SessionError;

use std::sync::Arc;

use log::{debug, info};
use ndarray::prelude::*;

use crate::{
    calibration::{compute_sample_offset, estimate_phase_offsets, CalibrationSide, CalibrationSolutions},
    chirp::ChirpTemplate,
    constants::{
        CALIBRATION_TONE_AMPLITUDE, CALIBRATION_TONE_CYCLES, DEFAULT_CHIRPS_PER_FRAME,
        DEFAULT_NUM_ANTENNAS, DEFAULT_SCHEDULE_LEAD_TIME, SAMPLE_OFFSET_SEARCH_MARGIN,
    },
    correction::apply_phase_correction,
    frame::{FrameOutcome, FrameScheduler},
    operator::{CalibrationSetup, Operator},
    radio::Radio,
    sc16,
    steering::BeamSteerer,
    sweep::{SweepController, SweepHandle, SweepRange, SweepReport},
};

/// Session-constant parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionParams {
    pub num_antennas: usize,

    pub chirps_per_frame: usize,

    /// Transmit samples per chirp slot. If `None`, the chirp's length is used
    /// (no silence between chirps).
    pub chirp_stride: Option<usize>,

    /// How far in the future frames are scheduled \[seconds\].
    pub lead_time: f64,
}

impl Default for SessionParams {
    fn default() -> Self {
        SessionParams {
            num_antennas: DEFAULT_NUM_ANTENNAS,
            chirps_per_frame: DEFAULT_CHIRPS_PER_FRAME,
            chirp_stride: None,
            lead_time: DEFAULT_SCHEDULE_LEAD_TIME,
        }
    }
}

pub struct RadarSession {
    radio: Arc<dyn Radio>,
    operator: Box<dyn Operator>,
    chirp: ChirpTemplate,
    params: SessionParams,
    steerer: BeamSteerer,
    rx_calibration: Vec<f64>,
    sample_offset: usize,
    sweeper: SweepController,
}

impl RadarSession {
    pub fn new(
        radio: Arc<dyn Radio>,
        operator: Box<dyn Operator>,
        chirp: ChirpTemplate,
        params: SessionParams,
    ) -> Result<RadarSession, SessionError> {
        let num_antennas = params.num_antennas;
        if radio.num_channels() != num_antennas {
            return Err(SessionError::ChannelCount {
                radio: radio.num_channels(),
                antennas: num_antennas,
            });
        }
        if params.chirps_per_frame == 0 {
            return Err(SessionError::NoChirps);
        }
        let chirp_stride = params.chirp_stride.unwrap_or(chirp.len());
        if chirp_stride < chirp.len() {
            return Err(SessionError::StrideTooShort {
                stride: chirp_stride,
                chirp: chirp.len(),
            });
        }

        let sweeper = SweepController::new(Arc::clone(&radio), chirp_stride, params.chirps_per_frame)
            .with_lead_time(params.lead_time);
        debug!(
            "Radar session: {num_antennas} antennas, {} chirps of {} samples ({chirp_stride} with padding) per frame",
            params.chirps_per_frame,
            chirp.len()
        );
        Ok(RadarSession {
            radio,
            operator,
            chirp,
            params,
            steerer: BeamSteerer::new(num_antennas),
            rx_calibration: vec![0.0; num_antennas],
            sample_offset: 0,
            sweeper,
        })
    }

    pub fn num_antennas(&self) -> usize {
        self.params.num_antennas
    }

    pub fn chirp(&self) -> &ChirpTemplate {
        &self.chirp
    }

    pub fn steerer(&self) -> &BeamSteerer {
        &self.steerer
    }

    /// The transmit calibration phases \[radians\].
    pub fn steering_calibration(&self) -> &[f64] {
        self.steerer.calibrations()
    }

    /// The receive calibration phases \[radians\].
    pub fn receive_calibration(&self) -> &[f64] {
        &self.rx_calibration
    }

    pub fn sample_offset(&self) -> usize {
        self.sample_offset
    }

    /// Replace the transmit calibration phases \[radians\]. There must be one
    /// per antenna.
    pub fn set_steering_calibration(&mut self, phases: &[f64]) -> Result<(), SessionError> {
        self.check_calibration_length(CalibrationSide::Transmit, phases)?;
        self.steerer.apply_calibrations(phases);
        Ok(())
    }

    /// Replace the receive calibration phases \[radians\]. There must be one
    /// per antenna.
    pub fn set_receive_calibration(&mut self, phases: &[f64]) -> Result<(), SessionError> {
        self.check_calibration_length(CalibrationSide::Receive, phases)?;
        self.rx_calibration.copy_from_slice(phases);
        Ok(())
    }

    pub fn set_sample_offset(&mut self, sample_offset: usize) {
        self.sample_offset = sample_offset;
    }

    fn check_calibration_length(
        &self,
        side: CalibrationSide,
        phases: &[f64],
    ) -> Result<(), SessionError> {
        if phases.len() != self.num_antennas() {
            return Err(SessionError::CalibrationLength {
                side,
                expected: self.num_antennas(),
                got: phases.len(),
            });
        }
        Ok(())
    }

    /// The current calibration state.
    pub fn solutions(&self) -> CalibrationSolutions {
        CalibrationSolutions {
            tx_phases_rad: self.steering_calibration().to_vec(),
            rx_phases_rad: self.rx_calibration.clone(),
            sample_offset: self.sample_offset,
            num_antennas: Some(self.num_antennas()),
            created: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Replace the calibration state. Nothing is changed if the solutions are
    /// for a different number of antennas.
    pub fn apply_solutions(&mut self, sols: &CalibrationSolutions) -> Result<(), SessionError> {
        self.check_calibration_length(CalibrationSide::Transmit, &sols.tx_phases_rad)?;
        self.check_calibration_length(CalibrationSide::Receive, &sols.rx_phases_rad)?;
        self.set_steering_calibration(&sols.tx_phases_rad)?;
        self.set_receive_calibration(&sols.rx_phases_rad)?;
        self.sample_offset = sols.sample_offset;
        Ok(())
    }

    /// A handle to watch or cancel sweeps from another thread.
    pub fn sweep_handle(&self) -> Arc<SweepHandle> {
        self.sweeper.handle()
    }

    /// Sweep the beam across `range`. Each corrected frame is handed to
    /// `consumer` along with its angle and outcome.
    pub fn run_sweep<F>(&mut self, range: &SweepRange, consumer: F) -> Result<SweepReport, SessionError>
    where
        F: FnMut(f64, ArrayView2<sc16>, &FrameOutcome),
    {
        let report = self.sweeper.run(
            range,
            &self.steerer,
            &self.chirp,
            &self.rx_calibration,
            self.sample_offset,
            consumer,
        )?;
        info!(
            "Swept {} angles ({} failed, {} short frames)",
            report.frames.len() + report.failed_angles.len(),
            report.failed_angles.len(),
            report.num_short_frames()
        );
        Ok(report)
    }

    /// Measure the sample offset. The operator is asked to loop every
    /// transmitter back to its receiver; the unsteered chirp is then sent
    /// with a capture window that is `SAMPLE_OFFSET_SEARCH_MARGIN` samples
    /// longer than the chirp, and the chirp is located in the capture of the
    /// first channel.
    pub fn calibrate_sample_offset(&mut self) -> Result<usize, SessionError> {
        self.operator
            .request(CalibrationSetup::Loopback, self.radio.as_ref())?;

        let decimation = self.radio.decimation();
        let stride = self.chirp.len() + SAMPLE_OFFSET_SEARCH_MARGIN * decimation;
        let (captured, outcome) = self.calibration_frame(&self.chirp, stride, 0)?;
        let reference = self.chirp.decimated(decimation);
        let captured = captured.slice(s![0, ..outcome.samples_received]).to_vec();
        let offset = compute_sample_offset(&captured, &reference)?;

        info!("Sample offset: {offset}");
        self.sample_offset = offset;
        Ok(offset)
    }

    /// Measure the phase skew of one side of the radio.
    ///
    /// For the receive side, the operator is asked to feed a common reference
    /// to every receiver; the calibration tone is sent and the phase of each
    /// channel is measured against channel 0.
    ///
    /// For the transmit side, the operator is asked to loop every transmitter
    /// back to its receiver; the tone is sent on every channel, the capture is
    /// corrected for the (already known) receive skew, and what remains is the
    /// transmit skew.
    ///
    /// The sample offset should be calibrated first.
    pub fn calibrate_phase(&mut self, side: CalibrationSide) -> Result<Vec<f64>, SessionError> {
        let setup = match side {
            CalibrationSide::Transmit => CalibrationSetup::Loopback,
            CalibrationSide::Receive => CalibrationSetup::CommonReference,
        };
        self.operator.request(setup, self.radio.as_ref())?;

        let tone = ChirpTemplate::tone(
            self.chirp.len(),
            CALIBRATION_TONE_CYCLES,
            CALIBRATION_TONE_AMPLITUDE,
        )?;
        let (mut captured, outcome) =
            self.calibration_frame(&tone, tone.len(), self.sample_offset)?;
        if outcome.samples_received == 0 {
            return Err(SessionError::NothingCaptured);
        }
        if side == CalibrationSide::Transmit {
            apply_phase_correction(captured.view_mut(), &self.rx_calibration)?;
        }
        let phases = estimate_phase_offsets(captured.view(), outcome.samples_received, 0)?;

        info!(
            "{side} calibration phases [deg]: {:?}",
            phases.iter().map(|p| p.to_degrees()).collect::<Vec<_>>()
        );
        match side {
            CalibrationSide::Transmit => self.steerer.apply_calibrations(&phases),
            CalibrationSide::Receive => self.rx_calibration.copy_from_slice(&phases),
        }
        Ok(phases)
    }

    /// Send `signal` once on every channel, padded with silence to `stride`
    /// samples, and capture the result.
    fn calibration_frame(
        &self,
        signal: &ChirpTemplate,
        stride: usize,
        skip: usize,
    ) -> Result<(Array2<sc16>, FrameOutcome), SessionError> {
        let mut scheduler = FrameScheduler::new(Arc::clone(&self.radio), stride, 1);
        let samples = signal.to_sc16();
        let mut tx = Array2::default((self.num_antennas(), stride));
        for mut row in tx.outer_iter_mut() {
            row.slice_mut(s![..samples.len()])
                .assign(&ArrayView1::from(samples.as_slice()));
        }
        let mut rx = Array2::default((self.num_antennas(), scheduler.geometry().rx_len()));
        let at = self.radio.future_time(self.params.lead_time);
        let outcome = scheduler.run_frame(tx.view(), rx.view_mut(), skip, at)?;
        Ok((rx, outcome))
    }
}
