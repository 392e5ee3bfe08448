// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::calibration::CalibrationSide;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The radio has {radio} channels, but the array has {antennas} antennas")]
    ChannelCount { radio: usize, antennas: usize },

    #[error("A frame needs at least one chirp")]
    NoChirps,

    #[error("The chirp slot ({stride} samples) is shorter than the chirp ({chirp} samples)")]
    StrideTooShort { stride: usize, chirp: usize },

    #[error("Expected {expected} {side} calibration phases (one per antenna), but got {got}")]
    CalibrationLength {
        side: CalibrationSide,
        expected: usize,
        got: usize,
    },

    #[error("Nothing was captured during calibration")]
    NothingCaptured,

    #[error(transparent)]
    Chirp(#[from] crate::chirp::ChirpError),

    #[error(transparent)]
    Calibration(#[from] crate::calibration::CalibrationError),

    #[error(transparent)]
    Correction(#[from] crate::correction::CorrectionError),

    #[error(transparent)]
    Frame(#[from] crate::frame::FrameError),

    #[error(transparent)]
    Sweep(#[from] crate::sweep::SweepError),

    #[error(transparent)]
    Operator(#[from] crate::operator::OperatorError),
}
