// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all phased_fmcw-related errors. This should be the *only*
//! error enum that is publicly visible.

use thiserror::Error;

use super::{calibrate::CalibrateArgsError, common::RadioArgsError};
use crate::{
    calibration::{CalibrationError, SolutionsReadError, SolutionsWriteError},
    chirp::ChirpError,
    correction::CorrectionError,
    frame::FrameError,
    operator::OperatorError,
    radio::RadioError,
    session::SessionError,
    steering::SteeringError,
    sweep::SweepError,
};

/// The *only* publicly visible error from phased_fmcw. Each error message
/// should point at where more help is available, unless it's "generic".
#[derive(Error, Debug)]
pub enum PhasedFmcwError {
    /// An error related to sweeping.
    #[error("{0}\n\nSee for more info: phased-fmcw sweep --help")]
    Sweep(String),

    /// An error related to calibrating.
    #[error("{0}\n\nSee for more info: phased-fmcw calibrate --help")]
    Calibrate(String),

    /// An error related to steering phases.
    #[error("{0}\n\nSee for more info: phased-fmcw steer --help")]
    Steer(String),

    /// An error related to how frames are laid out.
    #[error("{0}\n\nCheck the FRAME arguments; see for more info: phased-fmcw sweep --help")]
    Frame(String),

    /// An error related to the chirp waveform.
    #[error("{0}\n\nCheck the CHIRP arguments; see for more info: phased-fmcw sweep --help")]
    Chirp(String),

    /// An error related to the radio.
    #[error("{0}\n\nCheck the RADIO arguments; see for more info: phased-fmcw sweep --help")]
    Radio(String),

    /// Generic error surrounding calibration solutions.
    #[error("{0}\n\nCalibration solutions are written by: phased-fmcw calibrate")]
    Solutions(String),

    /// An error related to argument files.
    #[error("{0}\n\nAny subcommand's arguments may be given in a toml or json file; see for more info: phased-fmcw <SUBCOMMAND> --help")]
    ArgFile(String),

    /// A generic error that can't be clarified further with documentation, e.g.
    /// IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<CalibrateArgsError> for PhasedFmcwError {
    fn from(e: CalibrateArgsError) -> Self {
        let s = e.to_string();
        match e {
            CalibrateArgsError::NothingToDo => Self::Calibrate(s),
            CalibrateArgsError::BadOutputExt { .. } => Self::Solutions(s),
        }
    }
}

impl From<RadioArgsError> for PhasedFmcwError {
    fn from(e: RadioArgsError) -> Self {
        match e {
            RadioArgsError::InvalidPath { .. } => Self::Radio(e.to_string()),
            RadioArgsError::Radio(e) => Self::from(e),
        }
    }
}

// Library code errors.

impl From<SessionError> for PhasedFmcwError {
    fn from(e: SessionError) -> Self {
        let s = e.to_string();
        match e {
            SessionError::ChannelCount { .. } => Self::Radio(s),
            SessionError::NoChirps | SessionError::StrideTooShort { .. } => Self::Frame(s),
            SessionError::CalibrationLength { .. } => Self::Solutions(s),
            SessionError::NothingCaptured => Self::Calibrate(s),
            SessionError::Chirp(e) => Self::from(e),
            SessionError::Calibration(e) => Self::from(e),
            SessionError::Correction(e) => Self::from(e),
            SessionError::Frame(e) => Self::from(e),
            SessionError::Sweep(e) => Self::from(e),
            SessionError::Operator(e) => Self::from(e),
        }
    }
}

impl From<SweepError> for PhasedFmcwError {
    fn from(e: SweepError) -> Self {
        let s = e.to_string();
        match e {
            SweepError::BadStep(_)
            | SweepError::BadRange { .. }
            | SweepError::TooManyAngles { .. } => Self::Sweep(s),
            SweepError::Frame(e) => Self::from(e),
            SweepError::Correction(e) => Self::from(e),
        }
    }
}

impl From<FrameError> for PhasedFmcwError {
    fn from(e: FrameError) -> Self {
        let s = e.to_string();
        match e {
            FrameError::ChannelCountMismatch { .. }
            | FrameError::ChirpLength { .. }
            | FrameError::ReceiveBufferTooShort { .. } => Self::Frame(s),
            FrameError::Radio(e) => Self::from(e),
        }
    }
}

impl From<OperatorError> for PhasedFmcwError {
    fn from(e: OperatorError) -> Self {
        let s = e.to_string();
        match e {
            OperatorError::Timeout { .. } | OperatorError::Gone => Self::Calibrate(s),
            OperatorError::Radio(e) => Self::from(e),
            OperatorError::IO(e) => Self::from(e),
        }
    }
}

impl From<CalibrationError> for PhasedFmcwError {
    fn from(e: CalibrationError) -> Self {
        Self::Calibrate(e.to_string())
    }
}

impl From<SteeringError> for PhasedFmcwError {
    fn from(e: SteeringError) -> Self {
        Self::Steer(e.to_string())
    }
}

impl From<ChirpError> for PhasedFmcwError {
    fn from(e: ChirpError) -> Self {
        Self::Chirp(e.to_string())
    }
}

impl From<RadioError> for PhasedFmcwError {
    fn from(e: RadioError) -> Self {
        Self::Radio(e.to_string())
    }
}

impl From<CorrectionError> for PhasedFmcwError {
    fn from(e: CorrectionError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<SolutionsReadError> for PhasedFmcwError {
    fn from(e: SolutionsReadError) -> Self {
        let s = e.to_string();
        match e {
            SolutionsReadError::UnsupportedExt { .. }
            | SolutionsReadError::BadShape { .. }
            | SolutionsReadError::NonFinite { .. }
            | SolutionsReadError::Toml(_)
            | SolutionsReadError::Json(_) => Self::Solutions(s),
            SolutionsReadError::IO(e) => Self::from(e),
        }
    }
}

impl From<SolutionsWriteError> for PhasedFmcwError {
    fn from(e: SolutionsWriteError) -> Self {
        let s = e.to_string();
        match e {
            SolutionsWriteError::UnsupportedExt { .. }
            | SolutionsWriteError::Toml(_)
            | SolutionsWriteError::Json(_) => Self::Solutions(s),
            SolutionsWriteError::IO(e) => Self::from(e),
        }
    }
}

impl From<std::io::Error> for PhasedFmcwError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
