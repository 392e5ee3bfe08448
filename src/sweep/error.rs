// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    #[error("The sweep step must be positive and finite; got {0}°")]
    BadStep(f64),

    #[error("The sweep range must be finite; got {start}° to {end}°")]
    BadRange { start: f64, end: f64 },

    #[error("Sweeping from {start}° to {end}° in {step}° steps needs more than {max} angles", max = crate::constants::MAX_SWEEP_ANGLES)]
    TooManyAngles { start: f64, end: f64, step: f64 },

    #[error(transparent)]
    Frame(#[from] crate::frame::FrameError),

    #[error(transparent)]
    Correction(#[from] crate::correction::CorrectionError),
}
