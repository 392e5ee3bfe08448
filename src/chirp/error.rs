// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with creating chirp templates.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ChirpError {
    #[error("A chirp template cannot be empty")]
    Empty,

    #[error("The chirp's I samples ({i}) and Q samples ({q}) have different lengths")]
    LengthMismatch { i: usize, q: usize },

    #[error("The chirp sample rate must be positive and finite; got {0}")]
    BadSampleRate(f64),

    #[error("The chirp duration must be positive and finite; got {0}")]
    BadDuration(f64),

    #[error("A chirp of {0} samples is longer than the {max} samples allowed", max = crate::constants::MAX_CHIRP_SAMPLES)]
    TooLong(f64),

    #[error("The chirp bit resolution must be between 2 and 15; got {0}")]
    BadBitResolution(u32),

    #[error("The tone amplitude must fit in a 16-bit sample; got {0}")]
    BadAmplitude(f64),
}
