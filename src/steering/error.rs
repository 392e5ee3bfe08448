// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with beam steering.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SteeringError {
    #[error("Expected a steering buffer with {expected} channels, but it has {got}")]
    ChannelCountMismatch { expected: usize, got: usize },

    #[error("The I samples ({i}) and Q samples ({q}) have different lengths")]
    IqLengthMismatch { i: usize, q: usize },

    #[error("The output ({output} samples) is shorter than the input ({input} samples)")]
    OutputTooShort { input: usize, output: usize },
}
