// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Expected {expected} channels, but got {got}")]
    ChannelCountMismatch { expected: usize, got: usize },

    #[error("Expected steered chirps of {expected} samples, but got {got}")]
    ChirpLength { expected: usize, got: usize },

    #[error("The receive buffer needs at least {required} samples per channel, but has {got}")]
    ReceiveBufferTooShort { required: usize, got: usize },

    #[error(transparent)]
    Radio(#[from] crate::radio::RadioError),
}
