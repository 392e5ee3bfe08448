// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with the radio.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RadioError {
    #[error("Expected a buffer of {num_channels} channels with at least {sample_count} samples each, but got {rows} channels of {len} samples")]
    BufferShape {
        num_channels: usize,
        sample_count: usize,
        rows: usize,
        len: usize,
    },

    #[error("Tried to receive without first scheduling a capture")]
    NotArmed,

    #[error("A radio needs at least one channel")]
    NoChannels,

    #[error("The sample rates must be positive and finite; got TX {tx} and RX {rx}")]
    BadRate { tx: f64, rx: f64 },

    #[error("Expected {expected} {which} skews (one per channel), but got {got}")]
    SkewLength {
        which: &'static str,
        expected: usize,
        got: usize,
    },
}
