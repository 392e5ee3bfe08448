// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to abstract the radio front end.
//!
//! [`Radio`] is the capability the radar needs from a multi-channel
//! software-defined radio: timed, synchronised transmit and receive of 16-bit
//! complex samples on every channel. Device tuning and stream setup belong to
//! whoever constructs the implementation. [`LoopbackRadio`] is a self-contained
//! software implementation that loops transmitted samples back to the
//! receiver.
//!
//! Buffers are two-dimensional with one row per channel.

mod error;
mod loopback;

pub use error::RadioError;
pub use loopback::{LoopbackConfig, LoopbackRadio};

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::sc16;

/// A timestamp on the radio's clock \[seconds\].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct DeviceTime(pub f64);

impl DeviceTime {
    pub fn secs(self) -> f64 {
        self.0
    }
}

/// How the transmitters of a [`LoopbackRadio`] are wired to its receivers.
#[derive(
    Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum LoopbackPath {
    /// Transmitter `n` feeds receiver `n`.
    #[strum(serialize = "direct")]
    Direct,

    /// Transmitter 0 feeds every receiver through a splitter, so every
    /// receiver sees the same reference signal.
    #[strum(serialize = "common")]
    CommonReference,
}

/// A trait abstracting a multi-channel radio.
pub trait Radio: Sync + Send {
    /// The number of channels (antennas) this radio drives.
    fn num_channels(&self) -> usize;

    /// The transmit sample rate \[samples/s\].
    fn tx_rate(&self) -> f64;

    /// The receive sample rate \[samples/s\].
    fn rx_rate(&self) -> f64;

    /// How many transmitted samples correspond to one received sample. This is
    /// at least 1.
    fn decimation(&self) -> usize {
        let ratio = (self.tx_rate() / self.rx_rate()).round();
        if ratio.is_finite() && ratio >= 1.0 {
            ratio as usize
        } else {
            1
        }
    }

    /// A timestamp `seconds_from_now` in the future on the device's clock.
    fn future_time(&self, seconds_from_now: f64) -> DeviceTime;

    /// Arm a timed capture of `sample_count` samples (per channel) starting at
    /// `at`. This must be called before the corresponding [`Radio::receive`].
    fn schedule_receive(&self, sample_count: usize, at: DeviceTime) -> Result<(), RadioError>;

    /// Collect the armed capture. The first `skip` samples are discarded and
    /// the next `sample_count` are written to the start of each row of
    /// `buffers`. Returns how many samples were written per channel, which
    /// may be fewer than requested (e.g. on a timeout).
    fn receive(
        &self,
        buffers: ArrayViewMut2<sc16>,
        sample_count: usize,
        skip: usize,
    ) -> Result<usize, RadioError>;

    /// Transmit the first `sample_count` samples of each row of `buffers`,
    /// starting at `at`. Returns how many samples were sent per channel, which
    /// may be fewer than requested.
    fn transmit(
        &self,
        buffers: ArrayView2<sc16>,
        sample_count: usize,
        at: DeviceTime,
    ) -> Result<usize, RadioError>;

    /// Poke the device so it doesn't drop an idle connection.
    fn keep_alive(&self) -> Result<(), RadioError> {
        Ok(())
    }
}

/// Check that `dim` describes a buffer with one row per channel and rows at
/// least `sample_count` long.
pub(crate) fn check_buffer_shape(
    dim: (usize, usize),
    num_channels: usize,
    sample_count: usize,
) -> Result<(), RadioError> {
    let (rows, len) = dim;
    if rows != num_channels || len < sample_count {
        return Err(RadioError::BufferShape {
            num_channels,
            sample_count,
            rows,
            len,
        });
    }
    Ok(())
}
