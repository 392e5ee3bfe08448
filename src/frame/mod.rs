// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scheduling of transmit/receive frames.
//!
//! A frame is a steered chirp repeated `chirps_per_frame` times on every
//! channel. The receive capture is armed first; the transmit burst and the
//! capture then run concurrently on their own threads, and the frame is done
//! when both have returned. Short transfers are reported in the
//! [`FrameOutcome`], never as errors.

mod error;

pub use error::FrameError;

use std::{
    sync::Arc,
    thread::{self, ScopedJoinHandle},
};

use log::{trace, warn};
use ndarray::prelude::*;

use crate::{
    radio::{DeviceTime, Radio, RadioError},
    sc16,
};

/// The layout of a frame. Chirp `c` of every channel starts at sample
/// `c * chirp_stride` of the transmit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    /// The number of transmit samples occupied by one chirp, including any
    /// trailing silence.
    pub chirp_stride: usize,

    pub chirps_per_frame: usize,

    /// Transmit samples per receive sample.
    pub decimation: usize,
}

impl FrameGeometry {
    pub fn chirp_offset(&self, chirp: usize) -> usize {
        chirp * self.chirp_stride
    }

    /// The number of samples transmitted per channel.
    pub fn tx_len(&self) -> usize {
        self.chirps_per_frame * self.chirp_stride
    }

    /// The number of samples captured per channel (not counting any skipped
    /// samples).
    pub fn rx_len(&self) -> usize {
        self.tx_len().div_ceil(self.decimation.max(1))
    }

    /// The samples of chirp `chirp` on every channel of a transmit frame.
    pub fn chirp_view<'a>(&self, frame: ArrayView2<'a, sc16>, chirp: usize) -> ArrayView2<'a, sc16> {
        let start = self.chirp_offset(chirp);
        frame.slice_move(s![.., start..start + self.chirp_stride])
    }
}

/// What happened to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    pub samples_sent: usize,
    pub samples_received: usize,
    pub expected_sent: usize,
    pub expected_received: usize,
}

impl FrameOutcome {
    /// Were all samples sent and received?
    pub fn is_complete(&self) -> bool {
        self.samples_sent == self.expected_sent && self.samples_received == self.expected_received
    }
}

pub struct FrameScheduler {
    radio: Arc<dyn Radio>,
    geometry: FrameGeometry,

    /// The transmit frame. Allocated once and rewritten every frame.
    tx_frame: Array2<sc16>,
}

impl FrameScheduler {
    /// Set up frames of `chirps_per_frame` chirps, each `chirp_stride` samples
    /// long, on `radio`.
    pub fn new(radio: Arc<dyn Radio>, chirp_stride: usize, chirps_per_frame: usize) -> Self {
        let geometry = FrameGeometry {
            chirp_stride,
            chirps_per_frame,
            decimation: radio.decimation(),
        };
        let tx_frame = Array2::default((radio.num_channels(), geometry.tx_len()));
        FrameScheduler {
            radio,
            geometry,
            tx_frame,
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// The most recently transmitted frame.
    pub fn tx_frame(&self) -> ArrayView2<sc16> {
        self.tx_frame.view()
    }

    /// Transmit `steered` (one row per channel, `chirp_stride` samples each)
    /// `chirps_per_frame` times, while capturing into `rx_buffer`. The first
    /// `skip` samples of the capture are discarded. Transmission starts at
    /// `at`.
    pub fn run_frame(
        &mut self,
        steered: ArrayView2<sc16>,
        rx_buffer: ArrayViewMut2<sc16>,
        skip: usize,
        at: DeviceTime,
    ) -> Result<FrameOutcome, FrameError> {
        let num_channels = self.radio.num_channels();
        for rows in [steered.len_of(Axis(0)), rx_buffer.len_of(Axis(0))] {
            if rows != num_channels {
                return Err(FrameError::ChannelCountMismatch {
                    expected: num_channels,
                    got: rows,
                });
            }
        }
        if steered.len_of(Axis(1)) != self.geometry.chirp_stride {
            return Err(FrameError::ChirpLength {
                expected: self.geometry.chirp_stride,
                got: steered.len_of(Axis(1)),
            });
        }
        let tx_len = self.geometry.tx_len();
        let rx_len = self.geometry.rx_len();
        if rx_buffer.len_of(Axis(1)) < rx_len {
            return Err(FrameError::ReceiveBufferTooShort {
                required: rx_len,
                got: rx_buffer.len_of(Axis(1)),
            });
        }

        for chirp in 0..self.geometry.chirps_per_frame {
            let start = self.geometry.chirp_offset(chirp);
            self.tx_frame
                .slice_mut(s![.., start..start + self.geometry.chirp_stride])
                .assign(&steered);
        }

        // The capture must be armed before any energy is sent.
        self.radio.schedule_receive(rx_len + skip, at)?;

        let radio = &*self.radio;
        let tx_frame = self.tx_frame.view();
        let (sent, received) = thread::scope(|scope| {
            let rx_handle: ScopedJoinHandle<Result<usize, RadioError>> = thread::Builder::new()
                .name("receive".to_string())
                .spawn_scoped(scope, move || radio.receive(rx_buffer, rx_len, skip))
                .expect("OS can create threads");

            let tx_handle: ScopedJoinHandle<Result<usize, RadioError>> = thread::Builder::new()
                .name("transmit".to_string())
                .spawn_scoped(scope, move || radio.transmit(tx_frame, tx_len, at))
                .expect("OS can create threads");

            // Both transfers have to finish before the frame is done, so join
            // both before looking at either result.
            let sent = tx_handle.join().expect("transmit thread doesn't panic");
            let received = rx_handle.join().expect("receive thread doesn't panic");
            (sent, received)
        });

        let outcome = FrameOutcome {
            samples_sent: sent?,
            samples_received: received?,
            expected_sent: tx_len,
            expected_received: rx_len,
        };
        if outcome.samples_sent != tx_len {
            warn!(
                "Only sent {} of {tx_len} samples per channel",
                outcome.samples_sent
            );
        }
        if outcome.samples_received != rx_len {
            warn!(
                "Only received {} of {rx_len} samples per channel",
                outcome.samples_received
            );
        }
        trace!("Frame at {:.6} s: {outcome:?}", at.secs());
        Ok(outcome)
    }
}
