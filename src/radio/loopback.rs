// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A software radio that loops its transmitters back into its receivers.
//!
//! Transmitted bursts are handed to the receive side over a channel. On the
//! way, each burst is decimated to the receive rate, delayed by a fixed
//! latency and rotated by a fixed per-channel transmit and receive skew; this
//! is what a real front end does to a signal, and what calibration has to
//! undo. Transfers can also be truncated to exercise shortfall handling.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use crossbeam_utils::atomic::AtomicCell;
use log::{debug, trace, warn};
use ndarray::prelude::*;

use super::{check_buffer_shape, DeviceTime, LoopbackPath, Radio, RadioError};
use crate::{
    constants::{DEFAULT_RX_RATE, DEFAULT_TX_RATE},
    math::{cexp, round_to_sc16, to_c64},
    sc16,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LoopbackConfig {
    pub num_channels: usize,

    /// \[samples/s\]
    pub tx_rate: f64,

    /// \[samples/s\]
    pub rx_rate: f64,

    /// The number of zero samples that precede a burst in a capture.
    pub latency_samples: usize,

    /// The phase each transmitter adds to its signal \[radians\].
    pub tx_skew_rad: Vec<f64>,

    /// The phase each receiver adds to its signal \[radians\].
    pub rx_skew_rad: Vec<f64>,

    pub path: LoopbackPath,

    /// If set, no more than this many samples are sent per transmit call.
    pub max_tx_samples: Option<usize>,

    /// If set, no more than this many samples are returned per receive call.
    pub max_rx_samples: Option<usize>,

    /// How long a receive waits for a burst before giving up.
    pub receive_timeout: Duration,
}

impl LoopbackConfig {
    /// A skew-free, latency-free configuration at the default rates.
    pub fn new(num_channels: usize) -> LoopbackConfig {
        LoopbackConfig {
            num_channels,
            tx_rate: DEFAULT_TX_RATE,
            rx_rate: DEFAULT_RX_RATE,
            latency_samples: 0,
            tx_skew_rad: vec![0.0; num_channels],
            rx_skew_rad: vec![0.0; num_channels],
            path: LoopbackPath::Direct,
            max_tx_samples: None,
            max_rx_samples: None,
            receive_timeout: Duration::from_secs(2),
        }
    }
}

/// A capture armed by [`Radio::schedule_receive`].
#[derive(Debug, Clone, Copy)]
struct Capture {
    sample_count: usize,
    at: DeviceTime,
}

pub struct LoopbackRadio {
    config: LoopbackConfig,
    path: AtomicCell<LoopbackPath>,
    epoch: Instant,
    captures: (Sender<Capture>, Receiver<Capture>),
    bursts: (Sender<Array2<sc16>>, Receiver<Array2<sc16>>),
    num_keep_alives: AtomicCell<usize>,
}

impl LoopbackRadio {
    pub fn new(config: LoopbackConfig) -> Result<LoopbackRadio, RadioError> {
        if config.num_channels == 0 {
            return Err(RadioError::NoChannels);
        }
        let rates_ok = [config.tx_rate, config.rx_rate]
            .iter()
            .all(|r| r.is_finite() && *r > 0.0);
        if !rates_ok {
            return Err(RadioError::BadRate {
                tx: config.tx_rate,
                rx: config.rx_rate,
            });
        }
        for (which, skews) in [
            ("transmit", &config.tx_skew_rad),
            ("receive", &config.rx_skew_rad),
        ] {
            if skews.len() != config.num_channels {
                return Err(RadioError::SkewLength {
                    which,
                    expected: config.num_channels,
                    got: skews.len(),
                });
            }
        }

        debug!(
            "Loopback radio: {} channels, decimation {}, latency {} samples, {} path",
            config.num_channels,
            (config.tx_rate / config.rx_rate).round().max(1.0),
            config.latency_samples,
            config.path
        );
        Ok(LoopbackRadio {
            path: AtomicCell::new(config.path),
            config,
            epoch: Instant::now(),
            captures: crossbeam_channel::unbounded(),
            bursts: crossbeam_channel::unbounded(),
            num_keep_alives: AtomicCell::new(0),
        })
    }

    pub fn config(&self) -> &LoopbackConfig {
        &self.config
    }

    /// Rewire the loopback. This is what an operator does between calibration
    /// steps.
    pub fn set_path(&self, path: LoopbackPath) {
        debug!("Loopback path is now {path}");
        self.path.store(path);
    }

    pub fn path(&self) -> LoopbackPath {
        self.path.load()
    }

    /// How many times [`Radio::keep_alive`] has been called.
    pub fn num_keep_alives(&self) -> usize {
        self.num_keep_alives.load()
    }

    /// Turn a transmitted burst into what receiver `rx` captures: `len`
    /// samples at the receive rate.
    fn received_stream(&self, burst: ArrayView2<sc16>, rx: usize, len: usize) -> Vec<sc16> {
        let tx = match self.path() {
            LoopbackPath::Direct => rx,
            LoopbackPath::CommonReference => 0,
        };
        let skew = self.config.tx_skew_rad[tx] + self.config.rx_skew_rad[rx];
        let rotator = cexp(skew);

        let mut stream = vec![sc16::default(); len];
        let decimated = burst.row(tx).into_iter().step_by(self.decimation());
        for (s, &b) in stream
            .iter_mut()
            .skip(self.config.latency_samples)
            .zip(decimated)
        {
            *s = if skew == 0.0 {
                b
            } else {
                round_to_sc16(to_c64(b) * rotator)
            };
        }
        stream
    }
}

impl Radio for LoopbackRadio {
    fn num_channels(&self) -> usize {
        self.config.num_channels
    }

    fn tx_rate(&self) -> f64 {
        self.config.tx_rate
    }

    fn rx_rate(&self) -> f64 {
        self.config.rx_rate
    }

    fn future_time(&self, seconds_from_now: f64) -> DeviceTime {
        DeviceTime(self.epoch.elapsed().as_secs_f64() + seconds_from_now)
    }

    fn schedule_receive(&self, sample_count: usize, at: DeviceTime) -> Result<(), RadioError> {
        // Anything transmitted before the capture was armed is lost.
        let stale = self.bursts.1.try_iter().count();
        if stale > 0 {
            debug!("Dropping {stale} burst(s) sent before the capture was armed");
        }
        trace!("Armed a capture of {sample_count} samples at {:.6} s", at.secs());
        // Can't fail; we hold the receiver.
        let _ = self.captures.0.send(Capture { sample_count, at });
        Ok(())
    }

    fn receive(
        &self,
        mut buffers: ArrayViewMut2<sc16>,
        sample_count: usize,
        skip: usize,
    ) -> Result<usize, RadioError> {
        check_buffer_shape(buffers.dim(), self.num_channels(), sample_count)?;
        let capture = self
            .captures
            .1
            .try_recv()
            .map_err(|_| RadioError::NotArmed)?;

        let burst = match self.bursts.1.recv_timeout(self.config.receive_timeout) {
            Ok(b) => b,
            Err(_) => {
                warn!(
                    "Timed out waiting for samples for the capture at {:.6} s",
                    capture.at.secs()
                );
                return Ok(0);
            }
        };

        // The capture only holds what was armed.
        let available = capture.sample_count.saturating_sub(skip);
        let mut received = sample_count.min(available);
        if let Some(max) = self.config.max_rx_samples {
            received = received.min(max);
        }

        for (rx, mut row) in buffers.outer_iter_mut().enumerate() {
            let stream = self.received_stream(burst.view(), rx, capture.sample_count);
            for (b, &s) in row.iter_mut().zip(stream[skip.min(stream.len())..].iter()).take(received) {
                *b = s;
            }
        }
        trace!("Received {received} of {sample_count} samples (skipped {skip})");
        Ok(received)
    }

    fn transmit(
        &self,
        buffers: ArrayView2<sc16>,
        sample_count: usize,
        at: DeviceTime,
    ) -> Result<usize, RadioError> {
        check_buffer_shape(buffers.dim(), self.num_channels(), sample_count)?;
        let sent = match self.config.max_tx_samples {
            Some(max) => sample_count.min(max),
            None => sample_count,
        };
        trace!("Transmitting {sent} of {sample_count} samples at {:.6} s", at.secs());
        let _ = self.bursts.0.send(buffers.slice(s![.., ..sent]).to_owned());
        Ok(sent)
    }

    fn keep_alive(&self) -> Result<(), RadioError> {
        self.num_keep_alives.fetch_add(1);
        Ok(())
    }
}
