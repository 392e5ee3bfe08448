// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Chirp templates.
//!
//! A [`ChirpTemplate`] is a pair of equal-length, non-empty sequences of 16-bit
//! in-phase (I) and quadrature (Q) samples representing one baseband chirp. It
//! is created once for a radar session and never mutated; steering writes its
//! results into separate buffers.

mod error;

pub use error::ChirpError;

use vec1::Vec1;

use crate::{
    constants::{
        DEFAULT_CHIRP_BITS, DEFAULT_CHIRP_DURATION, DEFAULT_CHIRP_MAX_FREQ,
        DEFAULT_CHIRP_SAMPLE_RATE, MAX_CHIRP_SAMPLES, PI, TAU,
    },
    sc16,
};

/// The waveform definition of a linear FMCW chirp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChirpParams {
    /// The rate at which the waveform is sampled \[samples/s\].
    pub sample_rate: f64,

    /// The frequency reached at the end of the chirp \[Hz\].
    pub max_freq: f64,

    /// The length of the chirp \[seconds\].
    pub duration: f64,

    /// The bit resolution used to scale the samples. The scale is
    /// `2^(bits - 1) - 1`.
    pub bits: u32,

    /// If false, samples carry a DC offset of one scale (i.e. they are all
    /// non-negative), like the samples fed to an unsigned DAC. If true, the
    /// samples are centred on zero.
    pub centred: bool,
}

impl Default for ChirpParams {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_CHIRP_SAMPLE_RATE,
            max_freq: DEFAULT_CHIRP_MAX_FREQ,
            duration: DEFAULT_CHIRP_DURATION,
            bits: DEFAULT_CHIRP_BITS,
            centred: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChirpTemplate {
    i: Vec1<i16>,
    q: Vec1<i16>,
}

impl ChirpTemplate {
    /// Create a template from I and Q samples. Both must be non-empty and of
    /// the same length.
    pub fn new(i: Vec<i16>, q: Vec<i16>) -> Result<ChirpTemplate, ChirpError> {
        if i.len() != q.len() {
            return Err(ChirpError::LengthMismatch {
                i: i.len(),
                q: q.len(),
            });
        }
        let i = Vec1::try_from_vec(i).map_err(|_| ChirpError::Empty)?;
        let q = Vec1::try_from_vec(q).map_err(|_| ChirpError::Empty)?;
        Ok(ChirpTemplate { i, q })
    }

    /// Synthesise a linear chirp. The instantaneous frequency rises linearly
    /// from 0 to `max_freq` over `duration`; the phase at time `t` is
    /// `π α t²` with `α = max_freq / duration`.
    pub fn linear(params: &ChirpParams) -> Result<ChirpTemplate, ChirpError> {
        let ChirpParams {
            sample_rate,
            max_freq,
            duration,
            bits,
            centred,
        } = *params;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ChirpError::BadSampleRate(sample_rate));
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ChirpError::BadDuration(duration));
        }
        if !(2..=15).contains(&bits) {
            return Err(ChirpError::BadBitResolution(bits));
        }

        let num_samples = (duration * sample_rate).round();
        if !num_samples.is_finite() || num_samples > MAX_CHIRP_SAMPLES as f64 {
            return Err(ChirpError::TooLong(num_samples));
        }
        let num_samples = num_samples as usize;
        let alpha = max_freq / duration;
        let scale = ((1_i32 << (bits - 1)) - 1) as f64;
        let (i, q): (Vec<i16>, Vec<i16>) = (0..num_samples)
            .map(|n| {
                let t = n as f64 / sample_rate;
                let (sin, cos) = (PI * alpha * t * t).sin_cos();
                if centred {
                    ((scale * cos).round() as i16, (scale * sin).round() as i16)
                } else {
                    // Truncation, as the DAC tables were generated.
                    ((scale + scale * cos) as i16, (scale + scale * sin) as i16)
                }
            })
            .unzip();

        ChirpTemplate::new(i, q)
    }

    /// Synthesise a complex tone with `cycles` full periods across `len`
    /// samples: `I = A cos(2π k n / L)`, `Q = A sin(2π k n / L)`. This is the
    /// signal transmitted during phase calibration.
    pub fn tone(len: usize, cycles: usize, amplitude: f64) -> Result<ChirpTemplate, ChirpError> {
        if !(amplitude.is_finite() && amplitude.abs() <= i16::MAX as f64) {
            return Err(ChirpError::BadAmplitude(amplitude));
        }
        let (i, q): (Vec<i16>, Vec<i16>) = (0..len)
            .map(|n| {
                let (sin, cos) = (TAU * (cycles * n) as f64 / len as f64).sin_cos();
                ((amplitude * cos).round() as i16, (amplitude * sin).round() as i16)
            })
            .unzip();

        ChirpTemplate::new(i, q)
    }

    /// The number of samples in this chirp.
    pub fn len(&self) -> usize {
        self.i.len()
    }

    /// A template is never empty; this exists to satisfy clippy.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn i(&self) -> &[i16] {
        self.i.as_slice()
    }

    pub fn q(&self) -> &[i16] {
        self.q.as_slice()
    }

    /// The chirp as complex samples (I + jQ).
    pub fn to_sc16(&self) -> Vec<sc16> {
        self.i
            .iter()
            .zip(self.q.iter())
            .map(|(&i, &q)| sc16::new(i, q))
            .collect()
    }

    /// The chirp as complex samples, keeping every `factor`-th sample. This is
    /// what a receiver running `factor` times slower than the transmitter
    /// sees of the chirp. A factor of 0 is treated as 1.
    pub fn decimated(&self, factor: usize) -> Vec<sc16> {
        self.to_sc16()
            .into_iter()
            .step_by(factor.max(1))
            .collect()
    }
}
