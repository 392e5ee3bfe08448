// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All angles and phases are double precision. Samples are only converted to
16-bit integers at the very end of a calculation.
 */

use std::time::Duration;

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// The number of antenna elements (and radio channels) in the array.
pub const DEFAULT_NUM_ANTENNAS: usize = 4;

/// How many times a chirp is repeated in a single frame.
pub const DEFAULT_CHIRPS_PER_FRAME: usize = 128;

/// The first steering angle of a sweep \[degrees\].
pub const DEFAULT_SWEEP_START_DEG: f64 = -60.0;

/// The last steering angle of a sweep \[degrees\].
pub const DEFAULT_SWEEP_END_DEG: f64 = 60.0;

/// The angular step between sweep frames \[degrees\].
pub const DEFAULT_SWEEP_STEP_DEG: f64 = 5.0;

/// The rate at which the chirp waveform is defined \[samples/s\].
pub const DEFAULT_CHIRP_SAMPLE_RATE: f64 = 1e6;

/// The frequency reached at the end of a chirp \[Hz\].
pub const DEFAULT_CHIRP_MAX_FREQ: f64 = 100e3;

/// The duration of a single chirp \[seconds\].
pub const DEFAULT_CHIRP_DURATION: f64 = 10e-3;

/// The bit resolution used to scale chirp samples.
pub const DEFAULT_CHIRP_BITS: u32 = 8;

/// The default transmit sample rate \[samples/s\].
pub const DEFAULT_TX_RATE: f64 = 2e6;

/// The default receive sample rate \[samples/s\].
pub const DEFAULT_RX_RATE: f64 = 2e6;

/// How far in the future a frame is scheduled \[seconds\]. This has to be long
/// enough to arm the receive path before transmission starts.
pub const DEFAULT_SCHEDULE_LEAD_TIME: f64 = 0.5;

/// The amplitude of the calibration tone.
pub const CALIBRATION_TONE_AMPLITUDE: f64 = 16000.0;

/// The number of tone cycles in a single calibration tone template.
pub const CALIBRATION_TONE_CYCLES: usize = 8;

/// Extra samples captured beyond a frame when searching for the sample
/// offset. The latency being measured must fit within this margin.
pub const SAMPLE_OFFSET_SEARCH_MARGIN: usize = 4096;

/// The longest an operator-assisted procedure may wait for the operator.
pub const DEFAULT_OPERATOR_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How often the radio is poked while waiting on the operator.
pub const DEFAULT_KEEP_ALIVE_CADENCE: Duration = Duration::from_secs(1);

/// The most angles a single sweep may visit.
pub const MAX_SWEEP_ANGLES: usize = 1_000_000;

/// The most samples a chirp template may hold.
pub const MAX_CHIRP_SAMPLES: usize = u32::MAX as usize;
