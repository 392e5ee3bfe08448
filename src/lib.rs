// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Beam steering, phase calibration and frame scheduling for a phased-array FMCW
radar built on a multi-channel software-defined radio.
 */

pub mod calibration;
pub mod chirp;
mod cli;
pub mod constants;
pub mod correction;
pub mod frame;
pub(crate) mod math;
pub mod operator;
pub mod radio;
pub mod session;
pub mod steering;
pub mod sweep;

// Re-exports.
pub use calibration::{
    compute_sample_offset, estimate_phase_offsets, CalibrationError, CalibrationSide,
    CalibrationSolutions,
};
pub use chirp::ChirpTemplate;
pub use cli::{PhasedFmcw, PhasedFmcwError};
pub use correction::apply_phase_correction;
pub use frame::{FrameGeometry, FrameOutcome, FrameScheduler};
pub use radio::{DeviceTime, LoopbackConfig, LoopbackPath, LoopbackRadio, Radio, RadioError};
pub use session::{RadarSession, SessionError};
pub use steering::{BeamSteerer, SteeringError};
pub use sweep::{SweepController, SweepReport, SweepState};

use crossbeam_utils::atomic::AtomicCell;

/// A complex number with double-precision components.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

/// A complex sample with signed 16-bit components, the over-the-wire format
/// of the radio ("sc16").
#[allow(non_camel_case_types)]
pub type sc16 = num_complex::Complex<i16>;

/// Should progress bars be drawn? This is set by the CLI.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
