// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Operator interaction during calibration.
//!
//! Calibration procedures need the hardware rewired between steps. An
//! [`Operator`] is asked to put the hardware in a [`CalibrationSetup`] and
//! blocks until that is done. While it waits it must keep the radio alive.

mod error;

pub use error::OperatorError;

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::RecvTimeoutError;
use log::{debug, info};
use strum_macros::{Display, EnumIter};

use crate::{
    constants::{DEFAULT_KEEP_ALIVE_CADENCE, DEFAULT_OPERATOR_TIMEOUT},
    radio::{LoopbackPath, LoopbackRadio, Radio},
};

/// How the hardware needs to be wired for a calibration step.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSetup {
    /// Each transmitter is connected to its own receiver.
    #[strum(serialize = "loopback")]
    Loopback,

    /// One reference signal is split to every receiver.
    #[strum(serialize = "common reference")]
    CommonReference,
}

impl CalibrationSetup {
    pub fn instructions(self) -> &'static str {
        match self {
            CalibrationSetup::Loopback => {
                "Connect each TX port to the RX port of the same channel through an attenuator"
            }
            CalibrationSetup::CommonReference => {
                "Connect TX 0 through a splitter to the RX port of every channel"
            }
        }
    }
}

/// A trait abstracting the person (or thing) that rewires the hardware.
pub trait Operator: Sync + Send {
    /// Block until the hardware is in `setup`. `radio` is the radio that has to
    /// be kept alive in the meantime.
    fn request(&self, setup: CalibrationSetup, radio: &dyn Radio) -> Result<(), OperatorError>;
}

/// An operator for hardware that is permanently wired for calibration. Every
/// request succeeds immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoOperator;

impl Operator for AutoOperator {
    fn request(&self, setup: CalibrationSetup, _: &dyn Radio) -> Result<(), OperatorError> {
        debug!("Assuming the hardware is already in the {setup} setup");
        Ok(())
    }
}

/// An operator that rewires a [`LoopbackRadio`] in software. If another
/// operator is attached, it is asked first and the loopback is only rewired
/// once it is done.
pub struct LoopbackOperator {
    radio: Arc<LoopbackRadio>,
    operator: Option<Box<dyn Operator>>,
}

impl LoopbackOperator {
    pub fn new(radio: Arc<LoopbackRadio>) -> LoopbackOperator {
        LoopbackOperator {
            radio,
            operator: None,
        }
    }

    pub fn with_operator(mut self, operator: Box<dyn Operator>) -> LoopbackOperator {
        self.operator = Some(operator);
        self
    }
}

impl Operator for LoopbackOperator {
    fn request(&self, setup: CalibrationSetup, radio: &dyn Radio) -> Result<(), OperatorError> {
        if let Some(operator) = &self.operator {
            operator.request(setup, radio)?;
        }
        self.radio.set_path(match setup {
            CalibrationSetup::Loopback => LoopbackPath::Direct,
            CalibrationSetup::CommonReference => LoopbackPath::CommonReference,
        });
        Ok(())
    }
}

/// An operator at a terminal. The instructions for each setup are printed and
/// the operator presses a key when done. The radio is poked every `cadence`;
/// after `timeout` the request fails.
#[derive(Debug, Clone, Copy)]
pub struct TerminalOperator {
    pub cadence: Duration,
    pub timeout: Duration,
}

impl Default for TerminalOperator {
    fn default() -> Self {
        TerminalOperator {
            cadence: DEFAULT_KEEP_ALIVE_CADENCE,
            timeout: DEFAULT_OPERATOR_TIMEOUT,
        }
    }
}

impl Operator for TerminalOperator {
    fn request(&self, setup: CalibrationSetup, radio: &dyn Radio) -> Result<(), OperatorError> {
        info!("Calibration needs the {setup} setup:");
        info!("  {}", setup.instructions());
        info!("Press any key when ready");

        // Reading a key can't be interrupted, so the reader is detached. If the
        // request times out, it lingers until a key is pressed or the process
        // exits.
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name("operator".to_string())
            .spawn(move || {
                let result = console::Term::stderr().read_key().map(|_| ());
                // Nobody is listening if the request already timed out.
                let _ = tx.send(result);
            })?;

        wait_for_operator(&rx, radio, self.cadence, self.timeout)
    }
}

/// Wait on `rx` for the operator, calling [`Radio::keep_alive`] every
/// `cadence`, for at most `timeout`.
fn wait_for_operator(
    rx: &crossbeam_channel::Receiver<std::io::Result<()>>,
    radio: &dyn Radio,
    cadence: Duration,
    timeout: Duration,
) -> Result<(), OperatorError> {
    let start = Instant::now();
    loop {
        match rx.recv_timeout(cadence) {
            Ok(result) => {
                result?;
                debug!("Operator ready after {:.1?}", start.elapsed());
                return Ok(());
            }
            Err(RecvTimeoutError::Timeout) => {
                let waited = start.elapsed();
                if waited >= timeout {
                    return Err(OperatorError::Timeout { waited });
                }
                radio.keep_alive()?;
            }
            Err(RecvTimeoutError::Disconnected) => return Err(OperatorError::Gone),
        }
    }
}
