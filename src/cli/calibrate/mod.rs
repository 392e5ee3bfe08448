// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#[cfg(test)]
mod tests;

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{AppSettings, Parser};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{
    display_warnings, format_degrees, ChirpArgs, FrameArgs, InfoPrinter, RadioArgs, Warn,
    ARG_FILE_HELP,
};
use crate::{
    calibration::{is_solutions_file, CalibrationSide, CalibrationSolutions, SOLUTION_EXTENSIONS},
    chirp::ChirpTemplate,
    constants::{DEFAULT_KEEP_ALIVE_CADENCE, DEFAULT_OPERATOR_TIMEOUT},
    operator::{LoopbackOperator, Operator, TerminalOperator},
    radio::LoopbackRadio,
    session::{RadarSession, SessionParams},
    PhasedFmcwError,
};

pub(super) const DEFAULT_OUTPUT_SOLUTIONS_FILENAME: &str = "phased_fmcw_solutions.toml";

lazy_static::lazy_static! {
    static ref OUTPUTS_HELP: String =
        format!("Paths to the output calibration solution files. Supported formats: {}. Default: {DEFAULT_OUTPUT_SOLUTIONS_FILENAME}", *SOLUTION_EXTENSIONS);

    static ref OPERATOR_TIMEOUT_HELP: String =
        format!("With --interactive, give up after waiting this long for the operator [seconds]. Default: {}", DEFAULT_OPERATOR_TIMEOUT.as_secs());
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[clap(setting(AppSettings::AllowNegativeNumbers))]
pub(super) struct CalibrateArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "radio")]
    #[serde(default)]
    pub(super) radio_args: RadioArgs,

    #[clap(flatten)]
    #[serde(rename = "chirp")]
    #[serde(default)]
    pub(super) chirp_args: ChirpArgs,

    #[clap(flatten)]
    #[serde(rename = "frame")]
    #[serde(default)]
    pub(super) frame_args: FrameArgs,

    /// Calibration solutions to start from. Anything that isn't recalibrated
    /// is carried over to the outputs.
    #[clap(short, long, parse(from_os_str), help_heading = "CALIBRATION")]
    pub(super) solutions: Option<PathBuf>,

    /// Don't measure the sample offset.
    #[clap(long, help_heading = "CALIBRATION")]
    #[serde(default)]
    pub(super) no_sample_offset: bool,

    /// Don't measure the receive phases.
    #[clap(long, help_heading = "CALIBRATION")]
    #[serde(default)]
    pub(super) no_rx: bool,

    /// Don't measure the transmit phases.
    #[clap(long, help_heading = "CALIBRATION")]
    #[serde(default)]
    pub(super) no_tx: bool,

    /// Ask an operator at the terminal to rewire the radio before each step.
    /// The loopback is rewired once the operator is done.
    #[clap(long, help_heading = "CALIBRATION")]
    #[serde(default)]
    pub(super) interactive: bool,

    #[clap(long, help = OPERATOR_TIMEOUT_HELP.as_str(), help_heading = "CALIBRATION")]
    pub(super) operator_timeout: Option<f64>,

    #[clap(
        short = 'o',
        long,
        multiple_values(true),
        help = OUTPUTS_HELP.as_str(),
        help_heading = "OUTPUT FILES"
    )]
    pub(super) outputs: Option<Vec<PathBuf>>,
}

/// Which calibration steps to run. They always run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CalibrationSteps {
    sample_offset: bool,
    rx: bool,
    tx: bool,
}

/// Everything needed to calibrate.
pub(super) struct CalibrateParams {
    radio: Arc<LoopbackRadio>,
    chirp: ChirpTemplate,
    session_params: SessionParams,
    initial_solutions: Option<CalibrationSolutions>,
    steps: CalibrationSteps,
    operator: Box<dyn Operator>,
    outputs: Vec<PathBuf>,
}

impl CalibrateArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<CalibrateArgs, PhasedFmcwError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let CalibrateArgs {
                args_file: _,
                radio_args,
                chirp_args,
                frame_args,
                solutions,
                no_sample_offset,
                no_rx,
                no_tx,
                interactive,
                operator_timeout,
                outputs,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(CalibrateArgs {
                args_file: None,
                radio_args: cli_args.radio_args.merge(radio_args),
                chirp_args: cli_args.chirp_args.merge(chirp_args),
                frame_args: cli_args.frame_args.merge(frame_args),
                solutions: cli_args.solutions.or(solutions),
                no_sample_offset: cli_args.no_sample_offset || no_sample_offset,
                no_rx: cli_args.no_rx || no_rx,
                no_tx: cli_args.no_tx || no_tx,
                interactive: cli_args.interactive || interactive,
                operator_timeout: cli_args.operator_timeout.or(operator_timeout),
                outputs: cli_args.outputs.or(outputs),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<CalibrateParams, PhasedFmcwError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            radio_args,
            chirp_args,
            frame_args,
            solutions,
            no_sample_offset,
            no_rx,
            no_tx,
            interactive,
            operator_timeout,
            outputs,
        } = self;

        let steps = CalibrationSteps {
            sample_offset: !no_sample_offset,
            rx: !no_rx,
            tx: !no_tx,
        };
        if !(steps.sample_offset || steps.rx || steps.tx) {
            return Err(CalibrateArgsError::NothingToDo.into());
        }

        let outputs = outputs
            .unwrap_or_else(|| vec![PathBuf::from(DEFAULT_OUTPUT_SOLUTIONS_FILENAME)]);
        for output in &outputs {
            if !is_solutions_file(output) {
                return Err(CalibrateArgsError::BadOutputExt {
                    file: output.clone(),
                    valid: SOLUTION_EXTENSIONS.clone(),
                }
                .into());
            }
        }

        let radio = radio_args.parse()?;
        let chirp = chirp_args.parse()?;
        let session_params = frame_args.parse(radio.config().num_channels);

        let initial_solutions = match solutions {
            Some(file) => {
                let sols = CalibrationSolutions::read_solutions_from_ext(&file)?;
                info!("Starting from calibration solutions in '{}'", file.display());
                Some(sols)
            }
            None => None,
        };
        if initial_solutions.is_none() {
            if !steps.sample_offset {
                "The sample offset isn't being measured and no solutions were given; it is assumed to be 0"
                    .warn();
            }
            if steps.tx && !steps.rx {
                "The transmit phases are measured through the receivers, but the receive phases aren't being measured and no solutions were given; the transmit phases will include the receive skew"
                    .warn();
            }
        }

        // The command line only drives the software loopback, so it is always
        // rewired; an interactive operator is asked first.
        let mut operator = LoopbackOperator::new(Arc::clone(&radio));
        if interactive {
            let timeout = match operator_timeout.map(Duration::try_from_secs_f64) {
                Some(Ok(t)) if !t.is_zero() => t,
                Some(_) => {
                    format!(
                        "Ignoring the operator timeout of {} s; using {} s",
                        operator_timeout.unwrap_or_default(),
                        DEFAULT_OPERATOR_TIMEOUT.as_secs()
                    )
                    .warn();
                    DEFAULT_OPERATOR_TIMEOUT
                }
                None => DEFAULT_OPERATOR_TIMEOUT,
            };
            operator = operator.with_operator(Box::new(TerminalOperator {
                cadence: DEFAULT_KEEP_ALIVE_CADENCE,
                timeout,
            }));
        }
        let operator: Box<dyn Operator> = Box::new(operator);

        let mut printer = InfoPrinter::new("Calibration".into());
        let mut block = vec![];
        if steps.sample_offset {
            block.push("Measure the sample offset (loopback)".into());
        }
        if steps.rx {
            block.push("Measure the receive phases (common reference)".into());
        }
        if steps.tx {
            block.push("Measure the transmit phases (loopback)".into());
        }
        printer.push_block(block);
        printer.push_line(
            if interactive {
                "An operator is asked to rewire the radio before each step"
            } else {
                "The loopback is rewired automatically"
            }
            .into(),
        );
        printer.push_block(
            outputs
                .iter()
                .map(|o| format!("Writing solutions to {}", o.display()).into())
                .collect(),
        );
        printer.display();
        display_warnings();

        Ok(CalibrateParams {
            radio,
            chirp,
            session_params,
            initial_solutions,
            steps,
            operator,
            outputs,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), PhasedFmcwError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()
    }
}

impl CalibrateParams {
    fn run(self) -> Result<(), PhasedFmcwError> {
        let CalibrateParams {
            radio,
            chirp,
            session_params,
            initial_solutions,
            steps,
            operator,
            outputs,
        } = self;

        let mut session = RadarSession::new(radio, operator, chirp, session_params)?;
        if let Some(sols) = initial_solutions {
            session.apply_solutions(&sols)?;
        }

        // The receive phases have to be known before the transmit phases can
        // be measured through the receivers.
        if steps.sample_offset {
            session.calibrate_sample_offset()?;
        }
        if steps.rx {
            session.calibrate_phase(CalibrationSide::Receive)?;
        }
        if steps.tx {
            session.calibrate_phase(CalibrationSide::Transmit)?;
        }

        let sols = session.solutions();
        let mut printer = InfoPrinter::new("Calibration solutions".into());
        printer.push_block(vec![
            format!("Sample offset: {}", sols.sample_offset).into(),
            format!("TX phases [deg]: {}", format_degrees(&sols.tx_phases_rad)).into(),
            format!("RX phases [deg]: {}", format_degrees(&sols.rx_phases_rad)).into(),
        ]);
        printer.display();

        for output in outputs {
            sols.write_solutions_from_ext(&output)?;
            info!("Calibration solutions written to {}", output.display());
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum CalibrateArgsError {
    #[error("Every calibration step was turned off; there is nothing to do")]
    NothingToDo,

    #[error("Cannot write calibration solutions to '{}'. Supported formats: {valid}", .file.display())]
    BadOutputExt { file: PathBuf, valid: String },
}
