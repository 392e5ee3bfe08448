// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::{path::PathBuf, sync::Arc};

use clap::{AppSettings, Parser};
use log::{debug, info, trace};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, ChirpArgs, FrameArgs, InfoPrinter, RadioArgs, Warn, ARG_FILE_HELP,
};
use crate::{
    calibration::CalibrationSolutions,
    chirp::ChirpTemplate,
    constants::{DEFAULT_SWEEP_END_DEG, DEFAULT_SWEEP_START_DEG, DEFAULT_SWEEP_STEP_DEG},
    operator::AutoOperator,
    radio::LoopbackRadio,
    sc16,
    session::{RadarSession, SessionParams},
    sweep::SweepRange,
    PhasedFmcwError,
};

lazy_static::lazy_static! {
    static ref START_HELP: String =
        format!("The first steering angle [degrees]. Default: {DEFAULT_SWEEP_START_DEG}");

    static ref END_HELP: String =
        format!("The last steering angle; it is included if the steps land on it [degrees]. Default: {DEFAULT_SWEEP_END_DEG}");

    static ref STEP_HELP: String =
        format!("The angular step between frames [degrees]. Default: {DEFAULT_SWEEP_STEP_DEG}");
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[clap(setting(AppSettings::AllowNegativeNumbers))]
pub(super) struct SweepArgs {
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

    #[clap(long, help = START_HELP.as_str(), help_heading = "SWEEP")]
    pub(super) start: Option<f64>,

    #[clap(long, help = END_HELP.as_str(), help_heading = "SWEEP")]
    pub(super) end: Option<f64>,

    #[clap(long, help = STEP_HELP.as_str(), help_heading = "SWEEP")]
    pub(super) step: Option<f64>,

    /// Calibration solutions to steer and correct with. If not given, no
    /// calibration is applied.
    #[clap(short, long, parse(from_os_str), help_heading = "SWEEP")]
    pub(super) solutions: Option<PathBuf>,
}

/// Everything needed to run a sweep.
pub(super) struct SweepParams {
    radio: Arc<LoopbackRadio>,
    chirp: ChirpTemplate,
    session_params: SessionParams,
    range: SweepRange,
    solutions: Option<CalibrationSolutions>,
}

impl SweepArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<SweepArgs, PhasedFmcwError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let SweepArgs {
                args_file: _,
                radio_args,
                chirp_args,
                frame_args,
                start,
                end,
                step,
                solutions,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(SweepArgs {
                args_file: None,
                radio_args: cli_args.radio_args.merge(radio_args),
                chirp_args: cli_args.chirp_args.merge(chirp_args),
                frame_args: cli_args.frame_args.merge(frame_args),
                start: cli_args.start.or(start),
                end: cli_args.end.or(end),
                step: cli_args.step.or(step),
                solutions: cli_args.solutions.or(solutions),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<SweepParams, PhasedFmcwError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            radio_args,
            chirp_args,
            frame_args,
            start,
            end,
            step,
            solutions,
        } = self;

        let radio = radio_args.parse()?;
        let chirp = chirp_args.parse()?;
        let session_params = frame_args.parse(radio.config().num_channels);
        let range = SweepRange {
            start_deg: start.unwrap_or(DEFAULT_SWEEP_START_DEG),
            end_deg: end.unwrap_or(DEFAULT_SWEEP_END_DEG),
            step_deg: step.unwrap_or(DEFAULT_SWEEP_STEP_DEG),
        };
        let angles = range.angles()?;
        if angles.is_empty() {
            format!(
                "The sweep starts at {}° but ends at {}°; there is nothing to sweep",
                range.start_deg, range.end_deg
            )
            .warn();
        }

        let solutions = match solutions {
            Some(file) => {
                let sols = CalibrationSolutions::read_solutions_from_ext(&file)?;
                info!("Using calibration solutions from '{}'", file.display());
                Some(sols)
            }
            None => {
                "No calibration solutions were supplied; the beam is steered without calibration"
                    .warn();
                None
            }
        };

        let mut printer = InfoPrinter::new("Sweep".into());
        printer.push_block(vec![
            format!(
                "{} angles from {}° to {}° in {}° steps",
                angles.len(),
                range.start_deg,
                range.end_deg,
                range.step_deg
            )
            .into(),
            format!(
                "{} chirps per frame, scheduled {} s ahead",
                session_params.chirps_per_frame, session_params.lead_time
            )
            .into(),
        ]);
        printer.display();
        display_warnings();

        Ok(SweepParams {
            radio,
            chirp,
            session_params,
            range,
            solutions,
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

impl SweepParams {
    fn run(self) -> Result<(), PhasedFmcwError> {
        let SweepParams {
            radio,
            chirp,
            session_params,
            range,
            solutions,
        } = self;

        let mut session =
            RadarSession::new(radio, Box::new(AutoOperator), chirp, session_params)?;
        if let Some(sols) = solutions {
            session.apply_solutions(&sols)?;
        }

        let mut powers = vec![];
        let report = session.run_sweep(&range, |angle, frame, outcome| {
            let received = outcome.samples_received;
            let power = frame
                .outer_iter()
                .map(|row| mean_power(row.slice(s![..received.min(row.len())])))
                .collect::<Vec<_>>();
            trace!("{angle:+.1}°: mean power per channel {power:.1?}");
            powers.push(power);
        })?;

        let mut printer = InfoPrinter::new("Sweep results".into());
        for ((angle, outcome), power) in report.frames.iter().zip(powers.iter()) {
            let mean = power.iter().sum::<f64>() / power.len().max(1) as f64;
            let mut line = format!(
                "{angle:+7.2}°: sent {}/{}, received {}/{}, mean power {mean:.1}",
                outcome.samples_sent,
                outcome.expected_sent,
                outcome.samples_received,
                outcome.expected_received
            );
            if !outcome.is_complete() {
                line.push_str(" (short)");
            }
            printer.push_line(line.into());
        }
        if !report.failed_angles.is_empty() {
            printer.push_line(format!("Failed angles: {:?}", report.failed_angles).into());
        }
        if report.cancelled {
            printer.push_line("Cancelled".into());
        }
        printer.display();

        Ok(())
    }
}

/// The mean of |s|^2 over `samples`.
fn mean_power(samples: ArrayView1<sc16>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples
        .iter()
        .map(|s| {
            let (re, im) = (f64::from(s.re), f64::from(s.im));
            re * re + im * im
        })
        .sum::<f64>()
        / samples.len() as f64
}
