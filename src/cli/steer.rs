// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Print the phase given to each antenna for beam angles.

use std::path::PathBuf;

use clap::{AppSettings, Parser};
use itertools::Itertools;
use log::info;

use super::common::InfoPrinter;
use crate::{
    calibration::CalibrationSolutions, constants::DEFAULT_NUM_ANTENNAS, math::wrap_degrees,
    steering::BeamSteerer, PhasedFmcwError,
};

/// Print the per-antenna steering phases for one or more beam angles.
#[derive(Parser, Debug)]
#[clap(setting(AppSettings::AllowNegativeNumbers))]
pub struct SteerArgs {
    /// The beam angles [degrees].
    #[clap(name = "ANGLES", required = true)]
    angles: Vec<f64>,

    /// The number of antennas in the array. If solutions are given, this is
    /// taken from them. Default: 4
    #[clap(short = 'n', long)]
    num_antennas: Option<usize>,

    /// Include the transmit calibration phases in these solutions.
    #[clap(short, long, parse(from_os_str))]
    solutions: Option<PathBuf>,

    /// Print phases in (-180°, 180°] rather than as accumulated.
    #[clap(short, long)]
    wrap: bool,
}

impl SteerArgs {
    pub fn run(&self) -> Result<(), PhasedFmcwError> {
        let sols = self
            .solutions
            .as_ref()
            .map(CalibrationSolutions::read_solutions_from_ext)
            .transpose()?;
        let num_antennas = match (&sols, self.num_antennas) {
            (Some(sols), Some(n)) if sols.num_antennas() != n => {
                return Err(PhasedFmcwError::Steer(format!(
                    "Asked for {n} antennas, but the solutions are for {}",
                    sols.num_antennas()
                )))
            }
            (Some(sols), _) => sols.num_antennas(),
            (None, n) => n.unwrap_or(DEFAULT_NUM_ANTENNAS),
        };
        if num_antennas == 0 {
            return Err(PhasedFmcwError::Steer(
                "The array needs at least one antenna".to_string(),
            ));
        }

        let mut steerer = BeamSteerer::new(num_antennas);
        if let Some(sols) = &sols {
            steerer.apply_calibrations(&sols.tx_phases_rad);
        }

        let mut printer = InfoPrinter::new(
            format!("Steering phases for {num_antennas} antennas [degrees]").into(),
        );
        for &angle in &self.angles {
            let phases = steerer.steering_phases_deg(angle);
            let phases = phases
                .into_iter()
                .map(|p| if self.wrap { wrap_degrees(p) } else { p })
                .map(|p| format!("{p:8.3}"))
                .join(" ");
            printer.push_line(format!("{angle:+7.2}°: {phases}").into());
        }
        printer.display();
        if sols.is_none() {
            info!("No calibration included");
        }

        Ok(())
    }
}
