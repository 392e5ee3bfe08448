// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing calibration solutions.
//!
//! Solutions are the transmit and receive phase vectors (one value per
//! antenna, radians) and the sample offset. They are stored as TOML or JSON;
//! the format is chosen from the file's extension.

use std::{fs::File, io::Write, path::Path, str::FromStr};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::{SolutionsReadError, SolutionsWriteError};
use crate::PhasedFmcwError;

lazy_static::lazy_static! {
    pub(crate) static ref SOLUTION_EXTENSIONS: String = CalSolutionType::iter().join(", ");
}

#[derive(Debug, Display, EnumIter, EnumString)]
enum CalSolutionType {
    #[strum(serialize = "toml")]
    Toml,

    #[strum(serialize = "json")]
    Json,
}

/// Can calibration solutions be written to `file`? Only the extension is
/// checked.
pub(crate) fn is_solutions_file(file: &Path) -> bool {
    file.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| CalSolutionType::from_str(e).ok())
        .is_some()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSolutions {
    /// The transmit calibration phase of each antenna \[radians\]. The first
    /// antenna is the reference and should be 0.
    pub tx_phases_rad: Vec<f64>,

    /// The receive calibration phase of each antenna \[radians\].
    pub rx_phases_rad: Vec<f64>,

    /// The number of samples to skip at the start of every capture.
    pub sample_offset: usize,

    /// The number of antennas these solutions were made for. Optional as it
    /// can be inferred from the phase vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_antennas: Option<usize>,

    /// When these solutions were made (RFC 3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl CalibrationSolutions {
    /// Solutions that do nothing: zero phases and no sample offset.
    pub fn identity(num_antennas: usize) -> CalibrationSolutions {
        CalibrationSolutions {
            tx_phases_rad: vec![0.0; num_antennas],
            rx_phases_rad: vec![0.0; num_antennas],
            sample_offset: 0,
            num_antennas: Some(num_antennas),
            created: None,
        }
    }

    /// The number of antennas, taken from the transmit phases.
    pub fn num_antennas(&self) -> usize {
        self.tx_phases_rad.len()
    }

    /// Read in calibration solutions from a file. The format of the file is
    /// determined by the file's extension (e.g. ".toml").
    pub fn read_solutions_from_ext<P: AsRef<Path>>(
        file: P,
    ) -> Result<CalibrationSolutions, PhasedFmcwError> {
        Self::read_solutions_from_ext_inner(file.as_ref()).map_err(PhasedFmcwError::from)
    }

    pub(crate) fn read_solutions_from_ext_inner(
        file: &Path,
    ) -> Result<CalibrationSolutions, SolutionsReadError> {
        let ext = file.extension().and_then(|e| e.to_str());
        let sols: CalibrationSolutions = match ext.and_then(|s| CalSolutionType::from_str(s).ok())
        {
            Some(CalSolutionType::Toml) => {
                let contents = std::fs::read_to_string(file)?;
                toml::from_str(&contents)?
            }
            Some(CalSolutionType::Json) => {
                let f = File::open(file)?;
                serde_json::from_reader(f)?
            }
            None => {
                return Err(SolutionsReadError::UnsupportedExt {
                    ext: ext.unwrap_or("<no extension>").to_string(),
                })
            }
        };
        debug!("Read calibration solutions from '{}'", file.display());
        sols.validate()?;
        Ok(sols)
    }

    /// From the target file extension, write out the appropriately-formatted
    /// solutions.
    pub fn write_solutions_from_ext<P: AsRef<Path>>(&self, file: P) -> Result<(), PhasedFmcwError> {
        self.write_solutions_from_ext_inner(file.as_ref())
            .map_err(PhasedFmcwError::from)
    }

    pub(crate) fn write_solutions_from_ext_inner(
        &self,
        file: &Path,
    ) -> Result<(), SolutionsWriteError> {
        let ext = file.extension().and_then(|e| e.to_str());
        let contents = match ext.and_then(|s| CalSolutionType::from_str(s).ok()) {
            Some(CalSolutionType::Toml) => toml::to_string_pretty(self)?,
            Some(CalSolutionType::Json) => serde_json::to_string_pretty(self)?,
            None => {
                return Err(SolutionsWriteError::UnsupportedExt {
                    ext: ext.unwrap_or("<no extension>").to_string(),
                })
            }
        };
        let mut f = File::create(file)?;
        f.write_all(contents.as_bytes())?;
        debug!("Wrote calibration solutions to '{}'", file.display());
        Ok(())
    }

    fn validate(&self) -> Result<(), SolutionsReadError> {
        let num_antennas = self.num_antennas.unwrap_or(self.tx_phases_rad.len());
        for (thing, v) in [
            ("transmit phases", &self.tx_phases_rad),
            ("receive phases", &self.rx_phases_rad),
        ] {
            if v.len() != num_antennas {
                return Err(SolutionsReadError::BadShape {
                    thing,
                    expected: num_antennas,
                    actual: v.len(),
                });
            }
            if v.iter().any(|p| !p.is_finite()) {
                return Err(SolutionsReadError::NonFinite { thing });
            }
        }
        Ok(())
    }
}
