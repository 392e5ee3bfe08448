// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Here, we abstract many aspects
//! of `phased-fmcw`, e.g. the `sweep` and `calibrate` subcommands both need a
//! radio, a chirp and a frame layout, so those arguments are shared between
//! them.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{str::FromStr, sync::Arc};

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    chirp::{ChirpError, ChirpParams, ChirpTemplate},
    constants::{
        DEFAULT_CHIRPS_PER_FRAME, DEFAULT_CHIRP_BITS, DEFAULT_CHIRP_DURATION,
        DEFAULT_CHIRP_MAX_FREQ, DEFAULT_CHIRP_SAMPLE_RATE, DEFAULT_NUM_ANTENNAS,
        DEFAULT_RX_RATE, DEFAULT_SCHEDULE_LEAD_TIME, DEFAULT_TX_RATE,
        SAMPLE_OFFSET_SEARCH_MARGIN,
    },
    radio::{LoopbackConfig, LoopbackPath, LoopbackRadio, Radio, RadioError},
    session::SessionParams,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref NUM_ANTENNAS_HELP: String =
        format!("The number of antennas in the array (and channels on the radio). Default: {DEFAULT_NUM_ANTENNAS}");

    static ref TX_RATE_HELP: String =
        format!("The transmit sample rate [samples/s]. Default: {DEFAULT_TX_RATE}");

    static ref RX_RATE_HELP: String =
        format!("The receive sample rate [samples/s]. If this is lower than the transmit rate, captures are decimated. Default: {DEFAULT_RX_RATE}");

    static ref LOOPBACK_PATH_HELP: String =
        format!("How the transmitters are wired to the receivers when the run starts. Supported paths: {}. Default: {}",
                LoopbackPath::iter().join(", "), LoopbackPath::Direct);

    static ref CHIRP_SAMPLE_RATE_HELP: String =
        format!("The sample rate the chirp waveform is defined at [samples/s]. Default: {DEFAULT_CHIRP_SAMPLE_RATE}");

    static ref CHIRP_MAX_FREQ_HELP: String =
        format!("The frequency reached at the end of the chirp [Hz]. Default: {DEFAULT_CHIRP_MAX_FREQ}");

    static ref CHIRP_DURATION_HELP: String =
        format!("The duration of a single chirp [seconds]. Default: {DEFAULT_CHIRP_DURATION}");

    static ref CHIRP_BITS_HELP: String =
        format!("The bit resolution used to scale chirp samples. Default: {DEFAULT_CHIRP_BITS}");

    static ref CHIRPS_PER_FRAME_HELP: String =
        format!("How many times the chirp is repeated in a frame. Default: {DEFAULT_CHIRPS_PER_FRAME}");

    static ref LEAD_TIME_HELP: String =
        format!("How far in the future each frame is scheduled [seconds]. Default: {DEFAULT_SCHEDULE_LEAD_TIME}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PhasedFmcwError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PhasedFmcwError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(PhasedFmcwError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Arguments describing the radio. Only the software loopback radio can be
/// driven from the command line; its latency, skews and transfer limits
/// stand in for real hardware.
#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct RadioArgs {
    #[clap(short = 'n', long, help = NUM_ANTENNAS_HELP.as_str(), help_heading = "RADIO")]
    pub(super) num_antennas: Option<usize>,

    #[clap(long, help = TX_RATE_HELP.as_str(), help_heading = "RADIO")]
    pub(super) tx_rate: Option<f64>,

    #[clap(long, help = RX_RATE_HELP.as_str(), help_heading = "RADIO")]
    pub(super) rx_rate: Option<f64>,

    /// The number of silent samples that precede a transmitted burst in a
    /// capture. Default: 0
    #[clap(long, help_heading = "RADIO")]
    pub(super) latency: Option<usize>,

    /// The phase each transmitter adds to its signal, one value per antenna,
    /// comma separated [degrees]. Default: all 0
    #[clap(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        help_heading = "RADIO"
    )]
    pub(super) tx_skew: Option<Vec<f64>>,

    /// The phase each receiver adds to its signal, one value per antenna,
    /// comma separated [degrees]. Default: all 0
    #[clap(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        help_heading = "RADIO"
    )]
    pub(super) rx_skew: Option<Vec<f64>>,

    #[clap(long, help = LOOPBACK_PATH_HELP.as_str(), help_heading = "RADIO")]
    pub(super) loopback_path: Option<String>,

    /// Send no more than this many samples per channel in a frame. Use this to
    /// see how short frames are handled.
    #[clap(long, help_heading = "RADIO")]
    pub(super) max_tx_samples: Option<usize>,

    /// Receive no more than this many samples per channel in a frame.
    #[clap(long, help_heading = "RADIO")]
    pub(super) max_rx_samples: Option<usize>,
}

impl RadioArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        RadioArgs {
            num_antennas: self.num_antennas.or(other.num_antennas),
            tx_rate: self.tx_rate.or(other.tx_rate),
            rx_rate: self.rx_rate.or(other.rx_rate),
            latency: self.latency.or(other.latency),
            tx_skew: self.tx_skew.or(other.tx_skew),
            rx_skew: self.rx_skew.or(other.rx_skew),
            loopback_path: self.loopback_path.or(other.loopback_path),
            max_tx_samples: self.max_tx_samples.or(other.max_tx_samples),
            max_rx_samples: self.max_rx_samples.or(other.max_rx_samples),
        }
    }

    pub(super) fn parse(self) -> Result<Arc<LoopbackRadio>, RadioArgsError> {
        let RadioArgs {
            num_antennas,
            tx_rate,
            rx_rate,
            latency,
            tx_skew,
            rx_skew,
            loopback_path,
            max_tx_samples,
            max_rx_samples,
        } = self;

        let num_antennas = num_antennas.unwrap_or(DEFAULT_NUM_ANTENNAS);
        let mut config = LoopbackConfig::new(num_antennas);
        config.tx_rate = tx_rate.unwrap_or(DEFAULT_TX_RATE);
        config.rx_rate = rx_rate.unwrap_or(DEFAULT_RX_RATE);
        config.latency_samples = latency.unwrap_or(0);
        if let Some(skew) = tx_skew {
            config.tx_skew_rad = skew.into_iter().map(f64::to_radians).collect();
        }
        if let Some(skew) = rx_skew {
            config.rx_skew_rad = skew.into_iter().map(f64::to_radians).collect();
        }
        if let Some(path) = loopback_path {
            config.path = LoopbackPath::from_str(&path.to_lowercase()).map_err(|_| {
                RadioArgsError::InvalidPath {
                    got: path,
                    valid: LoopbackPath::iter().join(", "),
                }
            })?;
        }
        config.max_tx_samples = max_tx_samples;
        config.max_rx_samples = max_rx_samples;

        let radio = LoopbackRadio::new(config)?;
        let ratio = radio.tx_rate() / radio.rx_rate();
        if (ratio - ratio.round()).abs() > 1e-9 || ratio < 1.0 {
            format!(
                "The transmit rate isn't an integer multiple of the receive rate; captures are decimated by {}",
                radio.decimation()
            )
            .warn();
        }
        if radio.config().latency_samples > SAMPLE_OFFSET_SEARCH_MARGIN {
            format!(
                "The latency ({} samples) is longer than the sample offset search margin ({SAMPLE_OFFSET_SEARCH_MARGIN} samples); sample offset calibration won't find it",
                radio.config().latency_samples
            )
            .warn();
        }

        let config = radio.config();
        let mut printer = InfoPrinter::new("Radio".into());
        printer.push_block(vec![
            format!(
                "Software loopback with {} channels ({} path)",
                config.num_channels,
                radio.path()
            )
            .into(),
            format!(
                "TX {} samples/s, RX {} samples/s (decimation {})",
                config.tx_rate,
                config.rx_rate,
                radio.decimation()
            )
            .into(),
        ]);
        printer.push_block(vec![
            format!("Latency: {} samples", config.latency_samples).into(),
            format!("TX skew [deg]: {}", format_degrees(&config.tx_skew_rad)).into(),
            format!("RX skew [deg]: {}", format_degrees(&config.rx_skew_rad)).into(),
        ]);
        if config.max_tx_samples.is_some() || config.max_rx_samples.is_some() {
            let limit = |l: Option<usize>| l.map_or("none".to_string(), |l| l.to_string());
            printer.push_line(
                format!(
                    "Transfer limits: TX {}, RX {}",
                    limit(config.max_tx_samples),
                    limit(config.max_rx_samples)
                )
                .into(),
            );
        }
        printer.display();

        Ok(Arc::new(radio))
    }
}

#[derive(Error, Debug)]
pub(super) enum RadioArgsError {
    #[error("'{got}' is not a loopback path. Supported paths: {valid}")]
    InvalidPath { got: String, valid: String },

    #[error(transparent)]
    Radio(#[from] RadioError),
}

/// Arguments describing the chirp waveform.
#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct ChirpArgs {
    #[clap(long, help = CHIRP_SAMPLE_RATE_HELP.as_str(), help_heading = "CHIRP")]
    pub(super) chirp_sample_rate: Option<f64>,

    #[clap(long, help = CHIRP_MAX_FREQ_HELP.as_str(), help_heading = "CHIRP")]
    pub(super) chirp_max_freq: Option<f64>,

    #[clap(long, help = CHIRP_DURATION_HELP.as_str(), help_heading = "CHIRP")]
    pub(super) chirp_duration: Option<f64>,

    #[clap(long, help = CHIRP_BITS_HELP.as_str(), help_heading = "CHIRP")]
    pub(super) chirp_bits: Option<u32>,

    /// Don't offset chirp samples to be non-negative; the chirp is centred on
    /// zero instead.
    #[clap(long, help_heading = "CHIRP")]
    #[serde(default)]
    pub(super) centred_chirp: bool,
}

impl ChirpArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        ChirpArgs {
            chirp_sample_rate: self.chirp_sample_rate.or(other.chirp_sample_rate),
            chirp_max_freq: self.chirp_max_freq.or(other.chirp_max_freq),
            chirp_duration: self.chirp_duration.or(other.chirp_duration),
            chirp_bits: self.chirp_bits.or(other.chirp_bits),
            centred_chirp: self.centred_chirp || other.centred_chirp,
        }
    }

    pub(super) fn parse(self) -> Result<ChirpTemplate, ChirpError> {
        let defaults = ChirpParams::default();
        let params = ChirpParams {
            sample_rate: self.chirp_sample_rate.unwrap_or(defaults.sample_rate),
            max_freq: self.chirp_max_freq.unwrap_or(defaults.max_freq),
            duration: self.chirp_duration.unwrap_or(defaults.duration),
            bits: self.chirp_bits.unwrap_or(defaults.bits),
            centred: self.centred_chirp,
        };
        debug!("{params:?}");
        let chirp = ChirpTemplate::linear(&params)?;

        let mut printer = InfoPrinter::new("Chirp".into());
        printer.push_block(vec![
            format!(
                "{} samples ({} s at {} samples/s)",
                chirp.len(),
                params.duration,
                params.sample_rate
            )
            .into(),
            format!(
                "Sweeps to {} Hz, {}-bit scale{}",
                params.max_freq,
                params.bits,
                if params.centred { ", centred" } else { "" }
            )
            .into(),
        ]);
        printer.display();

        Ok(chirp)
    }
}

/// Arguments describing how chirps are laid out in a frame.
#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct FrameArgs {
    #[clap(long, help = CHIRPS_PER_FRAME_HELP.as_str(), help_heading = "FRAME")]
    pub(super) chirps_per_frame: Option<usize>,

    /// The number of transmit samples given to each chirp. Anything beyond
    /// the chirp is silent. Default: the chirp's length
    #[clap(long, help_heading = "FRAME")]
    pub(super) chirp_stride: Option<usize>,

    #[clap(long, help = LEAD_TIME_HELP.as_str(), help_heading = "FRAME")]
    pub(super) lead_time: Option<f64>,
}

impl FrameArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        FrameArgs {
            chirps_per_frame: self.chirps_per_frame.or(other.chirps_per_frame),
            chirp_stride: self.chirp_stride.or(other.chirp_stride),
            lead_time: self.lead_time.or(other.lead_time),
        }
    }

    pub(super) fn parse(self, num_antennas: usize) -> SessionParams {
        let defaults = SessionParams::default();
        SessionParams {
            num_antennas,
            chirps_per_frame: self.chirps_per_frame.unwrap_or(defaults.chirps_per_frame),
            chirp_stride: self.chirp_stride,
            lead_time: self.lead_time.unwrap_or(defaults.lead_time),
        }
    }
}

/// Format radians as a list of degrees.
pub(super) fn format_degrees(phases_rad: &[f64]) -> String {
    format!(
        "[{}]",
        phases_rad
            .iter()
            .map(|p| format!("{:.2}", p.to_degrees()))
            .join(", ")
    )
}
