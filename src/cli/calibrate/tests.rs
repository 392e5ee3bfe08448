// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{io::Write, path::PathBuf};

use approx::assert_abs_diff_eq;
use clap::Parser;
use indoc::indoc;
use tempfile::TempDir;

use super::{CalibrateArgs, DEFAULT_OUTPUT_SOLUTIONS_FILENAME};
use crate::{calibration::CalibrationSolutions, PhasedFmcwError};

fn calibrate_args(extra: &[&str]) -> CalibrateArgs {
    #[rustfmt::skip]
    let mut args = vec![
        "calibrate",
        "--num-antennas", "4",
        "--chirp-duration", "2e-4",
        "--chirps-per-frame", "1",
        "--lead-time", "0",
    ];
    args.extend(extra);
    CalibrateArgs::parse_from(args)
}

#[test]
fn calibration_recovers_skews() {
    let tmp_dir = TempDir::new().unwrap();
    let output = tmp_dir.path().join("sols.toml");
    let output_str = output.display().to_string();
    #[rustfmt::skip]
    let args = calibrate_args(&[
        "--latency", "37",
        "--tx-skew", "0,10,-20,30",
        "--rx-skew", "5,-15,25,0",
        "--outputs", &output_str,
    ]);
    args.run(false).unwrap();

    let sols = CalibrationSolutions::read_solutions_from_ext(&output).unwrap();
    assert_eq!(sols.sample_offset, 37);
    assert_eq!(sols.num_antennas, Some(4));
    assert!(sols.created.is_some());
    // Each stored phase cancels the skew relative to the first antenna.
    let expected_tx = [0.0, -10.0, 20.0, -30.0];
    let expected_rx = [0.0, 20.0, -20.0, 5.0];
    for (&got, expected) in sols.tx_phases_rad.iter().zip(expected_tx) {
        assert_abs_diff_eq!(got.to_degrees(), expected, epsilon = 1.0);
    }
    for (&got, expected) in sols.rx_phases_rad.iter().zip(expected_rx) {
        assert_abs_diff_eq!(got.to_degrees(), expected, epsilon = 1.0);
    }
}

#[test]
fn skipped_steps_are_carried_over() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("in.json");
    let output = tmp_dir.path().join("out.json");
    let mut sols = CalibrationSolutions::identity(4);
    sols.sample_offset = 11;
    sols.rx_phases_rad = vec![0.0, 0.1, 0.2, 0.3];
    sols.write_solutions_from_ext(&input).unwrap();

    let input_str = input.display().to_string();
    let output_str = output.display().to_string();
    #[rustfmt::skip]
    let args = calibrate_args(&[
        "--no-sample-offset",
        "--no-rx",
        "--solutions", &input_str,
        "-o", &output_str,
    ]);
    args.run(false).unwrap();

    let new_sols = CalibrationSolutions::read_solutions_from_ext(&output).unwrap();
    assert_eq!(new_sols.sample_offset, 11);
    assert_eq!(new_sols.rx_phases_rad, sols.rx_phases_rad);
    // No skews, so the transmit phases only undo the applied receive
    // correction.
    assert_eq!(new_sols.tx_phases_rad.len(), 4);
    assert_abs_diff_eq!(new_sols.tx_phases_rad[0], 0.0);
}

#[test]
fn nothing_to_do_is_an_error() {
    let args = calibrate_args(&["--no-sample-offset", "--no-rx", "--no-tx"]);
    let result = args.run(true);
    assert!(matches!(result, Err(PhasedFmcwError::Calibrate(_))));
}

#[test]
fn bad_output_extension_is_an_error() {
    let args = calibrate_args(&["-o", "solutions.fits"]);
    let result = args.run(true);
    assert!(matches!(result, Err(PhasedFmcwError::Solutions(_))));
}

#[test]
fn dry_run_writes_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let output = tmp_dir.path().join("sols.toml");
    let output_str = output.display().to_string();
    let args = calibrate_args(&["-o", &output_str]);
    args.run(true).unwrap();
    assert!(!output.exists());
}

#[test]
fn unusable_operator_timeouts_fall_back_to_the_default() {
    for timeout in ["0", "-5", "1e300"] {
        let args = calibrate_args(&["--interactive", "--operator-timeout", timeout]);
        args.run(true).unwrap();
    }
}

#[test]
fn default_output_is_toml() {
    let args = calibrate_args(&[]);
    assert!(args.outputs.is_none());
    assert!(DEFAULT_OUTPUT_SOLUTIONS_FILENAME.ends_with(".toml"));
}

#[test]
fn args_file_booleans_are_merged() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(
        indoc! {r#"
            no_tx = true
            outputs = ["a.json", "b.toml"]

            [radio]
            latency = 5
        "#}
        .as_bytes(),
    )
    .unwrap();
    let path = file.path().display().to_string();

    let args = CalibrateArgs::parse_from(["calibrate", &path, "--no-rx", "--latency", "9"])
        .merge()
        .unwrap();
    assert!(args.no_rx);
    assert!(args.no_tx);
    assert!(!args.no_sample_offset);
    assert!(!args.interactive);
    assert_eq!(args.radio_args.latency, Some(9));
    assert_eq!(
        args.outputs,
        Some(vec![PathBuf::from("a.json"), PathBuf::from("b.toml")])
    );
}
