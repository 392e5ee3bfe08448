// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the command-line interface for calibration.

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use phased_fmcw::CalibrationSolutions;

use crate::*;

#[test]
fn test_calibrate_then_sweep() {
    let tmp_dir = TempDir::new().unwrap();
    let sols_file = tmp_dir.path().join("sols.json");

    #[rustfmt::skip]
    let cmd = phased_fmcw()
        .args([
            "calibrate",
            "--no-progress-bars",
            "--latency", "20",
            "--tx-skew", "0,40,-70,100",
            "--rx-skew", "10,0,-10,-20",
        ])
        .args(SMALL_FRAMES)
        .arg("-o")
        .arg(&sols_file)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Sample offset: 20"), "{stdout}");
    assert!(stdout.contains("Calibration solutions written to"));

    let sols = CalibrationSolutions::read_solutions_from_ext(&sols_file).unwrap();
    assert_eq!(sols.sample_offset, 20);
    let expected_tx = [0.0, -40.0, 70.0, -100.0];
    let expected_rx = [0.0, 10.0, 20.0, 30.0];
    for (&got, expected) in sols.tx_phases_rad.iter().zip(expected_tx) {
        assert_abs_diff_eq!(got.to_degrees(), expected, epsilon = 1.0);
    }
    for (&got, expected) in sols.rx_phases_rad.iter().zip(expected_rx) {
        assert_abs_diff_eq!(got.to_degrees(), expected, epsilon = 1.0);
    }

    // The solutions can be swept with.
    let cmd = phased_fmcw()
        .args(["sweep", "--no-progress-bars", "--start", "0", "--end", "0", "--latency", "20"])
        .args(SMALL_FRAMES)
        .arg("--solutions")
        .arg(&sols_file)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Using calibration solutions from"));
}

#[test]
fn test_calibrate_rejects_unknown_output_formats() {
    let cmd = phased_fmcw()
        .args(["calibrate", "--dry-run", "-o", "sols.yaml"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("sols.yaml"), "{stderr}");
    assert!(stderr.contains("toml, json"), "{stderr}");
}
