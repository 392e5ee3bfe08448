// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the command-line interface for steering phases.

use std::io::Write;

use indoc::indoc;
use tempfile::TempDir;

use crate::*;

#[test]
fn test_steer_prints_phases() {
    let cmd = phased_fmcw()
        .args(["steer", "-n", "3", "30", "-30", "0"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "{stderr}");
    assert!(stdout.contains("Steering phases for 3 antennas"));
    // At 30°, each antenna is 90° behind the last.
    assert!(stdout.contains("+30.00°:    0.000  -90.000 -180.000"), "{stdout}");
    assert!(stdout.contains("-30.00°:    0.000   90.000  180.000"), "{stdout}");
    assert!(stdout.contains("No calibration included"));
}

#[test]
fn test_steer_wraps_phases() {
    let cmd = phased_fmcw()
        .args(["steer", "-n", "4", "--wrap", "-30"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    // 270° wraps to -90°.
    let line = stdout
        .lines()
        .find(|l| l.contains("-30.00°:"))
        .expect("a line for -30°");
    assert!(line.contains("-30.00°:    0.000   90.000"), "{line}");
    assert!(line.ends_with("-90.000"), "{line}");
    assert!(!stdout.contains("270.000"));
}

#[test]
fn test_steer_includes_calibration() {
    let tmp_dir = TempDir::new().unwrap();
    let (sols, mut f) = make_file_in_dir("sols.toml", tmp_dir.path());
    f.write_all(
        indoc! {r#"
            tx_phases_rad = [0.0, 1.5707963267948966]
            rx_phases_rad = [0.0, 0.0]
            sample_offset = 0
        "#}
        .as_bytes(),
    )
    .unwrap();
    drop(f);

    let cmd = phased_fmcw()
        .args(["steer", "0", "--solutions"])
        .arg(&sols)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("Steering phases for 2 antennas"));
    assert!(stdout.contains("+0.00°:    0.000   90.000"), "{stdout}");

    // The antenna count must agree with the solutions.
    let cmd = phased_fmcw()
        .args(["steer", "0", "-n", "3", "--solutions"])
        .arg(&sols)
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("solutions are for 2"), "{stderr}");
}
