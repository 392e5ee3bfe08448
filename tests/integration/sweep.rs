// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the command-line interface for sweeping.

use std::io::Write;

use indoc::indoc;
use tempfile::TempDir;

use crate::*;

#[test]
fn test_sweep_reports_every_angle() {
    let cmd = phased_fmcw()
        .args(["sweep", "--no-progress-bars", "--start", "-20", "--end", "20", "--step", "10"])
        .args(SMALL_FRAMES)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "{stderr}");
    for angle in ["-20.00°", "-10.00°", "+0.00°", "+10.00°", "+20.00°"] {
        assert!(stdout.contains(angle), "{angle} missing from\n{stdout}");
    }
    assert!(!stdout.contains("(short)"));
    assert!(stdout.contains("phased-fmcw sweep complete."));
}

#[test]
fn test_short_frames_are_not_fatal() {
    let cmd = phased_fmcw()
        .args(["sweep", "--no-progress-bars", "--start", "0", "--end", "0"])
        .args(SMALL_FRAMES)
        .args(["--max-tx-samples", "100"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("sent 100/400"), "{stdout}");
    assert!(stdout.contains("(short)"));
}

#[test]
fn test_sweep_dry_run_with_args_file() {
    let tmp_dir = TempDir::new().unwrap();
    let (args_file, mut f) = make_file_in_dir("sweep.toml", tmp_dir.path());
    f.write_all(
        indoc! {r#"
            start = -45.0
            end = 45.0
            step = 15.0

            [radio]
            num_antennas = 8
        "#}
        .as_bytes(),
    )
    .unwrap();
    drop(f);

    let cmd = phased_fmcw()
        .args(["sweep", "--dry-run"])
        .arg(&args_file)
        .args(["--step", "45"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("3 angles from -45° to 45° in 45° steps"), "{stdout}");
    assert!(stdout.contains("8 channels"));
    assert!(stdout.contains("Dry run -- exiting now."));
}

#[test]
fn test_save_toml_reproduces_the_run() {
    let tmp_dir = TempDir::new().unwrap();
    let saved = tmp_dir.path().join("saved.toml");
    let cmd = phased_fmcw()
        .args(["sweep", "--dry-run", "--start", "-5", "--latency", "3", "--save-toml"])
        .arg(&saved)
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let contents = std::fs::read_to_string(&saved).unwrap();
    assert!(contents.contains("start = -5.0"), "{contents}");
    assert!(contents.contains("latency = 3"), "{contents}");

    // The saved file is itself a valid arguments file.
    let cmd = phased_fmcw().args(["sweep", "--dry-run"]).arg(&saved).ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
}

#[test]
fn test_bad_arguments_are_reported() {
    let cmd = phased_fmcw()
        .args(["sweep", "--dry-run", "--step", "-1"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("step must be positive"), "{stderr}");

    let cmd = phased_fmcw()
        .args(["sweep", "--dry-run", "--chirp-bits", "1"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("bit resolution"), "{stderr}");
}
