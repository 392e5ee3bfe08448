// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;
use crate::{calibration::estimate_phase_offsets, chirp::ChirpTemplate, constants::PI};

fn tones(num_channels: usize) -> Array2<sc16> {
    let tone = ChirpTemplate::tone(512, 3, 12000.0).unwrap().to_sc16();
    Array2::from_shape_fn((num_channels, tone.len()), |(_, i)| tone[i])
}

#[test]
fn test_zero_phase_is_untouched() {
    // Odd values that would be disturbed by a round trip through floats.
    let mut buffer = array![[sc16::new(1, -1), sc16::new(32767, -32768)]];
    let before = buffer.clone();
    apply_phase_correction(buffer.view_mut(), &[0.0]).unwrap();
    assert_eq!(buffer, before);
}

#[test]
fn test_quarter_turn() {
    let mut buffer = array![
        [sc16::new(100, 0), sc16::new(0, 100)],
        [sc16::new(100, 0), sc16::new(0, 100)]
    ];
    apply_phase_correction(buffer.view_mut(), &[0.0, PI / 2.0]).unwrap();
    assert_eq!(
        buffer,
        array![
            [sc16::new(100, 0), sc16::new(0, 100)],
            [sc16::new(0, 100), sc16::new(-100, 0)]
        ]
    );
}

#[test]
fn test_rotation_mixes_i_and_q() {
    let mut buffer = array![[sc16::new(1000, 0)]];
    apply_phase_correction(buffer.view_mut(), &[PI / 4.0]).unwrap();
    assert_eq!(buffer[(0, 0)], sc16::new(707, 707));
}

#[test]
fn test_correction_is_recoverable_by_estimation() {
    let phases = [0.0, 0.4, -2.2, 1.7];
    let mut buffer = tones(4);
    apply_phase_correction(buffer.view_mut(), &phases).unwrap();
    let estimated = estimate_phase_offsets(buffer.view(), 512, 0).unwrap();
    for (p, e) in phases.iter().zip(estimated) {
        assert_abs_diff_eq!(-e, *p, epsilon = 1e-3);
    }
}

#[test]
fn test_estimate_then_correct_aligns_channels() {
    let skew = [0.0, 1.1, -0.7];
    let mut buffer = tones(3);
    apply_phase_correction(buffer.view_mut(), &skew).unwrap();

    let cal = estimate_phase_offsets(buffer.view(), 512, 0).unwrap();
    apply_phase_correction(buffer.view_mut(), &cal).unwrap();
    let residual = estimate_phase_offsets(buffer.view(), 512, 0).unwrap();
    for r in residual {
        assert_abs_diff_eq!(r, 0.0, epsilon = 1e-3);
    }
}

#[test]
fn test_wrong_channel_count() {
    let mut buffer = tones(3);
    let before = buffer.clone();
    assert_eq!(
        apply_phase_correction(buffer.view_mut(), &[0.1, 0.2]),
        Err(CorrectionError::ChannelCountMismatch {
            channels: 3,
            phases: 2
        })
    );
    assert_eq!(buffer, before);
}
