// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::time::Duration;

use ndarray::prelude::*;

use super::*;
use crate::{
    constants::{MAX_SWEEP_ANGLES, PI},
    correction::CorrectionError,
    radio::{DeviceTime, LoopbackConfig, LoopbackRadio, RadioError},
};

fn radio(config: LoopbackConfig) -> Arc<LoopbackRadio> {
    Arc::new(
        LoopbackRadio::new(LoopbackConfig {
            receive_timeout: Duration::from_millis(200),
            ..config
        })
        .unwrap(),
    )
}

fn chirp() -> ChirpTemplate {
    ChirpTemplate::tone(16, 2, 8000.0).unwrap()
}

fn range(start_deg: f64, end_deg: f64, step_deg: f64) -> SweepRange {
    SweepRange {
        start_deg,
        end_deg,
        step_deg,
    }
}

#[test]
fn test_angles() {
    let angles = SweepRange::default().angles().unwrap();
    assert_eq!(angles.len(), 25);
    assert_eq!(angles[0], -60.0);
    assert_eq!(angles[12], 0.0);
    assert_eq!(angles[24], 60.0);

    assert_eq!(range(0.0, 10.0, 3.0).angles().unwrap(), [0.0, 3.0, 6.0, 9.0]);
    assert_eq!(range(-0.3, 0.3, 0.1).angles().unwrap().len(), 7);
    assert_eq!(range(5.0, 5.0, 1.0).angles().unwrap(), [5.0]);
    assert!(range(10.0, -10.0, 5.0).angles().unwrap().is_empty());
}

#[test]
fn test_bad_ranges() {
    assert_eq!(range(0.0, 10.0, 0.0).angles(), Err(SweepError::BadStep(0.0)));
    assert_eq!(range(0.0, 10.0, -1.0).angles(), Err(SweepError::BadStep(-1.0)));
    assert!(matches!(
        range(0.0, f64::INFINITY, 1.0).angles(),
        Err(SweepError::BadRange { .. })
    ));
    // Tiny steps would need an absurd number of angles.
    for step in [1e-300, 1e-9, f64::MIN_POSITIVE] {
        assert!(matches!(
            range(-60.0, 60.0, step).angles(),
            Err(SweepError::TooManyAngles { .. })
        ));
    }
    assert!(matches!(
        range(-f64::MAX, f64::MAX, 1.0).angles(),
        Err(SweepError::TooManyAngles { .. })
    ));
    assert_eq!(
        range(0.0, (MAX_SWEEP_ANGLES - 1) as f64, 1.0)
            .angles()
            .unwrap()
            .len(),
        MAX_SWEEP_ANGLES
    );
}

#[test]
fn test_sweep_visits_every_angle() {
    let radio = radio(LoopbackConfig::new(4));
    let steerer = BeamSteerer::new(4);
    let chirp = chirp();
    let mut controller = SweepController::new(radio.clone(), 16, 2).with_lead_time(0.0);
    let handle = controller.handle();

    let mut seen = vec![];
    let report = controller
        .run(
            &range(-10.0, 10.0, 10.0),
            &steerer,
            &chirp,
            &[0.0; 4],
            0,
            |angle, frame, outcome| {
                assert_eq!(handle.state(), SweepState::PhaseCorrecting(angle));
                assert_eq!(frame.dim(), (4, 32));
                assert!(outcome.is_complete());
                seen.push(angle);
            },
        )
        .unwrap();

    assert_eq!(seen, [-10.0, 0.0, 10.0]);
    assert_eq!(report.frames.len(), 3);
    assert!(report.failed_angles.is_empty());
    assert!(!report.cancelled);
    assert_eq!(report.num_short_frames(), 0);
    assert_eq!(controller.state(), SweepState::Idle);
}

#[test]
fn test_frames_carry_the_steered_chirp() {
    let radio = radio(LoopbackConfig::new(2));
    let steerer = BeamSteerer::new(2);
    let chirp = chirp();
    let expected = steerer.steered(30.0, &chirp);
    let mut controller = SweepController::new(radio.clone(), 16, 3).with_lead_time(0.0);
    controller
        .run(
            &range(30.0, 30.0, 1.0),
            &steerer,
            &chirp,
            &[0.0; 2],
            0,
            |_, frame, _| {
                for c in 0..3 {
                    assert_eq!(frame.slice(s![.., c * 16..(c + 1) * 16]), expected);
                }
            },
        )
        .unwrap();
}

#[test]
fn test_receive_skew_is_corrected() {
    let radio = radio(LoopbackConfig {
        rx_skew_rad: vec![0.0, 0.5],
        ..LoopbackConfig::new(2)
    });
    let steerer = BeamSteerer::new(2);
    let chirp = chirp();
    let mut controller = SweepController::new(radio.clone(), 16, 1).with_lead_time(0.0);
    controller
        .run(
            &range(0.0, 0.0, 1.0),
            &steerer,
            &chirp,
            &[0.0, -0.5],
            0,
            |_, frame, _| {
                for (a, b) in frame.row(0).iter().zip(frame.row(1).iter()) {
                    assert!((a.re - b.re).abs() <= 1);
                    assert!((a.im - b.im).abs() <= 1);
                }
            },
        )
        .unwrap();
}

#[test]
fn test_steering_failures_are_isolated() {
    let radio = radio(LoopbackConfig::new(2));
    let steerer = BeamSteerer::new(2);
    // The chirp doesn't fit in the chirp slot, so every angle fails to steer.
    let chirp = chirp();
    let mut controller = SweepController::new(radio.clone(), 8, 2).with_lead_time(0.0);
    let mut consumed = 0;
    let report = controller
        .run(
            &range(-5.0, 5.0, 5.0),
            &steerer,
            &chirp,
            &[0.0; 2],
            0,
            |_, _, _| consumed += 1,
        )
        .unwrap();
    assert_eq!(consumed, 0);
    assert_eq!(report.failed_angles, [-5.0, 0.0, 5.0]);
    assert!(report.frames.is_empty());
    assert_eq!(controller.state(), SweepState::Idle);
}

#[test]
fn test_short_frames_do_not_stop_the_sweep() {
    let radio = radio(LoopbackConfig {
        max_rx_samples: Some(10),
        ..LoopbackConfig::new(2)
    });
    let steerer = BeamSteerer::new(2);
    let chirp = chirp();
    let mut controller = SweepController::new(radio.clone(), 16, 2).with_lead_time(0.0);
    let report = controller
        .run(&range(0.0, 20.0, 10.0), &steerer, &chirp, &[0.0; 2], 0, |_, _, _| {})
        .unwrap();
    assert_eq!(report.frames.len(), 3);
    assert_eq!(report.num_short_frames(), 3);
    assert!(report.frames.iter().all(|(_, o)| o.samples_received == 10));
}

#[test]
fn test_cancel_and_restart() {
    let radio = radio(LoopbackConfig::new(2));
    let steerer = BeamSteerer::new(2);
    let chirp = chirp();
    let mut controller = SweepController::new(radio.clone(), 16, 1).with_lead_time(0.0);
    let handle = controller.handle();

    let report = controller
        .run(&range(0.0, 40.0, 10.0), &steerer, &chirp, &[0.0; 2], 0, |_, _, _| {
            handle.cancel()
        })
        .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.frames.len(), 1);
    assert_eq!(controller.state(), SweepState::Idle);

    // The sweep can be run again, with a different range.
    let report = controller
        .run(&range(-20.0, 0.0, 10.0), &steerer, &chirp, &[0.0; 2], 0, |_, _, _| {})
        .unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.frames.len(), 3);
}

#[test]
fn test_bad_receive_calibration_is_an_error() {
    let radio = radio(LoopbackConfig::new(2));
    let steerer = BeamSteerer::new(2);
    let chirp = chirp();
    let mut controller = SweepController::new(radio.clone(), 16, 1).with_lead_time(0.0);
    let result = controller.run(&range(0.0, 0.0, 1.0), &steerer, &chirp, &[0.0; 3], 0, |_, _, _| {});
    assert_eq!(
        result,
        Err(SweepError::Correction(CorrectionError::ChannelCountMismatch {
            channels: 2,
            phases: 3
        }))
    );
    assert_eq!(controller.state(), SweepState::Idle);
}

/// A loopback radio whose captures after the first are cut short.
struct ShortAfterFirstCapture {
    inner: LoopbackRadio,
    short_len: usize,
    num_receives: AtomicCell<usize>,
}

impl Radio for ShortAfterFirstCapture {
    fn num_channels(&self) -> usize {
        self.inner.num_channels()
    }

    fn tx_rate(&self) -> f64 {
        self.inner.tx_rate()
    }

    fn rx_rate(&self) -> f64 {
        self.inner.rx_rate()
    }

    fn future_time(&self, seconds_from_now: f64) -> DeviceTime {
        self.inner.future_time(seconds_from_now)
    }

    fn schedule_receive(&self, sample_count: usize, at: DeviceTime) -> Result<(), RadioError> {
        self.inner.schedule_receive(sample_count, at)
    }

    fn receive(
        &self,
        buffers: ArrayViewMut2<sc16>,
        sample_count: usize,
        skip: usize,
    ) -> Result<usize, RadioError> {
        let sample_count = if self.num_receives.fetch_add(1) == 0 {
            sample_count
        } else {
            sample_count.min(self.short_len)
        };
        self.inner.receive(buffers, sample_count, skip)
    }

    fn transmit(
        &self,
        buffers: ArrayView2<sc16>,
        sample_count: usize,
        at: DeviceTime,
    ) -> Result<usize, RadioError> {
        self.inner.transmit(buffers, sample_count, at)
    }
}

#[test]
fn test_short_capture_does_not_leak_the_previous_frame() {
    let radio = Arc::new(ShortAfterFirstCapture {
        inner: LoopbackRadio::new(LoopbackConfig {
            receive_timeout: Duration::from_millis(200),
            ..LoopbackConfig::new(2)
        })
        .unwrap(),
        short_len: 4,
        num_receives: AtomicCell::new(0),
    });
    let steerer = BeamSteerer::new(2);
    let chirp = ChirpTemplate::new(vec![1000; 16], vec![0; 16]).unwrap();
    let mut controller = SweepController::new(radio, 16, 1).with_lead_time(0.0);

    let mut frames = vec![];
    let report = controller
        .run(
            &range(0.0, 10.0, 10.0),
            &steerer,
            &chirp,
            &[0.0, PI / 2.0],
            0,
            |angle, frame, outcome| frames.push((angle, frame.to_owned(), *outcome)),
        )
        .unwrap();
    assert_eq!(report.frames.len(), 2);

    // The first frame is complete and its second channel is rotated once.
    let (_, first, outcome) = &frames[0];
    assert!(outcome.is_complete());
    assert_eq!(first[(1, 10)], sc16::new(0, 1000));

    // The second frame only has its first 4 samples; the rest is silent
    // rather than a second rotation of the first frame.
    let (angle, second, outcome) = &frames[1];
    assert_eq!(*angle, 10.0);
    assert_eq!(outcome.samples_received, 4);
    assert!(second
        .slice(s![.., 4..])
        .iter()
        .all(|&s| s == sc16::default()));
    assert_ne!(second[(1, 0)], sc16::default());
}
