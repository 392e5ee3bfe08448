// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::*;
use ndarray::prelude::*;

use phased_fmcw::{
    apply_phase_correction, chirp::ChirpParams, compute_sample_offset, estimate_phase_offsets,
    sc16, BeamSteerer, ChirpTemplate,
};

fn chirp() -> ChirpTemplate {
    ChirpTemplate::linear(&ChirpParams {
        duration: 1e-3,
        ..Default::default()
    })
    .unwrap()
}

fn calibration(c: &mut Criterion) {
    let chirp = chirp();
    let reference = chirp.to_sc16();
    let mut captured = vec![sc16::default(); 4096 + reference.len()];
    captured[1234..1234 + reference.len()].copy_from_slice(&reference);

    c.bench_function("compute_sample_offset (1000 sample reference, 4096 lags)", |b| {
        b.iter(|| {
            compute_sample_offset(black_box(captured.as_slice()), black_box(reference.as_slice()))
                .unwrap()
        })
    });

    let frame = BeamSteerer::new(8).steered(20.0, &chirp);
    c.bench_function("estimate_phase_offsets (8 channels)", |b| {
        b.iter(|| estimate_phase_offsets(black_box(frame.view()), chirp.len(), 0).unwrap())
    });
}

fn steering(c: &mut Criterion) {
    let chirp = chirp();
    let steerer = BeamSteerer::new(8);
    let mut out = Array2::default((8, 2 * chirp.len()));

    c.bench_function("steer (8 antennas)", |b| {
        b.iter(|| {
            steerer
                .steer(black_box(35.0), &chirp, out.view_mut())
                .unwrap()
        })
    });
}

fn correction(c: &mut Criterion) {
    let chirp = chirp();
    let frame = BeamSteerer::new(8).steered(-15.0, &chirp);
    let frame = ndarray::concatenate(Axis(1), &vec![frame.view(); 128]).unwrap();
    let phases = [0.0, 0.1, -0.2, 0.3, -0.4, 0.5, -0.6, 0.7];

    c.bench_function("apply_phase_correction (8 x 128000 samples)", |b| {
        b.iter_batched(
            || frame.clone(),
            |mut frame| apply_phase_correction(frame.view_mut(), black_box(&phases)).unwrap(),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, calibration, steering, correction);
criterion_main!(benches);
