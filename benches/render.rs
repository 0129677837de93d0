// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#[macro_use]
extern crate criterion;

use criterion::Criterion;
use mandelbands::{render, render_mirrored, RenderConfig};

fn config(workers: u32) -> RenderConfig {
    RenderConfig {
        width: 320,
        height: 180,
        max_iterations: 500,
        workers,
        ..RenderConfig::default()
    }
}

fn by_worker_count(c: &mut Criterion) {
    c.bench_function_over_inputs(
        "render 320x180",
        |b, &workers| b.iter(|| render(&config(workers)).unwrap()),
        vec![1u32, 2, 4, 8, 16],
    );
}

fn mirrored(c: &mut Criterion) {
    c.bench_function("render_mirrored 320x180, 8 workers", |b| {
        b.iter(|| render_mirrored(&config(8)).unwrap())
    });
}

criterion_group!(benches, by_worker_count, mirrored);
criterion_main!(benches);
