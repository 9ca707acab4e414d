//! Common test utilities for ndbin-binner tests

use ndbin_aggregate::{Action, KernelFactory};
use ndbin_binner::Binner;
use ndbin_core::{AxisConfig, Column};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::ops::Range;

/// Points in the unit square with integer, roughly normal weights
pub struct Sample {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub w: Vec<i64>,
}

pub fn sample(n: usize, seed: u64) -> Sample {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let weights = Normal::<f64>::new(0.0, 20.0).unwrap();
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    for _ in 0..n {
        x.push(rng.gen::<f64>());
        y.push(rng.gen::<f64>());
        w.push(weights.sample(&mut rng).round() as i64);
    }
    Sample { x, y, w }
}

/// A 4 x 5 grid over the unit square with every built-in kernel on `w`
pub fn grid_binner() -> Binner {
    let mut binner = Binner::new();
    binner
        .axis(AxisConfig::new("x").with_min(0.0).with_step(0.25).with_bins(4))
        .unwrap();
    binner
        .axis(AxisConfig::new("y").with_min(0.0).with_step(0.2).with_bins(5))
        .unwrap();
    for (name, factory) in [
        ("sum", KernelFactory::sum()),
        ("avg", KernelFactory::average()),
        ("sd", KernelFactory::std_dev()),
        ("min", KernelFactory::min()),
        ("max", KernelFactory::max()),
    ] {
        binner.variable(name, Action::aggregator(factory)).unwrap();
    }
    binner.variable("count", Action::Count).unwrap();
    binner
}

/// Feed one chunk of `sample` to a binner from [`grid_binner`]
pub fn process_chunk(binner: &mut Binner, sample: &Sample, range: Range<usize>) {
    let w = &sample.w[range.clone()];
    let mut data = vec![
        ("x", Column::from(&sample.x[range.clone()])),
        ("y", Column::from(&sample.y[range])),
    ];
    for name in ["sum", "avg", "sd", "min", "max", "count"] {
        data.push((name, Column::from(w)));
    }
    binner.process(data).unwrap();
}
