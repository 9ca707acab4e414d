//! Configuration-driven binning through the umbrella crate

mod common;

use approx::assert_relative_eq;
use ndbin::{
    Action, AggregatorFactory, AxisConfig, Binner, BinnerConfig, Column, Error, KernelFactory,
    Registry,
};
use ndbin::aggregate::{Aggregator, BinnedValues, Traversal};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};

/// Range (max - min) per bin, registered under a custom name
struct Spread;

struct SpreadAggregator {
    min: ndbin::aggregate::Extremum,
    max: ndbin::aggregate::Extremum,
}

impl Aggregator for SpreadAggregator {
    fn name(&self) -> &str {
        "Spread"
    }

    fn process(&mut self, traversal: &mut Traversal<'_>) -> ndbin::Result<()> {
        let var = traversal.var().ok_or_else(|| anyhow::anyhow!("not positioned"))?;
        self.min.process(traversal)?;
        // the first kernel deactivates the variable; the second still needs it
        traversal.set_active(var, true);
        self.max.process(traversal)
    }

    fn result(&self) -> BinnedValues {
        let (min, max) = (self.min.result(), self.max.result());
        BinnedValues::Floats(
            (0..min.len())
                .map(|bin| Some(max.get_f64(bin)? - min.get_f64(bin)?))
                .collect(),
        )
    }
}

impl AggregatorFactory for Spread {
    fn name(&self) -> &str {
        "Spread"
    }

    fn create(&self, n_bins: usize) -> Box<dyn Aggregator> {
        Box::new(SpreadAggregator {
            min: ndbin::aggregate::Extremum::min(n_bins),
            max: ndbin::aggregate::Extremum::max(n_bins),
        })
    }
}

#[test]
fn test_config_with_custom_aggregator() {
    common::init_tracing();

    let config: BinnerConfig = serde_json::from_str(
        r#"{
            "default_bins": 10,
            "axes": [{ "name": "t", "min": 0, "step": 10, "n": 3 }],
            "variables": [
                { "name": "v", "action": "spread" },
                { "name": "v2", "action": "StdDev" },
                { "name": "t" }
            ]
        }"#,
    )
    .unwrap();

    let mut registry = Registry::with_defaults();
    registry.register(Spread);
    let mut binner = Binner::from_config(&config, &registry).unwrap();

    let t = vec![1.0, 5.0, 12.0, 15.0, 18.0, 29.0];
    let v = vec![2.0, 9.0, 1.0, 1.0, 4.0, 7.0];
    binner
        .process([("t", t), ("v", v.clone()), ("v2", v)])
        .unwrap();

    let out = binner.output().unwrap();
    assert_eq!(out[0].floats(), Some(&[Some(7.0), Some(3.0), Some(0.0)][..]));
    assert_relative_eq!(out[1].get(&[0]).unwrap(), 3.5);
    assert_relative_eq!(out[1].get(&[1]).unwrap(), 2.0f64.sqrt());
    assert_eq!(out[2].counts(), Some(&[2, 3, 1][..]));
}

#[test]
fn test_auto_scaled_histogram_of_normal_sample() {
    common::init_tracing();

    let mut rng = StdRng::seed_from_u64(2024);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let sample: Vec<f64> = (0..5_000).map(|_| normal.sample(&mut rng)).collect();

    let mut binner = Binner::new();
    binner.axis(AxisConfig::new("z").with_bins(20)).unwrap();
    binner.process([("z", sample.clone())]).unwrap();

    let out = binner.output().unwrap();
    let counts = out[0].counts().unwrap();
    assert_eq!(counts.iter().sum::<u64>(), 5_000);

    // the mode of a standard normal sits in the middle bins
    let peak = (0..counts.len()).max_by_key(|&i| counts[i]).unwrap();
    assert!((7..=12).contains(&peak), "peak at bin {peak}");

    let axis = binner.axes()[0].resolved().copied().unwrap();
    assert_relative_eq!(axis.min, sample.iter().cloned().fold(f64::INFINITY, f64::min));
    assert_eq!(axis.n, 20);
}

#[test]
fn test_integral_axis_with_mixed_variables() {
    common::init_tracing();

    let mut rng = StdRng::seed_from_u64(9);
    let days = Uniform::new_inclusive(1i32, 7);
    let amounts = Uniform::new(0.0, 100.0);
    let day: Vec<i32> = (0..700).map(|_| days.sample(&mut rng)).collect();
    let amount: Vec<f64> = (0..700).map(|_| amounts.sample(&mut rng)).collect();

    let mut binner = Binner::new();
    binner.axis(AxisConfig::new("day").with_step(1.0)).unwrap();
    binner.variable("amount", Action::aggregator(KernelFactory::sum())).unwrap();
    binner
        .variable(
            "large",
            Action::callback(|t| {
                let selected = t.selection()?;
                Ok(Some(selected.iter_f64().flatten().filter(|&a| a > 90.0).count() as f64))
            }),
        )
        .unwrap();
    binner
        .process([
            ("day", Column::from(day.clone())),
            ("amount", Column::from(amount.clone())),
            ("large", Column::from(amount.clone())),
        ])
        .unwrap();

    assert_eq!(binner.shape(), vec![7]);
    let out = binner.output().unwrap();
    for d in 1..=7 {
        let expected: f64 = day
            .iter()
            .zip(&amount)
            .filter(|(&dd, _)| dd == d)
            .map(|(_, &a)| a)
            .sum();
        let bin = (d - 1) as usize;
        assert_relative_eq!(out[0].get(&[bin]).unwrap(), expected, max_relative = 1e-12);

        let large = day
            .iter()
            .zip(&amount)
            .filter(|(&dd, &a)| dd == d && a > 90.0)
            .count();
        assert_eq!(out[1].get(&[bin]), Some(large as f64));
    }
}

#[test]
fn test_zero_range_axis_is_a_configuration_error() {
    common::init_tracing();

    let mut binner = Binner::new();
    binner.axis(AxisConfig::new("x")).unwrap();
    let err = binner.process([("x", vec![2.5, 2.5, 2.5])]).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert!(binner.output().is_err());
}
