//! Single-pass, mergeable statistics kernels
//!
//! Every kernel scatters the whole current variable into `N`-sized
//! accumulators in one O(n) pass. Accumulators are allocated on the first
//! `process` call and never reset, so running the kernel once per chunk of
//! a partitioned dataset reproduces the single-call result: the running
//! updates below are the same recurrence whether the next element arrives in
//! this call or the next.
//!
//! Elements without a bin (missing axis value) and missing variable values
//! contribute nothing.
//!
//! | kernel | per element | result |
//! |---|---|---|
//! | [`Count`] | `count += 1` | `count`, empty bins 0 |
//! | [`Sum`] | `sum += x` | `sum`, integral input stays integral (`i128`) |
//! | [`Average`] | `mean += (x - mean) / count` | `mean` as `f64` |
//! | [`StdDev`] | Welford `mean`/`M2` update | `sqrt(M2 / count)` as `f64` |
//! | [`Extremum`] | keep smaller/larger | min/max in the input's kind |

use crate::traits::{Aggregator, AggregatorFactory};
use crate::traversal::Traversal;
use crate::values::BinnedValues;
use ndbin_core::{Column, Error, Result};
use tracing::trace;

/// Feed every binned, non-missing element of the current variable to `f`
/// as `(bin, element, value)`, then retire the variable for this pass
fn scatter<F>(traversal: &mut Traversal<'_>, n_bins: usize, kernel: &str, mut f: F) -> Result<()>
where
    F: FnMut(usize, usize, f64) -> Result<()>,
{
    let var = traversal.var().ok_or_else(|| {
        Error::InvalidInput(format!("{kernel} called before the traversal's first step"))
    })?;
    if traversal.n_bins() != n_bins {
        return Err(Error::size_mismatch(n_bins, traversal.n_bins(), "aggregator bins"));
    }
    let data = traversal.data()?;
    let mut used = 0usize;
    for (i, bin) in traversal.index_array().iter().enumerate() {
        if let (Some(bin), Some(value)) = (*bin, data.value(i)) {
            f(bin, i, value)?;
            used += 1;
        }
    }
    trace!(kernel, var, used, elements = data.len(), "scatter pass");
    traversal.set_active(var, false);
    Ok(())
}

fn element_kind_changed(kernel: &str, was_integral: bool, data: &Column) -> Error {
    let before = if was_integral { "integral" } else { "floating" };
    Error::InvalidInput(format!(
        "{kernel} accumulated {before} data but received a {} chunk",
        data.dtype()
    ))
}

fn integer_at(data: &Column, i: usize) -> Result<i128> {
    data.integer(i).ok_or_else(|| {
        Error::Computation(format!("element {i} ({}) is not an integer", data.dtype()))
    })
}

/// Number of elements per bin
#[derive(Debug, Clone)]
pub struct Count {
    n_bins: usize,
    counts: Option<Vec<u64>>,
}

impl Count {
    pub fn new(n_bins: usize) -> Self {
        Self {
            n_bins,
            counts: None,
        }
    }
}

impl Aggregator for Count {
    fn name(&self) -> &str {
        "Count"
    }

    fn process(&mut self, traversal: &mut Traversal<'_>) -> Result<()> {
        let n_bins = self.n_bins;
        let counts = self.counts.get_or_insert_with(|| vec![0; n_bins]);
        scatter(traversal, n_bins, "Count", |bin, _, _| {
            counts[bin] += 1;
            Ok(())
        })
    }

    fn result(&self) -> BinnedValues {
        BinnedValues::Counts(
            self.counts
                .clone()
                .unwrap_or_else(|| vec![0; self.n_bins]),
        )
    }
}

#[derive(Debug, Clone)]
enum SumState {
    Integral { sum: Vec<i128>, count: Vec<u64> },
    Floating { sum: Vec<f64>, count: Vec<u64> },
}

/// Sum of the values per bin
///
/// Integral input, signed or unsigned, is summed in `i128` with overflow
/// checking; floating input in `f64`. The kind is fixed by the first chunk.
#[derive(Debug, Clone)]
pub struct Sum {
    n_bins: usize,
    state: Option<SumState>,
}

impl Sum {
    pub fn new(n_bins: usize) -> Self {
        Self {
            n_bins,
            state: None,
        }
    }
}

impl Aggregator for Sum {
    fn name(&self) -> &str {
        "Sum"
    }

    fn process(&mut self, traversal: &mut Traversal<'_>) -> Result<()> {
        let data = traversal.data()?;
        let integral = data.is_integral();
        let n_bins = self.n_bins;
        let state = self.state.get_or_insert_with(|| {
            if integral {
                SumState::Integral {
                    sum: vec![0; n_bins],
                    count: vec![0; n_bins],
                }
            } else {
                SumState::Floating {
                    sum: vec![0.0; n_bins],
                    count: vec![0; n_bins],
                }
            }
        });

        match state {
            SumState::Integral { sum, count } => {
                if !integral {
                    return Err(element_kind_changed("Sum", true, data));
                }
                scatter(traversal, n_bins, "Sum", |bin, i, _| {
                    let value = integer_at(data, i)?;
                    sum[bin] = sum[bin].checked_add(value).ok_or_else(|| {
                        Error::Computation(format!("integer overflow summing bin {bin}"))
                    })?;
                    count[bin] += 1;
                    Ok(())
                })
            }
            SumState::Floating { sum, count } => {
                if integral {
                    return Err(element_kind_changed("Sum", false, data));
                }
                scatter(traversal, n_bins, "Sum", |bin, _, value| {
                    sum[bin] += value;
                    count[bin] += 1;
                    Ok(())
                })
            }
        }
    }

    fn result(&self) -> BinnedValues {
        match &self.state {
            Some(SumState::Integral { sum, count }) => BinnedValues::Integers(
                sum.iter()
                    .zip(count)
                    .map(|(&s, &c)| (c > 0).then_some(s))
                    .collect(),
            ),
            Some(SumState::Floating { sum, count }) => BinnedValues::Floats(
                sum.iter()
                    .zip(count)
                    .map(|(&s, &c)| (c > 0).then_some(s))
                    .collect(),
            ),
            None => BinnedValues::Floats(vec![None; self.n_bins]),
        }
    }
}

/// Running mean per bin
///
/// Updating `mean += (x - mean) / count` keeps the accumulator in the data's
/// own magnitude instead of building a large sum first.
#[derive(Debug, Clone)]
pub struct Average {
    n_bins: usize,
    state: Option<(Vec<u64>, Vec<f64>)>,
}

impl Average {
    pub fn new(n_bins: usize) -> Self {
        Self {
            n_bins,
            state: None,
        }
    }
}

impl Aggregator for Average {
    fn name(&self) -> &str {
        "Avg"
    }

    fn process(&mut self, traversal: &mut Traversal<'_>) -> Result<()> {
        let n_bins = self.n_bins;
        let (count, mean) = self
            .state
            .get_or_insert_with(|| (vec![0; n_bins], vec![0.0; n_bins]));
        scatter(traversal, n_bins, "Avg", |bin, _, value| {
            count[bin] += 1;
            mean[bin] += (value - mean[bin]) / count[bin] as f64;
            Ok(())
        })
    }

    fn result(&self) -> BinnedValues {
        match &self.state {
            Some((count, mean)) => BinnedValues::Floats(
                count
                    .iter()
                    .zip(mean)
                    .map(|(&c, &m)| (c > 0).then_some(m))
                    .collect(),
            ),
            None => BinnedValues::Floats(vec![None; self.n_bins]),
        }
    }
}

#[derive(Debug, Clone)]
struct Moments {
    count: Vec<u64>,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

/// Standard deviation per bin (no Bessel correction)
///
/// Uses Welford's update: `delta = x - mean; mean += delta / count;
/// M2 += delta * (x - mean)`, the last factor taken with the updated mean.
/// A bin with a single element has deviation 0.
#[derive(Debug, Clone)]
pub struct StdDev {
    n_bins: usize,
    state: Option<Moments>,
}

impl StdDev {
    pub fn new(n_bins: usize) -> Self {
        Self {
            n_bins,
            state: None,
        }
    }
}

impl Aggregator for StdDev {
    fn name(&self) -> &str {
        "StdDev"
    }

    fn process(&mut self, traversal: &mut Traversal<'_>) -> Result<()> {
        let n_bins = self.n_bins;
        let Moments { count, mean, m2 } = self.state.get_or_insert_with(|| Moments {
            count: vec![0; n_bins],
            mean: vec![0.0; n_bins],
            m2: vec![0.0; n_bins],
        });
        scatter(traversal, n_bins, "StdDev", |bin, _, value| {
            count[bin] += 1;
            let delta = value - mean[bin];
            mean[bin] += delta / count[bin] as f64;
            m2[bin] += delta * (value - mean[bin]);
            Ok(())
        })
    }

    fn result(&self) -> BinnedValues {
        match &self.state {
            Some(moments) => BinnedValues::Floats(
                moments
                    .count
                    .iter()
                    .zip(&moments.m2)
                    .map(|(&c, &m2)| (c > 0).then(|| (m2 / c as f64).sqrt()))
                    .collect(),
            ),
            None => BinnedValues::Floats(vec![None; self.n_bins]),
        }
    }
}

/// Which end of the range an [`Extremum`] keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

impl Extreme {
    fn keeps<T: PartialOrd>(self, candidate: T, current: T) -> bool {
        match self {
            Extreme::Min => candidate < current,
            Extreme::Max => candidate > current,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Extreme::Min => "Min",
            Extreme::Max => "Max",
        }
    }
}

#[derive(Debug, Clone)]
enum ExtremeState {
    Integral(Vec<Option<i128>>),
    Floating(Vec<Option<f64>>),
}

fn keep_extreme<T: PartialOrd + Copy>(kind: Extreme, slot: &mut Option<T>, value: T) {
    match *slot {
        Some(current) if !kind.keeps(value, current) => {}
        _ => *slot = Some(value),
    }
}

/// Minimum or maximum per bin
#[derive(Debug, Clone)]
pub struct Extremum {
    kind: Extreme,
    n_bins: usize,
    state: Option<ExtremeState>,
}

impl Extremum {
    pub fn new(kind: Extreme, n_bins: usize) -> Self {
        Self {
            kind,
            n_bins,
            state: None,
        }
    }

    pub fn min(n_bins: usize) -> Self {
        Self::new(Extreme::Min, n_bins)
    }

    pub fn max(n_bins: usize) -> Self {
        Self::new(Extreme::Max, n_bins)
    }
}

impl Aggregator for Extremum {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn process(&mut self, traversal: &mut Traversal<'_>) -> Result<()> {
        let data = traversal.data()?;
        let integral = data.is_integral();
        let (kind, n_bins) = (self.kind, self.n_bins);
        let state = self.state.get_or_insert_with(|| {
            if integral {
                ExtremeState::Integral(vec![None; n_bins])
            } else {
                ExtremeState::Floating(vec![None; n_bins])
            }
        });

        match state {
            ExtremeState::Integral(out) => {
                if !integral {
                    return Err(element_kind_changed(kind.name(), true, data));
                }
                scatter(traversal, n_bins, kind.name(), |bin, i, _| {
                    keep_extreme(kind, &mut out[bin], integer_at(data, i)?);
                    Ok(())
                })
            }
            ExtremeState::Floating(out) => {
                if integral {
                    return Err(element_kind_changed(kind.name(), false, data));
                }
                scatter(traversal, n_bins, kind.name(), |bin, _, value| {
                    keep_extreme(kind, &mut out[bin], value);
                    Ok(())
                })
            }
        }
    }

    fn result(&self) -> BinnedValues {
        match &self.state {
            Some(ExtremeState::Integral(out)) => BinnedValues::Integers(out.clone()),
            Some(ExtremeState::Floating(out)) => BinnedValues::Floats(out.clone()),
            None => BinnedValues::Floats(vec![None; self.n_bins]),
        }
    }
}

fn build_count(n_bins: usize) -> Box<dyn Aggregator> {
    Box::new(Count::new(n_bins))
}

fn build_sum(n_bins: usize) -> Box<dyn Aggregator> {
    Box::new(Sum::new(n_bins))
}

fn build_average(n_bins: usize) -> Box<dyn Aggregator> {
    Box::new(Average::new(n_bins))
}

fn build_std_dev(n_bins: usize) -> Box<dyn Aggregator> {
    Box::new(StdDev::new(n_bins))
}

fn build_min(n_bins: usize) -> Box<dyn Aggregator> {
    Box::new(Extremum::min(n_bins))
}

fn build_max(n_bins: usize) -> Box<dyn Aggregator> {
    Box::new(Extremum::max(n_bins))
}

/// Factory for the built-in kernels
#[derive(Debug, Clone, Copy)]
pub struct KernelFactory {
    name: &'static str,
    build: fn(usize) -> Box<dyn Aggregator>,
}

impl KernelFactory {
    pub fn count() -> Self {
        Self { name: "Count", build: build_count }
    }

    pub fn sum() -> Self {
        Self { name: "Sum", build: build_sum }
    }

    pub fn average() -> Self {
        Self { name: "Avg", build: build_average }
    }

    pub fn std_dev() -> Self {
        Self { name: "StdDev", build: build_std_dev }
    }

    pub fn min() -> Self {
        Self { name: "Min", build: build_min }
    }

    pub fn max() -> Self {
        Self { name: "Max", build: build_max }
    }

    /// All built-in kernels
    pub fn builtins() -> [Self; 6] {
        [
            Self::count(),
            Self::sum(),
            Self::average(),
            Self::std_dev(),
            Self::min(),
            Self::max(),
        ]
    }
}

impl AggregatorFactory for KernelFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn create(&self, n_bins: usize) -> Box<dyn Aggregator> {
        (self.build)(n_bins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndbin_core::BinIndex;
    use proptest::prelude::*;

    fn run(agg: &mut dyn Aggregator, data: &Column, bins: &[Option<usize>], n_bins: usize) -> Result<()> {
        let index = BinIndex::from_parts(vec![n_bins], bins.to_vec())?;
        let refs = vec![data];
        let mut traversal = Traversal::new(&refs, &index)?;
        let mut calls = 0;
        while traversal.advance() {
            agg.process(&mut traversal)?;
            calls += 1;
        }
        assert_eq!(calls, 1, "vectorized kernels run once per pass");
        Ok(())
    }

    fn scenario() -> (Column, Vec<Option<usize>>) {
        let data = Column::from(vec![4i64, 5, 6, 7, 8, 9]);
        let bins = [0, 0, 0, 1, 3, 0].iter().map(|&b| Some(b)).collect();
        (data, bins)
    }

    #[test]
    fn test_count_scenario() {
        let (data, bins) = scenario();
        let mut count = Count::new(4);
        run(&mut count, &data, &bins, 4).unwrap();
        assert_eq!(count.result(), BinnedValues::Counts(vec![4, 1, 0, 1]));
    }

    #[test]
    fn test_sum_scenario() {
        let (data, bins) = scenario();
        let mut sum = Sum::new(4);
        run(&mut sum, &data, &bins, 4).unwrap();
        assert_eq!(
            sum.result(),
            BinnedValues::Integers(vec![Some(24), Some(7), None, Some(8)])
        );
    }

    #[test]
    fn test_average_scenario() {
        let (data, bins) = scenario();
        let mut avg = Average::new(4);
        run(&mut avg, &data, &bins, 4).unwrap();
        assert_eq!(
            avg.result(),
            BinnedValues::Floats(vec![Some(6.0), Some(7.0), None, Some(8.0)])
        );
    }

    #[test]
    fn test_std_dev_scenario() {
        let (data, bins) = scenario();
        let mut sd = StdDev::new(4);
        run(&mut sd, &data, &bins, 4).unwrap();
        let out = sd.result();
        let out = out.as_floats().unwrap();
        assert_relative_eq!(out[0].unwrap(), 3.5f64.sqrt());
        assert_eq!(out[1], Some(0.0));
        assert_eq!(out[2], None);
        assert_eq!(out[3], Some(0.0));
    }

    #[test]
    fn test_min_max_keep_input_kind() {
        let (data, bins) = scenario();
        let mut min = Extremum::min(4);
        let mut max = Extremum::max(4);
        run(&mut min, &data, &bins, 4).unwrap();
        run(&mut max, &data, &bins, 4).unwrap();
        assert_eq!(
            min.result(),
            BinnedValues::Integers(vec![Some(4), Some(7), None, Some(8)])
        );
        assert_eq!(
            max.result(),
            BinnedValues::Integers(vec![Some(9), Some(7), None, Some(8)])
        );

        let floats = Column::from(vec![-1.5, 2.5, 0.5]);
        let mut min = Extremum::min(2);
        run(&mut min, &floats, &[Some(1), Some(1), Some(1)], 2).unwrap();
        assert_eq!(min.result(), BinnedValues::Floats(vec![None, Some(-1.5)]));
    }

    #[test]
    fn test_missing_values_and_unbinned_elements_skipped() {
        let data = Column::from(vec![1.0, f64::NAN, 3.0, 100.0]);
        let bins = [Some(0), Some(0), Some(0), None];

        let mut count = Count::new(1);
        run(&mut count, &data, &bins, 1).unwrap();
        assert_eq!(count.result(), BinnedValues::Counts(vec![2]));

        let mut avg = Average::new(1);
        run(&mut avg, &data, &bins, 1).unwrap();
        assert_eq!(avg.result(), BinnedValues::Floats(vec![Some(2.0)]));
    }

    #[test]
    fn test_unprocessed_results() {
        assert_eq!(Count::new(2).result(), BinnedValues::Counts(vec![0, 0]));
        assert_eq!(Sum::new(2).result(), BinnedValues::Floats(vec![None, None]));
        assert_eq!(StdDev::new(1).result(), BinnedValues::Floats(vec![None]));
    }

    #[test]
    fn test_float_sum() {
        let data = Column::from(vec![0.5f32, 0.25, 2.0]);
        let mut sum = Sum::new(2);
        run(&mut sum, &data, &[Some(0), Some(0), Some(1)], 2).unwrap();
        assert_eq!(sum.result(), BinnedValues::Floats(vec![Some(0.75), Some(2.0)]));
    }

    #[test]
    fn test_unsigned_values_beyond_i64() {
        let big = u64::MAX - 1;
        let data = Column::from(vec![big, 3, big]);
        let bins = [Some(0), Some(0), Some(1)];

        let mut sum = Sum::new(2);
        run(&mut sum, &data, &bins, 2).unwrap();
        assert_eq!(
            sum.result(),
            BinnedValues::Integers(vec![Some(big as i128 + 3), Some(big as i128)])
        );

        let mut max = Extremum::max(2);
        run(&mut max, &data, &bins, 2).unwrap();
        assert_eq!(max.result(), BinnedValues::Integers(vec![Some(big as i128), Some(big as i128)]));

        let mut min = Extremum::min(2);
        run(&mut min, &data, &bins, 2).unwrap();
        assert_eq!(min.result(), BinnedValues::Integers(vec![Some(3), Some(big as i128)]));
    }

    #[test]
    fn test_signed_sums_past_i64_range() {
        let data = Column::from(vec![i64::MAX, i64::MAX, i64::MIN]);
        let mut sum = Sum::new(1);
        run(&mut sum, &data, &[Some(0), Some(0), Some(0)], 1).unwrap();
        assert_eq!(
            sum.result(),
            BinnedValues::Integers(vec![Some(i64::MAX as i128 - 1)])
        );
    }

    #[test]
    fn test_element_kind_change_is_fatal() {
        let mut sum = Sum::new(1);
        run(&mut sum, &Column::from(vec![1i32]), &[Some(0)], 1).unwrap();
        let err = run(&mut sum, &Column::from(vec![1.0]), &[Some(0)], 1).unwrap_err();
        assert!(err.to_string().contains("integral"));
    }

    #[test]
    fn test_bin_count_mismatch_is_fatal() {
        let mut count = Count::new(3);
        assert!(run(&mut count, &Column::from(vec![1.0]), &[Some(0)], 2).is_err());
    }

    #[test]
    fn test_factories() {
        let names: Vec<&str> = KernelFactory::builtins().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Count", "Sum", "Avg", "StdDev", "Min", "Max"]);
        let agg = KernelFactory::std_dev().create(5);
        assert_eq!(agg.name(), "StdDev");
        assert_eq!(agg.result().len(), 5);
    }

    fn chunked(
        make: fn(usize) -> Box<dyn Aggregator>,
        values: &[f64],
        bins: &[Option<usize>],
        cuts: &[usize],
    ) -> BinnedValues {
        let mut agg = make(5);
        let mut start = 0;
        for end in cuts.iter().copied().chain(std::iter::once(values.len())) {
            let end = end.clamp(start, values.len());
            let chunk = Column::from(values[start..end].to_vec());
            run(agg.as_mut(), &chunk, &bins[start..end], 5).unwrap();
            start = end;
        }
        agg.result()
    }

    fn assert_close(a: &BinnedValues, b: &BinnedValues) {
        assert_eq!(a.len(), b.len());
        for bin in 0..a.len() {
            assert_eq!(a.is_missing(bin), b.is_missing(bin));
            if let (Some(x), Some(y)) = (a.get_f64(bin), b.get_f64(bin)) {
                assert_relative_eq!(x, y, epsilon = 1e-9, max_relative = 1e-9);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_piecewise_matches_single_pass(
            rows in prop::collection::vec((-100.0f64..100.0, 0usize..5), 1..200),
            mut cuts in prop::collection::vec(0usize..200, 0..4),
        ) {
            cuts.sort_unstable();
            let values: Vec<f64> = rows.iter().map(|(v, _)| *v).collect();
            let bins: Vec<Option<usize>> = rows.iter().map(|(_, b)| Some(*b)).collect();

            for make in [build_count, build_sum, build_average, build_std_dev, build_min, build_max] {
                let whole = chunked(make, &values, &bins, &[]);
                let pieces = chunked(make, &values, &bins, &cuts);
                assert_close(&whole, &pieces);
            }
        }

        #[test]
        fn prop_integral_sum_exact_across_chunks(
            rows in prop::collection::vec((-1000i64..1000, 0usize..3), 1..100),
            cut in 0usize..100,
        ) {
            let values: Vec<i64> = rows.iter().map(|(v, _)| *v).collect();
            let bins: Vec<Option<usize>> = rows.iter().map(|(_, b)| Some(*b)).collect();
            let cut = cut.min(values.len());

            let mut whole = Sum::new(3);
            run(&mut whole, &Column::from(values.clone()), &bins, 3).unwrap();

            let mut pieces = Sum::new(3);
            run(&mut pieces, &Column::from(values[..cut].to_vec()), &bins[..cut], 3).unwrap();
            run(&mut pieces, &Column::from(values[cut..].to_vec()), &bins[cut..], 3).unwrap();

            prop_assert_eq!(whole.result(), pieces.result());
        }
    }
}
