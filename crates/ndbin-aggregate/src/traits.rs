//! Core traits for vectorized aggregation

use crate::traversal::Traversal;
use crate::values::BinnedValues;
use ndbin_core::Result;

/// An action that covers every bin of a variable in one pass
///
/// On each `process` call an aggregator scatters the whole current variable
/// into its `N`-sized accumulators using the flat bin index, then disables
/// the variable on the traversal so it is not visited again for the rest of
/// the pass. Accumulators persist between calls, so feeding data in chunks
/// yields the same result as one call over the concatenated data.
///
/// Errors from `process` are fatal for the whole pass.
pub trait Aggregator {
    /// Name for diagnostics
    fn name(&self) -> &str;

    /// Accumulate the traversal's current variable
    fn process(&mut self, traversal: &mut Traversal<'_>) -> Result<()>;

    /// Finished per-bin values
    fn result(&self) -> BinnedValues;
}

/// Creates aggregators sized for a given number of bins
///
/// Factories are what the [`Registry`](crate::Registry) stores under a name;
/// one aggregator is created per variable on the first processing pass.
pub trait AggregatorFactory: Send + Sync {
    /// Name the factory is registered under
    fn name(&self) -> &str;

    /// Create an aggregator for `n_bins` bins
    fn create(&self, n_bins: usize) -> Box<dyn Aggregator>;
}
