//! Actions: what to compute for each variable
//!
//! An [`Action`] is chosen once, when a variable is registered, and is never
//! re-inspected per step:
//!
//! - [`Action::Count`]: the default, counts elements per bin
//! - [`Action::Callback`]: a user function invoked once per (bin, variable)
//!   with the traversal positioned there; flexible but O(N * V) selections
//! - [`Action::Aggregator`]: a vectorized [`Aggregator`] created from a
//!   factory, covering all bins in one pass
//!
//! On the first processing pass each action is turned into an
//! [`ActionInstance`] holding the per-variable accumulator state, which then
//! persists across passes.

use crate::kernels::Count;
use crate::traits::{Aggregator, AggregatorFactory};
use crate::traversal::Traversal;
use crate::values::BinnedValues;
use ndbin_core::{Error, Result};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::warn;

/// Per-bin user computation
///
/// Returns `Ok(Some(value))` to set the bin, `Ok(None)` to leave it unset.
/// An `Err` is logged and also leaves the bin unset.
pub type Callback = dyn Fn(&Traversal<'_>) -> anyhow::Result<Option<f64>>;

/// What to compute for one variable
#[derive(Clone)]
pub enum Action {
    Count,
    Callback(Rc<Callback>),
    Aggregator(Arc<dyn AggregatorFactory>),
}

impl Default for Action {
    fn default() -> Self {
        Action::Count
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Count => write!(f, "Action::Count"),
            Action::Callback(_) => write!(f, "Action::Callback(..)"),
            Action::Aggregator(factory) => write!(f, "Action::Aggregator({})", factory.name()),
        }
    }
}

impl Action {
    /// Wrap a per-bin callback
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Traversal<'_>) -> anyhow::Result<Option<f64>> + 'static,
    {
        Action::Callback(Rc::new(f))
    }

    /// Wrap a vectorized aggregator factory
    pub fn aggregator<A: AggregatorFactory + 'static>(factory: A) -> Self {
        Action::Aggregator(Arc::new(factory))
    }

    /// Name for diagnostics
    pub fn name(&self) -> &str {
        match self {
            Action::Count => "Count",
            Action::Callback(_) => "callback",
            Action::Aggregator(factory) => factory.name(),
        }
    }

    /// Create the accumulator state for `n_bins` bins
    pub fn instantiate(&self, n_bins: usize) -> ActionInstance {
        match self {
            Action::Count => ActionInstance::Aggregator(Box::new(Count::new(n_bins))),
            Action::Callback(compute) => ActionInstance::Callback {
                compute: Rc::clone(compute),
                output: vec![None; n_bins],
            },
            Action::Aggregator(factory) => ActionInstance::Aggregator(factory.create(n_bins)),
        }
    }
}

/// Accumulator state of one variable's action
pub enum ActionInstance {
    Callback {
        compute: Rc<Callback>,
        output: Vec<Option<f64>>,
    },
    Aggregator(Box<dyn Aggregator>),
}

impl fmt::Debug for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionInstance::Callback { output, .. } => {
                write!(f, "ActionInstance::Callback({} bins)", output.len())
            }
            ActionInstance::Aggregator(agg) => write!(f, "ActionInstance::Aggregator({})", agg.name()),
        }
    }
}

impl ActionInstance {
    /// Run this action at the traversal's current (bin, variable)
    ///
    /// Callback failures are logged and leave the bin unset; aggregator
    /// failures are returned and abort the pass.
    pub fn step(&mut self, traversal: &mut Traversal<'_>) -> Result<()> {
        match self {
            ActionInstance::Callback { compute, output } => {
                let (bin, len) = (traversal.bin(), output.len());
                let slot = output.get_mut(bin).ok_or_else(|| {
                    Error::size_mismatch(len, traversal.n_bins(), "callback output")
                })?;
                match (**compute)(traversal) {
                    Ok(Some(value)) => *slot = Some(value),
                    Ok(None) => {}
                    Err(err) => warn!(
                        bin,
                        var = ?traversal.var(),
                        error = %err,
                        "callback failed, leaving bin unset"
                    ),
                }
                Ok(())
            }
            ActionInstance::Aggregator(agg) => agg.process(traversal),
        }
    }

    /// Current per-bin values
    pub fn result(&self) -> BinnedValues {
        match self {
            ActionInstance::Callback { output, .. } => BinnedValues::Floats(output.clone()),
            ActionInstance::Aggregator(agg) => agg.result(),
        }
    }
}
