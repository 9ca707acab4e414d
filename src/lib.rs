//! N-dimensional binning with mergeable per-bin statistics
//!
//! This crate re-exports the workspace members:
//!
//! - [`core`]: columns, axis resolution and flattening
//! - [`aggregate`]: traversal, actions and statistics kernels
//! - [`binner`]: the orchestrator and its configuration
//!
//! # Example
//!
//! ```rust
//! use ndbin::{Action, AxisConfig, Binner, KernelFactory};
//!
//! let mut binner = Binner::new();
//! binner.axis(AxisConfig::new("x").with_min(0.0).with_step(1.0).with_bins(3))?;
//! binner.axis(AxisConfig::new("y").with_min(0.0).with_step(1.0).with_bins(3))?;
//! binner.variable("w", Action::aggregator(KernelFactory::average()))?;
//!
//! binner.process([
//!     ("x", vec![1.0, 1.0, 2.0]),
//!     ("y", vec![2.0, 2.0, 0.0]),
//!     ("w", vec![3.0, 5.0, 1.0]),
//! ])?;
//!
//! let avg = &binner.output()?[0];
//! assert_eq!(avg.shape(), &[3, 3]);
//! assert_eq!(avg.get(&[1, 2]), Some(4.0));
//! assert_eq!(avg.get(&[0, 0]), None);
//! # Ok::<(), ndbin::Error>(())
//! ```

pub use ndbin_aggregate as aggregate;
pub use ndbin_binner as binner;
pub use ndbin_core as core;

pub use ndbin_aggregate::{
    Action, Aggregator, AggregatorFactory, BinnedValues, KernelFactory, Registry, Traversal,
};
pub use ndbin_binner::{Binned, Binner, BinnerConfig, VariableConfig};
pub use ndbin_core::{AxisConfig, AxisResolver, Column, Error, Numeric, ResolvedAxis, Result};
