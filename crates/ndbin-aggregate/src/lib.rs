//! Traversal protocol and per-bin statistics for N-dimensional binning
//!
//! Once every element has a flat bin (see [`ndbin_core::flatten`]), the
//! actions registered for each variable turn those bins into results. This
//! crate provides:
//!
//! - [`Traversal`]: the (bin, variable) cursor with lazily cached membership
//!   and selection
//! - [`Action`]: the choice between counting, a per-bin callback, or a
//!   vectorized [`Aggregator`]
//! - Mergeable kernels: [`Count`], [`Sum`], [`Average`], [`StdDev`] and
//!   [`Extremum`] (min/max)
//! - [`Registry`]: name-based lookup of [`AggregatorFactory`] values
//!
//! # Example
//!
//! ```rust
//! use ndbin_aggregate::{Action, KernelFactory, Traversal};
//! use ndbin_core::{BinIndex, Column};
//!
//! let data = Column::from(vec![5i64, 7, 2]);
//! let refs = vec![&data];
//! let index = BinIndex::from_parts(vec![2], vec![Some(0), Some(1), Some(0)]).unwrap();
//!
//! let mut sum = Action::aggregator(KernelFactory::sum()).instantiate(2);
//! let mut traversal = Traversal::new(&refs, &index).unwrap();
//! while traversal.advance() {
//!     sum.step(&mut traversal).unwrap();
//! }
//! assert_eq!(sum.result().as_integers(), Some(&[Some(7), Some(7)][..]));
//! ```

pub mod action;
pub mod kernels;
pub mod registry;
pub mod traits;
pub mod traversal;
pub mod values;

pub use action::{Action, ActionInstance, Callback};
pub use kernels::{Average, Count, Extreme, Extremum, KernelFactory, StdDev, Sum};
pub use registry::Registry;
pub use traits::{Aggregator, AggregatorFactory};
pub use traversal::Traversal;
pub use values::BinnedValues;

pub use ndbin_core::{Error, Result};
