//! Core types for N-dimensional binning
//!
//! This crate provides the leaves of the binning engine:
//!
//! - [`Column`]: typed source arrays for axes and variables, with NaN as the
//!   missing-value marker for floating types
//! - [`AxisResolver`]: derives the range, step and bin count of an axis from
//!   its data and whatever the user supplied
//! - [`flatten`]: maps per-axis bins to one flat bin index per element
//!
//! # Example
//!
//! ```rust
//! use ndbin_core::{flatten, AxisConfig, AxisResolver, Column};
//!
//! let x = Column::from(vec![1i32, 1, 2]);
//! let config = AxisConfig::new("x").with_min(0.0).with_step(1.0).with_bins(3);
//! let axis = AxisResolver::default().resolve(&config, &x).unwrap();
//!
//! let index = flatten(&[axis], &[&x]).unwrap();
//! assert_eq!(index.as_slice(), &[Some(1), Some(1), Some(2)]);
//! ```

pub mod axis;
pub mod error;
pub mod flatten;
pub mod numeric;

// Re-export core types
pub use axis::{AxisConfig, AxisResolver, AxisSpec, ResolvedAxis, DEFAULT_BINS};
pub use error::{Error, Result};
pub use flatten::{flatten, flatten_coords, total_bins, unflatten, BinIndex};
pub use numeric::{Column, Numeric};
