//! Orchestration of N-dimensional binning
//!
//! [`Binner`] owns the registered axes and variables, resolves the axes from
//! their data, flattens each element to one bin and drives the traversal
//! through every variable's action. Results come back as one [`Binned`] per
//! variable, shaped by the axes.
//!
//! A binner can be assembled in code or loaded from a serialized
//! [`BinnerConfig`], with action names looked up in a
//! [`Registry`](ndbin_aggregate::Registry).

pub mod binner;
pub mod config;
pub mod output;

pub use binner::Binner;
pub use config::{BinnerConfig, VariableConfig};
pub use output::Binned;

pub use ndbin_core::{Error, Result};
