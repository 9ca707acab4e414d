//! Mapping multidimensional bin coordinates to a single flat index
//!
//! Axes are folded in reverse registration order, `flat = flat * n + bin`,
//! so the first registered axis has stride 1 and varies fastest in the flat
//! layout. [`flatten_coords`] and [`unflatten`] use the same convention.

use crate::axis::ResolvedAxis;
use crate::error::{Error, Result};
use crate::numeric::Column;

/// Flat bin index of every data element, with the grid dimensions it refers to
///
/// Elements with a missing value on any axis have no bin (`None`).
#[derive(Debug, Clone, PartialEq)]
pub struct BinIndex {
    dims: Vec<usize>,
    n_bins: usize,
    bins: Vec<Option<usize>>,
}

impl BinIndex {
    /// Build an index from precomputed flat bins
    ///
    /// Fails if any bin lies outside the grid spanned by `dims`.
    pub fn from_parts(dims: Vec<usize>, bins: Vec<Option<usize>>) -> Result<Self> {
        let n_bins = total_bins(&dims)?;
        if let Some(bad) = bins.iter().flatten().find(|&&b| b >= n_bins) {
            return Err(Error::InvalidInput(format!(
                "bin {bad} is outside a grid of {n_bins} bins"
            )));
        }
        Ok(Self { dims, n_bins, bins })
    }

    /// Bin counts per axis, in registration order
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of bins `N`
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Number of data elements
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.bins
    }

    /// Indices of the elements that fall in `bin`
    pub fn members(&self, bin: usize) -> Vec<usize> {
        self.bins
            .iter()
            .enumerate()
            .filter_map(|(i, b)| (*b == Some(bin)).then_some(i))
            .collect()
    }
}

/// Product of the per-axis bin counts
pub fn total_bins(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Err(Error::InvalidInput("at least one axis is required".to_string()));
    }
    dims.iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            Error::InvalidParameter(format!("grid {dims:?} has no bins or too many to index"))
        })
}

/// Compute the flat bin of every element from its per-axis values
///
/// `columns[i]` holds the source data of `axes[i]`; all columns must share
/// one length.
pub fn flatten(axes: &[ResolvedAxis], columns: &[&Column]) -> Result<BinIndex> {
    if axes.len() != columns.len() {
        return Err(Error::size_mismatch(axes.len(), columns.len(), "axis columns"));
    }
    let dims: Vec<usize> = axes.iter().map(|axis| axis.n).collect();
    let n_bins = total_bins(&dims)?;

    let len = columns[0].len();
    if let Some(column) = columns.iter().find(|c| c.len() != len) {
        return Err(Error::size_mismatch(len, column.len(), "axis data"));
    }

    let mut bins = vec![Some(0usize); len];
    for (axis, column) in axes.iter().zip(columns).rev() {
        for (i, slot) in bins.iter_mut().enumerate() {
            *slot = match (*slot, column.value(i).and_then(|v| axis.bin_of(v))) {
                (Some(flat), Some(bin)) => Some(flat * axis.n + bin),
                _ => None,
            };
        }
    }

    Ok(BinIndex { dims, n_bins, bins })
}

/// Flat index of per-axis `coords`, or `None` if any coordinate is out of range
pub fn flatten_coords(coords: &[usize], dims: &[usize]) -> Option<usize> {
    if coords.len() != dims.len() {
        return None;
    }
    coords
        .iter()
        .zip(dims)
        .rev()
        .try_fold(0usize, |flat, (&c, &n)| {
            (c < n).then(|| flat.checked_mul(n)?.checked_add(c)).flatten()
        })
}

/// Per-axis coordinates of flat `bin`, first axis first
pub fn unflatten(bin: usize, dims: &[usize]) -> Vec<usize> {
    let mut rest = bin;
    dims.iter()
        .map(|&n| {
            let coord = rest % n;
            rest /= n;
            coord
        })
        .collect()
}
