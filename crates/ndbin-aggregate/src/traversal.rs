//! The (bin, variable) state machine consumed by actions
//!
//! A [`Traversal`] walks the product space `{0..N} x {0..V}` bin-major: for
//! each bin in increasing order, every active variable in registration order.
//! It starts before the first step; each [`Traversal::advance`] moves to the
//! next active pair and returns `false` once every bin has been passed.
//!
//! Membership (elements in the current bin), selection (the current
//! variable's values for those elements) and the unflattened bin coordinates
//! are computed lazily and cached. Moving to another bin drops the membership
//! and coordinate caches; moving to another variable drops the selection.

use ndbin_core::{unflatten, BinIndex, Column, Error, Result};
use std::cell::OnceCell;

/// Cursor over every (bin, active variable) pair of one processing pass
#[derive(Debug)]
pub struct Traversal<'a> {
    variables: &'a [&'a Column],
    index: &'a BinIndex,
    bin: usize,
    var: Option<usize>,
    active: Vec<bool>,
    membership: OnceCell<Vec<usize>>,
    selection: OnceCell<Column>,
    coords: OnceCell<Vec<usize>>,
}

impl<'a> Traversal<'a> {
    /// Create a traversal positioned before the first (bin, variable) pair
    ///
    /// Every variable must have one element per entry of `index`.
    pub fn new(variables: &'a [&'a Column], index: &'a BinIndex) -> Result<Self> {
        if let Some(column) = variables.iter().find(|c| c.len() != index.len()) {
            return Err(Error::size_mismatch(index.len(), column.len(), "variable data"));
        }
        Ok(Self {
            variables,
            index,
            bin: 0,
            var: None,
            active: vec![true; variables.len()],
            membership: OnceCell::new(),
            selection: OnceCell::new(),
            coords: OnceCell::new(),
        })
    }

    /// Move to the next active (bin, variable) pair
    ///
    /// Returns `false` once the traversal is exhausted.
    pub fn advance(&mut self) -> bool {
        if self.done() {
            return false;
        }
        loop {
            let mut next = self.var.map_or(0, |v| v + 1);
            if next >= self.variables.len() {
                next = 0;
                self.bin += 1;
                self.membership.take();
                self.coords.take();
            }
            self.var = Some(next);
            self.selection.take();

            if self.done() {
                return false;
            }
            if self.is_active(next) {
                return true;
            }
        }
    }

    /// Current flat bin
    pub fn bin(&self) -> usize {
        self.bin
    }

    /// Current variable, `None` before the first step
    pub fn var(&self) -> Option<usize> {
        self.var
    }

    /// Whether every bin has been visited
    pub fn done(&self) -> bool {
        self.bin >= self.index.n_bins()
    }

    pub fn n_bins(&self) -> usize {
        self.index.n_bins()
    }

    pub fn n_vars(&self) -> usize {
        self.variables.len()
    }

    /// Bin counts per axis
    pub fn dims(&self) -> &'a [usize] {
        self.index.dims()
    }

    /// Full source data of the current variable
    pub fn data(&self) -> Result<&'a Column> {
        self.var
            .and_then(|v| self.variables.get(v).copied())
            .ok_or_else(|| Error::InvalidInput("traversal is not positioned on a variable".to_string()))
    }

    /// Flat bin of every element
    pub fn index_array(&self) -> &'a [Option<usize>] {
        self.index.as_slice()
    }

    pub fn bin_index(&self) -> &'a BinIndex {
        self.index
    }

    /// Indices of the elements in the current bin
    pub fn membership(&self) -> &[usize] {
        self.membership.get_or_init(|| self.index.members(self.bin))
    }

    /// Values of the current variable for the elements in the current bin
    pub fn selection(&self) -> Result<&Column> {
        if let Some(selected) = self.selection.get() {
            return Ok(selected);
        }
        let selected = self.data()?.select(self.membership());
        Ok(self.selection.get_or_init(|| selected))
    }

    /// Per-axis coordinates of the current bin, first axis first
    pub fn unflatten(&self) -> &[usize] {
        self.coords.get_or_init(|| unflatten(self.bin, self.index.dims()))
    }

    /// Whether variable `var` will still be visited
    pub fn is_active(&self, var: usize) -> bool {
        self.active.get(var).copied().unwrap_or(false)
    }

    /// Enable or disable visits to variable `var`
    ///
    /// Vectorized aggregators disable their own variable after covering
    /// every bin in one pass.
    pub fn set_active(&mut self, var: usize, active: bool) {
        if let Some(flag) = self.active.get_mut(var) {
            *flag = active;
        }
    }
}
