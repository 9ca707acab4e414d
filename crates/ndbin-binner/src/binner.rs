//! The orchestrator tying axes, flattening and actions together
//!
//! A [`Binner`] holds axes and variables in registration order. Each call to
//! [`Binner::process`] feeds data, resolves the axes, flattens every element
//! to a bin and walks the (bin, variable) traversal, invoking each
//! variable's action. Accumulators are created on the first pass and kept,
//! so data may be supplied in several chunks before [`Binner::output`] is
//! read.

use crate::config::BinnerConfig;
use crate::output::Binned;
use ndbin_aggregate::{Action, ActionInstance, Registry, Traversal};
use ndbin_core::{
    flatten, AxisConfig, AxisResolver, AxisSpec, BinIndex, Column, Error, ResolvedAxis, Result,
};
use tracing::{debug, instrument, warn};

#[derive(Debug)]
struct Variable {
    name: String,
    data: Option<Column>,
    action: Action,
}

/// N-dimensional binning of named variables over named axes
///
/// # Example
///
/// ```rust
/// use ndbin_aggregate::{Action, KernelFactory};
/// use ndbin_binner::Binner;
/// use ndbin_core::{AxisConfig, Column};
///
/// let mut binner = Binner::new();
/// binner.axis(AxisConfig::new("x").with_min(0.0).with_step(1.0).with_bins(3))?;
/// binner.variable("w", Action::aggregator(KernelFactory::sum()))?;
///
/// binner.process([
///     ("x", Column::from(vec![1i32, 1, 2])),
///     ("w", Column::from(vec![10i64, 20, 5])),
/// ])?;
///
/// let out = binner.output()?;
/// assert_eq!(out[0].integers(), Some(&[None, Some(30), Some(5)][..]));
/// # Ok::<(), ndbin_core::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Binner {
    resolver: AxisResolver,
    axes: Vec<AxisSpec>,
    variables: Vec<Variable>,
    instances: Option<Vec<ActionInstance>>,
    /// Axis parameters of the previous pass
    previous: Vec<ResolvedAxis>,
    /// Set when a vectorized action failed; accumulators are then invalid
    poisoned: Option<String>,
    passes: usize,
}

impl Binner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a binner whose auto-scaled axes use `resolver`
    pub fn with_resolver(resolver: AxisResolver) -> Self {
        Self {
            resolver,
            ..Self::default()
        }
    }

    /// Build a binner from a serialized setup, resolving action names in
    /// `registry`
    pub fn from_config(config: &BinnerConfig, registry: &Registry) -> Result<Self> {
        if config.default_bins == 0 {
            return Err(Error::InvalidParameter(
                "default_bins must be positive".to_string(),
            ));
        }
        let mut binner = Self::with_resolver(AxisResolver::new(config.default_bins));
        for axis in &config.axes {
            binner.axis(axis.clone())?;
        }
        for variable in &config.variables {
            binner.variable(&variable.name, registry.action(&variable.action)?)?;
        }
        Ok(binner)
    }

    /// Register an axis; axes are flattened in registration order
    pub fn axis(&mut self, config: AxisConfig) -> Result<&mut Self> {
        self.ensure_registrable(&config.name)?;
        if self.axes.iter().any(|axis| axis.name() == config.name) {
            return Err(Error::InvalidParameter(format!(
                "axis '{}' is already registered",
                config.name
            )));
        }
        self.axes.push(AxisSpec::new(config));
        Ok(self)
    }

    /// Register a variable and the action computed for it
    ///
    /// Within each bin, actions run in registration order.
    pub fn variable(&mut self, name: impl Into<String>, action: Action) -> Result<&mut Self> {
        let name = name.into();
        self.ensure_registrable(&name)?;
        if self.variables.iter().any(|variable| variable.name == name) {
            return Err(Error::InvalidParameter(format!(
                "variable '{name}' is already registered"
            )));
        }
        self.variables.push(Variable {
            name,
            data: None,
            action,
        });
        Ok(self)
    }

    fn ensure_registrable(&self, name: &str) -> Result<()> {
        if self.instances.is_some() {
            return Err(Error::InvalidInput(format!(
                "cannot register '{name}' after data has been processed"
            )));
        }
        Ok(())
    }

    /// Associate source data with registered axes and variables
    ///
    /// A name registered both as an axis and as a variable feeds both. Every
    /// name is checked before any data is stored.
    pub fn feed<I, K, C>(&mut self, data: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Column>,
    {
        let entries = self.stage(data)?;
        self.store(entries);
        Ok(())
    }

    /// Convert and name-check `data` without storing it
    fn stage<I, K, C>(&self, data: I) -> Result<Vec<(String, Column)>>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Column>,
    {
        data.into_iter()
            .map(|(name, column)| {
                let name = name.as_ref();
                if self.is_registered(name) {
                    Ok((name.to_string(), column.into()))
                } else {
                    Err(Error::UnknownName(name.to_string()))
                }
            })
            .collect()
    }

    fn store(&mut self, entries: Vec<(String, Column)>) {
        for (name, column) in entries {
            if let Some(variable) = self.variables.iter_mut().find(|v| v.name == name) {
                variable.data = Some(column.clone());
            }
            if let Some(axis) = self.axes.iter_mut().find(|a| a.name() == name) {
                axis.feed(column);
            }
        }
    }

    fn is_registered(&self, name: &str) -> bool {
        self.axes.iter().any(|axis| axis.name() == name)
            || self.variables.iter().any(|variable| variable.name == name)
    }

    /// Feed `data` and run one binning pass over everything fed so far
    ///
    /// The pass is validated against the staged data first: on a
    /// configuration error (unknown name, length mismatch, unresolvable
    /// axis) nothing is stored and the binner is left as it was. When no
    /// variable is registered, the first axis is counted as a plain
    /// histogram. A failing vectorized action aborts the pass and leaves the
    /// binner unable to produce output.
    #[instrument(skip_all, fields(pass = self.passes))]
    pub fn process<I, K, C>(&mut self, data: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Column>,
    {
        if let Some(reason) = &self.poisoned {
            return Err(Error::Computation(format!(
                "an earlier pass failed: {reason}"
            )));
        }
        if self.axes.is_empty() {
            return Err(Error::InvalidParameter("no axes registered".to_string()));
        }

        let entries = self.stage(data)?;
        let (n_elem, resolved, index) = self.validate(&entries)?;
        let n_bins = index.n_bins();

        self.store(entries);
        for (axis, resolved) in self.axes.iter_mut().zip(&resolved) {
            axis.commit(None, *resolved);
        }
        if self.variables.is_empty() {
            let first = &self.axes[0];
            debug!(axis = first.name(), "no variables registered, counting the first axis");
            self.variables.push(Variable {
                name: first.name().to_string(),
                data: first.data().cloned(),
                action: Action::Count,
            });
        }

        let variable_columns = self
            .variables
            .iter()
            .map(|variable| fed(variable.data.as_ref(), &variable.name))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            elements = n_elem,
            bins = n_bins,
            variables = variable_columns.len(),
            "binning pass"
        );

        let variables = &self.variables;
        let instances = self.instances.get_or_insert_with(|| {
            variables
                .iter()
                .map(|variable| variable.action.instantiate(n_bins))
                .collect()
        });

        let mut traversal = Traversal::new(&variable_columns, &index)?;
        while traversal.advance() {
            let Some(instance) = traversal.var().and_then(|v| instances.get_mut(v)) else {
                continue;
            };
            if let Err(err) = instance.step(&mut traversal) {
                self.poisoned = Some(err.to_string());
                return Err(err);
            }
        }

        self.previous = resolved;
        self.passes += 1;
        Ok(())
    }

    /// Check lengths, resolve axes and flatten using `entries` in place of
    /// the stored data they would replace
    fn validate(&self, entries: &[(String, Column)]) -> Result<(usize, Vec<ResolvedAxis>, BinIndex)> {
        let mut named: Vec<(&str, &Column)> =
            Vec::with_capacity(self.axes.len() + self.variables.len());
        for axis in &self.axes {
            let column = fed(staged(entries, axis.name(), axis.data()), axis.name())?;
            named.push((axis.name(), column));
        }
        for variable in &self.variables {
            let name = variable.name.as_str();
            named.push((name, fed(staged(entries, name, variable.data.as_ref()), name)?));
        }
        let n_elem = check_lengths(&named)?;

        let axis_columns: Vec<&Column> = named[..self.axes.len()]
            .iter()
            .map(|&(_, column)| column)
            .collect();
        let resolved = self.resolve_axes(&axis_columns)?;
        let index = flatten(&resolved, &axis_columns)?;
        Ok((n_elem, resolved, index))
    }

    fn resolve_axes(&self, columns: &[&Column]) -> Result<Vec<ResolvedAxis>> {
        let mut resolved = Vec::with_capacity(self.axes.len());
        for (i, (axis, column)) in self.axes.iter().zip(columns).enumerate() {
            let current = axis.resolve_with(&self.resolver, column)?;
            if let Some(previous) = self.previous.get(i) {
                if previous.n != current.n {
                    return Err(Error::InvalidParameter(format!(
                        "axis '{}' resolved to {} bins but earlier passes used {}",
                        axis.name(),
                        current.n,
                        previous.n
                    )));
                }
                if previous != &current {
                    warn!(
                        axis = axis.name(),
                        previous_min = previous.min,
                        previous_step = previous.step,
                        min = current.min,
                        step = current.step,
                        "auto-scaled axis changed between passes"
                    );
                }
            }
            resolved.push(current);
        }
        Ok(resolved)
    }

    /// One result per variable, shaped by the axes' bin counts
    ///
    /// Fails if nothing was processed yet or a pass was aborted.
    pub fn output(&self) -> Result<Vec<Binned>> {
        if let Some(reason) = &self.poisoned {
            return Err(Error::Computation(format!(
                "results are invalid after a failed pass: {reason}"
            )));
        }
        let instances = self
            .instances
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("no data has been processed".to_string()))?;
        let shape = self.shape();
        Ok(self
            .variables
            .iter()
            .zip(instances)
            .map(|(variable, instance)| {
                Binned::new(variable.name.clone(), shape.clone(), instance.result())
            })
            .collect())
    }

    /// Registered axes with their most recent resolution
    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|variable| variable.name.as_str())
    }

    /// Bin count per axis as of the last pass; empty before the first pass
    pub fn shape(&self) -> Vec<usize> {
        self.previous.iter().map(|axis| axis.n).collect()
    }

    /// Number of completed passes
    pub fn passes(&self) -> usize {
        self.passes
    }
}

fn check_lengths(named: &[(&str, &Column)]) -> Result<usize> {
    let (_, first) = named
        .first()
        .ok_or_else(|| Error::empty_input("binning pass"))?;
    let expected = first.len();
    for (name, column) in named {
        if column.len() != expected {
            return Err(Error::size_mismatch(
                expected,
                column.len(),
                &format!("data for '{name}'"),
            ));
        }
    }
    Ok(expected)
}

/// The last staged column for `name`, else the stored one
fn staged<'c>(
    entries: &'c [(String, Column)],
    name: &str,
    stored: Option<&'c Column>,
) -> Option<&'c Column> {
    entries
        .iter()
        .rev()
        .find(|(entry, _)| entry == name)
        .map(|(_, column)| column)
        .or(stored)
}

fn fed<'c>(data: Option<&'c Column>, name: &str) -> Result<&'c Column> {
    data.ok_or_else(|| Error::InvalidInput(format!("no data fed for '{name}'")))
}
