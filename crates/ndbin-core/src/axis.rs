//! Axis parameters and their resolution from data
//!
//! An axis starts life as a partial [`AxisConfig`]: any of `min`, `max`,
//! `step`, `n` and `round` may be left out. The [`AxisResolver`] fills in the
//! gaps from the axis's source data, producing a [`ResolvedAxis`] whose
//! parameters satisfy `n > 0`, `step > 0` (`step >= 1` for integral data)
//! and `min <= max` (`min < max` for floating data).
//!
//! # Resolution order
//!
//! 1. `min`/`max` default to the data extremes (missing values ignored).
//! 2. A positive `round` widens them outward to the nearest multiple.
//! 3. Range checks: `max < min` always fails, `min == max` fails for
//!    floating data.
//! 4. A supplied `step` must be positive, and at least 1 for integral data.
//! 5. `n` is taken as supplied, else derived from `step`
//!    (`floor((max - min) / step)`, plus one for integral data), else
//!    `min(valid elements, default_bins)`.
//! 6. `step`, if still unknown, is `(max - min) / n` for floating data and
//!    `(max - min + 1) / n` for integral data.
//!
//! When `min`, `step` and `n` are all supplied, resolution short-circuits:
//! the data is not inspected beyond its element type.
//!
//! Supplying both `n` and `step` over-determines the axis; both are used as
//! given and `max` becomes informational. A warning is logged when they
//! disagree with the range.

use crate::error::{Error, Result};
use crate::numeric::Column;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default number of bins when neither `n` nor `step` is known
pub const DEFAULT_BINS: usize = 100;

/// User-supplied, possibly partial, parameters for one axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    /// Quantization granularity applied to `min`/`max` before deriving `n`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<f64>,
}

impl AxisConfig {
    /// Create an axis with every parameter left to auto-scaling
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_bins(mut self, n: usize) -> Self {
        self.n = Some(n);
        self
    }

    pub fn with_round(mut self, round: f64) -> Self {
        self.round = Some(round);
        self
    }

    /// Whether `min`, `step` and `n` were all supplied
    ///
    /// Fixed axes never need re-resolution when new data is fed.
    pub fn is_fixed(&self) -> bool {
        self.min.is_some() && self.step.is_some() && self.n.is_some()
    }
}

/// Fully resolved axis parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedAxis {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    /// Number of bins, always positive
    pub n: usize,
    /// Whether the axis data is integral
    pub integral: bool,
}

impl ResolvedAxis {
    /// Bin holding `value`, or `None` if the value is NaN
    ///
    /// Values at or below `min` land in bin 0 and values at or above `max`
    /// land in bin `n - 1`; all other bins are half-open `[lower, upper)`.
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let raw = ((value - self.min) / self.step).floor();
        let last = self.n - 1;
        Some(if raw <= 0.0 {
            0
        } else if raw >= last as f64 {
            last
        } else {
            raw as usize
        })
    }

    /// Inclusive lower edge of `bin`
    pub fn lower_edge(&self, bin: usize) -> f64 {
        self.min + self.step * bin as f64
    }
}

/// Derives missing axis parameters from data
#[derive(Debug, Clone, Copy)]
pub struct AxisResolver {
    default_bins: usize,
}

impl Default for AxisResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BINS)
    }
}

impl AxisResolver {
    /// Create a resolver using `default_bins` when neither `n` nor `step` is given
    pub fn new(default_bins: usize) -> Self {
        Self {
            default_bins: default_bins.max(1),
        }
    }

    pub fn default_bins(&self) -> usize {
        self.default_bins
    }

    /// Resolve `config` against its source `data`
    pub fn resolve(&self, config: &AxisConfig, data: &Column) -> Result<ResolvedAxis> {
        let name = config.name.as_str();
        let integral = data.is_integral();

        if let (Some(min), Some(step), Some(n)) = (config.min, config.step, config.n) {
            validate_step(name, step, integral)?;
            validate_bins(name, n)?;
            let max = config.max.unwrap_or_else(|| span_end(min, step, n, integral));
            if max < min {
                return Err(Error::InvalidParameter(format!(
                    "Axis '{name}' has max ({max}) below min ({min})"
                )));
            }
            return Ok(ResolvedAxis {
                min,
                max,
                step,
                n,
                integral,
            });
        }

        let observed = data.min_max();
        let (mut min, mut max) = match (
            config.min.or(observed.map(|(lo, _)| lo)),
            config.max.or(observed.map(|(_, hi)| hi)),
        ) {
            (Some(min), Some(max)) => (min, max),
            _ => return Err(Error::empty_input(&format!("resolution of axis '{name}'"))),
        };

        if let Some(round) = config.round.filter(|r| *r > 0.0) {
            min = (min / round).floor() * round;
            max = (max / round).ceil() * round;
        }

        if max < min {
            return Err(Error::InvalidParameter(format!(
                "Axis '{name}' has max ({max}) below min ({min})"
            )));
        }
        if !integral && min == max {
            return Err(Error::zero_range(name, min));
        }

        if let Some(step) = config.step {
            validate_step(name, step, integral)?;
        }

        // Integral value v occupies [v, v + 1), so the usable range gains one
        let range = if integral { max - min + 1.0 } else { max - min };

        let n = match (config.n, config.step) {
            (Some(n), _) => {
                validate_bins(name, n)?;
                n
            }
            (None, Some(step)) => {
                let mut n = ((max - min) / step).floor() as usize;
                if integral {
                    n += 1;
                }
                if n == 0 {
                    return Err(Error::InvalidParameter(format!(
                        "Axis '{name}' step {step} exceeds its range [{min}, {max}]"
                    )));
                }
                n
            }
            (None, None) => {
                let n = data.valid_count().min(self.default_bins);
                if n == 0 {
                    return Err(Error::empty_input(&format!("resolution of axis '{name}'")));
                }
                n
            }
        };

        let step = match config.step {
            Some(step) => step,
            None => {
                let step = range / n as f64;
                if integral && step < 1.0 {
                    return Err(Error::too_many_bins(name, n, range));
                }
                step
            }
        };

        if config.n.is_some() && config.step.is_some() {
            let covered = step * n as f64;
            if (covered - range).abs() > f64::EPSILON * range.abs().max(1.0) * 8.0 {
                warn!(
                    axis = name,
                    n, step, range, "over-determined axis: n * step does not match the range, keeping n and step"
                );
            }
        }

        debug!(axis = name, min, max, step, n, integral, "resolved axis");

        Ok(ResolvedAxis {
            min,
            max,
            step,
            n,
            integral,
        })
    }
}

fn validate_step(axis: &str, step: f64, integral: bool) -> Result<()> {
    if !(step > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "Axis '{axis}' step must be positive, got {step}"
        )));
    }
    if integral && step < 1.0 {
        return Err(Error::InvalidParameter(format!(
            "Axis '{axis}' has integral data and needs step >= 1, got {step}"
        )));
    }
    Ok(())
}

fn validate_bins(axis: &str, n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::InvalidParameter(format!(
            "Axis '{axis}' needs at least one bin"
        )));
    }
    Ok(())
}

/// Upper end of the range covered by `n` bins of width `step` from `min`
fn span_end(min: f64, step: f64, n: usize, integral: bool) -> f64 {
    let end = min + step * n as f64;
    if integral {
        end - 1.0
    } else {
        end
    }
}

/// One registered axis: its configuration, current data, and resolution
#[derive(Debug, Clone)]
pub struct AxisSpec {
    config: AxisConfig,
    data: Option<Column>,
    resolved: Option<ResolvedAxis>,
}

impl AxisSpec {
    pub fn new(config: AxisConfig) -> Self {
        Self {
            config,
            data: None,
            resolved: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    /// Source data of the current pass, if any has been fed
    pub fn data(&self) -> Option<&Column> {
        self.data.as_ref()
    }

    /// Parameters from the most recent resolution
    pub fn resolved(&self) -> Option<&ResolvedAxis> {
        self.resolved.as_ref()
    }

    /// Replace the source data
    ///
    /// Unless the axis is fixed, this discards the previous resolution.
    pub fn feed(&mut self, data: Column) {
        self.data = Some(data);
        if !self.config.is_fixed() {
            self.resolved = None;
        }
    }

    /// Resolve the axis if it is not resolved yet
    pub fn resolve(&mut self, resolver: &AxisResolver) -> Result<ResolvedAxis> {
        if let Some(resolved) = self.resolved {
            return Ok(resolved);
        }
        let data = self.data.as_ref().ok_or_else(|| {
            Error::InvalidInput(format!("no data fed for axis '{}'", self.config.name))
        })?;
        let resolved = resolver.resolve(&self.config, data)?;
        self.resolved = Some(resolved);
        Ok(resolved)
    }

    /// Resolution this axis would get if `data` were fed, leaving it untouched
    ///
    /// A fixed axis that is already resolved keeps its resolution.
    pub fn resolve_with(&self, resolver: &AxisResolver, data: &Column) -> Result<ResolvedAxis> {
        match self.resolved {
            Some(resolved) if self.config.is_fixed() => Ok(resolved),
            _ => resolver.resolve(&self.config, data),
        }
    }

    /// Store `data`, if any, together with its resolution from [`resolve_with`](Self::resolve_with)
    pub fn commit(&mut self, data: Option<Column>, resolved: ResolvedAxis) {
        if let Some(data) = data {
            self.data = Some(data);
        }
        self.resolved = Some(resolved);
    }

    /// Bin of `value` along this axis, once resolved
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        self.resolved.as_ref().and_then(|axis| axis.bin_of(value))
    }
}
