//! Serializable binning setups

use ndbin_core::{AxisConfig, DEFAULT_BINS};
use serde::{Deserialize, Serialize};

fn default_bins() -> usize {
    DEFAULT_BINS
}

fn default_action() -> String {
    "Count".to_string()
}

/// A variable and the name of the action computed for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    /// Registry name of the action
    #[serde(default = "default_action")]
    pub action: String,
}

impl VariableConfig {
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
        }
    }

    /// A variable counted per bin
    pub fn count(name: impl Into<String>) -> Self {
        Self::new(name, default_action())
    }
}

/// Complete binner setup: axes in registration order, then variables
///
/// ```rust
/// use ndbin_binner::BinnerConfig;
///
/// let config: BinnerConfig = serde_json::from_str(r#"{
///     "axes": [{ "name": "x", "min": 0, "step": 1, "n": 3 }],
///     "variables": [{ "name": "w", "action": "Avg" }]
/// }"#).unwrap();
/// assert_eq!(config.default_bins, 100);
/// assert_eq!(config.variables[0].action, "Avg");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnerConfig {
    /// Bin count for axes with neither `step` nor `n`, capped at the number
    /// of elements
    #[serde(default = "default_bins")]
    pub default_bins: usize,
    #[serde(default)]
    pub axes: Vec<AxisConfig>,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

impl Default for BinnerConfig {
    fn default() -> Self {
        Self {
            default_bins: DEFAULT_BINS,
            axes: Vec::new(),
            variables: Vec::new(),
        }
    }
}

impl BinnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_bins(mut self, default_bins: usize) -> Self {
        self.default_bins = default_bins;
        self
    }

    pub fn with_axis(mut self, axis: AxisConfig) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn with_variable(mut self, variable: VariableConfig) -> Self {
        self.variables.push(variable);
        self
    }
}
