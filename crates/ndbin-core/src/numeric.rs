//! Numeric element types and the typed source array
//!
//! Axis and variable data arrive as [`Column`]s: owned, typed arrays whose
//! element type decides integral vs floating semantics during axis
//! resolution and accumulation. Any type implementing [`Numeric`] converts
//! into a `Column` through `From<Vec<T>>`.
//!
//! # Missing values
//!
//! Floating-point elements that are NaN are *missing*: they are skipped by
//! min/max reduction, give their element no bin when they appear on an axis,
//! and contribute nothing when they appear in a variable. Integers are never
//! missing.

use num_traits::ToPrimitive;
use std::fmt::Debug;

/// Base trait for element types that can be binned and aggregated
pub trait Numeric: Copy + PartialOrd + Debug + ToPrimitive + Send + Sync + 'static {
    /// Whether values of this type are integral (`v` occupies `[v, v + 1)`)
    const INTEGRAL: bool;

    /// Check whether this value denotes a missing observation
    fn is_missing(&self) -> bool;

    /// Wrap a vector of this type into a [`Column`]
    fn into_column(data: Vec<Self>) -> Column;
}

macro_rules! impl_numeric_float {
    ($t:ty, $variant:ident) => {
        impl Numeric for $t {
            const INTEGRAL: bool = false;

            fn is_missing(&self) -> bool {
                self.is_nan()
            }

            fn into_column(data: Vec<Self>) -> Column {
                Column::$variant(data)
            }
        }
    };
}

macro_rules! impl_numeric_int {
    ($t:ty, $variant:ident) => {
        impl Numeric for $t {
            const INTEGRAL: bool = true;

            fn is_missing(&self) -> bool {
                false // Integers are always present
            }

            fn into_column(data: Vec<Self>) -> Column {
                Column::$variant(data)
            }
        }
    };
}

impl_numeric_float!(f64, F64);
impl_numeric_float!(f32, F32);
impl_numeric_int!(i64, I64);
impl_numeric_int!(i32, I32);
impl_numeric_int!(u64, U64);
impl_numeric_int!(u32, U32);

/// An owned, typed source array for one axis or variable
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I64(Vec<i64>),
    I32(Vec<i32>),
    U64(Vec<u64>),
    U32(Vec<u32>),
}

/// Apply `$body` to the inner vector of a column, whatever its element type
macro_rules! with_column {
    ($col:expr, $data:ident => $body:expr) => {
        match $col {
            Column::F64($data) => $body,
            Column::F32($data) => $body,
            Column::I64($data) => $body,
            Column::I32($data) => $body,
            Column::U64($data) => $body,
            Column::U32($data) => $body,
        }
    };
}

impl Column {
    /// Number of elements, missing ones included
    pub fn len(&self) -> usize {
        with_column!(self, data => data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the element type is integral
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Column::I64(_) | Column::I32(_) | Column::U64(_) | Column::U32(_)
        )
    }

    /// Name of the element type, for diagnostics
    pub fn dtype(&self) -> &'static str {
        match self {
            Column::F64(_) => "f64",
            Column::F32(_) => "f32",
            Column::I64(_) => "i64",
            Column::I32(_) => "i32",
            Column::U64(_) => "u64",
            Column::U32(_) => "u32",
        }
    }

    /// Element `i` as `f64`, or `None` if it is missing or out of bounds
    pub fn value(&self, i: usize) -> Option<f64> {
        with_column!(self, data => data
            .get(i)
            .filter(|v| !v.is_missing())
            .and_then(|v| v.to_f64()))
    }

    /// Element `i` as `i128`, which holds every supported integral value
    ///
    /// Returns `None` for floating columns and out-of-bounds indices.
    pub fn integer(&self, i: usize) -> Option<i128> {
        if !self.is_integral() {
            return None;
        }
        with_column!(self, data => data.get(i).and_then(|v| v.to_i128()))
    }

    /// Iterate all elements as `f64`, yielding `None` for missing ones
    pub fn iter_f64(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        (0..self.len()).map(move |i| self.value(i))
    }

    /// Number of non-missing elements
    pub fn valid_count(&self) -> usize {
        with_column!(self, data => data.iter().filter(|v| !v.is_missing()).count())
    }

    /// Minimum and maximum over non-missing elements
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.iter_f64().flatten().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Elements at `indices`, preserving the element type
    pub fn select(&self, indices: &[usize]) -> Column {
        with_column!(self, data => {
            indices
                .iter()
                .filter_map(|&i| data.get(i).copied())
                .collect::<Vec<_>>()
                .into()
        })
    }

    /// Copy into a `Vec<f64>`, missing elements becoming NaN
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.iter_f64().map(|v| v.unwrap_or(f64::NAN)).collect()
    }
}

impl<T: Numeric> From<Vec<T>> for Column {
    fn from(data: Vec<T>) -> Self {
        T::into_column(data)
    }
}

impl<T: Numeric> From<&[T]> for Column {
    fn from(data: &[T]) -> Self {
        T::into_column(data.to_vec())
    }
}
