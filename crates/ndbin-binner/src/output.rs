//! Per-variable results shaped by the axes

use ndbin_aggregate::BinnedValues;
use ndbin_core::flatten_coords;

/// Result of one variable over the binning grid
///
/// Values are stored flat with the first axis varying fastest; `shape[i]` is
/// the bin count of axis `i`. Use [`get`](Self::get) to read a cell by its
/// per-axis coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Binned {
    name: String,
    shape: Vec<usize>,
    values: BinnedValues,
}

impl Binned {
    pub(crate) fn new(name: String, shape: Vec<usize>, values: BinnedValues) -> Self {
        Self {
            name,
            shape,
            values,
        }
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bin count per axis, first axis first
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat values
    pub fn values(&self) -> &BinnedValues {
        &self.values
    }

    pub fn into_values(self) -> BinnedValues {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at `coords` widened to `f64`
    ///
    /// `None` for a missing bin or out-of-range coordinates.
    pub fn get(&self, coords: &[usize]) -> Option<f64> {
        flatten_coords(coords, &self.shape).and_then(|bin| self.values.get_f64(bin))
    }

    pub fn counts(&self) -> Option<&[u64]> {
        self.values.as_counts()
    }

    pub fn integers(&self) -> Option<&[Option<i128>]> {
        self.values.as_integers()
    }

    pub fn floats(&self) -> Option<&[Option<f64>]> {
        self.values.as_floats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_coords() {
        // 3 x 2 grid, x fastest
        let binned = Binned::new(
            "w".to_string(),
            vec![3, 2],
            BinnedValues::Counts(vec![0, 1, 2, 10, 11, 12]),
        );
        assert_eq!(binned.get(&[0, 0]), Some(0.0));
        assert_eq!(binned.get(&[2, 0]), Some(2.0));
        assert_eq!(binned.get(&[1, 1]), Some(11.0));
        assert_eq!(binned.get(&[3, 0]), None);
        assert_eq!(binned.get(&[0]), None);
        assert_eq!(binned.len(), 6);
    }

    #[test]
    fn test_missing_cell() {
        let binned = Binned::new("w".to_string(), vec![2], BinnedValues::Floats(vec![Some(1.5), None]));
        assert_eq!(binned.get(&[0]), Some(1.5));
        assert_eq!(binned.get(&[1]), None);
        assert!(binned.counts().is_none());
        assert_eq!(binned.floats().map(|v| v.len()), Some(2));
    }
}
