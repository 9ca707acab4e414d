//! Flat per-bin results produced by actions

/// Result of one action over all `N` bins, in flat bin order
///
/// `None` marks a bin no data contributed to. Counts have no such marker:
/// an empty bin simply counts zero. Integral results are `i128` so that both
/// signed and unsigned 64-bit input keep their exact values.
#[derive(Debug, Clone, PartialEq)]
pub enum BinnedValues {
    Counts(Vec<u64>),
    Integers(Vec<Option<i128>>),
    Floats(Vec<Option<f64>>),
}

impl BinnedValues {
    /// Number of bins
    pub fn len(&self) -> usize {
        match self {
            BinnedValues::Counts(v) => v.len(),
            BinnedValues::Integers(v) => v.len(),
            BinnedValues::Floats(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_counts(&self) -> Option<&[u64]> {
        match self {
            BinnedValues::Counts(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integers(&self) -> Option<&[Option<i128>]> {
        match self {
            BinnedValues::Integers(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[Option<f64>]> {
        match self {
            BinnedValues::Floats(v) => Some(v),
            _ => None,
        }
    }

    /// Value of `bin` widened to `f64`; `None` when missing or out of range
    pub fn get_f64(&self, bin: usize) -> Option<f64> {
        match self {
            BinnedValues::Counts(v) => v.get(bin).map(|&c| c as f64),
            BinnedValues::Integers(v) => v.get(bin).copied().flatten().map(|x| x as f64),
            BinnedValues::Floats(v) => v.get(bin).copied().flatten(),
        }
    }

    /// Whether `bin` holds the missing marker
    pub fn is_missing(&self, bin: usize) -> bool {
        match self {
            BinnedValues::Counts(_) => false,
            BinnedValues::Integers(v) => matches!(v.get(bin), Some(None)),
            BinnedValues::Floats(v) => matches!(v.get(bin), Some(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_marker() {
        let counts = BinnedValues::Counts(vec![0, 3]);
        assert!(!counts.is_missing(0));
        assert_eq!(counts.get_f64(1), Some(3.0));

        let sums = BinnedValues::Integers(vec![Some(4), None]);
        assert!(sums.is_missing(1));
        assert_eq!(sums.get_f64(0), Some(4.0));
        assert_eq!(sums.get_f64(1), None);
        assert_eq!(sums.as_floats(), None);
    }
}
