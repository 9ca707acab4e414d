//! Name-based lookup of aggregator factories
//!
//! The registry is populated explicitly: [`Registry::with_defaults`] holds
//! the built-in kernels, and applications [`register`](Registry::register)
//! their own factories before building binners from configuration. Names
//! match case-insensitively.

use crate::action::Action;
use crate::kernels::KernelFactory;
use crate::traits::AggregatorFactory;
use ndbin_core::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps action names to aggregator factories
#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<String, Arc<dyn AggregatorFactory>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding Count, Sum, Avg, StdDev, Min and Max
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for factory in KernelFactory::builtins() {
            registry.register(factory);
        }
        registry
    }

    /// Add a factory under its own name, returning any factory it replaces
    pub fn register<A: AggregatorFactory + 'static>(
        &mut self,
        factory: A,
    ) -> Option<Arc<dyn AggregatorFactory>> {
        self.factories
            .insert(factory.name().to_ascii_lowercase(), Arc::new(factory))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AggregatorFactory>> {
        self.factories.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names, as the factories spell them
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.values().map(|factory| factory.name())
    }

    /// Resolve `name` into an [`Action`]
    ///
    /// Registered factories win, including one registered under `"Count"`.
    /// An unregistered `"Count"` still resolves to the default
    /// [`Action::Count`]; any other name must be registered.
    pub fn action(&self, name: &str) -> Result<Action> {
        match self.get(name) {
            Some(factory) => Ok(Action::Aggregator(factory)),
            None if name.eq_ignore_ascii_case("count") => Ok(Action::Count),
            None => Err(Error::unknown_action(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::Sum;
    use crate::traits::Aggregator;

    struct DoubleSum;

    impl AggregatorFactory for DoubleSum {
        fn name(&self) -> &str {
            "Sum"
        }

        fn create(&self, n_bins: usize) -> Box<dyn Aggregator> {
            Box::new(Sum::new(n_bins * 2))
        }
    }

    #[test]
    fn test_defaults() {
        let registry = Registry::with_defaults();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["Avg", "Count", "Max", "Min", "StdDev", "Sum"]);
        assert!(registry.contains("stddev"));
        assert!(registry.contains("AVG"));
    }

    #[test]
    fn test_action_resolution() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.action("Count").unwrap().name(), "Count");
        assert_eq!(registry.action("count").unwrap().name(), "Count");
        assert_eq!(registry.action("sum").unwrap().name(), "Sum");

        let err = registry.action("Median").unwrap_err();
        assert!(matches!(err, Error::UnknownAction(name) if name == "Median"));
    }

    #[test]
    fn test_count_resolves_without_registration() {
        assert!(matches!(Registry::new().action("Count"), Ok(Action::Count)));
        assert!(Registry::new().action("Sum").is_err());
    }

    #[test]
    fn test_replaced_count_is_reachable() {
        struct Tally;

        impl AggregatorFactory for Tally {
            fn name(&self) -> &str {
                "Count"
            }

            fn create(&self, n_bins: usize) -> Box<dyn Aggregator> {
                Box::new(Sum::new(n_bins + 1))
            }
        }

        let mut registry = Registry::with_defaults();
        registry.register(Tally);
        let Action::Aggregator(factory) = registry.action("count").unwrap() else {
            panic!("expected the registered factory");
        };
        assert_eq!(factory.create(2).result().len(), 3);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = Registry::with_defaults();
        let previous = registry.register(DoubleSum);
        assert_eq!(previous.map(|f| f.name().to_string()), Some("Sum".to_string()));
        let agg = registry.get("Sum").unwrap().create(3);
        assert_eq!(agg.result().len(), 6);
    }
}
