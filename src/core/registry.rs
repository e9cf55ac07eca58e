// src/core/registry.rs

use crate::core::target::Target;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("target {0} cannot be registered more than once")]
    DuplicateName(String),
}

/// The unique-keyed collection of all targets known to one orchestrator.
///
/// Backed by a `BTreeMap` so listing order is the names' lexicographic
/// order, independent of registration order.
#[derive(Debug, Default)]
pub struct Registry {
    targets: BTreeMap<String, Target>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a target under its name.
    ///
    /// A duplicate name is a programming error in target composition, never
    /// a silent overwrite; the caller treats it as fatal.
    pub fn register(&mut self, target: Target) -> Result<(), RegistryError> {
        if self.targets.contains_key(target.name()) {
            return Err(RegistryError::DuplicateName(target.name().to_string()));
        }
        log::debug!("Registered target '{}'", target.name());
        self.targets.insert(target.name().to_string(), target);
        Ok(())
    }

    /// Pure read; an absent name is a normal outcome, not a defect.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.get_mut(name)
    }

    /// Target names in ascending lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Targets in ascending name order, for the listing.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::target::RunContext;
    use anyhow::Result;

    fn noop(_ctx: &mut RunContext<'_>) -> Result<()> {
        Ok(())
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::new();
        registry.register(Target::from_fn("vendor", noop)).unwrap();

        let err = registry.register(Target::from_fn("vendor", noop)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "target vendor cannot be registered more than once"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_sorted_regardless_of_registration_order() {
        let mut registry = Registry::new();
        registry.register(Target::from_fn("beta", noop)).unwrap();
        registry.register(Target::from_fn("alpha", noop)).unwrap();
        registry.register(Target::from_fn("gamma", noop)).unwrap();

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        let mut registry = Registry::new();
        assert!(registry.lookup_mut("nothing").is_none());
    }
}
