// src/core/help.rs

use crate::constants::{HELP_DESC_INDENT, HELP_HEADER, HELP_NAME_INDENT};
use crate::core::registry::Registry;
use std::fmt::Write;

/// Renders the listing of all registered targets.
///
/// Pure function of the registry: a header line, then for each target (in
/// ascending name order) an indented name line and, when present, a
/// further-indented description line. Calling it twice on an unmodified
/// registry yields byte-identical output.
pub fn available_targets(registry: &Registry) -> String {
    let mut help = String::from(HELP_HEADER);
    help.push('\n');

    for target in registry.iter() {
        let _ = writeln!(help, "{HELP_NAME_INDENT}{}", target.name());
        if let Some(desc) = target.description() {
            if !desc.is_empty() {
                let _ = writeln!(help, "{HELP_DESC_INDENT}{desc}");
            }
        }
    }

    help
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::target::{RunContext, Target};
    use anyhow::Result;

    fn noop(_ctx: &mut RunContext<'_>) -> Result<()> {
        Ok(())
    }

    #[test]
    fn listing_is_sorted_and_indented() {
        let mut registry = Registry::new();
        registry.register(Target::from_fn("beta", noop)).unwrap();
        registry
            .register(Target::from_fn("alpha", noop).describe("First of the two."))
            .unwrap();

        let exp = "Available targets:\n   alpha\n      First of the two.\n   beta\n";
        assert_eq!(available_targets(&registry), exp);
    }

    #[test]
    fn listing_is_idempotent() {
        let mut registry = Registry::new();
        registry.register(Target::from_fn("vendor", noop)).unwrap();
        registry.register(Target::from_fn("lint", noop)).unwrap();

        let first = available_targets(&registry);
        let second = available_targets(&registry);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_description_is_omitted() {
        let mut registry = Registry::new();
        registry
            .register(Target::from_fn("alpha", noop).describe(""))
            .unwrap();

        assert_eq!(available_targets(&registry), "Available targets:\n   alpha\n");
    }
}
