// src/core/maker.rs

use crate::constants::HELP_TARGET;
use crate::core::help;
use crate::core::output::Output;
use crate::core::registry::{Registry, RegistryError};
use crate::core::target::{FlagContext, RunContext, Target};

/// The orchestrator: owns the registry and the output sinks, resolves one
/// requested target per `run` call and drives the run algorithm end to end.
///
/// Construction is explicit; the thin process entry point holds the only
/// process-wide instance. A `Maker` keeps no state between `run` calls.
#[derive(Debug, Default)]
pub struct Maker {
    registry: Registry,
    output: Output,
}

impl Maker {
    /// An orchestrator writing to the process stdout/stderr.
    pub fn new() -> Self {
        Self::default()
    }

    /// An orchestrator writing to the given sinks. This is how tests observe
    /// behavior without process-level capture.
    pub fn with_output(output: Output) -> Self {
        Self {
            registry: Registry::new(),
            output,
        }
    }

    /// Registers one target. A duplicate name is a configuration error the
    /// caller must treat as fatal.
    pub fn register(&mut self, target: Target) -> Result<(), RegistryError> {
        self.registry.register(target)
    }

    /// Registers targets in order, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        targets: impl IntoIterator<Item = Target>,
    ) -> Result<(), RegistryError> {
        for target in targets {
            self.registry.register(target)?;
        }
        Ok(())
    }

    /// Read access to the registry, for the listing.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolves `args[0]` as a target name, forwards `args[1..]` as that
    /// target's flag arguments and runs its dependency chain.
    ///
    /// Returns the process exit code: 0 for success or the listing view, 1
    /// for an empty registry, an unknown name, a flag-validation failure or
    /// an action failure.
    pub fn run(&mut self, args: &[String]) -> i32 {
        let Self { registry, output } = self;

        if registry.is_empty() {
            output.error("no targets available");
            return 1;
        }

        let listing = help::available_targets(registry);

        let Some((name, flag_args)) = args.split_first() else {
            output.print(&listing);
            return 0;
        };

        if name == HELP_TARGET {
            output.print(&listing);
            return 0;
        }

        let Some(target) = registry.lookup_mut(name) else {
            output.error(format_args!(
                "target {name} not available\n\n{}",
                listing.trim_end()
            ));
            return 1;
        };

        // Only the target the user asked for receives the CLI flag
        // arguments; its dependencies keep whatever they were defined with.
        target.flag_args = flag_args.to_vec();

        execute_one(output, target)
    }
}

/// Runs each target in order, fail-fast: the first non-zero result is
/// returned without executing the rest. An empty sequence is a success.
fn execute_chain(output: &mut Output, targets: &mut [Target]) -> i32 {
    for target in targets {
        let code = execute_one(output, target);
        if code != 0 {
            return code;
        }
    }
    0
}

/// Runs one target: flags, pre-messages, pre-targets, action, post-messages.
///
/// Deferred targets are scheduled through a scope guard right after the
/// pre-messages, so they run on every exit path out of the rest of the
/// procedure; their own results never change this target's code.
fn execute_one(output: &mut Output, target: &mut Target) -> i32 {
    log::debug!("Running target '{}'", target.name);

    let mut flag_ctx = FlagContext {
        name: &target.name,
        flag_args: &target.flag_args,
        options: &mut target.options,
    };
    if let Err(err) = target.runner.handle_flags(&mut flag_ctx) {
        output.error(err);
        return 1;
    }

    for msg in &target.pre_messages {
        output.message(msg);
    }

    let Target {
        name,
        runner,
        options,
        settings,
        work_dir,
        pre_targets,
        deferred_targets,
        post_messages,
        ..
    } = target;

    let mut output = scopeguard::guard(output, |out| {
        let _ = execute_chain(out, deferred_targets);
    });

    let code = execute_chain(&mut **output, pre_targets);
    if code != 0 {
        return code;
    }

    let mut ctx = RunContext {
        name: name.as_str(),
        options,
        settings,
        work_dir: work_dir.as_deref(),
        output: &mut **output,
    };
    if let Err(err) = runner.run(&mut ctx) {
        output.error(err);
        return 1;
    }

    for msg in post_messages.iter() {
        output.message(msg);
    }

    0
}
