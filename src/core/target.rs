// src/core/target.rs

use crate::core::output::Output;
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Validation error produced by a target's flag handler.
#[derive(Error, Debug)]
pub enum FlagError {
    #[error("{target}: flag --{flag} is required")]
    MissingFlag { target: String, flag: &'static str },
    #[error("{target}: {message}")]
    Invalid { target: String, message: String },
}

/// A typed value held in a target's option or settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Bool(bool),
    /// An ordered list of strings (e.g. command lines to be split later).
    List(Vec<String>),
}

/// A typed key/value store for per-target configuration.
///
/// Accessors check the stored variant, so a mismatched read surfaces as an
/// absent value instead of a runtime type assertion blowing up inside an
/// action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<String, OptionValue>);

impl Options {
    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), OptionValue::Str(value.into()));
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.0.insert(key.into(), OptionValue::Bool(value));
    }

    pub fn set_list(&mut self, key: impl Into<String>, value: Vec<String>) {
        self.0.insert(key.into(), OptionValue::List(value));
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(OptionValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(OptionValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        match self.0.get(key) {
            Some(OptionValue::List(l)) => Some(l.as_slice()),
            _ => None,
        }
    }

    /// True when the key holds a non-empty string.
    pub fn has_str(&self, key: &str) -> bool {
        self.get_str(key).is_some_and(|s| !s.is_empty())
    }
}

/// The view a flag handler gets: the target's raw argument tokens and its
/// mutable option store.
#[derive(Debug)]
pub struct FlagContext<'a> {
    pub name: &'a str,
    pub flag_args: &'a [String],
    pub options: &'a mut Options,
}

impl FlagContext<'_> {
    /// A `flag --<name> is required` error for this target.
    pub fn missing(&self, flag: &'static str) -> FlagError {
        FlagError::MissingFlag {
            target: self.name.to_string(),
            flag,
        }
    }

    /// A free-form validation error for this target.
    pub fn invalid(&self, message: impl Into<String>) -> FlagError {
        FlagError::Invalid {
            target: self.name.to_string(),
            message: message.into(),
        }
    }

    /// Fails unless `key` ended up holding a non-empty string, either seeded
    /// on the target or supplied on the command line.
    pub fn ensure_str(&self, key: &'static str) -> Result<(), FlagError> {
        if self.options.has_str(key) {
            Ok(())
        } else {
            Err(self.missing(key))
        }
    }
}

/// The handle a running action gets back to its owning orchestrator.
///
/// Bound by the orchestrator immediately before the action runs; its lifetime
/// is the run call. Actions reach the output sinks only through this handle.
pub struct RunContext<'a> {
    pub name: &'a str,
    pub options: &'a Options,
    pub settings: &'a Options,
    pub work_dir: Option<&'a Path>,
    pub output: &'a mut Output,
}

impl fmt::Debug for RunContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("name", &self.name)
            .field("work_dir", &self.work_dir)
            .finish_non_exhaustive()
    }
}

impl RunContext<'_> {
    /// Reads a string option the flag handler was supposed to guarantee.
    /// Returns an owned value so the context stays free for output calls.
    pub fn require_str(&self, key: &str) -> Result<String> {
        self.options
            .get_str(key)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| anyhow!("{}: flag --{key} is required", self.name))
    }
}

/// The contract every target variant implements: parse its own flags, then
/// do the work.
pub trait TargetRunner {
    /// Parses `ctx.flag_args` into `ctx.options`. The default accepts
    /// anything, for targets without flags.
    fn handle_flags(&self, _ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
        Ok(())
    }

    /// The target's action. Failures are reported through the result, never
    /// by terminating the process.
    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()>;
}

/// Adapter turning a plain function or closure into a runner without flags.
pub struct RunFn<F>(pub F);

impl<F> fmt::Debug for RunFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunFn").finish_non_exhaustive()
    }
}

impl<F> TargetRunner for RunFn<F>
where
    F: Fn(&mut RunContext<'_>) -> Result<()>,
{
    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        (self.0)(ctx)
    }
}

/// A named, self-describing unit of work.
///
/// Built once, registered with a [`Maker`](crate::core::maker::Maker) and
/// invoked by name. Pre-targets run before the action, fail-fast; deferred
/// targets are guaranteed to run after the action attempt, success or
/// failure.
pub struct Target {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) flag_args: Vec<String>,
    pub(crate) options: Options,
    pub(crate) pre_messages: Vec<String>,
    pub(crate) post_messages: Vec<String>,
    pub(crate) pre_targets: Vec<Target>,
    pub(crate) deferred_targets: Vec<Target>,
    pub(crate) work_dir: Option<PathBuf>,
    pub(crate) settings: Options,
    pub(crate) runner: Box<dyn TargetRunner>,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("pre_targets", &self.pre_targets)
            .field("deferred_targets", &self.deferred_targets)
            .finish_non_exhaustive()
    }
}

impl Target {
    pub fn new(name: impl Into<String>, runner: impl TargetRunner + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            flag_args: Vec::new(),
            options: Options::default(),
            pre_messages: Vec::new(),
            post_messages: Vec::new(),
            pre_targets: Vec::new(),
            deferred_targets: Vec::new(),
            work_dir: None,
            settings: Options::default(),
            runner: Box::new(runner),
        }
    }

    /// A target whose action is a plain function or closure and which takes
    /// no flags.
    pub fn from_fn<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut RunContext<'_>) -> Result<()> + 'static,
    {
        Self::new(name, RunFn(action))
    }

    /// The unique, CLI-visible name. Immutable after construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The optional one-line summary shown in the listing.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    // --- Builder-style composition ---

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn pre_message(mut self, text: impl Into<String>) -> Self {
        self.pre_messages.push(text.into());
        self
    }

    pub fn post_message(mut self, text: impl Into<String>) -> Self {
        self.post_messages.push(text.into());
        self
    }

    /// Appends a target to run, in order, before this target's action.
    pub fn pre_target(mut self, target: Target) -> Self {
        self.pre_targets.push(target);
        self
    }

    /// Appends a target guaranteed to run after the action attempt.
    pub fn deferred_target(mut self, target: Target) -> Self {
        self.deferred_targets.push(target);
        self
    }

    /// Overrides the directory the action's subprocesses execute in.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Seeds an option before any flag parsing happens.
    pub fn option(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        match value {
            OptionValue::Str(s) => self.options.set_str(key, s),
            OptionValue::Bool(b) => self.options.set_bool(key, b),
            OptionValue::List(l) => self.options.set_list(key, l),
        }
        self
    }

    /// Sets a piece of static configuration not meant to be overridden by
    /// flags.
    pub fn setting(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        match value {
            OptionValue::Str(s) => self.settings.set_str(key, s),
            OptionValue::Bool(b) => self.settings.set_bool(key, b),
            OptionValue::List(l) => self.settings.set_list(key, l),
        }
        self
    }

    /// Pre-sets raw flag arguments, as if they had been passed on the
    /// command line.
    pub fn flag_args(mut self, args: Vec<String>) -> Self {
        self.flag_args = args;
        self
    }
}
