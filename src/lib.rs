//! # taskforge
//!
//! A programmable substitute for a traditional build-automation tool.
//! Targets are plain Rust values carrying a [`core::target::TargetRunner`]
//! implementation; a [`core::maker::Maker`] resolves one target name per
//! invocation, runs its pre-requisite targets first, executes the target's
//! own action, and finally runs any deferred cleanup targets.

pub mod constants;
pub mod core;
pub mod system;
pub mod targets;

#[cfg(test)]
pub(crate) mod test_support;
