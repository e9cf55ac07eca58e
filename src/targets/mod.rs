//! # Stock Target Library
//!
//! Pre-built targets implementing the engine's target contract. Each one is
//! a thin wrapper around an external command-line tool; the engine treats
//! them like any caller-registered target.
//!
//! - **`cargo`**: vendoring, toolchain version, linting and test coverage.
//! - **`docker`**: building and multi-platform pushing of container images.
//! - **`badges`**: fetching shields.io badge images from a JSON config.

use crate::core::target::Target;
use clap::Parser;

pub mod badges;
pub mod cargo;
pub mod docker;

/// All stock targets, ready to be registered with a `Maker`.
pub fn stock() -> Vec<Target> {
    vec![
        badges::badges(),
        cargo::cargo_version(),
        cargo::clean_vendor(),
        cargo::coverage(),
        cargo::lint(),
        cargo::vendor(),
        docker::docker_build(),
        docker::docker_buildx(),
    ]
}

/// Parses a target's raw flag arguments with a clap derive struct.
///
/// The struct must set `#[command(no_binary_name = true)]` since the tokens
/// start right after the target name.
pub(crate) fn parse_flags<T: Parser>(
    ctx: &crate::core::target::FlagContext<'_>,
) -> Result<T, crate::core::target::FlagError> {
    T::try_parse_from(ctx.flag_args).map_err(|e| ctx.invalid(e.to_string()))
}
