// src/targets/docker.rs

use crate::core::target::{FlagContext, FlagError, RunContext, Target, TargetRunner};
use crate::system::executor::{self, ExecOptions};
use crate::targets::parse_flags;
use anyhow::Result;
use clap::Parser;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// The registry implied when none is given.
const DEFAULT_REGISTRY: &str = "docker.io";

fn docker(args: &[&str]) -> Vec<String> {
    let mut cmd = vec!["docker".to_string()];
    cmd.extend(args.iter().map(ToString::to_string));
    cmd
}

fn exec_docker(ctx: &mut RunContext<'_>, args: &[&str]) -> Result<()> {
    if let Some(dir) = ctx.work_dir {
        ctx.output
            .println(format_args!("executing in directory: {}", dir.display()));
    }
    let opts = ExecOptions::in_dir(ctx.work_dir);
    let (out_sink, err_sink) = ctx.output.sinks();
    executor::run(&docker(args), &opts, out_sink, err_sink)?;
    Ok(())
}

/// `image:tag`, prefixed with the registry when one is set.
fn full_tag(registry: Option<&str>, image: &str, tag: &str) -> String {
    match registry {
        Some(r) => format!("{}/{image}:{tag}", r.trim_end_matches('/')),
        None => format!("{image}:{tag}"),
    }
}

// --- docker-build ---

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct BuildFlags {
    /// Docker registry to be used when naming the image.
    #[arg(long)]
    registry: Option<String>,
    /// Docker image name.
    #[arg(long)]
    image: Option<String>,
    /// Docker image tag (usually a version).
    #[arg(long)]
    tag: Option<String>,
}

struct BuildRunner;

impl TargetRunner for BuildRunner {
    fn handle_flags(&self, ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
        let flags: BuildFlags = parse_flags(ctx)?;

        if let Some(registry) = flags.registry {
            // "local" is an alias for the public registry.
            let registry = if registry == "local" {
                DEFAULT_REGISTRY.to_string()
            } else {
                registry
            };
            ctx.options.set_str("registry", registry);
        }

        if let Some(image) = flags.image {
            ctx.options.set_str("image", image);
        }
        if ctx.options.get_str("registry") == Some(DEFAULT_REGISTRY) {
            // The public registry only accepts `library/<name>`.
            if let Some(image) = ctx.options.get_str("image").filter(|s| !s.is_empty()) {
                let short = image.rsplit('/').next().unwrap_or(image).to_string();
                ctx.options.set_str("image", format!("library/{short}"));
            }
        }
        ctx.ensure_str("image")?;

        if let Some(tag) = flags.tag {
            ctx.options.set_str("tag", tag);
        }
        ctx.ensure_str("tag")?;

        Ok(())
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        let image = ctx.require_str("image")?;
        let tag = ctx.require_str("tag")?;
        let registry = ctx
            .options
            .get_str("registry")
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        if registry.is_none() {
            ctx.output
                .println("Note: registry not set, default docker.io/library will be used.");
        }

        let full = full_tag(registry.as_deref(), &image, &tag);
        exec_docker(ctx, &["build", "--tag", full.as_str(), "."])
    }
}

/// Builds a container image from the Dockerfile in the working directory.
pub fn docker_build() -> Target {
    Target::new("docker-build", BuildRunner)
        .describe("Builds a container image from the local Dockerfile.")
        .pre_message("building image")
        .post_message("done building Docker image")
}

// --- docker-buildx ---

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct BuildXFlags {
    /// Docker registry to push to (authentication must be done before).
    #[arg(long)]
    registry: Option<String>,
    /// Docker image name.
    #[arg(long)]
    image: Option<String>,
    /// Docker image tag (usually a version).
    #[arg(long)]
    tag: Option<String>,
    /// Platforms to build for (comma separated).
    #[arg(long)]
    platform: Option<String>,
}

struct BuildXRunner;

impl TargetRunner for BuildXRunner {
    fn handle_flags(&self, ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
        let flags: BuildXFlags = parse_flags(ctx)?;

        if let Some(registry) = flags.registry {
            ctx.options.set_str("registry", registry);
        }
        ctx.ensure_str("registry")?;

        if let Some(image) = flags.image {
            ctx.options.set_str("image", image);
        }
        ctx.ensure_str("image")?;

        if let Some(tag) = flags.tag {
            ctx.options.set_str("tag", tag);
        }
        ctx.ensure_str("tag")?;

        if let Some(platform) = flags.platform {
            ctx.options.set_str("platform", platform);
        }
        if !ctx.options.has_str("platform") {
            ctx.options.set_str("platform", "linux/arm64,linux/amd64");
        }

        Ok(())
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        let registry = ctx.require_str("registry")?;
        let image = ctx.require_str("image")?;
        let tag = ctx.require_str("tag")?;
        let platform = ctx.require_str("platform")?;

        let full = full_tag(Some(&registry), &image, &tag);
        let builder = builder_name();

        exec_docker(
            ctx,
            &[
                "buildx",
                "create",
                "--name",
                builder.as_str(),
                "--driver",
                "docker-container",
                "--use",
            ],
        )?;

        // The temporary builder is removed on every exit path from here on.
        let builder_to_remove = builder.clone();
        let mut ctx = scopeguard::guard(ctx, move |ctx| {
            let _ = exec_docker(ctx, &["buildx", "rm", "-f", builder_to_remove.as_str()]);
        });

        exec_docker(
            &mut **ctx,
            &[
                "buildx",
                "build",
                "--builder",
                builder.as_str(),
                "--platform",
                platform.as_str(),
                "--tag",
                full.as_str(),
                "--push",
                ".",
            ],
        )
    }
}

/// A name unlikely to collide with an existing buildx builder.
fn builder_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.subsec_nanos());
    format!("taskforge-temporary-{}-{nanos}", process::id())
}

/// Builds and pushes a multi-platform image through a temporary buildx
/// builder.
pub fn docker_buildx() -> Target {
    Target::new("docker-buildx", BuildXRunner)
        .describe("Builds and pushes a multi-platform container image.")
        .pre_message("building image")
        .post_message("done building Docker image")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::maker::Maker;
    use crate::core::target::Options;
    use crate::test_support::captured;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn build_required_flags_are_enforced() {
        let cases = [
            ("image", vec!["--tag", "0.9.0"]),
            ("tag", vec!["--image", "example"]),
        ];

        for (missing, given) in cases {
            let (output, _out, err) = captured();
            let mut maker = Maker::with_output(output);
            maker.register(docker_build()).unwrap();

            let mut argv = vec!["docker-build"];
            argv.extend(given);
            assert_eq!(maker.run(&args(&argv)), 1, "case --{missing}");
            assert_eq!(
                err.contents().trim_end(),
                format!("Error: docker-build: flag --{missing} is required")
            );
        }
    }

    #[test]
    fn buildx_required_flags_are_enforced() {
        let cases = [
            ("registry", vec!["--image", "example", "--tag", "0.9.0"]),
            ("image", vec!["--registry", "fake.example.com", "--tag", "0.9.0"]),
            (
                "tag",
                vec!["--image", "example", "--registry", "fake.example.com"],
            ),
        ];

        for (missing, given) in cases {
            let (output, _out, err) = captured();
            let mut maker = Maker::with_output(output);
            maker.register(docker_buildx()).unwrap();

            let mut argv = vec!["docker-buildx"];
            argv.extend(given);
            assert_eq!(maker.run(&args(&argv)), 1, "case --{missing}");
            assert_eq!(
                err.contents().trim_end(),
                format!("Error: docker-buildx: flag --{missing} is required")
            );
        }
    }

    #[test]
    fn local_registry_maps_to_the_public_one_and_namespaces_the_image() {
        let flag_args = args(&[
            "--registry",
            "local",
            "--image",
            "somewhere/example",
            "--tag",
            "0.9.0",
        ]);
        let mut options = Options::default();
        let mut ctx = FlagContext {
            name: "docker-build",
            flag_args: &flag_args,
            options: &mut options,
        };
        BuildRunner.handle_flags(&mut ctx).unwrap();

        assert_eq!(options.get_str("registry"), Some("docker.io"));
        assert_eq!(options.get_str("image"), Some("library/example"));
        assert_eq!(options.get_str("tag"), Some("0.9.0"));
    }

    #[test]
    fn buildx_platform_has_a_default() {
        let flag_args = args(&[
            "--registry",
            "fake.example.com",
            "--image",
            "example",
            "--tag",
            "0.9.0",
        ]);
        let mut options = Options::default();
        let mut ctx = FlagContext {
            name: "docker-buildx",
            flag_args: &flag_args,
            options: &mut options,
        };
        BuildXRunner.handle_flags(&mut ctx).unwrap();

        assert_eq!(options.get_str("platform"), Some("linux/arm64,linux/amd64"));
    }

    #[test]
    fn full_tag_joins_registry_image_and_tag() {
        assert_eq!(
            full_tag(Some("ghcr.io/"), "owner/app", "1.2.3"),
            "ghcr.io/owner/app:1.2.3"
        );
        assert_eq!(full_tag(None, "app", "latest"), "app:latest");
    }
}
