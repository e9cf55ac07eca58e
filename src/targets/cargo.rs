// src/targets/cargo.rs

use crate::core::target::{
    FlagContext, FlagError, OptionValue, RunContext, Target, TargetRunner,
};
use crate::system::executor::{self, ExecOptions};
use crate::targets::parse_flags;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use regex::Regex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn cmdline(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

// --- vendor / clean-vendor ---

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct VendorFlags {
    /// Create the vendor directory at the given path.
    #[arg(long)]
    out: Option<String>,
}

fn handle_vendor_flags(ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
    let flags: VendorFlags = parse_flags(ctx)?;
    if let Some(out) = flags.out {
        ctx.options.set_str("out", out);
    }
    if !ctx.options.has_str("out") {
        ctx.options.set_str("out", "vendor");
    }
    Ok(())
}

struct VendorRunner;

impl TargetRunner for VendorRunner {
    fn handle_flags(&self, ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
        handle_vendor_flags(ctx)
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        let out = ctx.require_str("out")?;
        let opts = ExecOptions::in_dir(ctx.work_dir);
        let (out_sink, err_sink) = ctx.output.sinks();
        executor::run(
            &cmdline(&["cargo", "vendor", out.as_str()]),
            &opts,
            out_sink,
            err_sink,
        )?;
        Ok(())
    }
}

/// Creates a vendored copy of all dependencies.
pub fn vendor() -> Target {
    Target::new("vendor", VendorRunner)
        .describe("Creates a vendored copy of all dependencies via `cargo vendor`.")
        .pre_message("running cargo vendor command")
        .post_message("done running cargo vendor command")
}

struct CleanVendorRunner;

impl TargetRunner for CleanVendorRunner {
    fn handle_flags(&self, ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
        handle_vendor_flags(ctx)
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        let out = ctx.require_str("out")?;
        let path = ctx.work_dir.map_or_else(|| PathBuf::from(&out), |d| d.join(&out));

        match fs::remove_dir_all(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("removing vendor folder '{}'", path.display()))
            }
        }
    }
}

/// Removes the vendored dependencies folder.
pub fn clean_vendor() -> Target {
    Target::new("clean-vendor", CleanVendorRunner)
        .describe("Removes the vendored dependencies folder.")
        .pre_message("removing vendor folder")
        .post_message("done removing vendor folder")
}

// --- cargo-version ---

/// Prints the toolchain version. Mostly useful for testing the engine.
pub fn cargo_version() -> Target {
    Target::from_fn("cargo-version", |ctx: &mut RunContext<'_>| {
        let exec = executor::capture(
            &cmdline(&["cargo", "--version"]),
            &ExecOptions::in_dir(ctx.work_dir),
        )?;
        if !exec.success {
            return Err(anyhow!("cargo --version failed: {}", exec.stderr.trim()));
        }
        ctx.output.println(exec.stdout.trim());
        Ok(())
    })
    .pre_message("running cargo version")
    .post_message("done running cargo version")
}

// --- lint ---

/// Runs clippy. Findings are printed but do not fail the target; only a
/// broken invocation does.
pub fn lint() -> Target {
    Target::from_fn("lint", |ctx: &mut RunContext<'_>| {
        let exec = executor::capture(
            &cmdline(&["cargo", "clippy", "--all-targets", "--color", "always"]),
            &ExecOptions::in_dir(ctx.work_dir),
        )?;
        if !exec.success {
            ctx.output.print(&exec.stdout);
            ctx.output.print(&exec.stderr);
            return Ok(());
        }
        ctx.output.println("Congrats! Looking good!");
        Ok(())
    })
    .describe("Runs cargo clippy against the project's source.")
    .pre_message("running cargo clippy")
    .post_message("done running cargo clippy")
}

// --- coverage ---

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct CoverageFlags {
    /// Where to store coverage profiles (default: a temporary directory).
    #[arg(long)]
    coverdir: Option<String>,
}

struct CoverageRunner;

impl TargetRunner for CoverageRunner {
    fn handle_flags(&self, ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
        let flags: CoverageFlags = parse_flags(ctx)?;
        if let Some(dir) = flags.coverdir {
            ctx.options.set_str("coverdir", dir);
        }
        Ok(())
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        let coverdir = ctx
            .options
            .get_str("coverdir")
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        let integration: Vec<String> = ctx
            .settings
            .get_list("integration")
            .unwrap_or_default()
            .to_vec();

        if let Some(total) = combined_coverage(ctx, coverdir, &integration)? {
            ctx.output.println(format_args!("Total Coverage: {total}"));
        }
        Ok(())
    }
}

/// Computes combined unit + integration coverage.
///
/// Unit tests run under `cargo llvm-cov` without reporting; the integration
/// commands (themselves `cargo llvm-cov run --no-report` invocations, so
/// their binaries are instrumented) run next; finally the summary report is
/// parsed for the total percentage. All invocations share one cargo target
/// directory, so the report sees the profiles of every leg. Tool findings
/// (non-zero exits) are printed and end the computation without failing the
/// target, mirroring the lint policy.
fn combined_coverage(
    ctx: &mut RunContext<'_>,
    coverdir: Option<String>,
    integration: &[String],
) -> Result<Option<String>> {
    let _scratch: Option<tempfile::TempDir>;
    let dir: PathBuf = match coverdir {
        Some(given) => {
            match fs::create_dir(&given) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    ctx.output.println(
                        "Coverage output directory exists; you are responsible to clean it up before and after",
                    );
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("creating coverage directory '{given}'"));
                }
            }
            _scratch = None;
            PathBuf::from(given)
        }
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("taskforge-coverage")
                .tempdir()
                .context("creating temporary coverage directory")?;
            let path = tmp.path().to_path_buf();
            _scratch = Some(tmp);
            path
        }
    };

    ctx.output
        .println(format_args!("Coverage profiles stored in {}", dir.display()));

    let opts = coverage_exec_options(ctx.work_dir, &dir);

    ctx.output.println("Coverage using unit tests");
    let exec = executor::capture(&cmdline(&["cargo", "llvm-cov", "--no-report", "test"]), &opts)?;
    if !exec.success {
        ctx.output.print(&exec.stderr);
        return Ok(None);
    }

    if !integration.is_empty() {
        ctx.output.println("Coverage using integration");
    }
    for line in integration {
        ctx.output.println(format_args!("  Running: {line}"));
        let parts = shlex::split(line)
            .ok_or_else(|| anyhow!("could not split integration command: {line}"))?;
        let exec = executor::capture(&parts, &opts)?;
        if !exec.success {
            ctx.output.print(&exec.stderr);
            return Ok(None);
        }
    }

    let report = executor::capture(
        &cmdline(&["cargo", "llvm-cov", "report", "--summary-only"]),
        &opts,
    )?;
    if !report.success {
        ctx.output.print(&report.stderr);
        return Ok(None);
    }

    Ok(Some(parse_total(&report.stdout)?))
}

/// Execution settings shared by every coverage invocation. Pointing all of
/// them at the same cargo target directory is what lets the final report
/// merge the unit and integration profiles.
fn coverage_exec_options(work_dir: Option<&Path>, dir: &Path) -> ExecOptions {
    ExecOptions::in_dir(work_dir).env("CARGO_TARGET_DIR", dir.display().to_string())
}

/// Pulls the total line-coverage percentage out of a summary report.
fn parse_total(report: &str) -> Result<String> {
    let re = Regex::new(r"(?m)^TOTAL\b.*\s(\d+\.\d+)%\s*$")?;
    re.captures(report)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| anyhow!("parsing output of coverage tool (getting total)"))
}

/// Runs unit and integration tests to calculate combined coverage.
pub fn coverage() -> Target {
    Target::new("coverage", CoverageRunner)
        .describe("Runs both unit tests and integration commands to calculate coverage.")
        .pre_message("running coverage")
        .post_message("done running coverage")
        .setting(
            "integration",
            // Each command must build instrumented and leave its profile
            // where the report looks, hence `llvm-cov run --no-report`.
            // coverage itself cannot appear here (it would recurse).
            OptionValue::List(vec![
                "cargo llvm-cov run --no-report --quiet -- cargo-version".to_string(),
            ]),
        )
}
