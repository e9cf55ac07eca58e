// src/targets/badges.rs

use crate::core::target::{FlagContext, FlagError, RunContext, Target, TargetRunner};
use crate::system::executor::{self, ExecOptions};
use crate::targets::parse_flags;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = "_badges/badge.json";
const DEFAULT_DEST: &str = "_badges/";

/// The JSON badge definition file: which shields.io images to fetch and the
/// file names to store them under.
#[derive(Deserialize, Debug)]
struct BadgeConfig {
    badges: Vec<BadgeSpec>,
}

#[derive(Deserialize, Debug)]
struct BadgeSpec {
    /// File name within the destination folder, e.g. `coverage.svg`.
    file: String,
    /// Full shields.io URL to fetch.
    url: String,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct BadgesFlags {
    /// Configuration file listing the badges to generate.
    #[arg(long)]
    config: Option<String>,
    /// Folder in which fetched badges will be stored.
    #[arg(long)]
    dest: Option<String>,
}

struct BadgesRunner;

impl TargetRunner for BadgesRunner {
    fn handle_flags(&self, ctx: &mut FlagContext<'_>) -> Result<(), FlagError> {
        let flags: BadgesFlags = parse_flags(ctx)?;

        if let Some(config) = flags.config {
            ctx.options.set_str("config", config);
        }
        if !ctx.options.has_str("config") {
            ctx.options.set_str("config", DEFAULT_CONFIG);
        }

        if let Some(dest) = flags.dest {
            ctx.options.set_str("dest", dest);
        }
        if !ctx.options.has_str("dest") {
            ctx.options.set_str("dest", DEFAULT_DEST);
        }

        Ok(())
    }

    fn run(&self, ctx: &mut RunContext<'_>) -> Result<()> {
        let config_path = ctx.require_str("config")?;
        let dest = ctx.require_str("dest")?;

        let config = load_config(Path::new(&config_path))?;

        fs::create_dir_all(&dest)
            .with_context(|| format!("creating badge folder '{dest}'"))?;

        for badge in &config.badges {
            let out_file = Path::new(&dest).join(&badge.file);
            ctx.output.println(format_args!(
                "fetching {} into {}",
                badge.url,
                out_file.display()
            ));

            let cmd = vec![
                "curl".to_string(),
                "-fsSL".to_string(),
                "-o".to_string(),
                out_file.display().to_string(),
                badge.url.clone(),
            ];

            let opts = ExecOptions::in_dir(ctx.work_dir);
            let (out_sink, err_sink) = ctx.output.sinks();
            executor::run(&cmd, &opts, out_sink, err_sink)
                .with_context(|| format!("fetching badge '{}'", badge.file))?;
        }

        Ok(())
    }
}

fn load_config(path: &Path) -> Result<BadgeConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading badge configuration '{}'", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("parsing badge configuration '{}'", path.display()))
}

/// Fetches shields.io badge images, e.g. for showing on a repository page.
pub fn badges() -> Target {
    Target::new("badges", BadgesRunner)
        .describe("Fetches shields.io badges defined in a JSON configuration file.")
        .pre_message("generating badges")
        .post_message("done generating badges")
}
