// src/bin/taskforge.rs

use clap::Parser;
use colored::*;
use taskforge::constants::EXIT_CONFIG_ERROR;
use taskforge::core::maker::Maker;
use taskforge::targets;

/// taskforge: a programmable substitute for make.
///
/// The first argument is a target name; everything after it is forwarded
/// verbatim as that target's flag arguments. Without arguments (or with
/// `help`) the listing of registered targets is shown.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Target name followed by that target's flag arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("CLI args parsed: {:?}", cli);

    // The only process-wide orchestrator instance lives here.
    let mut maker = Maker::new();

    // A duplicate name is a mistake in how the stock targets are composed;
    // nothing at run time can recover from it.
    if let Err(e) = maker.register_all(targets::stock()) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    std::process::exit(maker.run(&cli.args));
}
