//! Command-line interface definition.
//!
//! # Command Structure
//!
//! - `dray build` - run a full build from `dray.toml`
//! - `dray check` - validate the configuration without building

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// dray - config-driven AMD-style bundling
#[derive(Parser, Debug)]
#[command(
    name = "dray",
    version,
    about = "Config-driven AMD-style bundling",
    long_about = "dray groups registered source files into bundles, assembles the\n\
                  module-loader configuration from dependency analysis, and writes\n\
                  the config-bearing bundle last so it embeds the final loader state."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register sources, transform bundles, and write outputs
    Build(BuildArgs),
    /// Validate the build configuration and report what it declares
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Project directory containing dray.toml
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Explicit config file path (skips discovery)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Build environment, matched against item env tags
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Build target directory, placed ahead of configured targets
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Directory dependencies are resolved from, relative to the project
    #[arg(long, default_value = "lib")]
    pub packages: PathBuf,

    /// Write the trace cache as JSON into the build target
    #[arg(long)]
    pub emit_trace: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Project directory containing dray.toml
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Explicit config file path (skips discovery)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
