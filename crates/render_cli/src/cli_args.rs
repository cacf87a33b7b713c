//! Definition of the Clap command line.
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render scenes.
    Render(RenderArgs),

    /// List scenes whose outputs are incomplete.
    Check(CheckArgs),
}

/// Arguments shared by every command.
#[derive(Debug, Parser)]
pub struct SceneArgs {
    /// Renderer configuration as YAML.  Built-in defaults are used if omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON list of scene descriptors.
    #[arg(long)]
    pub scenes: PathBuf,

    /// Directory rendered scenes are written to.
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, Parser)]
pub struct RenderArgs {
    #[command(flatten)]
    pub scenes: SceneArgs,

    /// Root of the input tree, containing one directory per dataset.
    #[arg(long)]
    pub input: PathBuf,

    /// Worker threads.  Defaults to one per core.
    #[arg(long)]
    pub threads: Option<NonZeroUsize>,

    /// Render scenes even if all of their outputs already exist.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    #[command(flatten)]
    pub scenes: SceneArgs,
}
