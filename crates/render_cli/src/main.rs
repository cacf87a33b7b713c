//! Render hearing aid scenes from the command line.
//!
//! `render` renders every scene in a metadata file that isn't already complete, and `check` reports which scenes are
//! not.  Logging goes through `env_logger`, so set `RUST_LOG=info` (or `debug`) to see progress.
mod cli_args;
mod commands;

fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::init();
    let args = cli_args::CliArgs::parse();
    commands::dispatch_command(args)
}
