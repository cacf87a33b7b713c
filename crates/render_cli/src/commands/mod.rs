mod check;
mod render;

use anyhow::{Context, Result};
use scene_renderer::{load_scenes, RendererConfig, SceneDescriptor};

use crate::cli_args::{self, SceneArgs};

/// Figure out what command to run, then run it.
pub fn dispatch_command(args: cli_args::CliArgs) -> Result<()> {
    match &args.command {
        cli_args::Command::Render(r) => render::render(&args, r),
        cli_args::Command::Check(c) => check::check(&args, c),
    }
}

fn load_inputs(args: &SceneArgs) -> Result<(RendererConfig, Vec<SceneDescriptor>)> {
    let config = match args.config.as_ref() {
        Some(path) => RendererConfig::load_yaml(path)
            .with_context(|| format!("While loading {}", path.display()))?,
        None => RendererConfig::default(),
    };

    let scenes = load_scenes(&args.scenes)?;
    log::info!(
        "Loaded {} scenes from {}",
        scenes.len(),
        args.scenes.display()
    );
    Ok((config, scenes))
}
