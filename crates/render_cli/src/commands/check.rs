use anyhow::{bail, Result};
use scene_renderer::scene_is_rendered;

use crate::cli_args::{CheckArgs, CliArgs};

pub fn check(_top_args: &CliArgs, check_args: &CheckArgs) -> Result<()> {
    let (config, scenes) = super::load_inputs(&check_args.scenes)?;
    let output = &check_args.scenes.output;

    let incomplete = scenes
        .iter()
        .filter(|s| !scene_is_rendered(&s.scene, output, config.num_channels))
        .collect::<Vec<_>>();

    for scene in incomplete.iter() {
        println!("{}", scene.scene);
    }

    if !incomplete.is_empty() {
        bail!("{} of {} scenes are incomplete", incomplete.len(), scenes.len());
    }
    log::info!("All {} scenes are complete", scenes.len());
    Ok(())
}
