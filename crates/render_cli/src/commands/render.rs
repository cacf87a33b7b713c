use anyhow::{bail, Result};
use scene_renderer::{render_batch, BatchOptions, Renderer};

use crate::cli_args::{CliArgs, RenderArgs};

pub fn render(_top_args: &CliArgs, render_args: &RenderArgs) -> Result<()> {
    let (config, scenes) = super::load_inputs(&render_args.scenes)?;
    let renderer = Renderer::new(config, &render_args.input, &render_args.scenes.output)?;

    let options = BatchOptions {
        threads: render_args.threads,
        skip_existing: !render_args.force,
    };
    let report = render_batch(&renderer, &scenes, &options)?;

    println!(
        "{} rendered, {} skipped, {} failed",
        report.rendered(),
        report.skipped(),
        report.failed().count()
    );
    for (scene, error) in report.failed() {
        println!("{scene}: {error}");
    }

    if !report.is_success() {
        bail!("{} scenes failed", report.failed().count());
    }
    Ok(())
}
