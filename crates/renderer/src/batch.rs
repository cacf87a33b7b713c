//! Rendering many scenes at once.
use std::num::NonZeroUsize;

use rayon::prelude::*;

use crate::error::Error;
use crate::renderer::Renderer;
use crate::scene::SceneDescriptor;

/// What happened to one scene of a batch.
#[derive(Debug, derive_more::IsVariant)]
pub enum SceneOutcome {
    Rendered,

    /// Every output was already present.
    Skipped,

    Failed(Error),
}

#[derive(Clone, Debug, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct BatchOptions {
    /// Worker threads.  Defaults to rayon's choice, one per core.
    #[builder(default)]
    pub threads: Option<NonZeroUsize>,

    /// Leave scenes whose outputs all exist alone.
    #[builder(default = "true")]
    pub skip_existing: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            threads: None,
            skip_existing: true,
        }
    }
}

/// Per-scene outcomes, in the order the scenes were given.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<(String, SceneOutcome)>,
}

impl BatchReport {
    pub fn rendered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.1.is_rendered()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.1.is_skipped()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|(id, o)| match o {
            SceneOutcome::Failed(e) => Some((id.as_str(), e)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

fn render_one(renderer: &Renderer, scene: &SceneDescriptor, skip_existing: bool) -> SceneOutcome {
    if skip_existing && renderer.is_rendered(scene) {
        log::debug!("Skipping scene {}: already rendered", scene.scene);
        return SceneOutcome::Skipped;
    }

    match renderer.render(scene) {
        Ok(_) => SceneOutcome::Rendered,
        Err(e) => {
            log::error!("Scene {} failed: {}", scene.scene, e);
            SceneOutcome::Failed(e)
        }
    }
}

/// Render `scenes` in parallel.
///
/// A failing scene is logged and recorded; it does not stop the others.  Scenes must have distinct identifiers, since
/// scenes sharing one would write the same files.
pub fn render_batch(
    renderer: &Renderer,
    scenes: &[SceneDescriptor],
    options: &BatchOptions,
) -> Result<BatchReport, rayon::ThreadPoolBuildError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = options.threads {
        builder = builder.num_threads(threads.get());
    }
    let pool = builder.build()?;

    log::info!(
        "Rendering {} scenes on {} threads",
        scenes.len(),
        pool.current_num_threads()
    );

    let outcomes = pool.install(|| {
        scenes
            .par_iter()
            .map(|scene| {
                (
                    scene.scene.clone(),
                    render_one(renderer, scene, options.skip_existing),
                )
            })
            .collect::<Vec<_>>()
    });

    let report = BatchReport { outcomes };
    log::info!(
        "Batch done: {} rendered, {} skipped, {} failed",
        report.rendered(),
        report.skipped(),
        report.failed().count()
    );
    Ok(report)
}
