use std::path::{Path, PathBuf};

use crate::config::channel_sequence;
use crate::naming::artifact_roles;

/// Every file a finished render of `scene_id` over `num_channels` channels leaves in `output_dir`.
pub fn expected_files(scene_id: &str, output_dir: &Path, num_channels: usize) -> Vec<PathBuf> {
    artifact_roles(&channel_sequence(num_channels))
        .into_iter()
        .map(|role| output_dir.join(role.file_name(scene_id)))
        .collect()
}

/// True only if every expected output exists.
///
/// Contents are not inspected: a file that exists counts, even if a previous run died while writing it.
pub fn scene_is_rendered(scene_id: &str, output_dir: &Path, num_channels: usize) -> bool {
    let missing = expected_files(scene_id, output_dir, num_channels)
        .into_iter()
        .find(|p| !p.exists());

    match missing {
        Some(p) => {
            log::trace!("Scene {scene_id} is incomplete: {} is missing", p.display());
            false
        }
        None => true,
    }
}
