use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterfererRef {
    pub name: String,

    /// The interferer class, which is also the directory it lives in.
    #[serde(rename = "type")]
    pub kind: String,

    /// Where to start reading the interferer, in samples.
    pub offset: u32,
}

/// One scene, as described by the scene metadata.
///
/// Fields the renderer doesn't use are ignored when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    /// The output identifier.  Every output file name starts with it.
    pub scene: String,
    pub dataset: String,
    pub room: NamedRef,
    pub target: NamedRef,
    pub interferer: InterfererRef,

    /// Target to interferer ratio of the mixture, in dB.
    #[serde(rename = "SNR")]
    pub snr_db: f64,
}

/// Load a JSON list of scene descriptors.
pub fn load_scenes(path: impl AsRef<Path>) -> Result<Vec<SceneDescriptor>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MetadataError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let scenes = serde_json::from_str(&text).map_err(|source| MetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(scenes)
}
