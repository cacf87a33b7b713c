//! Where inputs are found and what outputs are called.
//!
//! Downstream evaluation tooling finds outputs by name, so these formats must not change.
use std::path::PathBuf;

/// One file of a rendered scene.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ArtifactRole {
    /// The padded target, before any room.
    Target,
    /// The ramped interferer, before any room.
    Interferer,
    /// The target through the anechoic impulse response.
    TargetAnechoic,
    /// Target plus scaled interferer at a channel.
    Mixed(usize),
    /// The target at a channel.
    TargetAtChannel(usize),
    /// The scaled interferer at a channel.
    InterfererAtChannel(usize),
}

impl ArtifactRole {
    pub fn file_name(&self, scene_id: &str) -> String {
        match self {
            ArtifactRole::Target => format!("{scene_id}_target.wav"),
            ArtifactRole::Interferer => format!("{scene_id}_interferer.wav"),
            ArtifactRole::TargetAnechoic => format!("{scene_id}_target_anechoic.wav"),
            ArtifactRole::Mixed(c) => format!("{scene_id}_mixed_CH{c}.wav"),
            ArtifactRole::TargetAtChannel(c) => format!("{scene_id}_target_CH{c}.wav"),
            ArtifactRole::InterfererAtChannel(c) => format!("{scene_id}_interferer_CH{c}.wav"),
        }
    }

    /// The three roles recorded per channel, in the order they are rendered.
    pub fn per_channel(channel: usize) -> [ArtifactRole; 3] {
        [
            ArtifactRole::Mixed(channel),
            ArtifactRole::TargetAtChannel(channel),
            ArtifactRole::InterfererAtChannel(channel),
        ]
    }
}

/// Every role a scene rendered over `channels` produces, in render order.
pub fn artifact_roles(channels: &[usize]) -> Vec<ArtifactRole> {
    let mut roles = vec![ArtifactRole::Target, ArtifactRole::Interferer];
    roles.extend(channels.iter().flat_map(|c| ArtifactRole::per_channel(*c)));
    roles.push(ArtifactRole::TargetAnechoic);
    roles
}

/// Which source an impulse response carries to the listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BrirRole {
    Target,
    Interferer,
}

impl BrirRole {
    fn tag(&self) -> &'static str {
        match self {
            BrirRole::Target => "t",
            BrirRole::Interferer => "i1",
        }
    }
}

/// The on-disk layout of a dataset's inputs.
///
/// ```text
/// {root}/{dataset}/targets/{target}.wav
/// {root}/{dataset}/interferers/{type}/{interferer}.wav
/// {root}/{dataset}/rooms/brir/brir_{room}_t_CH{c}.wav
/// {root}/{dataset}/rooms/brir/brir_{room}_i1_CH{c}.wav
/// {root}/{dataset}/rooms/brir/anech_brir_{room}_t_CH1.wav
/// ```
#[derive(Clone, Debug)]
pub struct InputLayout {
    root: PathBuf,
}

/// The anechoic impulse response always comes from this channel.
pub const ANECHOIC_CHANNEL: usize = 1;

impl InputLayout {
    pub fn new(root: impl Into<PathBuf>) -> InputLayout {
        InputLayout { root: root.into() }
    }

    fn brir_dir(&self, dataset: &str) -> PathBuf {
        self.root.join(dataset).join("rooms").join("brir")
    }

    pub fn target(&self, dataset: &str, target: &str) -> PathBuf {
        self.root
            .join(dataset)
            .join("targets")
            .join(format!("{target}.wav"))
    }

    pub fn interferer(&self, dataset: &str, kind: &str, interferer: &str) -> PathBuf {
        self.root
            .join(dataset)
            .join("interferers")
            .join(kind)
            .join(format!("{interferer}.wav"))
    }

    pub fn brir(&self, dataset: &str, room: &str, role: BrirRole, channel: usize) -> PathBuf {
        self.brir_dir(dataset)
            .join(format!("brir_{room}_{}_CH{channel}.wav", role.tag()))
    }

    pub fn anechoic_brir(&self, dataset: &str, room: &str) -> PathBuf {
        self.brir_dir(dataset)
            .join(format!("anech_brir_{room}_t_CH{ANECHOIC_CHANNEL}.wav"))
    }
}
