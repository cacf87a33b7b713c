//! Renders hearing aid listening scenes.
//!
//! Given a target recording, an interfering noise, and binaural room impulse responses for each hearing aid microphone
//! channel, a [Renderer] produces the padded target, the ramped interferer, a dry anechoic reference, and for every
//! channel the target and interferer as heard at that channel plus their mixture at the scene's SNR.
//!
//! [render_batch] drives many scenes in parallel and skips those whose outputs are already complete.
mod batch;
mod brir;
mod completeness;
mod config;
mod error;
mod naming;
mod reference_snr;
mod renderer;
mod scene;
mod signal_io;

pub use batch::*;
pub use brir::BrirConvolver;
pub use completeness::{expected_files, scene_is_rendered};
pub use config::{channel_sequence, ConfigError, RendererConfig, RendererConfigBuilder};
pub use error::{Error, MetadataError, Result};
pub use naming::{artifact_roles, ArtifactRole, BrirRole, InputLayout, ANECHOIC_CHANNEL};
pub use reference_snr::{compute_snr, ReferenceSnrEstimator};
pub use renderer::{Artifact, RenderStage, RenderedScene, Renderer};
pub use scene::{load_scenes, InterfererRef, NamedRef, SceneDescriptor};
pub use signal_io::{to_fixed_point, EncodedSignal, OutputEncoding, SignalIoError, WavIo};
