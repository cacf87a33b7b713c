use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::signal_io::OutputEncoding;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything a renderer needs to know that isn't specific to one scene.
///
/// This is immutable once a [crate::Renderer] is built from it.  Durations are in seconds and are converted to sample
/// counts by truncation, through the methods here, so that every component agrees on the same counts.
///
/// Build one with [RendererConfigBuilder], load one from YAML with [RendererConfig::load_yaml], or start from
/// `Default`, which matches the settings the challenge data was generated with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(pattern = "owned", default)]
#[serde(default)]
pub struct RendererConfig {
    /// The only sample rate inputs may have, and the rate outputs are written at.
    pub sample_rate: u32,

    /// Number of hearing aid microphone channels.
    ///
    /// 0 renders only the raw target, raw interferer and anechoic reference.  `N` additionally renders channels
    /// `1..=N` and then the eardrum channel 0.
    pub num_channels: usize,

    /// Length of the half-cosine fade applied to each end of the interferer.
    pub ramp_duration: f64,

    /// How much of the reverberant tail to keep past the end of the input.
    pub tail_duration: f64,

    /// Silence added before the target.
    pub pre_duration: f64,

    /// Silence added after the target.
    pub post_duration: f64,

    /// How output files are encoded.
    pub output_encoding: OutputEncoding,

    /// A mono wave file whose samples are the speech-weighting filter taps.  Unweighted when absent.
    pub speech_filter: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        RendererConfig {
            sample_rate: 44100,
            num_channels: 1,
            ramp_duration: 0.5,
            tail_duration: 0.2,
            pre_duration: 2.0,
            post_duration: 1.0,
            output_encoding: OutputEncoding::Float32,
            speech_filter: None,
        }
    }
}

/// The order channels are rendered in for a given channel count.
///
/// The first entry supplies the reference gain for the whole scene, so this order is load-bearing.
pub fn channel_sequence(num_channels: usize) -> Vec<usize> {
    if num_channels == 0 {
        return vec![];
    }

    (1..=num_channels).chain(std::iter::once(0)).collect()
}

fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64) as usize
}

impl RendererConfig {
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<RendererConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RendererConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".into()));
        }

        for (name, value) in [
            ("ramp_duration", self.ramp_duration),
            ("tail_duration", self.tail_duration),
            ("pre_duration", self.pre_duration),
            ("post_duration", self.post_duration),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number of seconds, not {value}"
                )));
            }
        }

        Ok(())
    }

    pub fn channels(&self) -> Vec<usize> {
        channel_sequence(self.num_channels)
    }

    /// Samples of reverberant tail kept past the input length.
    pub fn n_tail(&self) -> usize {
        seconds_to_samples(self.tail_duration, self.sample_rate)
    }

    pub fn pre_samples(&self) -> usize {
        seconds_to_samples(self.pre_duration, self.sample_rate)
    }

    pub fn post_samples(&self) -> usize {
        seconds_to_samples(self.post_duration, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_channel_sequence() {
        assert_eq!(channel_sequence(0), Vec::<usize>::new());
        assert_eq!(channel_sequence(1), vec![1, 0]);
        assert_eq!(channel_sequence(3), vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_default_sample_counts() {
        let config = RendererConfig::default();
        assert_eq!(config.n_tail(), 8820);
        assert_eq!(config.pre_samples(), 88200);
        assert_eq!(config.post_samples(), 44100);
    }

    #[test]
    fn test_builder_fills_defaults() {
        let config = RendererConfigBuilder::default()
            .num_channels(3)
            .tail_duration(0.0)
            .build()
            .unwrap();
        assert_eq!(config.num_channels, 3);
        assert_eq!(config.n_tail(), 0);
        assert_eq!(config.sample_rate, 44100);
    }

    #[test]
    fn test_partial_yaml() {
        let config: RendererConfig =
            serde_yaml::from_str("num_channels: 2\noutput_encoding: pcm16\n").unwrap();
        assert_eq!(config.channels(), vec![1, 2, 0]);
        assert_eq!(config.output_encoding, OutputEncoding::Pcm16);
        assert_eq!(config.pre_duration, 2.0);
    }

    #[test]
    fn test_validate() {
        let mut config = RendererConfig::default();
        assert!(config.validate().is_ok());
        config.post_duration = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.post_duration = 1.0;
        config.sample_rate = 0;
        assert!(config.validate().is_err());
    }
}
