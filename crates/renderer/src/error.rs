use scene_dsp::DspError;

use crate::config::ConfigError;
use crate::signal_io::SignalIoError;

#[derive(Debug, derive_more::Display, derive_more::IsVariant)]
enum ErrorPayload {
    #[display(fmt = "Signal I/O error: {}", _0)]
    SignalIo(SignalIoError),

    #[display(fmt = "Signal processing error: {}", _0)]
    Dsp(DspError),

    #[display(fmt = "Configuration error: {}", _0)]
    Config(ConfigError),

    #[display(fmt = "Scene metadata error: {}", _0)]
    Metadata(MetadataError),
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Unable to read scene metadata {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse scene metadata {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that can go wrong rendering a scene.
///
/// Every one of these aborts the scene it came from.  Use the `is_*` predicates to find out which kind of failure it
/// was; the payload itself is deliberately opaque.
#[derive(Debug, thiserror::Error)]
#[error("{payload}")]
pub struct Error {
    payload: ErrorPayload,
}

macro_rules! conv {
    ($variant: ident, $from_err: path) => {
        impl From<$from_err> for Error {
            fn from(value: $from_err) -> Error {
                Error {
                    payload: ErrorPayload::$variant(value),
                }
            }
        }
    };
}

conv!(SignalIo, SignalIoError);
conv!(Dsp, DspError);
conv!(Config, ConfigError);
conv!(Metadata, MetadataError);

impl Error {
    /// A file was missing, unreadable, or unwritable.
    pub fn is_io(&self) -> bool {
        match &self.payload {
            ErrorPayload::SignalIo(e) => e.is_io(),
            ErrorPayload::Metadata(MetadataError::Read { .. }) => true,
            ErrorPayload::Config(ConfigError::Read { .. }) => true,
            _ => false,
        }
    }

    pub fn is_channel_mismatch(&self) -> bool {
        matches!(
            self.payload,
            ErrorPayload::SignalIo(SignalIoError::ChannelMismatch { .. })
        )
    }

    pub fn is_sample_rate_mismatch(&self) -> bool {
        matches!(
            self.payload,
            ErrorPayload::SignalIo(SignalIoError::SampleRateMismatch { .. })
        )
    }

    /// A signal and impulse response (or two signals being combined) had layouts that cannot go together.
    pub fn is_invalid_shape(&self) -> bool {
        matches!(self.payload, ErrorPayload::Dsp(DspError::InvalidShape { .. }))
    }

    /// The target and noise analysis segments differed in length.
    pub fn is_length_mismatch(&self) -> bool {
        matches!(
            self.payload,
            ErrorPayload::Dsp(DspError::LengthMismatch { .. })
        )
    }

    /// A fixed-point write would have overflowed.
    pub fn is_clip(&self) -> bool {
        matches!(
            self.payload,
            ErrorPayload::SignalIo(SignalIoError::Clip { .. })
        )
    }

    pub fn is_config(&self) -> bool {
        self.payload.is_config()
    }

    pub fn is_metadata(&self) -> bool {
        self.payload.is_metadata()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
