use crate::channel_format::ChannelFormat;

/// Errors from the signal math.
///
/// All of these are fatal for whatever scene triggered them: nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum DspError {
    #[error("Unsupported shape combination: {signal} signal against {impulse} impulse response")]
    InvalidShape {
        signal: ChannelFormat,
        impulse: ChannelFormat,
    },

    #[error("Target ({target}) differs in length from noise ({noise})")]
    LengthMismatch { target: usize, noise: usize },

    #[error("Cannot pad a signal of {length} frames down to {requested} frames")]
    PadTooShort { length: usize, requested: usize },

    #[error("SNR is undefined: {0}")]
    DegenerateSegment(&'static str),

    #[error("Interleaved data of {samples} samples is not a whole number of {channels}-channel frames")]
    RaggedInterleave { samples: usize, channels: usize },

    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),
}
