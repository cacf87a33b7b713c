//! Signal math for scene rendering: the signal type, ramps, convolution, mixing, and SNR measurement.
//!
//! Nothing in here touches the filesystem.  Everything works in `f64` regardless of how the audio is stored.
mod channel_format;
#[doc(hidden)]
pub mod close_floats;
mod convolution;
mod db;
mod error;
mod mix;
mod ramp;
mod signal;
mod snr;

pub use channel_format::*;
pub use convolution::{convolve_direct, convolve_fft, FftConvolver};
pub use db::DbExt;
pub use error::DspError;
pub use mix::{pad, sum_signals};
pub use ramp::{apply_ramp, apply_window, half_cosine_window, ramp_len};
pub use signal::Signal;
pub use snr::{BetterEarSnr, SnrMetric, SpeechWeighting};
