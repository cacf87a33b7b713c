//! Better-ear, speech-weighted signal to noise ratio.
//!
//! Each ear's target and noise are passed through the same speech-weighting FIR filter, the per-ear ratio of RMS levels
//! is taken, and the better (larger) ear wins.  The result is a linear amplitude ratio, not dB: multiplying the noise
//! by it brings the two to equal weighted level.
use crate::convolution::FftConvolver;
use crate::error::DspError;
use crate::signal::Signal;

/// Something that can score a target against a noise over equal-length segments.
///
/// The renderer only depends on this seam, so alternative weightings can be substituted without touching it.
pub trait SnrMetric {
    /// Linear target-to-noise ratio of two segments of equal length and channel format.
    fn snr(&self, target: &Signal, noise: &Signal) -> Result<f64, DspError>;
}

/// FIR taps applied to both target and noise before measuring levels.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechWeighting {
    taps: Vec<f64>,
}

impl SpeechWeighting {
    /// No weighting at all: a single unit tap.
    pub fn flat() -> SpeechWeighting {
        SpeechWeighting { taps: vec![1.0] }
    }

    /// Weighting from filter taps.  Returns `None` for an empty filter, which would make every level zero.
    pub fn from_taps(taps: Vec<f64>) -> Option<SpeechWeighting> {
        if taps.is_empty() {
            return None;
        }
        Some(SpeechWeighting { taps })
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps[..]
    }
}

impl Default for SpeechWeighting {
    fn default() -> Self {
        Self::flat()
    }
}

fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|x| x * x).sum::<f64>() / samples.len() as f64).sqrt()
}

/// The better-ear speech-weighted SNR.
#[derive(Clone, Debug, Default)]
pub struct BetterEarSnr {
    weighting: SpeechWeighting,
}

impl BetterEarSnr {
    pub fn new(weighting: SpeechWeighting) -> BetterEarSnr {
        BetterEarSnr { weighting }
    }

    fn ear_snr(
        &self,
        convolver: &mut FftConvolver,
        target: &[f64],
        noise: &[f64],
    ) -> Result<f64, DspError> {
        let target_level = rms(&convolver.convolve(target, self.weighting.taps())?);
        let noise_level = rms(&convolver.convolve(noise, self.weighting.taps())?);

        if noise_level == 0.0 {
            return Err(DspError::DegenerateSegment("the noise segment is silent"));
        }

        Ok(target_level / noise_level)
    }
}

impl SnrMetric for BetterEarSnr {
    fn snr(&self, target: &Signal, noise: &Signal) -> Result<f64, DspError> {
        if target.channel_format() != noise.channel_format() {
            return Err(DspError::InvalidShape {
                signal: target.channel_format(),
                impulse: noise.channel_format(),
            });
        }

        if target.len() != noise.len() {
            return Err(DspError::LengthMismatch {
                target: target.len(),
                noise: noise.len(),
            });
        }

        if target.is_empty() {
            return Err(DspError::DegenerateSegment("the segments are empty"));
        }

        let mut convolver = FftConvolver::new();
        let snr = match (target, noise) {
            (Signal::Mono(t), Signal::Mono(n)) => self.ear_snr(&mut convolver, t, n)?,
            _ => {
                let left = self.ear_snr(&mut convolver, &target.channel(0), &noise.channel(0))?;
                let right = self.ear_snr(&mut convolver, &target.channel(1), &noise.channel(1))?;
                log::trace!("Per-ear SNR: left={left}, right={right}");
                left.max(right)
            }
        };

        Ok(snr)
    }
}
