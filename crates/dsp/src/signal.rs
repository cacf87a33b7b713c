use std::ops::Range;

use crate::channel_format::ChannelFormat;
use crate::error::DspError;

/// An audio signal, tagged with its channel layout.
///
/// The layout is decided once, when the signal is loaded or built, and everything downstream dispatches on the variant
/// rather than re-inspecting the data.  Stereo frames are `[l, r]`, so the two channels can never disagree in length.
#[derive(Clone, Debug, PartialEq, derive_more::IsVariant)]
pub enum Signal {
    Mono(Vec<f64>),
    Stereo(Vec<[f64; 2]>),
}

impl Signal {
    /// Build a signal from interleaved samples, as found in a wave file.
    pub fn from_interleaved(format: ChannelFormat, samples: Vec<f64>) -> Result<Signal, DspError> {
        match format {
            ChannelFormat::Mono => Ok(Signal::Mono(samples)),
            ChannelFormat::Stereo => {
                if samples.len() % 2 != 0 {
                    return Err(DspError::RaggedInterleave {
                        samples: samples.len(),
                        channels: 2,
                    });
                }

                Ok(Signal::Stereo(
                    samples.chunks_exact(2).map(|f| [f[0], f[1]]).collect(),
                ))
            }
        }
    }

    /// Zip two channels into a stereo signal.
    ///
    /// # Panics
    ///
    /// If the channels differ in length.
    pub fn from_channels(left: Vec<f64>, right: Vec<f64>) -> Signal {
        assert_eq!(left.len(), right.len(), "Stereo channels must match in length");
        Signal::Stereo(left.into_iter().zip(right).map(|(l, r)| [l, r]).collect())
    }

    /// A signal of silence.
    pub fn zeros(format: ChannelFormat, frames: usize) -> Signal {
        match format {
            ChannelFormat::Mono => Signal::Mono(vec![0.0; frames]),
            ChannelFormat::Stereo => Signal::Stereo(vec![[0.0; 2]; frames]),
        }
    }

    pub fn channel_format(&self) -> ChannelFormat {
        match self {
            Signal::Mono(_) => ChannelFormat::Mono,
            Signal::Stereo(_) => ChannelFormat::Stereo,
        }
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        match self {
            Signal::Mono(s) => s.len(),
            Signal::Stereo(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out one channel.
    ///
    /// Mono signals return their only channel whatever the index, which is what lets a mono source feed both ears.
    pub fn channel(&self, index: usize) -> Vec<f64> {
        match self {
            Signal::Mono(s) => s.clone(),
            Signal::Stereo(s) => {
                assert!(index < 2, "Stereo signals have 2 channels, not {}", index + 1);
                s.iter().map(|f| f[index]).collect()
            }
        }
    }

    /// Iterate over every sample of every channel, in interleaved order.
    pub fn samples(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Signal::Mono(s) => Box::new(s.iter().copied()),
            Signal::Stereo(s) => Box::new(s.iter().flat_map(|f| f.iter().copied())),
        }
    }

    /// Apply `func` to every sample, producing a new signal of the same shape.
    pub fn map(&self, mut func: impl FnMut(f64) -> f64) -> Signal {
        match self {
            Signal::Mono(s) => Signal::Mono(s.iter().map(|x| func(*x)).collect()),
            Signal::Stereo(s) => {
                Signal::Stereo(s.iter().map(|[l, r]| [func(*l), func(*r)]).collect())
            }
        }
    }

    pub fn scaled(&self, gain: f64) -> Signal {
        self.map(|x| x * gain)
    }

    /// Copy out a range of frames.
    pub fn slice(&self, range: Range<usize>) -> Signal {
        match self {
            Signal::Mono(s) => Signal::Mono(s[range].to_vec()),
            Signal::Stereo(s) => Signal::Stereo(s[range].to_vec()),
        }
    }

    /// Shorten to at most `frames` frames.  Longer requests leave the signal alone.
    pub fn truncate(&mut self, frames: usize) {
        match self {
            Signal::Mono(s) => s.truncate(frames),
            Signal::Stereo(s) => s.truncate(frames),
        }
    }

    /// Surround the signal with `before` and `after` frames of silence.
    pub fn zero_padded(&self, before: usize, after: usize) -> Signal {
        match self {
            Signal::Mono(s) => {
                let mut out = Vec::with_capacity(before + s.len() + after);
                out.resize(before, 0.0);
                out.extend_from_slice(s);
                out.resize(before + s.len() + after, 0.0);
                Signal::Mono(out)
            }
            Signal::Stereo(s) => {
                let mut out = Vec::with_capacity(before + s.len() + after);
                out.resize(before, [0.0; 2]);
                out.extend_from_slice(s);
                out.resize(before + s.len() + after, [0.0; 2]);
                Signal::Stereo(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved_stereo() {
        let s = Signal::from_interleaved(ChannelFormat::Stereo, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s, Signal::Stereo(vec![[1.0, 2.0], [3.0, 4.0]]));
        assert_eq!(s.channel(1), vec![2.0, 4.0]);
        assert_eq!(s.samples().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_ragged_interleave() {
        let err = Signal::from_interleaved(ChannelFormat::Stereo, vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, DspError::RaggedInterleave { samples: 3, .. }));
    }

    #[test]
    fn test_mono_channel_feeds_both_ears() {
        let s = Signal::Mono(vec![0.5, -0.5]);
        assert_eq!(s.channel(0), s.channel(1));
    }

    #[test]
    fn test_zero_padded() {
        let s = Signal::Mono(vec![1.0, 2.0]).zero_padded(2, 1);
        assert_eq!(s, Signal::Mono(vec![0.0, 0.0, 1.0, 2.0, 0.0]));

        let s = Signal::Stereo(vec![[1.0, 2.0]]).zero_padded(1, 0);
        assert_eq!(s, Signal::Stereo(vec![[0.0, 0.0], [1.0, 2.0]]));
    }
}
