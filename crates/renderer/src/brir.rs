use scene_dsp::{DspError, FftConvolver, Signal};

/// Convolves sources with binaural room impulse responses.
///
/// Output is always stereo and always exactly `input + n_tail` frames, unless the full convolution is shorter than
/// that, in which case it is returned whole.  Keeping only a bounded tail caps output size no matter how long the
/// impulse response is.
#[derive(Debug)]
pub struct BrirConvolver {
    n_tail: usize,
    convolver: FftConvolver,
}

impl BrirConvolver {
    pub fn new(n_tail: usize) -> BrirConvolver {
        BrirConvolver {
            n_tail,
            convolver: FftConvolver::new(),
        }
    }

    /// Put `signal` through `brir`.
    ///
    /// A mono signal feeds both ears of the BRIR.  A stereo signal goes left to left and right to right.  The BRIR
    /// itself must be stereo.
    pub fn apply_brir(&mut self, signal: &Signal, brir: &Signal) -> Result<Signal, DspError> {
        if !brir.is_stereo() {
            return Err(DspError::InvalidShape {
                signal: signal.channel_format(),
                impulse: brir.channel_format(),
            });
        }

        // Signal::channel hands a mono signal back for either index.
        let left = self.convolver.convolve(&signal.channel(0), &brir.channel(0))?;
        let right = self.convolver.convolve(&signal.channel(1), &brir.channel(1))?;

        let mut out = Signal::from_channels(left, right);
        out.truncate(signal.len() + self.n_tail);
        Ok(out)
    }
}
