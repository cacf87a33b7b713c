//! Padding and summing signals of unequal length.
use crate::error::DspError;
use crate::signal::Signal;

/// Zero-extend `signal` to `length` frames.
///
/// Never truncates: asking for fewer frames than the signal has is an error.
pub fn pad(signal: &Signal, length: usize) -> Result<Signal, DspError> {
    let current = signal.len();
    if length < current {
        return Err(DspError::PadTooShort {
            length: current,
            requested: length,
        });
    }

    Ok(signal.zero_padded(0, length - current))
}

/// Sum signals frame by frame, zero-extending each to the longest.
///
/// All signals must share a channel format; mixing mono and stereo is an [DspError::InvalidShape].  An empty list sums
/// to an empty mono signal.
pub fn sum_signals(signals: &[&Signal]) -> Result<Signal, DspError> {
    let Some(first) = signals.first() else {
        return Ok(Signal::Mono(vec![]));
    };

    let format = first.channel_format();
    if let Some(odd) = signals.iter().find(|s| s.channel_format() != format) {
        return Err(DspError::InvalidShape {
            signal: odd.channel_format(),
            impulse: format,
        });
    }

    let longest = signals.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = Signal::zeros(format, longest);

    for s in signals.iter() {
        match (&mut out, *s) {
            (Signal::Mono(acc), Signal::Mono(x)) => {
                for (a, b) in acc.iter_mut().zip(x.iter()) {
                    *a += b;
                }
            }
            (Signal::Stereo(acc), Signal::Stereo(x)) => {
                for (a, b) in acc.iter_mut().zip(x.iter()) {
                    a[0] += b[0];
                    a[1] += b[1];
                }
            }
            _ => unreachable!("Formats were checked above"),
        }
    }

    debug_assert_eq!(out.channel_format(), format);
    Ok(out)
}
