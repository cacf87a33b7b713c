//! Half-cosine fades on the edges of a signal.
//!
//! Interferers are cut out of much longer recordings, so both ends are arbitrary points in a waveform.  Fading them
//! in and out keeps the cut from clicking.
use std::f64::consts::PI;

use crate::signal::Signal;

/// Build a rising half-cosine window of `len` samples, going from exactly 0 to exactly 1.
///
/// This is `(cos(x) + 1) / 2` sampled at `len` evenly spaced points over `[pi, 2pi]`, endpoints included.
pub fn half_cosine_window(len: usize) -> Vec<f64> {
    match len {
        0 => vec![],
        1 => vec![0.0],
        _ => {
            let step = PI / (len - 1) as f64;
            (0..len)
                .map(|i| {
                    // Pin the last point so that it is 1 rather than something within an ulp of it.
                    let x = if i == len - 1 {
                        2.0 * PI
                    } else {
                        PI + step * i as f64
                    };
                    (x.cos() + 1.0) / 2.0
                })
                .collect()
        }
    }
}

/// Number of window samples for a ramp of `duration` seconds.  Truncates, as sample counts derived from durations do
/// everywhere else.
pub fn ramp_len(duration: f64, sample_rate: u32) -> usize {
    (sample_rate as f64 * duration) as usize
}

fn ramp_channel<F: Copy>(frames: &mut [F], window: &[f64], mut scale: impl FnMut(&mut F, f64)) {
    let len = window.len().min(frames.len());
    for (frame, w) in frames[..len].iter_mut().zip(window.iter()) {
        scale(frame, *w);
    }

    // The falling edge is the reversed window on the last frames.  On signals shorter than two windows the edges
    // overlap and both apply there.
    let start = frames.len() - len;
    for (frame, w) in frames[start..].iter_mut().zip(window.iter().rev()) {
        scale(frame, *w);
    }
}

/// Fade `signal` in and out over `duration` seconds at each end.
///
/// Frames between the two windows are untouched.  For stereo signals, both channels share the window.
pub fn apply_ramp(signal: &Signal, duration: f64, sample_rate: u32) -> Signal {
    let window = half_cosine_window(ramp_len(duration, sample_rate));
    apply_window(signal, &window)
}

/// [apply_ramp] with a prebuilt window.
pub fn apply_window(signal: &Signal, window: &[f64]) -> Signal {
    let mut out = signal.clone();
    match &mut out {
        Signal::Mono(s) => ramp_channel(&mut s[..], window, |x, w| *x *= w),
        Signal::Stereo(s) => ramp_channel(&mut s[..], window, |f, w| {
            f[0] *= w;
            f[1] *= w;
        }),
    }
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::close_floats::*;

    #[test]
    fn test_window_endpoints() {
        let w = half_cosine_window(5);
        assert_eq!(w[0], 0.0);
        assert_eq!(w[4], 1.0);
        close_floats64(w[2], 0.5, 1e-12);
        assert!(w.windows(2).all(|p| p[0] <= p[1]));
    }

    #[test]
    fn test_degenerate_windows() {
        assert!(half_cosine_window(0).is_empty());
        assert_eq!(half_cosine_window(1), vec![0.0]);

        let s = Signal::Mono(vec![1.0; 4]);
        assert_eq!(apply_window(&s, &[]), s);
    }

    #[test]
    fn test_ramp_len_truncates() {
        assert_eq!(ramp_len(0.5, 44100), 22050);
        assert_eq!(ramp_len(0.00001, 44100), 0);
    }

    #[test]
    fn test_overlapping_windows_multiply() {
        // A window of 3 on 4 frames: frames 1 and 2 get hit by both edges.
        let window = half_cosine_window(3);
        let out = apply_window(&Signal::Mono(vec![1.0; 4]), &window);
        let Signal::Mono(out) = out else {
            panic!("Ramp changed the channel format");
        };
        close_floats64(out[0], 0.0, 1e-12);
        close_floats64(out[1], window[1] * window[2], 1e-12);
        close_floats64(out[2], window[2] * window[1], 1e-12);
        close_floats64(out[3], 0.0, 1e-12);
    }

    #[test]
    fn test_window_longer_than_signal() {
        let out = apply_window(&Signal::Mono(vec![1.0; 2]), &half_cosine_window(10));
        assert_eq!(out.len(), 2);
        assert_eq!(out.channel(0)[0], 0.0);
    }

    #[test]
    fn test_stereo_channels_share_window() {
        let s = Signal::Stereo(vec![[1.0, 2.0]; 100]);
        let out = apply_ramp(&s, 0.1, 100);
        let left = out.channel(0);
        let right = out.channel(1);
        for (l, r) in left.iter().zip(right.iter()) {
            close_floats64(*l * 2.0, *r, 1e-12);
        }
    }

    proptest! {
        #[test]
        fn test_middle_untouched_and_edges_silenced(
            samples in prop::collection::vec(-1.0f64..1.0, 40..400),
            window_len in 1usize..20,
        ) {
            let window = half_cosine_window(window_len);
            let input = Signal::Mono(samples.clone());
            let out = apply_window(&input, &window).channel(0);

            prop_assert_eq!(out.len(), samples.len());
            prop_assert_eq!(out[0], 0.0);
            prop_assert_eq!(out[out.len() - 1], 0.0);
            for i in window_len..samples.len() - window_len {
                prop_assert_eq!(out[i], samples[i]);
            }
        }
    }
}
